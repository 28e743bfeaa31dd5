//! Machine provisioning operations on top of Celium.

use std::sync::Arc;

use crate::api::CeliumClient;
use crate::error::{ApiError, Result};
use crate::models::{
    CreatePodRequest, CreateTemplateRequest, LaunchMachineRequest, Machine, Pod, RentPodResponse,
    TemplateResponse, TemplateSpec,
};
use crate::translate;

/// Stateless request orchestration; every call goes straight to Celium.
#[derive(Clone)]
pub struct MachinesService {
    client: Arc<CeliumClient>,
}

impl MachinesService {
    pub fn new(client: CeliumClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// List executors as machines.
    pub async fn list_machines(&self) -> Result<Vec<Machine>> {
        let executors = self.client.list_executors().await?;
        let machines = executors
            .iter()
            .map(translate::machine_from_raw)
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(count = machines.len(), "Listed machines");
        Ok(machines)
    }

    /// Create a template from a request.
    pub async fn create_template(&self, req: CreateTemplateRequest) -> Result<TemplateResponse> {
        req.validate()?;
        let spec = translate::template_spec_from_create_request(req);
        self.submit_template(&spec).await
    }

    /// Current verification status of a template.
    pub async fn get_template(&self, template_id: &str) -> Result<TemplateResponse> {
        validate_path_id("template_id", template_id)?;
        let raw = self.client.get_template(template_id).await?;
        translate::template_response_from_raw(&raw)
    }

    /// Rent a pod on `executor_id` with an existing template.
    ///
    /// The returned id is always the requested executor id, whatever Celium
    /// echoes back.
    pub async fn create_pod(&self, req: CreatePodRequest) -> Result<RentPodResponse> {
        req.validate()?;
        validate_path_id("executor_id", &req.executor_id)?;
        let payload = translate::rent_payload_from_request(&req, &req.template_id);

        tracing::info!(
            executor_id = %req.executor_id,
            template_id = %req.template_id,
            pod_name = %req.name,
            "Renting pod"
        );
        let raw = self.client.rent_pod(&req.executor_id, &payload).await?;
        if let Some(upstream_id) = raw.get("id").and_then(|id| id.as_str()) {
            if upstream_id != req.executor_id {
                tracing::debug!(
                    executor_id = %req.executor_id,
                    upstream_id,
                    "Rent response id differs from executor id"
                );
            }
        }

        Ok(RentPodResponse {
            id: req.executor_id,
        })
    }

    /// Fetch a pod by id.
    pub async fn get_pod(&self, pod_id: &str) -> Result<Pod> {
        validate_path_id("pod_id", pod_id)?;
        let raw = self.client.get_pod(pod_id).await?;
        translate::pod_from_raw(&raw, pod_id)
    }

    /// Create a template and immediately rent a pod with it.
    ///
    /// Not atomic: if the rent fails the new template stays behind on Celium.
    pub async fn launch_machine(&self, req: LaunchMachineRequest) -> Result<RentPodResponse> {
        req.validate()?;
        validate_path_id("executor_id", &req.executor_id)?;
        let spec = translate::template_spec_from_launch_request(&req);
        let template = self.submit_template(&spec).await?;

        let pod_req = CreatePodRequest {
            template_id: template.id,
            executor_id: req.executor_id,
            ssh_key: req.ssh_key,
            name: req.name,
        };
        let template_id = pod_req.template_id.clone();

        self.create_pod(pod_req).await.inspect_err(|e| {
            tracing::warn!(
                template_id = %template_id,
                error = %e,
                "Rent failed after template creation; template left in place"
            );
        })
    }

    async fn submit_template(&self, spec: &TemplateSpec) -> Result<TemplateResponse> {
        tracing::info!(
            name = %spec.name,
            image = %spec.docker_image,
            tag = %spec.docker_image_tag,
            "Creating template"
        );
        let raw = self.client.create_template(spec).await?;
        let template = translate::template_response_from_raw(&raw)?;

        tracing::info!(template_id = %template.id, status = %template.status, "Template created");
        Ok(template)
    }
}

/// Ids become single upstream path segments; dot segments would be dropped
/// and separators or escapes have no place in a Celium id.
fn validate_path_id(field: &str, id: &str) -> Result<()> {
    if id.trim().is_empty()
        || id == "."
        || id == ".."
        || id.contains(['/', '\\', '?', '#', '%'])
        || id.chars().any(char::is_control)
    {
        return Err(ApiError::Validation(format!("invalid {field}: {id:?}")));
    }
    Ok(())
}
