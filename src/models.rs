//! Public request/response models and the payloads sent to Celium.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};

/// Default template category.
pub const DEFAULT_CATEGORY: &str = "PYTORCH";

/// Prefix for generated template names.
pub const DEFAULT_NAME_PREFIX: &str = "celium-pods";

/// First verification state of a new template. Celium alone decides when a
/// template is verified.
pub const INITIAL_TEMPLATE_STATUS: &str = "CREATED";

/// A rentable GPU host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    pub id: String,
    pub gpu_type: String,
    pub gpu_count: i64,
}

/// Request body for `POST /machines/template`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTemplateRequest {
    pub docker_image: String,
    pub docker_image_digest: String,
    pub docker_image_tag: String,
    #[serde(default)]
    pub startup_commands: String,
    #[serde(default)]
    pub port_mapping: Vec<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub environment: HashMap<String, String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub entrypoint: Option<String>,
    #[serde(default)]
    pub readme: Option<String>,
    #[serde(default)]
    pub is_private: Option<bool>,
    #[serde(default)]
    pub container_start_immediately: Option<bool>,
    #[serde(default)]
    pub volumes: Option<Vec<String>>,
}

impl CreateTemplateRequest {
    pub fn validate(&self) -> Result<()> {
        require_non_empty("docker_image", &self.docker_image)?;
        require_non_empty("docker_image_tag", &self.docker_image_tag)?;
        validate_ports(&self.port_mapping)?;
        if let Some(name) = &self.name {
            require_non_empty("name", name)?;
        }
        Ok(())
    }
}

/// Template definition as Celium expects it on `POST /templates`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSpec {
    pub category: String,
    pub container_start_immediately: bool,
    pub description: String,
    pub docker_image: String,
    pub docker_image_digest: String,
    pub docker_image_tag: String,
    pub entrypoint: String,
    pub environment: HashMap<String, String>,
    pub internal_ports: Vec<i64>,
    pub is_private: bool,
    pub name: String,
    pub readme: String,
    pub startup_commands: String,
    pub volumes: Vec<String>,
}

/// Template id and verification status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateResponse {
    pub id: String,
    pub status: String,
}

/// Template summary embedded in a [`Pod`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateInfo {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub docker_image: Option<String>,
    #[serde(default)]
    pub docker_image_tag: Option<String>,
}

/// A rented pod. Its id is the id of the executor it runs on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pod {
    pub id: String,
    pub status: String,
    pub pod_name: String,
    pub gpu_name: Option<String>,
    pub gpu_count: Option<i64>,
    pub cpu_name: Option<String>,
    pub ram_total: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub ssh_connect_cmd: Option<String>,
    pub ports_mapping: Option<HashMap<String, i64>>,
    pub template: Option<TemplateInfo>,
    pub executor_ip_address: Option<String>,
}

/// Request body for `POST /machines/`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePodRequest {
    pub template_id: String,
    pub executor_id: String,
    pub ssh_key: String,
    pub name: String,
}

impl CreatePodRequest {
    pub fn validate(&self) -> Result<()> {
        require_non_empty("template_id", &self.template_id)?;
        require_non_empty("executor_id", &self.executor_id)?;
        require_non_empty("ssh_key", &self.ssh_key)?;
        require_non_empty("name", &self.name)
    }
}

/// Request body for `POST /machines/launch`: template creation and rent in one call.
#[derive(Debug, Clone, Deserialize)]
pub struct LaunchMachineRequest {
    pub port_mapping: Vec<i64>,
    pub docker_image: String,
    pub docker_image_digest: String,
    pub docker_image_tag: String,
    pub startup_commands: String,
    pub executor_id: String,
    pub ssh_key: String,
    pub name: String,
}

impl LaunchMachineRequest {
    pub fn validate(&self) -> Result<()> {
        require_non_empty("docker_image", &self.docker_image)?;
        require_non_empty("docker_image_tag", &self.docker_image_tag)?;
        require_non_empty("executor_id", &self.executor_id)?;
        require_non_empty("ssh_key", &self.ssh_key)?;
        require_non_empty("name", &self.name)?;
        validate_ports(&self.port_mapping)
    }
}

/// Body of `POST /executors/{id}/rent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentPodPayload {
    pub pod_name: String,
    pub template_id: String,
    pub user_public_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentPodResponse {
    pub id: String,
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

fn validate_ports(ports: &[i64]) -> Result<()> {
    match ports.iter().find(|p| !(1..=65535).contains(*p)) {
        Some(port) => Err(ApiError::Validation(format!("port {port} is outside 1-65535"))),
        None => Ok(()),
    }
}
