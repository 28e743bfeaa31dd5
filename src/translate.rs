//! Mapping between Celium payloads and the public models.
//!
//! Every function here is pure. Optional upstream fields that are missing or
//! have the wrong shape become `None` (or a documented default); only missing
//! required fields produce [`ApiError::Mapping`].

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::{
    CreatePodRequest, CreateTemplateRequest, LaunchMachineRequest, Machine, Pod, RentPodPayload,
    TemplateInfo, TemplateResponse, TemplateSpec, DEFAULT_CATEGORY, DEFAULT_NAME_PREFIX,
    INITIAL_TEMPLATE_STATUS,
};

const UNKNOWN_GPU: &str = "Unknown";

const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Convert a Celium executor record into a [`Machine`].
pub fn machine_from_raw(raw: &Value) -> Result<Machine> {
    let id = required_str(raw, "id", "executor")?;
    let gpu = raw.pointer("/specs/gpu");

    let gpu_type = gpu
        .and_then(|g| g.get("details"))
        .and_then(Value::as_array)
        .and_then(|details| details.first())
        .and_then(|first| first.get("name"))
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .unwrap_or(UNKNOWN_GPU)
        .to_string();

    let gpu_count = gpu
        .and_then(|g| g.get("count"))
        .and_then(Value::as_i64)
        .unwrap_or(0);

    Ok(Machine {
        id,
        gpu_type,
        gpu_count,
    })
}

/// Fill in template defaults around the caller's fields.
pub fn template_spec_from_create_request(req: CreateTemplateRequest) -> TemplateSpec {
    TemplateSpec {
        category: req.category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        container_start_immediately: req.container_start_immediately.unwrap_or(true),
        description: req.description.unwrap_or_default(),
        docker_image: req.docker_image,
        docker_image_digest: req.docker_image_digest,
        docker_image_tag: req.docker_image_tag,
        entrypoint: req.entrypoint.unwrap_or_default(),
        environment: req.environment,
        internal_ports: req.port_mapping,
        is_private: req.is_private.unwrap_or(true),
        name: req.name.unwrap_or_else(default_template_name),
        readme: req.readme.unwrap_or_default(),
        startup_commands: req.startup_commands,
        volumes: req.volumes.unwrap_or_else(default_volumes),
    }
}

/// Template spec for the combined create-and-rent flow.
pub fn template_spec_from_launch_request(req: &LaunchMachineRequest) -> TemplateSpec {
    template_spec_from_create_request(CreateTemplateRequest {
        docker_image: req.docker_image.clone(),
        docker_image_digest: req.docker_image_digest.clone(),
        docker_image_tag: req.docker_image_tag.clone(),
        startup_commands: req.startup_commands.clone(),
        port_mapping: req.port_mapping.clone(),
        name: None,
        category: None,
        environment: HashMap::new(),
        description: None,
        entrypoint: None,
        readme: None,
        is_private: None,
        container_start_immediately: None,
        volumes: None,
    })
}

/// Extract `{id, status}` from a Celium template record.
///
/// A record without `status` is reported as `CREATED`, the first state of
/// verification.
pub fn template_response_from_raw(raw: &Value) -> Result<TemplateResponse> {
    let id = required_str(raw, "id", "template")?;
    let status = raw
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or(INITIAL_TEMPLATE_STATUS)
        .to_string();

    Ok(TemplateResponse { id, status })
}

/// Convert a Celium pod record into a [`Pod`] identified by `id`.
pub fn pod_from_raw(raw: &Value, id: &str) -> Result<Pod> {
    let status = required_str(raw, "status", "pod")?;
    let pod_name = required_str(raw, "pod_name", "pod")?;
    let ssh_connect_cmd = optional_str(raw, "ssh_connect_cmd");
    let executor_ip_address = ssh_connect_cmd.as_deref().and_then(ssh_host);

    Ok(Pod {
        id: id.to_string(),
        status,
        pod_name,
        gpu_name: optional_str(raw, "gpu_name"),
        gpu_count: optional_int(raw, "gpu_count"),
        cpu_name: optional_str(raw, "cpu_name"),
        ram_total: optional_int(raw, "ram_total"),
        created_at: optional_str(raw, "created_at").and_then(|s| parse_timestamp(&s)),
        updated_at: optional_str(raw, "updated_at").and_then(|s| parse_timestamp(&s)),
        ssh_connect_cmd,
        ports_mapping: raw.get("ports_mapping").and_then(ports_mapping),
        template: raw.get("template").and_then(template_info),
        executor_ip_address,
    })
}

/// Build the rent payload for `template_id` from a pod request.
pub fn rent_payload_from_request(req: &CreatePodRequest, template_id: &str) -> RentPodPayload {
    RentPodPayload {
        pod_name: req.name.clone(),
        template_id: template_id.to_string(),
        user_public_key: req.ssh_key.clone(),
    }
}

/// Host part of an `ssh <user>@<host> -p <port>` command.
pub fn ssh_host(cmd: &str) -> Option<String> {
    let (_, rest) = cmd.split_once('@')?;
    rest.split(char::is_whitespace)
        .next()
        .filter(|host| !host.is_empty())
        .map(str::to_string)
}

/// Parse an ISO-8601 timestamp; zone-less values are taken as UTC.
///
/// Accepts a space instead of `T` between date and time, minute precision
/// and bare dates (midnight).
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    let text = match text.as_bytes().get(10) {
        Some(b' ') => format!("{}T{}", &text[..10], &text[11..]),
        _ => text.to_string(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(naive) = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&text, fmt).ok())
    {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(&text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub fn default_template_name() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{DEFAULT_NAME_PREFIX}-{}", &suffix[..8])
}

fn default_volumes() -> Vec<String> {
    vec![String::new()]
}

fn required_str(raw: &Value, field: &str, entity: &str) -> Result<String> {
    raw.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ApiError::Mapping(format!("{entity} is missing string field `{field}`")))
}

fn optional_str(raw: &Value, field: &str) -> Option<String> {
    raw.get(field).and_then(Value::as_str).map(str::to_string)
}

fn optional_int(raw: &Value, field: &str) -> Option<i64> {
    raw.get(field).and_then(Value::as_i64)
}

fn ports_mapping(value: &Value) -> Option<HashMap<String, i64>> {
    let ports = value
        .as_object()?
        .iter()
        .filter_map(|(k, v)| v.as_i64().map(|port| (k.clone(), port)))
        .collect();
    Some(ports)
}

fn template_info(value: &Value) -> Option<TemplateInfo> {
    Some(TemplateInfo {
        id: value.get("id")?.as_str()?.to_string(),
        name: optional_str(value, "name"),
        category: optional_str(value, "category"),
        docker_image: optional_str(value, "docker_image"),
        docker_image_tag: optional_str(value, "docker_image_tag"),
    })
}
