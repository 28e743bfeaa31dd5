//! HTTP routes under `/machines`.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use tower_http::trace::TraceLayer;

use crate::error::{ApiError, Result};
use crate::models::{
    CreatePodRequest, CreateTemplateRequest, LaunchMachineRequest, Machine, Pod, RentPodResponse,
    TemplateResponse,
};
use crate::service::MachinesService;

/// Build the application router.
pub fn router(service: MachinesService) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/machines", get(list_machines).post(create_pod))
        .route("/machines/", get(list_machines).post(create_pod))
        .route("/machines/launch", post(launch_machine))
        .route("/machines/template", post(create_template))
        .route("/machines/template/{template_id}", get(get_template))
        .route("/machines/{pod_id}", get(get_pod))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn health() -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn list_machines(State(service): State<MachinesService>) -> Result<Json<Vec<Machine>>> {
    Ok(Json(service.list_machines().await?))
}

async fn create_template(
    State(service): State<MachinesService>,
    body: std::result::Result<Json<CreateTemplateRequest>, JsonRejection>,
) -> Result<Json<TemplateResponse>> {
    let Json(req) = body.map_err(rejection)?;
    Ok(Json(service.create_template(req).await?))
}

async fn get_template(
    State(service): State<MachinesService>,
    Path(template_id): Path<String>,
) -> Result<Json<TemplateResponse>> {
    Ok(Json(service.get_template(&template_id).await?))
}

async fn create_pod(
    State(service): State<MachinesService>,
    body: std::result::Result<Json<CreatePodRequest>, JsonRejection>,
) -> Result<Json<RentPodResponse>> {
    let Json(req) = body.map_err(rejection)?;
    Ok(Json(service.create_pod(req).await?))
}

async fn get_pod(
    State(service): State<MachinesService>,
    Path(pod_id): Path<String>,
) -> Result<Json<Pod>> {
    Ok(Json(service.get_pod(&pod_id).await?))
}

async fn launch_machine(
    State(service): State<MachinesService>,
    body: std::result::Result<Json<LaunchMachineRequest>, JsonRejection>,
) -> Result<Json<RentPodResponse>> {
    let Json(req) = body.map_err(rejection)?;
    Ok(Json(service.launch_machine(req).await?))
}

fn rejection(err: JsonRejection) -> ApiError {
    ApiError::Validation(err.body_text())
}
