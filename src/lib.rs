//! REST facade for renting GPU pods through the Celium compute API.
//!
//! Requests flow through three layers:
//! - [`routes`] validates the inbound HTTP request,
//! - [`translate`] maps between public models and Celium payloads,
//! - [`api::CeliumClient`] performs the single upstream call.
//!
//! Nothing is stored locally; every response is rebuilt from Celium.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod service;
pub mod translate;

pub use api::CeliumClient;
pub use config::Config;
pub use error::{ApiError, Result};
pub use routes::router;
pub use service::MachinesService;
