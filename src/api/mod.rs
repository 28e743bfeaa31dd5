//! Celium upstream API.

mod client;

pub use client::CeliumClient;
