//! # API Handlers
//!
//! HTTP endpoint handlers for the Delivery Tracker API, one module per entity
//! kind plus the stats singleton.

use crate::models::ServiceInfo;
use axum::response::Json;

pub mod deliveries;
pub mod documents;
pub mod stats;
pub mod suppliers;
pub mod whatsapp_messages;

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

#[cfg(test)]
mod tests;
