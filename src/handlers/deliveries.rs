//! # Delivery API Handlers

use axum::{
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::Json,
};

use crate::error::{ApiError, not_found};
use crate::models::{Delivery, DeliveryPatch, EntityId, NewDelivery};
use crate::repositories::DeliveryRepository;
use crate::server::AppState;

/// List all deliveries
#[utoipa::path(
    get,
    path = "/api/deliveries",
    responses(
        (status = 200, description = "Deliveries in insertion order", body = [Delivery])
    ),
    tag = "deliveries"
)]
pub async fn list_deliveries(State(state): State<AppState>) -> Json<Vec<Delivery>> {
    Json(DeliveryRepository::new(&state.store).list_deliveries().await)
}

/// Get a delivery by id
#[utoipa::path(
    get,
    path = "/api/deliveries/{id}",
    params(("id" = i32, Path, description = "Delivery id")),
    responses(
        (status = 200, description = "Delivery found", body = Delivery),
        (status = 404, description = "Delivery not found", body = ApiError)
    ),
    tag = "deliveries"
)]
pub async fn get_delivery(
    State(state): State<AppState>,
    id: Result<Path<EntityId>, PathRejection>,
) -> Result<Json<Delivery>, ApiError> {
    let Path(id) = id?;

    DeliveryRepository::new(&state.store)
        .get_delivery(id)
        .await
        .map(Json)
        .ok_or_else(|| not_found("Delivery", id))
}

/// Record a delivery
#[utoipa::path(
    post,
    path = "/api/deliveries",
    request_body = NewDelivery,
    responses(
        (status = 201, description = "Delivery created", body = Delivery),
        (status = 400, description = "Validation failed", body = ApiError)
    ),
    tag = "deliveries"
)]
pub async fn create_delivery(
    State(state): State<AppState>,
    payload: Result<Json<NewDelivery>, JsonRejection>,
) -> Result<(StatusCode, Json<Delivery>), ApiError> {
    let Json(payload) = payload?;

    let delivery = DeliveryRepository::new(&state.store)
        .create_delivery(payload)
        .await?;

    Ok((StatusCode::CREATED, Json(delivery)))
}

/// Update a delivery
#[utoipa::path(
    put,
    path = "/api/deliveries/{id}",
    params(("id" = i32, Path, description = "Delivery id")),
    request_body = DeliveryPatch,
    responses(
        (status = 200, description = "Delivery updated", body = Delivery),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Delivery not found", body = ApiError)
    ),
    tag = "deliveries"
)]
pub async fn update_delivery(
    State(state): State<AppState>,
    id: Result<Path<EntityId>, PathRejection>,
    patch: Result<Json<DeliveryPatch>, JsonRejection>,
) -> Result<Json<Delivery>, ApiError> {
    let Path(id) = id?;
    let Json(patch) = patch?;

    DeliveryRepository::new(&state.store)
        .update_delivery(id, patch)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("Delivery", id))
}

/// Delete a delivery
#[utoipa::path(
    delete,
    path = "/api/deliveries/{id}",
    params(("id" = i32, Path, description = "Delivery id")),
    responses(
        (status = 204, description = "Delivery deleted"),
        (status = 404, description = "Delivery not found", body = ApiError)
    ),
    tag = "deliveries"
)]
pub async fn delete_delivery(
    State(state): State<AppState>,
    id: Result<Path<EntityId>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;

    if DeliveryRepository::new(&state.store).delete_delivery(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Delivery", id))
    }
}
