//! # Supplier API Handlers

use axum::{
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::Json,
};

use crate::error::{ApiError, not_found};
use crate::models::{EntityId, NewSupplier, Supplier, SupplierPatch};
use crate::repositories::SupplierRepository;
use crate::server::AppState;

/// List all suppliers
#[utoipa::path(
    get,
    path = "/api/suppliers",
    responses(
        (status = 200, description = "Suppliers in insertion order", body = [Supplier])
    ),
    tag = "suppliers"
)]
pub async fn list_suppliers(State(state): State<AppState>) -> Json<Vec<Supplier>> {
    Json(SupplierRepository::new(&state.store).list_suppliers().await)
}

/// Get a supplier by id
#[utoipa::path(
    get,
    path = "/api/suppliers/{id}",
    params(("id" = i32, Path, description = "Supplier id")),
    responses(
        (status = 200, description = "Supplier found", body = Supplier),
        (status = 404, description = "Supplier not found", body = ApiError)
    ),
    tag = "suppliers"
)]
pub async fn get_supplier(
    State(state): State<AppState>,
    id: Result<Path<EntityId>, PathRejection>,
) -> Result<Json<Supplier>, ApiError> {
    let Path(id) = id?;

    SupplierRepository::new(&state.store)
        .get_supplier(id)
        .await
        .map(Json)
        .ok_or_else(|| not_found("Supplier", id))
}

/// Create a supplier
#[utoipa::path(
    post,
    path = "/api/suppliers",
    request_body = NewSupplier,
    responses(
        (status = 201, description = "Supplier created", body = Supplier),
        (status = 400, description = "Validation failed", body = ApiError)
    ),
    tag = "suppliers"
)]
pub async fn create_supplier(
    State(state): State<AppState>,
    payload: Result<Json<NewSupplier>, JsonRejection>,
) -> Result<(StatusCode, Json<Supplier>), ApiError> {
    let Json(payload) = payload?;

    let supplier = SupplierRepository::new(&state.store)
        .create_supplier(payload)
        .await?;

    Ok((StatusCode::CREATED, Json(supplier)))
}

/// Update a supplier
///
/// Omitted fields are left untouched; `null` clears optional fields.
#[utoipa::path(
    put,
    path = "/api/suppliers/{id}",
    params(("id" = i32, Path, description = "Supplier id")),
    request_body = SupplierPatch,
    responses(
        (status = 200, description = "Supplier updated", body = Supplier),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Supplier not found", body = ApiError)
    ),
    tag = "suppliers"
)]
pub async fn update_supplier(
    State(state): State<AppState>,
    id: Result<Path<EntityId>, PathRejection>,
    patch: Result<Json<SupplierPatch>, JsonRejection>,
) -> Result<Json<Supplier>, ApiError> {
    let Path(id) = id?;
    let Json(patch) = patch?;

    SupplierRepository::new(&state.store)
        .update_supplier(id, patch)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("Supplier", id))
}

/// Delete a supplier
///
/// Deliveries that referenced the supplier keep their `supplierName` but lose
/// their `supplierId`.
#[utoipa::path(
    delete,
    path = "/api/suppliers/{id}",
    params(("id" = i32, Path, description = "Supplier id")),
    responses(
        (status = 204, description = "Supplier deleted"),
        (status = 404, description = "Supplier not found", body = ApiError)
    ),
    tag = "suppliers"
)]
pub async fn delete_supplier(
    State(state): State<AppState>,
    id: Result<Path<EntityId>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;

    if SupplierRepository::new(&state.store).delete_supplier(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Supplier", id))
    }
}
