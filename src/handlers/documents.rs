//! # Document API Handlers
//!
//! Includes the multipart upload intake, which stores the file under the
//! configured upload directory and queues simulated OCR for the new record.

use std::path::Path as FsPath;

use axum::{
    extract::{
        Multipart, Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::Json,
};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, not_found, validation_error};
use crate::models::document::DEFAULT_DOCUMENT_TYPE;
use crate::models::{Document, DocumentPatch, DocumentStatus, EntityId, NewDocument};
use crate::processing::ProcessingJob;
use crate::repositories::DocumentRepository;
use crate::server::AppState;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Multipart form accepted by the upload endpoint (documentation only)
#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
#[allow(dead_code)]
pub struct DocumentUploadForm {
    /// The file to store
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
    /// Document classifier, defaults to `invoice`
    #[schema(example = "invoice")]
    document_type: Option<String>,
    /// Delivery the document belongs to
    delivery_id: Option<i32>,
}

/// List all documents
#[utoipa::path(
    get,
    path = "/api/documents",
    responses(
        (status = 200, description = "Documents in insertion order", body = [Document])
    ),
    tag = "documents"
)]
pub async fn list_documents(State(state): State<AppState>) -> Json<Vec<Document>> {
    Json(DocumentRepository::new(&state.store).list_documents().await)
}

/// Get a document by id
#[utoipa::path(
    get,
    path = "/api/documents/{id}",
    params(("id" = i32, Path, description = "Document id")),
    responses(
        (status = 200, description = "Document found", body = Document),
        (status = 404, description = "Document not found", body = ApiError)
    ),
    tag = "documents"
)]
pub async fn get_document(
    State(state): State<AppState>,
    id: Result<Path<EntityId>, PathRejection>,
) -> Result<Json<Document>, ApiError> {
    let Path(id) = id?;

    DocumentRepository::new(&state.store)
        .get_document(id)
        .await
        .map(Json)
        .ok_or_else(|| not_found("Document", id))
}

/// Create a document record from JSON metadata
///
/// Records created in `processing` state are queued for extraction.
#[utoipa::path(
    post,
    path = "/api/documents",
    request_body = NewDocument,
    responses(
        (status = 201, description = "Document created", body = Document),
        (status = 400, description = "Validation failed", body = ApiError)
    ),
    tag = "documents"
)]
pub async fn create_document(
    State(state): State<AppState>,
    payload: Result<Json<NewDocument>, JsonRejection>,
) -> Result<(StatusCode, Json<Document>), ApiError> {
    let Json(payload) = payload?;

    let document = DocumentRepository::new(&state.store)
        .create_document(payload)
        .await?;

    if document.processing_status == DocumentStatus::Processing {
        state
            .processing
            .submit(ProcessingJob::Document { id: document.id })
            .await;
    }

    Ok((StatusCode::CREATED, Json(document)))
}

/// Update a document
///
/// Setting `processingStatus` to `completed` stamps `processedAt` the first time.
#[utoipa::path(
    put,
    path = "/api/documents/{id}",
    params(("id" = i32, Path, description = "Document id")),
    request_body = DocumentPatch,
    responses(
        (status = 200, description = "Document updated", body = Document),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Document not found", body = ApiError)
    ),
    tag = "documents"
)]
pub async fn update_document(
    State(state): State<AppState>,
    id: Result<Path<EntityId>, PathRejection>,
    patch: Result<Json<DocumentPatch>, JsonRejection>,
) -> Result<Json<Document>, ApiError> {
    let Path(id) = id?;
    let Json(patch) = patch?;

    DocumentRepository::new(&state.store)
        .update_document(id, patch)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("Document", id))
}

/// Upload a document file
///
/// Returns the new record immediately in `processing` state; extraction
/// results appear on the record once the background job finishes.
#[utoipa::path(
    post,
    path = "/api/documents/upload",
    request_body(content = DocumentUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Document stored and queued for processing", body = Document),
        (status = 400, description = "Missing file or invalid form field", body = ApiError),
        (status = 413, description = "Upload exceeds the configured size limit", body = ApiError),
        (status = 500, description = "File could not be stored", body = ApiError)
    ),
    tag = "documents"
)]
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Document>), ApiError> {
    let mut upload: Option<UploadedFile> = None;
    let mut document_type: Option<String> = None;
    let mut delivery_id: Option<EntityId> = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("file") => {
                let original_name = non_blank(field.file_name());
                let content_type = non_blank(field.content_type());
                let bytes = field.bytes().await?;
                upload = Some(UploadedFile {
                    original_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            Some("documentType") => {
                let value = field.text().await?;
                if !value.trim().is_empty() {
                    document_type = Some(value.trim().to_string());
                }
            }
            Some("deliveryId") => {
                let value = field.text().await?;
                delivery_id = parse_delivery_id(&value)?;
            }
            _ => {}
        }
    }

    let Some(upload) = upload else {
        return Err(validation_error(
            "No file uploaded",
            json!({ "field": "file", "message": "is required" }),
        ));
    };

    let stored_name = stored_file_name(upload.original_name.as_deref());
    let stored_path = state.config.upload_dir.join(&stored_name);

    let payload = NewDocument {
        file_name: upload.original_name.unwrap_or(stored_name),
        file_type: upload
            .content_type
            .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string()),
        file_size: Some(upload.bytes.len() as i64),
        file_path: Some(stored_path.to_string_lossy().into_owned()),
        document_type: document_type.unwrap_or_else(|| DEFAULT_DOCUMENT_TYPE.to_string()),
        processing_status: Some(DocumentStatus::Processing),
        delivery_id,
        ..Default::default()
    };
    payload.validate()?;

    tokio::fs::create_dir_all(&state.config.upload_dir).await?;
    tokio::fs::write(&stored_path, &upload.bytes).await?;

    let document = match DocumentRepository::new(&state.store)
        .create_document(payload)
        .await
    {
        Ok(document) => document,
        Err(err) => {
            if let Err(io_err) = tokio::fs::remove_file(&stored_path).await {
                tracing::warn!(
                    path = %stored_path.display(),
                    error = %io_err,
                    "Failed to remove rejected upload"
                );
            }
            return Err(err.into());
        }
    };
    state
        .processing
        .submit(ProcessingJob::Document { id: document.id })
        .await;

    Ok((StatusCode::CREATED, Json(document)))
}

struct UploadedFile {
    original_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn parse_delivery_id(value: &str) -> Result<Option<EntityId>, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }

    value.parse::<EntityId>().map(Some).map_err(|_| {
        validation_error(
            "Invalid value for field 'deliveryId'",
            json!({ "field": "deliveryId", "message": "must be an integer" }),
        )
    })
}

/// Random on-disk name, keeping the original extension when there is one.
fn stored_file_name(original_name: Option<&str>) -> String {
    let extension = original_name
        .and_then(|name| FsPath::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    match extension {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
        None => Uuid::new_v4().to_string(),
    }
}
