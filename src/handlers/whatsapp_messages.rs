//! # WhatsApp Message API Handlers
//!
//! Messages arrive through the direct create endpoint or the webhook. Both
//! store the message in `processing` state and queue it for parsing.

use axum::{
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::error::{ApiError, not_found, validation_error};
use crate::models::{
    EntityId, NewWhatsappMessage, ProcessingStatus, WhatsappMessage, WhatsappMessagePatch,
};
use crate::processing::ProcessingJob;
use crate::repositories::WhatsappMessageRepository;
use crate::server::AppState;

/// Sender block of a webhook delivery
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct WebhookSender {
    #[serde(default)]
    #[schema(example = "919876543210")]
    pub id: String,
    #[serde(default)]
    #[schema(example = "ABC Trading Co.")]
    pub name: String,
}

/// Message block of a webhook delivery
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct WebhookMessage {
    #[serde(default)]
    #[schema(example = "Delivered 500 tons of raw steel to Mumbai factory today at 3pm")]
    pub text: String,
}

/// Inbound webhook body
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct WhatsappWebhookPayload {
    pub sender: Option<WebhookSender>,
    pub message: Option<WebhookMessage>,
}

/// Webhook acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAck {
    pub success: bool,
    pub message_id: EntityId,
}

/// List all messages
#[utoipa::path(
    get,
    path = "/api/whatsapp-messages",
    responses(
        (status = 200, description = "Messages in insertion order", body = [WhatsappMessage])
    ),
    tag = "whatsapp-messages"
)]
pub async fn list_whatsapp_messages(State(state): State<AppState>) -> Json<Vec<WhatsappMessage>> {
    Json(
        WhatsappMessageRepository::new(&state.store)
            .list_whatsapp_messages()
            .await,
    )
}

/// Get a message by id
#[utoipa::path(
    get,
    path = "/api/whatsapp-messages/{id}",
    params(("id" = i32, Path, description = "Message id")),
    responses(
        (status = 200, description = "Message found", body = WhatsappMessage),
        (status = 404, description = "Message not found", body = ApiError)
    ),
    tag = "whatsapp-messages"
)]
pub async fn get_whatsapp_message(
    State(state): State<AppState>,
    id: Result<Path<EntityId>, PathRejection>,
) -> Result<Json<WhatsappMessage>, ApiError> {
    let Path(id) = id?;

    WhatsappMessageRepository::new(&state.store)
        .get_whatsapp_message(id)
        .await
        .map(Json)
        .ok_or_else(|| not_found("WhatsApp message", id))
}

/// Ingest a message
#[utoipa::path(
    post,
    path = "/api/whatsapp-messages",
    request_body = NewWhatsappMessage,
    responses(
        (status = 201, description = "Message stored and queued for processing", body = WhatsappMessage),
        (status = 400, description = "Validation failed", body = ApiError)
    ),
    tag = "whatsapp-messages"
)]
pub async fn create_whatsapp_message(
    State(state): State<AppState>,
    payload: Result<Json<NewWhatsappMessage>, JsonRejection>,
) -> Result<(StatusCode, Json<WhatsappMessage>), ApiError> {
    let Json(payload) = payload?;

    let message = ingest(&state, payload).await?;

    Ok((StatusCode::CREATED, Json(message)))
}

/// Update a message
#[utoipa::path(
    put,
    path = "/api/whatsapp-messages/{id}",
    params(("id" = i32, Path, description = "Message id")),
    request_body = WhatsappMessagePatch,
    responses(
        (status = 200, description = "Message updated", body = WhatsappMessage),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Message not found", body = ApiError)
    ),
    tag = "whatsapp-messages"
)]
pub async fn update_whatsapp_message(
    State(state): State<AppState>,
    id: Result<Path<EntityId>, PathRejection>,
    patch: Result<Json<WhatsappMessagePatch>, JsonRejection>,
) -> Result<Json<WhatsappMessage>, ApiError> {
    let Path(id) = id?;
    let Json(patch) = patch?;

    WhatsappMessageRepository::new(&state.store)
        .update_whatsapp_message(id, patch)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("WhatsApp message", id))
}

/// WhatsApp webhook intake
#[utoipa::path(
    post,
    path = "/api/webhook/whatsapp",
    request_body = WhatsappWebhookPayload,
    responses(
        (status = 200, description = "Message accepted", body = WebhookAck),
        (status = 400, description = "Invalid webhook data", body = ApiError)
    ),
    tag = "whatsapp-messages"
)]
pub async fn whatsapp_webhook(
    State(state): State<AppState>,
    payload: Result<Json<WhatsappWebhookPayload>, JsonRejection>,
) -> Result<Json<WebhookAck>, ApiError> {
    let Json(payload) = payload?;

    let (Some(sender), Some(message)) = (payload.sender, payload.message) else {
        return Err(validation_error(
            "Invalid webhook data",
            json!({ "message": "both 'sender' and 'message' are required" }),
        ));
    };

    let message = ingest(
        &state,
        NewWhatsappMessage {
            sender_id: sender.id,
            sender_name: sender.name,
            message: message.text,
            processing_status: Some(ProcessingStatus::Processing),
            ..Default::default()
        },
    )
    .await?;

    tracing::debug!(message_id = message.id, "Accepted webhook message");
    Ok(Json(WebhookAck {
        success: true,
        message_id: message.id,
    }))
}

/// Stores a message and queues it when it still needs processing.
async fn ingest(
    state: &AppState,
    payload: NewWhatsappMessage,
) -> Result<WhatsappMessage, ApiError> {
    let message = WhatsappMessageRepository::new(&state.store)
        .create_whatsapp_message(payload)
        .await?;

    if message.processing_status == ProcessingStatus::Processing {
        state
            .processing
            .submit(ProcessingJob::WhatsappMessage { id: message.id })
            .await;
    }

    Ok(message)
}
