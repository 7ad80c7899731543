//! WhatsApp message entity model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{
    EntityId, ExtractedData, PERCENT_MAX, ProcessingStatus, apply, apply_required, check_range,
    nullable, require_text,
};
use crate::error::RepositoryError;

/// Stored message record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WhatsappMessage {
    pub id: EntityId,
    #[schema(example = "u1")]
    pub sender_id: String,
    #[schema(example = "ABC")]
    pub sender_name: String,
    #[schema(example = "delivered 200 bags of rice")]
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub processing_status: ProcessingStatus,
    #[schema(value_type = Option<Object>)]
    pub extracted_data: Option<ExtractedData>,
    /// Extraction confidence between 0 and 100
    #[schema(value_type = Option<String>)]
    pub confidence: Option<Decimal>,
    /// Weak reference to a delivery
    pub delivery_id: Option<EntityId>,
    pub processed_at: Option<DateTime<Utc>>,
}

/// Payload for creating a message
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewWhatsappMessage {
    #[serde(default)]
    pub sender_id: String,
    #[serde(default)]
    pub sender_name: String,
    #[serde(default)]
    pub message: String,
    pub processing_status: Option<ProcessingStatus>,
    #[schema(value_type = Option<Object>)]
    pub extracted_data: Option<ExtractedData>,
    #[schema(value_type = Option<String>)]
    pub confidence: Option<Decimal>,
    pub delivery_id: Option<EntityId>,
}

impl NewWhatsappMessage {
    pub fn validate(&self) -> Result<(), RepositoryError> {
        require_text("senderId", &self.sender_id)?;
        require_text("senderName", &self.sender_name)?;
        require_text("message", &self.message)?;
        check_range("confidence", self.confidence, PERCENT_MAX)
    }

    /// Builds the stored record; the message timestamp is the creation time.
    pub fn into_message(self, id: EntityId, now: DateTime<Utc>) -> WhatsappMessage {
        WhatsappMessage {
            id,
            sender_id: self.sender_id,
            sender_name: self.sender_name,
            message: self.message,
            timestamp: now,
            processing_status: self
                .processing_status
                .unwrap_or(ProcessingStatus::Processing),
            extracted_data: self.extracted_data,
            confidence: self.confidence,
            delivery_id: self.delivery_id,
            processed_at: None,
        }
    }
}

/// Partial update for a message
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WhatsappMessagePatch {
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub sender_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub sender_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub message: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<ProcessingStatus>)]
    pub processing_status: Option<Option<ProcessingStatus>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub extracted_data: Option<Option<ExtractedData>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub confidence: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<i32>)]
    pub delivery_id: Option<Option<EntityId>>,
}

impl WhatsappMessagePatch {
    /// Patch recording a failed extraction.
    pub fn failed() -> Self {
        Self {
            processing_status: Some(Some(ProcessingStatus::Error)),
            ..Default::default()
        }
    }
}

impl WhatsappMessage {
    /// Merges `patch` into this record, stamping `processed_at` on the first
    /// transition to `completed`.
    pub fn apply_patch(
        &mut self,
        patch: WhatsappMessagePatch,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut next = self.clone();
        let completes = matches!(
            patch.processing_status,
            Some(Some(ProcessingStatus::Completed))
        );

        apply_required("senderId", &mut next.sender_id, patch.sender_id)?;
        apply_required("senderName", &mut next.sender_name, patch.sender_name)?;
        apply_required("message", &mut next.message, patch.message)?;
        apply_required(
            "processingStatus",
            &mut next.processing_status,
            patch.processing_status,
        )?;
        apply(&mut next.extracted_data, patch.extracted_data);
        apply(&mut next.confidence, patch.confidence);
        apply(&mut next.delivery_id, patch.delivery_id);

        require_text("senderId", &next.sender_id)?;
        require_text("senderName", &next.sender_name)?;
        require_text("message", &next.message)?;
        check_range("confidence", next.confidence, PERCENT_MAX)?;

        if completes
            && (self.processing_status != ProcessingStatus::Completed
                || next.processed_at.is_none())
        {
            next.processed_at = Some(now.max(next.timestamp));
        }

        *self = next;
        Ok(())
    }
}
