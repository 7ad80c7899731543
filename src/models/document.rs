//! Document entity model
//!
//! An uploaded file (invoice, receipt, contract, delivery note, ...) and the
//! result of the simulated extraction run over it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{
    EntityId, ExtractedData, PERCENT_MAX, apply, apply_required, check_range,
    nullable, require_text,
};
use crate::error::RepositoryError;

pub const DEFAULT_DOCUMENT_TYPE: &str = "invoice";

/// Extraction lifecycle of a document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    #[default]
    Processing,
    Completed,
    Error,
}

/// Stored document record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: EntityId,
    #[schema(example = "invoice-1042.pdf")]
    pub file_name: String,
    #[schema(example = "application/pdf")]
    pub file_type: String,
    pub file_size: Option<i64>,
    pub file_path: Option<String>,
    /// Free-form classifier such as `invoice`, `receipt`, `contract`, `delivery-note`
    #[schema(example = "invoice")]
    pub document_type: String,
    pub processing_status: DocumentStatus,
    pub extracted_text: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub extracted_data: Option<ExtractedData>,
    /// Extraction confidence between 0 and 100
    #[schema(value_type = Option<String>)]
    pub confidence: Option<Decimal>,
    /// Weak reference to a delivery
    pub delivery_id: Option<EntityId>,
    pub uploaded_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

/// Payload for creating a document record
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewDocument {
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub file_type: String,
    pub file_size: Option<i64>,
    pub file_path: Option<String>,
    #[serde(default)]
    pub document_type: String,
    pub processing_status: Option<DocumentStatus>,
    pub extracted_text: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub extracted_data: Option<ExtractedData>,
    #[schema(value_type = Option<String>)]
    pub confidence: Option<Decimal>,
    pub delivery_id: Option<EntityId>,
}

impl NewDocument {
    pub fn validate(&self) -> Result<(), RepositoryError> {
        require_text("fileName", &self.file_name)?;
        require_text("fileType", &self.file_type)?;
        require_text("documentType", &self.document_type)?;
        check_file_size(self.file_size)?;
        check_range("confidence", self.confidence, PERCENT_MAX)
    }

    /// Builds the stored record. `processed_at` always starts unset.
    pub fn into_document(self, id: EntityId, now: DateTime<Utc>) -> Document {
        Document {
            id,
            file_name: self.file_name,
            file_type: self.file_type,
            file_size: self.file_size,
            file_path: self.file_path,
            document_type: self.document_type,
            processing_status: self.processing_status.unwrap_or_default(),
            extracted_text: self.extracted_text,
            extracted_data: self.extracted_data,
            confidence: self.confidence,
            delivery_id: self.delivery_id,
            uploaded_at: now,
            processed_at: None,
        }
    }
}

/// Partial update for a document
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPatch {
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub file_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub file_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<i64>)]
    pub file_size: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub file_path: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub document_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<DocumentStatus>)]
    pub processing_status: Option<Option<DocumentStatus>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub extracted_text: Option<Option<String>>,
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

impl DocumentPatch {
    /// Patch recording a failed extraction.
    pub fn failed() -> Self {
        Self {
            processing_status: Some(Some(DocumentStatus::Error)),
            ..Default::default()
        }
    }
}

impl Document {
    /// Merges `patch` into this record.
    ///
    /// `processed_at` is stamped with `now` when the patch moves the document
    /// into `completed` and it has not been stamped before; otherwise it is
    /// left as is.
    pub fn apply_patch(
        &mut self,
        patch: DocumentPatch,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut next = self.clone();
        let completes = matches!(patch.processing_status, Some(Some(DocumentStatus::Completed)));

        apply_required("fileName", &mut next.file_name, patch.file_name)?;
        apply_required("fileType", &mut next.file_type, patch.file_type)?;
        apply(&mut next.file_size, patch.file_size);
        apply(&mut next.file_path, patch.file_path);
        apply_required("documentType", &mut next.document_type, patch.document_type)?;
        apply_required(
            "processingStatus",
            &mut next.processing_status,
            patch.processing_status,
        )?;
        apply(&mut next.extracted_text, patch.extracted_text);
        apply(&mut next.extracted_data, patch.extracted_data);
        apply(&mut next.confidence, patch.confidence);
        apply(&mut next.delivery_id, patch.delivery_id);

        require_text("fileName", &next.file_name)?;
        require_text("fileType", &next.file_type)?;
        require_text("documentType", &next.document_type)?;
        check_file_size(next.file_size)?;
        check_range("confidence", next.confidence, PERCENT_MAX)?;

        if completes
            && (self.processing_status != DocumentStatus::Completed || next.processed_at.is_none())
        {
            next.processed_at = Some(now.max(next.uploaded_at));
        }

        *self = next;
        Ok(())
    }
}

fn check_file_size(file_size: Option<i64>) -> Result<(), RepositoryError> {
    match file_size {
        Some(size) if size < 0 => Err(RepositoryError::validation_error(
            "fileSize",
            "must not be negative",
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn uploaded() -> Document {
        NewDocument {
            file_name: "receipt.png".to_string(),
            file_type: "image/png".to_string(),
            document_type: "receipt".to_string(),
            ..Default::default()
        }
        .into_document(1, Utc::now())
    }

    #[test]
    fn created_in_processing_without_processed_at() {
        let document = uploaded();

        assert_eq!(document.processing_status, DocumentStatus::Processing);
        assert!(document.processed_at.is_none());
    }

    #[test]
    fn processed_at_only_set_on_completion() {
        let mut document = uploaded();

        document
            .apply_patch(DocumentPatch::failed(), Utc::now())
            .unwrap();
        assert_eq!(document.processing_status, DocumentStatus::Error);
        assert!(document.processed_at.is_none());

        let completed_at = Utc::now() + Duration::seconds(1);
        let patch = DocumentPatch {
            processing_status: Some(Some(DocumentStatus::Completed)),
            ..Default::default()
        };
        document.apply_patch(patch, completed_at).unwrap();
        assert_eq!(document.processed_at, Some(completed_at));
        assert!(document.processed_at.unwrap() >= document.uploaded_at);

        // Re-sending completed keeps the first stamp.
        let patch = DocumentPatch {
            processing_status: Some(Some(DocumentStatus::Completed)),
            ..Default::default()
        };
        document
            .apply_patch(patch, completed_at + Duration::seconds(5))
            .unwrap();
        assert_eq!(document.processed_at, Some(completed_at));
    }

    #[test]
    fn null_processing_status_rejected() {
        let mut document = uploaded();
        let before = document.clone();

        let err = document
            .apply_patch(
                DocumentPatch {
                    processing_status: Some(None),
                    ..Default::default()
                },
                Utc::now(),
            )
            .unwrap_err();

        assert_eq!(err.field(), Some("processingStatus"));
        assert_eq!(document, before);
    }

    #[test]
    fn review_is_not_a_document_status() {
        assert!(serde_json::from_str::<DocumentStatus>("\"review\"").is_err());
    }

    #[test]
    fn negative_file_size_rejected() {
        let payload = NewDocument {
            file_name: "a.pdf".to_string(),
            file_type: "application/pdf".to_string(),
            document_type: "invoice".to_string(),
            file_size: Some(-1),
            ..Default::default()
        };

        assert_eq!(payload.validate().unwrap_err().field(), Some("fileSize"));
    }
}
