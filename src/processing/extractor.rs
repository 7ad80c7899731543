//! Extraction backends
//!
//! The service ships only [`MockExtractor`], which returns fixed payloads
//! standing in for OCR and message parsing.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use thiserror::Error;

use crate::models::{Document, ExtractedData, WhatsappMessage};

/// Result of running extraction over a document or message.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Raw text recovered from the input, when the backend produces any
    pub text: Option<String>,
    pub data: ExtractedData,
    /// Confidence on a 0 to 100 scale
    pub confidence: Decimal,
}

#[derive(Debug, Clone, Error)]
pub enum ExtractionError {
    #[error("unsupported input: {0}")]
    Unsupported(String),
    #[error("extraction failed: {0}")]
    Failed(String),
}

/// Interface implemented by extraction backends.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract_document(&self, document: &Document) -> Result<Extraction, ExtractionError>;

    async fn extract_message(
        &self,
        message: &WhatsappMessage,
    ) -> Result<Extraction, ExtractionError>;
}

/// Deterministic stand-in extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockExtractor;

pub const MOCK_DOCUMENT_TEXT: &str = "Mock extracted text from OCR";

#[async_trait]
impl Extractor for MockExtractor {
    async fn extract_document(&self, _document: &Document) -> Result<Extraction, ExtractionError> {
        let data = object(json!({
            "supplier": "Mock Supplier",
            "amount": "50000.00",
            "date": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            "items": ["Raw materials", "Processing fee"],
        }));

        Ok(Extraction {
            text: Some(MOCK_DOCUMENT_TEXT.to_string()),
            data,
            confidence: Decimal::new(95, 0),
        })
    }

    async fn extract_message(
        &self,
        message: &WhatsappMessage,
    ) -> Result<Extraction, ExtractionError> {
        let data = object(json!({
            "supplier": message.sender_name,
            "material": "Auto-detected material",
            "quantity": "Auto-detected quantity",
            "status": "delivered",
            "confidence": 0.9,
        }));

        Ok(Extraction {
            text: None,
            data,
            confidence: Decimal::new(90, 0),
        })
    }
}

fn object(value: Value) -> ExtractedData {
    match value {
        Value::Object(map) => map,
        _ => ExtractedData::new(),
    }
}
