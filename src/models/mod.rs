//! # Data Models
//!
//! Entity records stored by the tracker, their creation payloads, and the
//! partial-update (patch) payloads accepted by the API.
//!
//! Patch fields use `Option<Option<T>>`: an omitted field is `None` and leaves
//! the stored value untouched, an explicit JSON `null` is `Some(None)` and
//! clears it, and a value is `Some(Some(v))`.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::error::RepositoryError;

pub mod delivery;
pub mod document;
pub mod processing_stats;
pub mod supplier;
pub mod whatsapp_message;

pub use delivery::{Delivery, DeliveryPatch, DeliverySource, DeliveryStatus, NewDelivery};
pub use document::{Document, DocumentPatch, DocumentStatus, NewDocument};
pub use processing_stats::{ProcessingStats, ProcessingStatsPatch};
pub use supplier::{NewSupplier, Supplier, SupplierPatch};
pub use whatsapp_message::{NewWhatsappMessage, WhatsappMessage, WhatsappMessagePatch};

/// Identifier type shared by every collection.
pub type EntityId = i32;

/// Schema-less structured payload produced by automated extraction.
pub type ExtractedData = serde_json::Map<String, serde_json::Value>;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "delivery-tracker".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Lifecycle of automated extraction on a delivery or message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ProcessingStatus {
    Processing,
    Completed,
    Review,
    Error,
}

/// Deserializes a present field (including `null`) as `Some(..)`.
///
/// Combined with `#[serde(default)]` this distinguishes an omitted field from an
/// explicit `null`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Applies a patch value to an optional field.
pub(crate) fn apply<T>(target: &mut Option<T>, patch: Option<Option<T>>) {
    if let Some(value) = patch {
        *target = value;
    }
}

/// Applies a patch value to a field with a default; `null` restores the default.
pub(crate) fn apply_or_else<T>(
    target: &mut T,
    patch: Option<Option<T>>,
    default: impl FnOnce() -> T,
) {
    if let Some(value) = patch {
        *target = value.unwrap_or_else(default);
    }
}

/// Applies a patch value to a required field; `null` is rejected.
pub(crate) fn apply_required<T>(
    field: &str,
    target: &mut T,
    patch: Option<Option<T>>,
) -> Result<(), RepositoryError> {
    match patch {
        None => Ok(()),
        Some(None) => Err(RepositoryError::validation_error(field, "cannot be null")),
        Some(Some(value)) => {
            *target = value;
            Ok(())
        }
    }
}

/// Rejects empty or whitespace-only text.
pub(crate) fn require_text(field: &str, value: &str) -> Result<(), RepositoryError> {
    if value.trim().is_empty() {
        return Err(RepositoryError::validation_error(field, "is required"));
    }
    Ok(())
}

/// Rejects values outside `[0, max]`.
pub(crate) fn check_range(
    field: &str,
    value: Option<Decimal>,
    max: Decimal,
) -> Result<(), RepositoryError> {
    match value {
        Some(v) if v < Decimal::ZERO || v > max => Err(RepositoryError::validation_error(
            field,
            format!("must be between 0 and {}", max),
        )),
        _ => Ok(()),
    }
}

/// Rejects negative values.
pub(crate) fn check_non_negative(
    field: &str,
    value: Option<Decimal>,
) -> Result<(), RepositoryError> {
    match value {
        Some(v) if v.is_sign_negative() && !v.is_zero() => Err(
            RepositoryError::validation_error(field, "must not be negative"),
        ),
        _ => Ok(()),
    }
}

pub(crate) const PERCENT_MAX: Decimal = Decimal::ONE_HUNDRED;
pub(crate) const RATING_MAX: Decimal = Decimal::from_parts(5, 0, 0, false, 0);
