//! Processing statistics singleton

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{PERCENT_MAX, apply_or_else, check_non_negative, check_range, nullable};
use crate::error::RepositoryError;

/// Aggregate dashboard counters.
///
/// Counters are caller-supplied; nothing in the service recomputes them from
/// the entity collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingStats {
    #[schema(example = 1247)]
    pub messages_processed: i64,
    #[schema(example = 342)]
    pub documents_processed: i64,
    #[schema(value_type = String, example = "87.30")]
    pub on_time_delivery_rate: Decimal,
    pub active_suppliers: i64,
    #[schema(value_type = String, example = "3.50")]
    pub time_saved_hours: Decimal,
    pub last_updated: DateTime<Utc>,
}

impl ProcessingStats {
    /// All-zero row used when an update arrives before any stats exist.
    pub fn zeroed(now: DateTime<Utc>) -> Self {
        Self {
            messages_processed: 0,
            documents_processed: 0,
            on_time_delivery_rate: Decimal::ZERO,
            active_suppliers: 0,
            time_saved_hours: Decimal::ZERO,
            last_updated: now,
        }
    }

    /// Merges `patch` into the row and refreshes `last_updated`.
    pub fn apply_patch(
        &mut self,
        patch: ProcessingStatsPatch,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut next = self.clone();

        apply_or_else(&mut next.messages_processed, patch.messages_processed, || 0);
        apply_or_else(
            &mut next.documents_processed,
            patch.documents_processed,
            || 0,
        );
        apply_or_else(
            &mut next.on_time_delivery_rate,
            patch.on_time_delivery_rate,
            Decimal::default,
        );
        apply_or_else(&mut next.active_suppliers, patch.active_suppliers, || 0);
        apply_or_else(
            &mut next.time_saved_hours,
            patch.time_saved_hours,
            Decimal::default,
        );

        check_count("messagesProcessed", next.messages_processed)?;
        check_count("documentsProcessed", next.documents_processed)?;
        check_count("activeSuppliers", next.active_suppliers)?;
        check_range(
            "onTimeDeliveryRate",
            Some(next.on_time_delivery_rate),
            PERCENT_MAX,
        )?;
        check_non_negative("timeSavedHours", Some(next.time_saved_hours))?;

        next.last_updated = now;
        *self = next;
        Ok(())
    }
}

/// Partial update for the stats row
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingStatsPatch {
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<i64>)]
    pub messages_processed: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<i64>)]
    pub documents_processed: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub on_time_delivery_rate: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<i64>)]
    pub active_suppliers: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub time_saved_hours: Option<Option<Decimal>>,
}

fn check_count(field: &str, value: i64) -> Result<(), RepositoryError> {
    if value < 0 {
        return Err(RepositoryError::validation_error(
            field,
            "must not be negative",
        ));
    }
    Ok(())
}
