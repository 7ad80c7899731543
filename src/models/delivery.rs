//! Delivery entity model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{
    EntityId, ExtractedData, ProcessingStatus, apply, apply_or_else, apply_required,
    check_non_negative, nullable, require_text,
};
use crate::error::RepositoryError;

pub const DEFAULT_CURRENCY: &str = "INR";

/// Shipment state of a delivery
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryStatus {
    #[default]
    Pending,
    InTransit,
    Delivered,
    Delayed,
    Cancelled,
}

/// Intake channel that produced a delivery
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DeliverySource {
    #[default]
    Manual,
    Whatsapp,
    Email,
    Pdf,
}

/// Stored delivery record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    pub id: EntityId,
    /// Weak reference to a supplier; may be absent or stale
    pub supplier_id: Option<EntityId>,
    /// Denormalized supplier name, kept even when `supplier_id` is cleared
    #[schema(example = "ABC Trading Co.")]
    pub supplier_name: String,
    #[schema(example = "Raw Steel")]
    pub material_type: String,
    /// Quantity as entered; unit consistency is the caller's concern
    #[schema(example = "500")]
    pub quantity: String,
    #[schema(example = "tons")]
    pub unit: String,
    pub expected_date: Option<DateTime<Utc>>,
    pub actual_date: Option<DateTime<Utc>>,
    pub status: DeliveryStatus,
    #[schema(value_type = Option<String>, example = "2500000.00")]
    pub invoice_amount: Option<Decimal>,
    pub currency: String,
    pub delivery_location: Option<String>,
    pub notes: Option<String>,
    pub source: DeliverySource,
    pub processing_status: ProcessingStatus,
    #[schema(value_type = Option<Object>)]
    pub extracted_data: Option<ExtractedData>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a delivery
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewDelivery {
    pub supplier_id: Option<EntityId>,
    #[serde(default)]
    pub supplier_name: String,
    #[serde(default)]
    pub material_type: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub unit: String,
    pub expected_date: Option<DateTime<Utc>>,
    pub actual_date: Option<DateTime<Utc>>,
    pub status: Option<DeliveryStatus>,
    #[schema(value_type = Option<String>)]
    pub invoice_amount: Option<Decimal>,
    pub currency: Option<String>,
    pub delivery_location: Option<String>,
    pub notes: Option<String>,
    pub source: Option<DeliverySource>,
    pub processing_status: Option<ProcessingStatus>,
    #[schema(value_type = Option<Object>)]
    pub extracted_data: Option<ExtractedData>,
}

impl NewDelivery {
    pub fn validate(&self) -> Result<(), RepositoryError> {
        require_text("supplierName", &self.supplier_name)?;
        require_text("materialType", &self.material_type)?;
        require_text("quantity", &self.quantity)?;
        require_text("unit", &self.unit)?;
        check_non_negative("invoiceAmount", self.invoice_amount)?;
        if let Some(currency) = &self.currency {
            require_text("currency", currency)?;
        }
        Ok(())
    }

    /// Builds the stored record, filling defaults for omitted fields.
    pub fn into_delivery(self, id: EntityId, now: DateTime<Utc>) -> Delivery {
        Delivery {
            id,
            supplier_id: self.supplier_id,
            supplier_name: self.supplier_name,
            material_type: self.material_type,
            quantity: self.quantity,
            unit: self.unit,
            expected_date: self.expected_date,
            actual_date: self.actual_date,
            status: self.status.unwrap_or_default(),
            invoice_amount: self.invoice_amount,
            currency: self
                .currency
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            delivery_location: self.delivery_location,
            notes: self.notes,
            source: self.source.unwrap_or_default(),
            processing_status: self
                .processing_status
                .unwrap_or(ProcessingStatus::Completed),
            extracted_data: self.extracted_data,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for a delivery
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryPatch {
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<i32>)]
    pub supplier_id: Option<Option<EntityId>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub supplier_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub material_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub quantity: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub unit: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub expected_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub actual_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<DeliveryStatus>)]
    pub status: Option<Option<DeliveryStatus>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub invoice_amount: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub currency: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub delivery_location: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<DeliverySource>)]
    pub source: Option<Option<DeliverySource>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<ProcessingStatus>)]
    pub processing_status: Option<Option<ProcessingStatus>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub extracted_data: Option<Option<ExtractedData>>,
}

impl Delivery {
    /// Merges `patch` into this record and refreshes `updated_at`.
    ///
    /// The record is left untouched when validation fails.
    pub fn apply_patch(
        &mut self,
        patch: DeliveryPatch,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut next = self.clone();

        apply(&mut next.supplier_id, patch.supplier_id);
        apply_required("supplierName", &mut next.supplier_name, patch.supplier_name)?;
        apply_required("materialType", &mut next.material_type, patch.material_type)?;
        apply_required("quantity", &mut next.quantity, patch.quantity)?;
        apply_required("unit", &mut next.unit, patch.unit)?;
        apply(&mut next.expected_date, patch.expected_date);
        apply(&mut next.actual_date, patch.actual_date);
        apply_or_else(&mut next.status, patch.status, DeliveryStatus::default);
        apply(&mut next.invoice_amount, patch.invoice_amount);
        apply_or_else(&mut next.currency, patch.currency, || {
            DEFAULT_CURRENCY.to_string()
        });
        apply(&mut next.delivery_location, patch.delivery_location);
        apply(&mut next.notes, patch.notes);
        apply_or_else(&mut next.source, patch.source, DeliverySource::default);
        apply_or_else(&mut next.processing_status, patch.processing_status, || {
            ProcessingStatus::Completed
        });
        apply(&mut next.extracted_data, patch.extracted_data);

        require_text("supplierName", &next.supplier_name)?;
        require_text("materialType", &next.material_type)?;
        require_text("quantity", &next.quantity)?;
        require_text("unit", &next.unit)?;
        require_text("currency", &next.currency)?;
        check_non_negative("invoiceAmount", next.invoice_amount)?;

        next.updated_at = now;
        *self = next;
        Ok(())
    }
}
