//! Supplier entity model
//!
//! A supplier delivering materials. The performance scores are informational:
//! they are supplied by callers and never derived from delivery history.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{
    EntityId, PERCENT_MAX, RATING_MAX, apply, apply_or_else, apply_required, check_range, nullable,
    require_text,
};
use crate::error::RepositoryError;

/// Stored supplier record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: EntityId,
    #[schema(example = "ABC Trading Co.")]
    pub name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Rating between 0 and 5
    #[schema(value_type = String, example = "4.5")]
    pub rating: Decimal,
    /// Percentage between 0 and 100
    #[schema(value_type = String, example = "87.30")]
    pub on_time_delivery_rate: Decimal,
    #[schema(value_type = String)]
    pub communication_quality: Decimal,
    #[schema(value_type = String)]
    pub document_accuracy: Decimal,
    #[schema(value_type = String)]
    pub cost_competitiveness: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a supplier
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewSupplier {
    /// Display name (required)
    #[serde(default)]
    pub name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[schema(value_type = Option<String>)]
    pub rating: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub on_time_delivery_rate: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub communication_quality: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub document_accuracy: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub cost_competitiveness: Option<Decimal>,
    pub is_active: Option<bool>,
}

impl NewSupplier {
    pub fn validate(&self) -> Result<(), RepositoryError> {
        require_text("name", &self.name)?;
        check_scores(
            self.rating,
            self.on_time_delivery_rate,
            self.communication_quality,
            self.document_accuracy,
            self.cost_competitiveness,
        )
    }

    /// Builds the stored record, filling defaults for omitted fields.
    pub fn into_supplier(self, id: EntityId, now: DateTime<Utc>) -> Supplier {
        Supplier {
            id,
            name: self.name,
            contact_person: self.contact_person,
            email: self.email,
            phone: self.phone,
            address: self.address,
            rating: self.rating.unwrap_or_default(),
            on_time_delivery_rate: self.on_time_delivery_rate.unwrap_or_default(),
            communication_quality: self.communication_quality.unwrap_or_default(),
            document_accuracy: self.document_accuracy.unwrap_or_default(),
            cost_competitiveness: self.cost_competitiveness.unwrap_or_default(),
            is_active: self.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for a supplier
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplierPatch {
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub contact_person: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub rating: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub on_time_delivery_rate: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub communication_quality: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub document_accuracy: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub cost_competitiveness: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<bool>)]
    pub is_active: Option<Option<bool>>,
}

impl Supplier {
    /// Merges `patch` into this record and refreshes `updated_at`.
    ///
    /// The record is left untouched when validation fails.
    pub fn apply_patch(
        &mut self,
        patch: SupplierPatch,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut next = self.clone();

        apply_required("name", &mut next.name, patch.name)?;
        require_text("name", &next.name)?;
        apply(&mut next.contact_person, patch.contact_person);
        apply(&mut next.email, patch.email);
        apply(&mut next.phone, patch.phone);
        apply(&mut next.address, patch.address);
        apply_or_else(&mut next.rating, patch.rating, Decimal::default);
        apply_or_else(
            &mut next.on_time_delivery_rate,
            patch.on_time_delivery_rate,
            Decimal::default,
        );
        apply_or_else(
            &mut next.communication_quality,
            patch.communication_quality,
            Decimal::default,
        );
        apply_or_else(
            &mut next.document_accuracy,
            patch.document_accuracy,
            Decimal::default,
        );
        apply_or_else(
            &mut next.cost_competitiveness,
            patch.cost_competitiveness,
            Decimal::default,
        );
        apply_or_else(&mut next.is_active, patch.is_active, || true);

        check_scores(
            Some(next.rating),
            Some(next.on_time_delivery_rate),
            Some(next.communication_quality),
            Some(next.document_accuracy),
            Some(next.cost_competitiveness),
        )?;

        next.updated_at = now;
        *self = next;
        Ok(())
    }
}

fn check_scores(
    rating: Option<Decimal>,
    on_time_delivery_rate: Option<Decimal>,
    communication_quality: Option<Decimal>,
    document_accuracy: Option<Decimal>,
    cost_competitiveness: Option<Decimal>,
) -> Result<(), RepositoryError> {
    check_range("rating", rating, RATING_MAX)?;
    check_range("onTimeDeliveryRate", on_time_delivery_rate, PERCENT_MAX)?;
    check_range("communicationQuality", communication_quality, PERCENT_MAX)?;
    check_range("documentAccuracy", document_accuracy, PERCENT_MAX)?;
    check_range("costCompetitiveness", cost_competitiveness, PERCENT_MAX)
}
