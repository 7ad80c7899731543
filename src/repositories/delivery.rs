//! # Delivery Repository

use chrono::Utc;

use crate::db::MemoryStore;
use crate::error::RepositoryError;
use crate::models::{Delivery, DeliveryPatch, EntityId, NewDelivery};

/// Repository for delivery records
pub struct DeliveryRepository<'a> {
    db: &'a MemoryStore,
}

impl<'a> DeliveryRepository<'a> {
    pub fn new(db: &'a MemoryStore) -> Self {
        Self { db }
    }

    pub async fn list_deliveries(&self) -> Vec<Delivery> {
        self.db.read().await.deliveries.values().cloned().collect()
    }

    pub async fn get_delivery(&self, id: EntityId) -> Option<Delivery> {
        self.db.read().await.deliveries.get(id).cloned()
    }

    pub async fn create_delivery(&self, payload: NewDelivery) -> Result<Delivery, RepositoryError> {
        payload.validate()?;

        let now = Utc::now();
        let delivery = self
            .db
            .write()
            .await
            .deliveries
            .insert_with(|id| payload.into_delivery(id, now))?;

        tracing::info!(
            delivery_id = delivery.id,
            supplier_id = ?delivery.supplier_id,
            source = ?delivery.source,
            "Created delivery"
        );
        Ok(delivery)
    }

    /// Merge `patch` into a delivery; `Ok(None)` when the id is unknown
    pub async fn update_delivery(
        &self,
        id: EntityId,
        patch: DeliveryPatch,
    ) -> Result<Option<Delivery>, RepositoryError> {
        let mut tables = self.db.write().await;
        let Some(delivery) = tables.deliveries.get_mut(id) else {
            return Ok(None);
        };

        delivery.apply_patch(patch, Utc::now())?;
        Ok(Some(delivery.clone()))
    }

    /// Delete a delivery and clear `deliveryId` on documents and messages
    /// pointing at it.
    pub async fn delete_delivery(&self, id: EntityId) -> bool {
        let mut tables = self.db.write().await;
        if tables.deliveries.remove(id).is_none() {
            return false;
        }

        for document in tables.documents.values_mut() {
            if document.delivery_id == Some(id) {
                document.delivery_id = None;
            }
        }
        for message in tables.whatsapp_messages.values_mut() {
            if message.delivery_id == Some(id) {
                message.delivery_id = None;
            }
        }

        tracing::info!(delivery_id = id, "Deleted delivery");
        true
    }
}
