//! # WhatsApp Message Repository

use chrono::Utc;

use crate::db::MemoryStore;
use crate::error::RepositoryError;
use crate::models::{EntityId, NewWhatsappMessage, WhatsappMessage, WhatsappMessagePatch};

/// Repository for incoming message records
pub struct WhatsappMessageRepository<'a> {
    db: &'a MemoryStore,
}

impl<'a> WhatsappMessageRepository<'a> {
    pub fn new(db: &'a MemoryStore) -> Self {
        Self { db }
    }

    pub async fn list_whatsapp_messages(&self) -> Vec<WhatsappMessage> {
        self.db
            .read()
            .await
            .whatsapp_messages
            .values()
            .cloned()
            .collect()
    }

    pub async fn get_whatsapp_message(&self, id: EntityId) -> Option<WhatsappMessage> {
        self.db.read().await.whatsapp_messages.get(id).cloned()
    }

    pub async fn create_whatsapp_message(
        &self,
        payload: NewWhatsappMessage,
    ) -> Result<WhatsappMessage, RepositoryError> {
        payload.validate()?;

        let now = Utc::now();
        let message = self
            .db
            .write()
            .await
            .whatsapp_messages
            .insert_with(|id| payload.into_message(id, now))?;

        tracing::info!(
            message_id = message.id,
            sender_id = %message.sender_id,
            "Received message"
        );
        Ok(message)
    }

    /// Merge `patch` into a message; `Ok(None)` when the id is unknown
    pub async fn update_whatsapp_message(
        &self,
        id: EntityId,
        patch: WhatsappMessagePatch,
    ) -> Result<Option<WhatsappMessage>, RepositoryError> {
        let mut tables = self.db.write().await;
        let Some(message) = tables.whatsapp_messages.get_mut(id) else {
            return Ok(None);
        };

        message.apply_patch(patch, Utc::now())?;
        Ok(Some(message.clone()))
    }
}
