//! # Document Repository
//!
//! Documents have no delete operation; records are only created and updated.

use chrono::Utc;

use crate::db::MemoryStore;
use crate::error::RepositoryError;
use crate::models::{Document, DocumentPatch, EntityId, NewDocument};

/// Repository for document records
pub struct DocumentRepository<'a> {
    db: &'a MemoryStore,
}

impl<'a> DocumentRepository<'a> {
    pub fn new(db: &'a MemoryStore) -> Self {
        Self { db }
    }

    pub async fn list_documents(&self) -> Vec<Document> {
        self.db.read().await.documents.values().cloned().collect()
    }

    pub async fn get_document(&self, id: EntityId) -> Option<Document> {
        self.db.read().await.documents.get(id).cloned()
    }

    pub async fn create_document(&self, payload: NewDocument) -> Result<Document, RepositoryError> {
        payload.validate()?;

        let now = Utc::now();
        let document = self
            .db
            .write()
            .await
            .documents
            .insert_with(|id| payload.into_document(id, now))?;

        tracing::info!(
            document_id = document.id,
            document_type = %document.document_type,
            file_size = ?document.file_size,
            "Created document"
        );
        Ok(document)
    }

    /// Merge `patch` into a document; `Ok(None)` when the id is unknown
    pub async fn update_document(
        &self,
        id: EntityId,
        patch: DocumentPatch,
    ) -> Result<Option<Document>, RepositoryError> {
        let mut tables = self.db.write().await;
        let Some(document) = tables.documents.get_mut(id) else {
            return Ok(None);
        };

        document.apply_patch(patch, Utc::now())?;
        Ok(Some(document.clone()))
    }
}
