//! In-process entity store for the Delivery Tracker API.
//!
//! All collections live behind a single async `RwLock`. The store is built once
//! at startup and shared with handlers and the processing worker as
//! `Arc<MemoryStore>`; tests construct a fresh one each.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::RepositoryError;
use crate::models::{Delivery, Document, EntityId, ProcessingStats, Supplier, WhatsappMessage};

/// One id-keyed collection with a monotonic id counter.
///
/// Ids start at 1 and are never handed out twice, even after a row is removed.
/// Once the counter would pass `EntityId::MAX` further inserts are refused.
#[derive(Debug)]
pub struct Table<T> {
    rows: BTreeMap<EntityId, T>,
    next_id: EntityId,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T: Clone> Table<T> {
    /// Allocates the next id, stores the row built from it and returns a copy.
    pub fn insert_with(
        &mut self,
        build: impl FnOnce(EntityId) -> T,
    ) -> Result<T, RepositoryError> {
        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(RepositoryError::IdsExhausted)?;
        let row = build(id);
        self.rows.insert(id, row.clone());
        Ok(row)
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.rows.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.rows.get_mut(&id)
    }

    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        self.rows.remove(&id)
    }

    /// Rows in insertion order. Ids are monotonic, so key order is insertion order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.rows.values_mut()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Every collection plus the stats singleton.
#[derive(Debug, Default)]
pub struct Tables {
    pub suppliers: Table<Supplier>,
    pub deliveries: Table<Delivery>,
    pub documents: Table<Document>,
    pub whatsapp_messages: Table<WhatsappMessage>,
    pub stats: Option<ProcessingStats>,
}

/// Process-lifetime store shared across the service.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

/// Shared handle to the store.
pub type SharedStore = Arc<MemoryStore>;

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store wrapped for sharing.
    pub fn shared() -> SharedStore {
        let store = Arc::new(Self::new());
        tracing::debug!("Initialized in-memory entity store");
        store
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_and_never_reused() {
        let mut table: Table<String> = Table::default();

        let first = table.insert_with(|id| format!("row-{id}")).unwrap();
        let second = table.insert_with(|id| format!("row-{id}")).unwrap();
        assert_eq!(first, "row-1");
        assert_eq!(second, "row-2");

        table.remove(2);
        let third = table.insert_with(|id| format!("row-{id}")).unwrap();
        assert_eq!(third, "row-3");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn exhausted_id_space_refuses_insert() {
        let mut table: Table<EntityId> = Table {
            rows: BTreeMap::new(),
            next_id: EntityId::MAX - 1,
        };

        assert_eq!(table.insert_with(|id| id).unwrap(), EntityId::MAX - 1);
        assert_eq!(
            table.insert_with(|id| id).unwrap_err(),
            RepositoryError::IdsExhausted
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn values_follow_insertion_order() {
        let mut table: Table<EntityId> = Table::default();
        for _ in 0..5 {
            table.insert_with(|id| id).unwrap();
        }
        table.remove(3);

        let ids: Vec<_> = table.values().copied().collect();
        assert_eq!(ids, vec![1, 2, 4, 5]);
    }

    #[tokio::test]
    async fn fresh_store_is_empty() {
        let store = MemoryStore::new();
        let tables = store.read().await;

        assert!(tables.suppliers.is_empty());
        assert!(tables.deliveries.is_empty());
        assert!(tables.documents.is_empty());
        assert!(tables.whatsapp_messages.is_empty());
        assert!(tables.stats.is_none());
    }
}
