//! # Supplier Repository
//!
//! CRUD operations over the supplier collection.

use chrono::Utc;

use crate::db::MemoryStore;
use crate::error::RepositoryError;
use crate::models::{EntityId, NewSupplier, Supplier, SupplierPatch};

/// Repository for supplier records
pub struct SupplierRepository<'a> {
    db: &'a MemoryStore,
}

impl<'a> SupplierRepository<'a> {
    pub fn new(db: &'a MemoryStore) -> Self {
        Self { db }
    }

    /// List all suppliers in insertion order
    pub async fn list_suppliers(&self) -> Vec<Supplier> {
        self.db.read().await.suppliers.values().cloned().collect()
    }

    pub async fn get_supplier(&self, id: EntityId) -> Option<Supplier> {
        self.db.read().await.suppliers.get(id).cloned()
    }

    /// Create a supplier, applying defaults for omitted scores
    pub async fn create_supplier(&self, payload: NewSupplier) -> Result<Supplier, RepositoryError> {
        payload.validate()?;

        let now = Utc::now();
        let supplier = self
            .db
            .write()
            .await
            .suppliers
            .insert_with(|id| payload.into_supplier(id, now))?;

        tracing::info!(supplier_id = supplier.id, name = %supplier.name, "Created supplier");
        Ok(supplier)
    }

    /// Merge `patch` into a supplier; `Ok(None)` when the id is unknown
    pub async fn update_supplier(
        &self,
        id: EntityId,
        patch: SupplierPatch,
    ) -> Result<Option<Supplier>, RepositoryError> {
        let mut tables = self.db.write().await;
        let Some(supplier) = tables.suppliers.get_mut(id) else {
            return Ok(None);
        };

        supplier.apply_patch(patch, Utc::now())?;
        Ok(Some(supplier.clone()))
    }

    /// Delete a supplier and detach the deliveries that referenced it.
    ///
    /// Returns `false` when the id is unknown.
    pub async fn delete_supplier(&self, id: EntityId) -> bool {
        let mut tables = self.db.write().await;
        if tables.suppliers.remove(id).is_none() {
            return false;
        }

        let mut detached = 0usize;
        for delivery in tables.deliveries.values_mut() {
            if delivery.supplier_id == Some(id) {
                delivery.supplier_id = None;
                detached += 1;
            }
        }

        tracing::info!(
            supplier_id = id,
            detached_deliveries = detached,
            "Deleted supplier"
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewDelivery;
    use crate::repositories::DeliveryRepository;

    fn named(name: &str) -> NewSupplier {
        NewSupplier {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn sequential_creates_get_sequential_ids_in_order() {
        let store = MemoryStore::new();
        let repo = SupplierRepository::new(&store);

        let first = repo.create_supplier(named("ABC Trading Co.")).await.unwrap();
        let second = repo.create_supplier(named("XYZ Suppliers")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        let listed: Vec<_> = repo.list_suppliers().await.into_iter().map(|s| s.id).collect();
        assert_eq!(listed, vec![1, 2]);
    }

    #[tokio::test]
    async fn created_supplier_is_readable_unchanged() {
        let store = MemoryStore::new();
        let repo = SupplierRepository::new(&store);

        let created = repo.create_supplier(named("PQR Industries")).await.unwrap();

        assert_eq!(repo.get_supplier(created.id).await, Some(created));
    }

    #[tokio::test]
    async fn unknown_ids_are_not_errors() {
        let store = MemoryStore::new();
        let repo = SupplierRepository::new(&store);

        assert!(repo.get_supplier(999).await.is_none());
        assert!(!repo.delete_supplier(999).await);
        assert!(
            repo.update_supplier(999, SupplierPatch::default())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn empty_patch_only_refreshes_updated_at() {
        let store = MemoryStore::new();
        let repo = SupplierRepository::new(&store);
        let created = repo.create_supplier(named("ABC")).await.unwrap();

        let updated = repo
            .update_supplier(created.id, SupplierPatch::default())
            .await
            .unwrap()
            .unwrap();

        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(
            Supplier {
                updated_at: created.updated_at,
                ..updated
            },
            created
        );
    }

    #[tokio::test]
    async fn failed_create_does_not_consume_an_id() {
        let store = MemoryStore::new();
        let repo = SupplierRepository::new(&store);

        let err = repo.create_supplier(NewSupplier::default()).await.unwrap_err();
        assert_eq!(err.field(), Some("name"));

        let created = repo.create_supplier(named("ABC")).await.unwrap();
        assert_eq!(created.id, 1);
    }

    #[tokio::test]
    async fn ids_not_reused_after_delete() {
        let store = MemoryStore::new();
        let repo = SupplierRepository::new(&store);

        let first = repo.create_supplier(named("A")).await.unwrap();
        assert!(repo.delete_supplier(first.id).await);
        let second = repo.create_supplier(named("B")).await.unwrap();

        assert_eq!(second.id, 2);
        assert!(repo.get_supplier(first.id).await.is_none());
    }

    #[tokio::test]
    async fn delete_detaches_deliveries() {
        let store = MemoryStore::new();
        let suppliers = SupplierRepository::new(&store);
        let deliveries = DeliveryRepository::new(&store);

        let supplier = suppliers.create_supplier(named("ABC Trading Co.")).await.unwrap();
        let delivery = deliveries
            .create_delivery(NewDelivery {
                supplier_id: Some(supplier.id),
                supplier_name: "ABC Trading Co.".to_string(),
                material_type: "Raw Steel".to_string(),
                quantity: "500".to_string(),
                unit: "tons".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(suppliers.delete_supplier(supplier.id).await);

        let delivery = deliveries.get_delivery(delivery.id).await.unwrap();
        assert_eq!(delivery.supplier_id, None);
        assert_eq!(delivery.supplier_name, "ABC Trading Co.");
    }
}
