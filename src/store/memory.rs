use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::panic::AssertUnwindSafe;
use uuid::Uuid;

use super::{ResourceStore, TransactionFn};
use crate::error::{panic_message, OrchestrationError, OrchestrationResult};
use crate::models::ResourceRecord;

/// DashMap-backed store used for embedding and tests.
///
/// A row's shard lock is the transaction lock: `transact` holds it for the
/// whole read-modify-write, so concurrent adjustments on one row serialize.
#[derive(Debug, Default)]
pub struct InMemoryResourceStore {
    rows: DashMap<Uuid, ResourceRecord>,
    zone_refs: DashMap<Uuid, BTreeSet<Uuid>>,
}

impl InMemoryResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl ResourceStore for InMemoryResourceStore {
    async fn create(&self, record: ResourceRecord) -> OrchestrationResult<ResourceRecord> {
        if self.rows.contains_key(&record.id) {
            return Err(OrchestrationError::Store(format!(
                "resource[uuid:{}] already exists",
                record.id
            )));
        }
        self.rows.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> OrchestrationResult<Option<ResourceRecord>> {
        Ok(self.rows.get(&id).map(|row| row.value().clone()))
    }

    async fn update(&self, record: &ResourceRecord) -> OrchestrationResult<()> {
        match self.rows.get_mut(&record.id) {
            Some(mut row) => {
                *row = record.clone();
                Ok(())
            }
            None => Err(OrchestrationError::ResourceNotFound {
                resource_id: record.id,
            }),
        }
    }

    async fn delete(&self, id: Uuid) -> OrchestrationResult<bool> {
        self.zone_refs.remove(&id);
        Ok(self.rows.remove(&id).is_some())
    }

    async fn list(&self) -> OrchestrationResult<Vec<ResourceRecord>> {
        Ok(self.rows.iter().map(|row| row.value().clone()).collect())
    }

    async fn transact(
        &self,
        id: Uuid,
        apply: TransactionFn,
    ) -> OrchestrationResult<ResourceRecord> {
        let mut row = self
            .rows
            .get_mut(&id)
            .ok_or(OrchestrationError::ResourceNotFound { resource_id: id })?;

        // Work on a copy so that an error or a panic leaves the row untouched
        let mut working = row.value().clone();
        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| apply(&mut working)))
            .map_err(|payload| {
                OrchestrationError::Internal(format!(
                    "transaction on resource[uuid:{id}] panicked: {}",
                    panic_message(payload.as_ref())
                ))
            })?;
        outcome?;

        if working.available_capacity > working.total_capacity {
            return Err(OrchestrationError::Store(format!(
                "transaction on resource[uuid:{id}] would leave available capacity above total"
            )));
        }

        *row = working.clone();
        Ok(working)
    }

    async fn add_zone_ref(&self, id: Uuid, zone_id: Uuid) -> OrchestrationResult<bool> {
        if !self.rows.contains_key(&id) {
            return Err(OrchestrationError::ResourceNotFound { resource_id: id });
        }
        Ok(self.zone_refs.entry(id).or_default().insert(zone_id))
    }

    async fn remove_zone_ref(&self, id: Uuid, zone_id: Uuid) -> OrchestrationResult<bool> {
        Ok(self
            .zone_refs
            .get_mut(&id)
            .map(|mut zones| zones.remove(&zone_id))
            .unwrap_or(false))
    }

    async fn zone_refs(&self, id: Uuid) -> OrchestrationResult<Vec<Uuid>> {
        Ok(self
            .zone_refs
            .get(&id)
            .map(|zones| zones.iter().copied().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::NewResource;
    use crate::store::with_transaction;
    use std::sync::Arc;

    async fn seeded(total: u64, available: u64) -> (Arc<InMemoryResourceStore>, Uuid) {
        let store = Arc::new(InMemoryResourceStore::new());
        let record = ResourceRecord::from_new(
            NewResource::new("bs", "mock", total).with_available_capacity(available),
        );
        let id = record.id;
        store.create(record).await.unwrap();
        (store, id)
    }

    #[tokio::test]
    async fn test_crud_roundtrip() {
        let (store, id) = seeded(100, 100).await;
        let mut record = store.get(id).await.unwrap().unwrap();
        record.name = "renamed".to_string();
        store.update(&record).await.unwrap();
        assert_eq!(store.get(id).await.unwrap().unwrap().name, "renamed");

        assert!(store.delete(id).await.unwrap());
        assert!(store.get(id).await.unwrap().is_none());
        assert!(!store.delete(id).await.unwrap());
    }

    #[tokio::test]
    async fn test_transaction_rolls_back_on_error() {
        let (store, id) = seeded(100, 40).await;
        let err = with_transaction(store.as_ref(), id, |r| {
            r.available_capacity = 0;
            r.reserve_capacity(10)
        })
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CapacityExceeded);
        assert_eq!(store.get(id).await.unwrap().unwrap().available_capacity, 40);
    }

    #[tokio::test]
    async fn test_transaction_rolls_back_on_panic() {
        let (store, id) = seeded(100, 40).await;
        let err = with_transaction(store.as_ref(), id, |r| {
            r.available_capacity = 1;
            panic!("mid-transaction fault");
        })
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(store.get(id).await.unwrap().unwrap().available_capacity, 40);
    }

    #[tokio::test]
    async fn test_zone_refs() {
        let (store, id) = seeded(100, 100).await;
        let zone = Uuid::new_v4();
        assert!(store.add_zone_ref(id, zone).await.unwrap());
        assert!(!store.add_zone_ref(id, zone).await.unwrap());
        assert_eq!(store.zone_refs(id).await.unwrap(), vec![zone]);
        assert!(store.remove_zone_ref(id, zone).await.unwrap());
        assert!(store.zone_refs(id).await.unwrap().is_empty());

        let missing = store.add_zone_ref(Uuid::new_v4(), zone).await.unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::ResourceNotFound);
    }
}
