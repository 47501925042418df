//! # Resource Store
//!
//! Interface to the external persistence of resource records and of the
//! resource/zone association table. The orchestration core only needs
//! create/read/update/delete by id plus a scoped transaction for short
//! critical sections such as capacity adjustments.

pub mod memory;

pub use memory::InMemoryResourceStore;

use async_trait::async_trait;
use std::fmt;
use uuid::Uuid;

use crate::error::{OrchestrationError, OrchestrationResult};
use crate::models::{ResourceInventory, ResourceRecord};

/// Mutation applied inside [`ResourceStore::transact`]
pub type TransactionFn =
    Box<dyn FnOnce(&mut ResourceRecord) -> OrchestrationResult<()> + Send + 'static>;

#[async_trait]
pub trait ResourceStore: Send + Sync + fmt::Debug {
    async fn create(&self, record: ResourceRecord) -> OrchestrationResult<ResourceRecord>;

    async fn get(&self, id: Uuid) -> OrchestrationResult<Option<ResourceRecord>>;

    /// Overwrite an existing row; fails with `ResourceNotFound` if absent
    async fn update(&self, record: &ResourceRecord) -> OrchestrationResult<()>;

    /// Remove the row and its zone associations. Returns whether a row existed.
    async fn delete(&self, id: Uuid) -> OrchestrationResult<bool>;

    async fn list(&self) -> OrchestrationResult<Vec<ResourceRecord>>;

    /// Run `apply` against the row under an exclusive lock. The row is written
    /// back only when `apply` returns `Ok`; on error the stored row is untouched.
    async fn transact(&self, id: Uuid, apply: TransactionFn)
        -> OrchestrationResult<ResourceRecord>;

    /// Insert a resource/zone association. Returns false if it already existed.
    async fn add_zone_ref(&self, id: Uuid, zone_id: Uuid) -> OrchestrationResult<bool>;

    async fn remove_zone_ref(&self, id: Uuid, zone_id: Uuid) -> OrchestrationResult<bool>;

    async fn zone_refs(&self, id: Uuid) -> OrchestrationResult<Vec<Uuid>>;
}

/// Read a record that must exist
pub async fn get_required(
    store: &dyn ResourceStore,
    id: Uuid,
) -> OrchestrationResult<ResourceRecord> {
    store
        .get(id)
        .await?
        .ok_or(OrchestrationError::ResourceNotFound { resource_id: id })
}

/// Scoped transaction over a closure; commit on `Ok`, rollback on every other exit
pub async fn with_transaction<F>(
    store: &dyn ResourceStore,
    id: Uuid,
    apply: F,
) -> OrchestrationResult<ResourceRecord>
where
    F: FnOnce(&mut ResourceRecord) -> OrchestrationResult<()> + Send + 'static,
{
    store.transact(id, Box::new(apply)).await
}

/// Build the inventory snapshot for a record, including its zone associations
pub async fn inventory_of(
    store: &dyn ResourceStore,
    record: &ResourceRecord,
) -> OrchestrationResult<ResourceInventory> {
    let zones = store.zone_refs(record.id).await?;
    Ok(ResourceInventory::from_record(record, zones))
}
