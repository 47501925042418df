//! # Resource Manager
//!
//! Creates resources, instantiates their drivers through per-type factories
//! and owns the handler task of every live resource.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use super::base::ResourceBase;
use super::context::OrchestratorContext;
use crate::driver::{CapacityReport, DriverFactory};
use crate::error::{OrchestrationError, OrchestrationResult};
use crate::messaging::{Command, Reply};
use crate::models::{NewResource, ResourceInventory, ResourceRecord};
use crate::store::inventory_of;

/// Outcome of adding a resource
#[derive(Debug, Clone)]
pub struct AddedResource {
    /// Snapshot after the first connect attempt
    pub inventory: ResourceInventory,
    /// Why the first connect attempt failed, if it did. The resource is kept.
    pub connect_error: Option<OrchestrationError>,
}

struct ManagedResource {
    base: ResourceBase,
    handle: JoinHandle<()>,
}

/// Entry point for creating and addressing resources
pub struct ResourceManager {
    ctx: OrchestratorContext,
    factories: DashMap<String, Arc<dyn DriverFactory>>,
    resources: DashMap<Uuid, ManagedResource>,
}

impl std::fmt::Debug for ResourceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceManager")
            .field("factories", &self.factories.len())
            .field("resources", &self.resources.len())
            .finish()
    }
}

impl ResourceManager {
    pub fn new(ctx: OrchestratorContext) -> Self {
        Self {
            ctx,
            factories: DashMap::new(),
            resources: DashMap::new(),
        }
    }

    pub fn context(&self) -> &OrchestratorContext {
        &self.ctx
    }

    pub fn register_factory(&self, factory: Arc<dyn DriverFactory>) {
        let resource_type = factory.resource_type().to_string();
        info!(resource_type = %resource_type, "🏭 MANAGER: Registered driver factory");
        if self.factories.insert(resource_type.clone(), factory).is_some() {
            warn!(resource_type = %resource_type, "Replaced existing driver factory");
        }
    }

    fn factory_for(&self, resource_type: &str) -> OrchestrationResult<Arc<dyn DriverFactory>> {
        self.factories
            .get(resource_type)
            .map(|f| f.value().clone())
            .ok_or_else(|| {
                OrchestrationError::Configuration(format!(
                    "no driver factory registered for resource type {resource_type}"
                ))
            })
    }

    /// Persist a new resource, start its handler and run the first connect
    pub async fn add_resource(&self, new_resource: NewResource) -> OrchestrationResult<AddedResource> {
        let factory = self.factory_for(&new_resource.resource_type)?;
        let record = self
            .ctx
            .store
            .create(ResourceRecord::from_new(new_resource))
            .await?;
        let resource_id = record.id;

        if let Err(e) = self.start(&record, factory.as_ref()).await {
            // Undo the insert so a failed add leaves nothing behind
            if let Err(cleanup) = self.ctx.store.delete(resource_id).await {
                warn!(resource_id = %resource_id, error = %cleanup, "Failed to remove record after aborted add");
            }
            return Err(e);
        }
        info!(resource_id = %resource_id, name = %record.name, "➕ MANAGER: Resource added");

        let connect_error = self
            .ctx
            .bus
            .send(resource_id, Command::Connect { new_add: true })
            .await
            .err();
        if let Some(e) = &connect_error {
            warn!(resource_id = %resource_id, error = %e, "First connect attempt failed; resource kept disconnected");
        }

        let record = crate::store::get_required(self.ctx.store.as_ref(), resource_id).await?;
        Ok(AddedResource {
            inventory: inventory_of(self.ctx.store.as_ref(), &record).await?,
            connect_error,
        })
    }

    /// Start handlers for every stored resource and ask each to reconnect.
    /// Returns the number of resources resumed.
    pub async fn resume_all(&self) -> OrchestrationResult<usize> {
        let mut resumed = 0;
        for record in self.ctx.store.list().await? {
            if self.resources.contains_key(&record.id) {
                continue;
            }
            let factory = match self.factory_for(&record.resource_type) {
                Ok(factory) => factory,
                Err(e) => {
                    warn!(resource_id = %record.id, error = %e, "Skipping resource without driver");
                    continue;
                }
            };
            self.start(&record, factory.as_ref()).await?;
            self.ctx
                .bus
                .post(record.id, Command::Connect { new_add: false })
                .await;
            resumed += 1;
        }
        info!(resumed = resumed, "🔁 MANAGER: Resumed stored resources");
        Ok(resumed)
    }

    async fn start(&self, record: &ResourceRecord, factory: &dyn DriverFactory) -> OrchestrationResult<()> {
        let inventory = inventory_of(self.ctx.store.as_ref(), record).await?;
        let driver = factory.create(&inventory)?;
        let base = ResourceBase::new(self.ctx.clone(), record.id, driver);
        let handle = base.clone().spawn();
        self.resources.insert(record.id, ManagedResource { base, handle });
        Ok(())
    }

    /// Send a command to a resource and wait for its reply
    pub async fn send(&self, resource_id: Uuid, command: Command) -> Reply {
        self.ctx.bus.send(resource_id, command).await
    }

    pub fn resource(&self, resource_id: Uuid) -> Option<ResourceBase> {
        self.resources.get(&resource_id).map(|r| r.base.clone())
    }

    /// Capacity update reported out of band by a driver
    pub async fn update_capacity(
        &self,
        resource_id: Uuid,
        report: CapacityReport,
    ) -> OrchestrationResult<ResourceRecord> {
        let base = self
            .resource(resource_id)
            .ok_or(OrchestrationError::ResourceNotFound { resource_id })?;
        base.update_capacity(report).await
    }

    /// Drop bookkeeping for resources whose handler loop has ended (deleted)
    pub fn reap(&self) -> usize {
        let before = self.resources.len();
        self.resources.retain(|_, r| !r.handle.is_finished());
        before - self.resources.len()
    }

    pub fn live_count(&self) -> usize {
        self.resources.iter().filter(|r| !r.handle.is_finished()).count()
    }

    /// Stop health checks and every handler loop
    pub fn shutdown(&self) {
        self.ctx.supervisor.shutdown();
        for entry in self.resources.iter() {
            self.ctx.bus.unregister(*entry.key());
            entry.handle.abort();
        }
        self.resources.clear();
        info!("🛑 MANAGER: Shut down");
    }
}
