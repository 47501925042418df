use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::cascade::CascadeFacade;
use crate::config::{ConfigLoader, OrchestratorConfig};
use crate::error::OrchestrationResult;
use crate::events::EventPublisher;
use crate::health::HealthSupervisor;
use crate::messaging::MessageBus;
use crate::state_machine::{LifecycleHooks, OperationGate};
use crate::store::ResourceStore;
use crate::sync::SyncSerializer;

/// Shared orchestration dependencies
///
/// Explicit dependency injection container handed to every resource handler
/// and to the manager at construction:
/// - Message bus and canonical event publisher
/// - External resource store
/// - Per-resource serializer
/// - Health supervisor
/// - Cascade facade, lifecycle hooks and the permission gate
#[derive(Clone)]
pub struct OrchestratorContext {
    /// Orchestrator instance ID
    pub system_id: Uuid,
    pub config: Arc<OrchestratorConfig>,
    pub bus: MessageBus,
    pub store: Arc<dyn ResourceStore>,
    pub serializer: SyncSerializer,
    pub supervisor: HealthSupervisor,
    pub cascade: Arc<CascadeFacade>,
    pub hooks: Arc<LifecycleHooks>,
    pub gate: Arc<OperationGate>,
}

impl std::fmt::Debug for OrchestratorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrchestratorContext")
            .field("system_id", &self.system_id)
            .field("registered_resources", &self.bus.registered_count())
            .field("tracked_resources", &self.supervisor.tracked_count())
            .field("store", &"Arc<dyn ResourceStore>")
            .finish()
    }
}

impl OrchestratorContext {
    /// Load configuration from the default sources and build a context over `store`
    pub fn load(store: Arc<dyn ResourceStore>) -> OrchestrationResult<Self> {
        let config = ConfigLoader::new().load()?;
        Ok(Self::from_config(config, store))
    }

    /// Build every shared component from `config`
    pub fn from_config(config: OrchestratorConfig, store: Arc<dyn ResourceStore>) -> Self {
        let system_id = Uuid::new_v4();
        info!(system_id = %system_id, "🔧 Initializing OrchestratorContext");

        let events = EventPublisher::new(config.events.channel_capacity);
        let bus = MessageBus::new(&config.bus, events);
        let supervisor = HealthSupervisor::new(&config.health, bus.clone());
        let serializer = SyncSerializer::new(config.serializer.default_sync_level);

        Self {
            system_id,
            config: Arc::new(config),
            bus,
            store,
            serializer,
            supervisor,
            cascade: Arc::new(CascadeFacade::new()),
            hooks: Arc::new(LifecycleHooks::new()),
            gate: Arc::new(OperationGate::default()),
        }
    }

    /// Replace the permission gate
    pub fn with_gate(mut self, gate: OperationGate) -> Self {
        self.gate = Arc::new(gate);
        self
    }
}
