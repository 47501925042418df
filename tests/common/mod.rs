//! Shared fixtures for integration tests: a scriptable driver, recording
//! cascade dependents and a harness wiring a full orchestrator context over
//! the in-memory store.

#![allow(dead_code)]

pub mod strategies;

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use uuid::Uuid;

use resource_orchestrator::cascade::{CascadeAction, CascadeContext, CascadeExtension};
use resource_orchestrator::config::OrchestratorConfig;
use resource_orchestrator::driver::{CapacityReport, DownloadResult, DriverFactory, ResourceDriver};
use resource_orchestrator::error::{OrchestrationError, OrchestrationResult};
use resource_orchestrator::events::{CanonicalEvent, PublishedEvent};
use resource_orchestrator::models::{NewResource, ResourceInventory, ResourceRecord};
use resource_orchestrator::resource::{AddedResource, OrchestratorContext, ResourceManager};
use resource_orchestrator::state_machine::StateTransition;
use resource_orchestrator::store::{InMemoryResourceStore, ResourceStore};

pub const MOCK_TYPE: &str = "mock";
pub const GB: u64 = 1024 * 1024 * 1024;

/// Driver whose outcomes are scripted by the test
#[derive(Debug, Default)]
pub struct MockDriver {
    /// Number of upcoming connect attempts that fail
    pub connect_failures: AtomicUsize,
    pub ping_fails: AtomicBool,
    pub download_fails: AtomicBool,
    pub scan_fails: AtomicBool,
    pub delete_fails: AtomicBool,
    pub panic_on_custom: AtomicBool,
    pub capacity_report: Mutex<Option<CapacityReport>>,
    /// Bytes a download actually consumes; defaults to the requested size
    pub download_actual: Mutex<Option<u64>>,
    pub calls: Mutex<Vec<String>>,
}

impl MockDriver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }

    pub fn calls_of(&self, prefix: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn fail_next_connects(&self, n: usize) {
        self.connect_failures.store(n, Ordering::SeqCst);
    }
}

#[async_trait]
impl ResourceDriver for MockDriver {
    async fn connect(
        &self,
        _resource: &ResourceInventory,
        new_add: bool,
    ) -> OrchestrationResult<Option<CapacityReport>> {
        self.record(format!("connect:{new_add}"));
        let failing = self
            .connect_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(OrchestrationError::backend("connect", "host unreachable"));
        }
        Ok(*self.capacity_report.lock())
    }

    async fn ping(&self, _resource: &ResourceInventory) -> OrchestrationResult<()> {
        self.record("ping");
        if self.ping_fails.load(Ordering::SeqCst) {
            return Err(OrchestrationError::backend("ping", "no answer"));
        }
        Ok(())
    }

    async fn attach(&self, _resource: &ResourceInventory, zone_id: Uuid) -> OrchestrationResult<()> {
        self.record(format!("attach:{zone_id}"));
        Ok(())
    }

    async fn detach(&self, _resource: &ResourceInventory, zone_id: Uuid) -> OrchestrationResult<()> {
        self.record(format!("detach:{zone_id}"));
        Ok(())
    }

    async fn change_state(
        &self,
        _resource: &ResourceInventory,
        transition: &StateTransition,
    ) -> OrchestrationResult<()> {
        self.record(format!("change_state:{}", transition.event));
        Ok(())
    }

    async fn delete(&self, _resource: &ResourceInventory) -> OrchestrationResult<()> {
        self.record("delete");
        if self.delete_fails.load(Ordering::SeqCst) {
            return Err(OrchestrationError::backend("delete", "backend busy"));
        }
        Ok(())
    }

    async fn scan(&self, _resource: &ResourceInventory) -> OrchestrationResult<()> {
        self.record("scan");
        if self.scan_fails.load(Ordering::SeqCst) {
            return Err(OrchestrationError::backend("scan", "listing failed"));
        }
        Ok(())
    }

    async fn download(
        &self,
        _resource: &ResourceInventory,
        url: &str,
        size: u64,
    ) -> OrchestrationResult<DownloadResult> {
        self.record(format!("download:{url}"));
        if self.download_fails.load(Ordering::SeqCst) {
            return Err(OrchestrationError::backend("download", "connection reset"));
        }
        Ok(DownloadResult {
            install_path: format!("/store/{}", url.rsplit('/').next().unwrap_or("image")),
            size: self.download_actual.lock().unwrap_or(size),
        })
    }

    async fn delete_bits(&self, _resource: &ResourceInventory, install_path: &str) -> OrchestrationResult<()> {
        self.record(format!("delete_bits:{install_path}"));
        Ok(())
    }

    async fn handle_custom(
        &self,
        _resource: &ResourceInventory,
        kind: &str,
        payload: &serde_json::Value,
    ) -> Option<OrchestrationResult<serde_json::Value>> {
        if self.panic_on_custom.load(Ordering::SeqCst) {
            panic!("driver fault in custom handler");
        }
        match kind {
            "echo" => Some(Ok(payload.clone())),
            _ => None,
        }
    }
}

/// Factory handing out one shared mock driver
pub struct MockDriverFactory {
    pub driver: Arc<MockDriver>,
}

impl DriverFactory for MockDriverFactory {
    fn resource_type(&self) -> &str {
        MOCK_TYPE
    }

    fn create(&self, _resource: &ResourceInventory) -> OrchestrationResult<Arc<dyn ResourceDriver>> {
        Ok(self.driver.clone())
    }
}

/// Cascade dependent recording every action and refusing the scripted ones
pub struct RecordingDependent {
    pub name: String,
    pub refuse: Mutex<Vec<CascadeAction>>,
    pub seen: Mutex<Vec<CascadeAction>>,
}

impl RecordingDependent {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            refuse: Mutex::new(Vec::new()),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn refusing(name: &str, action: CascadeAction) -> Arc<Self> {
        let dependent = Self::new(name);
        dependent.refuse.lock().push(action);
        dependent
    }

    pub fn saw(&self, action: CascadeAction) -> bool {
        self.seen.lock().contains(&action)
    }
}

#[async_trait]
impl CascadeExtension for RecordingDependent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, action: CascadeAction, _ctx: &CascadeContext) -> OrchestrationResult<()> {
        self.seen.lock().push(action);
        if self.refuse.lock().contains(&action) {
            return Err(OrchestrationError::internal(format!("{} still in use", self.name)));
        }
        Ok(())
    }
}

/// Fully wired orchestrator over an in-memory store
pub struct TestHarness {
    pub store: Arc<InMemoryResourceStore>,
    pub manager: ResourceManager,
    pub driver: Arc<MockDriver>,
    pub events: broadcast::Receiver<PublishedEvent>,
}

pub fn test_config() -> OrchestratorConfig {
    let mut config = OrchestratorConfig::default();
    config.bus.default_timeout_ms = 5_000;
    // Pings are driven explicitly by tests
    config.health.ping_interval_ms = 3_600_000;
    config
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: OrchestratorConfig) -> Self {
        resource_orchestrator::logging::init_structured_logging();
        let store = Arc::new(InMemoryResourceStore::new());
        let ctx = OrchestratorContext::from_config(config, store.clone());
        let events = ctx.bus.subscribe();
        let manager = ResourceManager::new(ctx);
        let driver = MockDriver::new();
        manager.register_factory(Arc::new(MockDriverFactory {
            driver: driver.clone(),
        }));
        Self {
            store,
            manager,
            driver,
            events,
        }
    }

    pub fn ctx(&self) -> &OrchestratorContext {
        self.manager.context()
    }

    pub async fn add(&self, total: u64, available: u64) -> AddedResource {
        self.manager
            .add_resource(NewResource::new("bs-test", MOCK_TYPE, total).with_available_capacity(available))
            .await
            .expect("resource added")
    }

    /// Add a resource whose first connect succeeds, then forget the events so far
    pub async fn add_connected(&mut self, total: u64, available: u64) -> Uuid {
        let added = self.add(total, available).await;
        assert!(added.connect_error.is_none(), "first connect should succeed");
        self.drain_events();
        added.inventory.id
    }

    pub async fn record(&self, id: Uuid) -> Option<ResourceRecord> {
        self.store.get(id).await.expect("store read")
    }

    /// Every event published so far
    pub fn drain_events(&mut self) -> Vec<CanonicalEvent> {
        let mut events = Vec::new();
        while let Ok(published) = self.events.try_recv() {
            events.push(published.event);
        }
        events
    }

    pub fn status_changes(events: &[CanonicalEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, CanonicalEvent::StatusChanged { .. }))
            .count()
    }
}

/// Poll `check` until it holds or the deadline passes
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}
