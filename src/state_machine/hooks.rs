//! # Lifecycle Hooks
//!
//! Ordered observers invoked at four points around a transition:
//! pre-check (may veto), before, after and failed. A veto at pre-check stops
//! the operation before any before/after hook runs.

use async_trait::async_trait;
use futures::FutureExt;
use parking_lot::RwLock;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::events::StateEvent;
use super::states::{ResourceState, ResourceStatus};
use crate::error::{panic_message, OrchestrationError, OrchestrationResult};
use crate::models::ResourceInventory;

/// Extension invoked around a lifecycle transition of type `C`
#[async_trait]
pub trait LifecycleHook<C: Send + Sync>: Send + Sync {
    /// Name used in logs and veto errors
    fn name(&self) -> &str;

    /// Veto point. Returning an error aborts the operation.
    async fn pre_check(&self, _ctx: &C) -> OrchestrationResult<()> {
        Ok(())
    }

    async fn before(&self, _ctx: &C) {}

    async fn after(&self, _ctx: &C) {}

    async fn failed(&self, _ctx: &C, _error: &OrchestrationError) {}
}

/// Status transition context
#[derive(Debug, Clone)]
pub struct StatusTransition {
    pub resource_id: Uuid,
    pub old_status: ResourceStatus,
    pub new_status: ResourceStatus,
}

/// Administrative state transition context
#[derive(Debug, Clone)]
pub struct StateTransition {
    pub resource_id: Uuid,
    pub event: StateEvent,
    pub old_state: ResourceState,
    pub new_state: ResourceState,
}

/// Zone attach/detach context
#[derive(Debug, Clone)]
pub struct ZoneChange {
    pub resource_id: Uuid,
    pub zone_id: Uuid,
}

/// Self-deletion context
#[derive(Debug, Clone)]
pub struct ResourceDeletion {
    pub resource_id: Uuid,
    pub inventory: ResourceInventory,
}

/// Registration-ordered list of hooks for one context type
pub struct HookChain<C: Send + Sync + 'static> {
    hooks: RwLock<Vec<Arc<dyn LifecycleHook<C>>>>,
}

impl<C: Send + Sync + 'static> Default for HookChain<C> {
    fn default() -> Self {
        Self {
            hooks: RwLock::new(Vec::new()),
        }
    }
}

impl<C: Send + Sync + 'static> std::fmt::Debug for HookChain<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookChain")
            .field("hooks", &self.len())
            .finish()
    }
}

impl<C: Send + Sync + 'static> HookChain<C> {
    pub fn register(&self, hook: Arc<dyn LifecycleHook<C>>) {
        debug!(hook = hook.name(), "Registered lifecycle hook");
        self.hooks.write().push(hook);
    }

    pub fn len(&self) -> usize {
        self.hooks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.read().is_empty()
    }

    fn snapshot(&self) -> Vec<Arc<dyn LifecycleHook<C>>> {
        self.hooks.read().clone()
    }

    /// Run pre-checks in order; the first veto wins
    pub async fn pre_check(&self, ctx: &C) -> OrchestrationResult<()> {
        for hook in self.snapshot() {
            let outcome = AssertUnwindSafe(hook.pre_check(ctx)).catch_unwind().await;
            let result = outcome.unwrap_or_else(|payload| {
                Err(OrchestrationError::Internal(panic_message(payload.as_ref())))
            });
            if let Err(error) = result {
                debug!(hook = hook.name(), error = %error, "🛑 HOOK: Pre-check vetoed operation");
                return Err(match error {
                    OrchestrationError::ExtensionVetoed { .. } => error,
                    other => OrchestrationError::ExtensionVetoed {
                        extension: hook.name().to_string(),
                        reason: other.to_string(),
                    },
                });
            }
        }
        Ok(())
    }

    pub async fn before(&self, ctx: &C) {
        for hook in self.snapshot() {
            Self::observe(hook.name(), "before", hook.before(ctx)).await;
        }
    }

    pub async fn after(&self, ctx: &C) {
        for hook in self.snapshot() {
            Self::observe(hook.name(), "after", hook.after(ctx)).await;
        }
    }

    pub async fn failed(&self, ctx: &C, error: &OrchestrationError) {
        for hook in self.snapshot() {
            Self::observe(hook.name(), "failed", hook.failed(ctx, error)).await;
        }
    }

    // Observer faults are logged; they never change the outcome of the operation
    async fn observe<F: std::future::Future<Output = ()>>(name: &str, point: &str, fut: F) {
        if let Err(payload) = AssertUnwindSafe(fut).catch_unwind().await {
            warn!(
                hook = name,
                point = point,
                panic = %panic_message(payload.as_ref()),
                "Lifecycle hook panicked"
            );
        }
    }
}

/// Hook registries for every extension point of a resource
#[derive(Debug, Default)]
pub struct LifecycleHooks {
    pub status: HookChain<StatusTransition>,
    pub state: HookChain<StateTransition>,
    pub attach: HookChain<ZoneChange>,
    pub detach: HookChain<ZoneChange>,
    pub delete: HookChain<ResourceDeletion>,
}

impl LifecycleHooks {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use parking_lot::Mutex;

    struct Recorder {
        name: String,
        veto: bool,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl LifecycleHook<ZoneChange> for Recorder {
        fn name(&self) -> &str {
            &self.name
        }

        async fn pre_check(&self, _ctx: &ZoneChange) -> OrchestrationResult<()> {
            self.log.lock().push(format!("{}:pre", self.name));
            if self.veto {
                return Err(OrchestrationError::internal("zone is full"));
            }
            Ok(())
        }

        async fn before(&self, _ctx: &ZoneChange) {
            self.log.lock().push(format!("{}:before", self.name));
        }

        async fn after(&self, _ctx: &ZoneChange) {
            self.log.lock().push(format!("{}:after", self.name));
        }
    }

    fn ctx() -> ZoneChange {
        ZoneChange {
            resource_id: Uuid::new_v4(),
            zone_id: Uuid::new_v4(),
        }
    }

    #[tokio::test]
    async fn test_hooks_run_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = HookChain::default();
        for name in ["a", "b"] {
            chain.register(Arc::new(Recorder {
                name: name.to_string(),
                veto: false,
                log: log.clone(),
            }));
        }

        let ctx = ctx();
        chain.pre_check(&ctx).await.unwrap();
        chain.before(&ctx).await;
        chain.after(&ctx).await;
        assert_eq!(
            *log.lock(),
            vec!["a:pre", "b:pre", "a:before", "b:before", "a:after", "b:after"]
        );
    }

    #[tokio::test]
    async fn test_veto_stops_at_first_hook() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = HookChain::default();
        chain.register(Arc::new(Recorder {
            name: "quota".to_string(),
            veto: true,
            log: log.clone(),
        }));
        chain.register(Arc::new(Recorder {
            name: "never".to_string(),
            veto: false,
            log: log.clone(),
        }));

        let err = chain.pre_check(&ctx()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExtensionVetoed);
        assert!(err.to_string().contains("quota"));
        assert_eq!(*log.lock(), vec!["quota:pre"]);
    }
}
