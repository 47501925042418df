//! Broadcast of cascade actions to dependent-resource extensions.

use async_trait::async_trait;
use futures::FutureExt;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::deletion::DeletionMode;
use crate::error::{panic_message, OrchestrationError, OrchestrationResult};
use crate::models::ResourceInventory;

/// Action propagated to dependents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeAction {
    /// Ask every dependent whether deletion may proceed; any refusal vetoes
    DeletionCheck,
    /// Dependents detach or release what they hold
    DeletionDelete,
    /// Same as delete, without a prior check round
    DeletionForceDelete,
    /// Advisory after-the-fact cleanup
    DeletionCleanup,
}

impl CascadeAction {
    pub fn code(&self) -> &'static str {
        match self {
            Self::DeletionCheck => "deletion_check",
            Self::DeletionDelete => "deletion_delete",
            Self::DeletionForceDelete => "deletion_force_delete",
            Self::DeletionCleanup => "deletion_cleanup",
        }
    }
}

impl fmt::Display for CascadeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// What a cascade is about
#[derive(Debug, Clone)]
pub struct CascadeContext {
    pub resource_id: Uuid,
    pub resource_type: String,
    pub mode: DeletionMode,
    pub inventory: ResourceInventory,
}

/// A dependent of a resource that reacts to cascade actions
#[async_trait]
pub trait CascadeExtension: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this dependent cares about resources of `resource_type`
    fn applies_to(&self, _resource_type: &str) -> bool {
        true
    }

    async fn handle(&self, action: CascadeAction, ctx: &CascadeContext) -> OrchestrationResult<()>;
}

/// Registry and broadcaster of cascade extensions
#[derive(Default)]
pub struct CascadeFacade {
    extensions: RwLock<Vec<Arc<dyn CascadeExtension>>>,
}

impl fmt::Debug for CascadeFacade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CascadeFacade")
            .field("extensions", &self.extensions.read().len())
            .finish()
    }
}

impl CascadeFacade {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, extension: Arc<dyn CascadeExtension>) {
        info!(extension = extension.name(), "🔗 CASCADE: Registered dependent extension");
        self.extensions.write().push(extension);
    }

    fn dependents(&self, resource_type: &str) -> Vec<Arc<dyn CascadeExtension>> {
        self.extensions
            .read()
            .iter()
            .filter(|ext| ext.applies_to(resource_type))
            .cloned()
            .collect()
    }

    async fn dispatch(
        extension: &Arc<dyn CascadeExtension>,
        action: CascadeAction,
        ctx: &CascadeContext,
    ) -> OrchestrationResult<()> {
        AssertUnwindSafe(extension.handle(action, ctx))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| {
                Err(OrchestrationError::Internal(format!(
                    "cascade extension[{}] panicked: {}",
                    extension.name(),
                    panic_message(payload.as_ref())
                )))
            })
    }

    /// Broadcast `action`; the first failure aborts. A refusal during
    /// `DeletionCheck` is reported as `VetoedByDependent`.
    pub async fn async_cascade(
        &self,
        action: CascadeAction,
        ctx: &CascadeContext,
    ) -> OrchestrationResult<()> {
        for extension in self.dependents(&ctx.resource_type) {
            debug!(
                resource_id = %ctx.resource_id,
                action = %action,
                dependent = extension.name(),
                "Cascading action to dependent"
            );
            if let Err(error) = Self::dispatch(&extension, action, ctx).await {
                warn!(
                    resource_id = %ctx.resource_id,
                    action = %action,
                    dependent = extension.name(),
                    error = %error,
                    "⛔ CASCADE: Dependent failed action"
                );
                return Err(match (action, error) {
                    (_, vetoed @ OrchestrationError::VetoedByDependent { .. }) => vetoed,
                    (CascadeAction::DeletionCheck, other) => OrchestrationError::VetoedByDependent {
                        dependent: extension.name().to_string(),
                        reason: other.to_string(),
                    },
                    (_, other) => other,
                });
            }
        }
        Ok(())
    }

    /// Broadcast `action` to every dependent regardless of failures.
    /// Returns the failures, which callers treat as advisory.
    pub async fn async_cascade_full(
        &self,
        action: CascadeAction,
        ctx: &CascadeContext,
    ) -> Vec<OrchestrationError> {
        let mut failures = Vec::new();
        for extension in self.dependents(&ctx.resource_type) {
            if let Err(error) = Self::dispatch(&extension, action, ctx).await {
                warn!(
                    resource_id = %ctx.resource_id,
                    action = %action,
                    dependent = extension.name(),
                    error = %error,
                    "Dependent failed best-effort action"
                );
                failures.push(error);
            }
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::{NewResource, ResourceRecord};
    use parking_lot::Mutex;

    struct Dependent {
        name: &'static str,
        refuse: Option<CascadeAction>,
        seen: Arc<Mutex<Vec<(&'static str, CascadeAction)>>>,
    }

    #[async_trait]
    impl CascadeExtension for Dependent {
        fn name(&self) -> &str {
            self.name
        }

        async fn handle(&self, action: CascadeAction, _ctx: &CascadeContext) -> OrchestrationResult<()> {
            self.seen.lock().push((self.name, action));
            if self.refuse == Some(action) {
                return Err(OrchestrationError::internal("in use"));
            }
            Ok(())
        }
    }

    fn ctx() -> CascadeContext {
        let record = ResourceRecord::from_new(NewResource::new("bs", "mock", 10));
        CascadeContext {
            resource_id: record.id,
            resource_type: record.resource_type.clone(),
            mode: DeletionMode::Permissive,
            inventory: ResourceInventory::from_record(&record, vec![]),
        }
    }

    fn facade(refusals: [Option<CascadeAction>; 2]) -> (CascadeFacade, Arc<Mutex<Vec<(&'static str, CascadeAction)>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let facade = CascadeFacade::new();
        for (name, refuse) in ["first", "second"].into_iter().zip(refusals) {
            facade.register(Arc::new(Dependent {
                name,
                refuse,
                seen: seen.clone(),
            }));
        }
        (facade, seen)
    }

    #[tokio::test]
    async fn test_check_refusal_is_veto_and_stops_broadcast() {
        let (facade, seen) = facade([Some(CascadeAction::DeletionCheck), None]);
        let err = facade
            .async_cascade(CascadeAction::DeletionCheck, &ctx())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::VetoedByDependent);
        assert_eq!(seen.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_full_cascade_is_best_effort() {
        let (facade, seen) = facade([Some(CascadeAction::DeletionCleanup), None]);
        let failures = facade
            .async_cascade_full(CascadeAction::DeletionCleanup, &ctx())
            .await;
        assert_eq!(failures.len(), 1);
        assert_eq!(seen.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_non_check_failure_keeps_its_kind() {
        let (facade, _) = facade([None, Some(CascadeAction::DeletionDelete)]);
        let err = facade
            .async_cascade(CascadeAction::DeletionDelete, &ctx())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
