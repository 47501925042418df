//! Deletion pipeline steps that act on the resource itself.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::base::ResourceBase;
use crate::cascade::DeletionPhase;
use crate::constants::flow_keys::{PRIOR_STATE, PRIOR_UPDATED_AT};
use crate::error::{OrchestrationError, OrchestrationResult};
use crate::flow::{Flow, FlowData};
use crate::state_machine::{ResourceDeletion, ResourceState, StateEvent};

/// Moves the resource to `PendingDelete`; rollback restores the prior state
/// and modification time
pub struct MarkPendingDelete {
    base: ResourceBase,
}

impl MarkPendingDelete {
    pub fn new(base: ResourceBase) -> Self {
        Self { base }
    }
}

#[async_trait]
impl Flow for MarkPendingDelete {
    fn name(&self) -> &str {
        DeletionPhase::MarkPendingDelete.step_name()
    }

    async fn run(&self, data: &mut FlowData) -> OrchestrationResult<()> {
        let record = self.base.record().await?;
        data.insert(PRIOR_STATE.to_string(), serde_json::to_value(record.state)?);
        data.insert(PRIOR_UPDATED_AT.to_string(), serde_json::to_value(record.updated_at)?);
        if record.state == ResourceState::PendingDelete {
            debug!(resource_id = %record.id, "Already pending delete");
            return Ok(());
        }
        self.base.apply_state_event(StateEvent::PreDelete).await?;
        Ok(())
    }

    async fn rollback(&self, data: &mut FlowData) -> OrchestrationResult<()> {
        let prior = data
            .get(PRIOR_STATE)
            .cloned()
            .ok_or_else(|| OrchestrationError::internal("prior state missing from flow data"))?;
        let prior: ResourceState = serde_json::from_value(prior)?;
        let updated_at = data
            .get(PRIOR_UPDATED_AT)
            .cloned()
            .ok_or_else(|| OrchestrationError::internal("prior update time missing from flow data"))?;
        let updated_at: DateTime<Utc> = serde_json::from_value(updated_at)?;
        self.base.restore_state(prior, updated_at).await?;
        info!(resource_id = %self.base.resource_id(), state = %prior, "↩️ RESOURCE: Restored state after aborted deletion");
        Ok(())
    }
}

/// Final leaf: driver delete hook, delete hooks, untrack, record removal and
/// bus unregistration
pub struct DeleteSelf {
    base: ResourceBase,
}

impl DeleteSelf {
    pub fn new(base: ResourceBase) -> Self {
        Self { base }
    }

    async fn delete_self(&self, deletion: &ResourceDeletion) -> OrchestrationResult<()> {
        let ctx = self.base.context();
        let resource_id = deletion.resource_id;

        self.base.driver().delete(&deletion.inventory).await?;
        self.base.apply_state_event(StateEvent::Delete).await?;

        ctx.supervisor.untrack(resource_id);
        ctx.store.delete(resource_id).await?;
        ctx.bus.unregister(resource_id);
        Ok(())
    }
}

#[async_trait]
impl Flow for DeleteSelf {
    fn name(&self) -> &str {
        DeletionPhase::DeleteSelf.step_name()
    }

    async fn run(&self, _data: &mut FlowData) -> OrchestrationResult<()> {
        let deletion = ResourceDeletion {
            resource_id: self.base.resource_id(),
            inventory: self.base.inventory().await?,
        };
        let hooks = &self.base.context().hooks.delete;
        hooks.pre_check(&deletion).await?;
        hooks.before(&deletion).await;

        if let Err(e) = self.delete_self(&deletion).await {
            hooks.failed(&deletion, &e).await;
            return Err(e);
        }
        hooks.after(&deletion).await;

        info!(resource_id = %deletion.resource_id, name = %deletion.inventory.name, "🗑️ RESOURCE: Deleted");
        Ok(())
    }
}
