//! Permission table gating commands by administrative state and operational status.

use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use super::states::{ResourceState, ResourceStatus};
use crate::error::{OrchestrationError, OrchestrationResult};
use crate::messaging::CommandKind;

/// Allowed states and statuses for one command kind. `None` means any.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Permission {
    pub states: Option<Vec<ResourceState>>,
    pub statuses: Option<Vec<ResourceStatus>>,
}

impl Permission {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn states(mut self, states: &[ResourceState]) -> Self {
        self.states = Some(states.to_vec());
        self
    }

    pub fn statuses(mut self, statuses: &[ResourceStatus]) -> Self {
        self.statuses = Some(statuses.to_vec());
        self
    }
}

/// Static permission table keyed by command kind
#[derive(Debug, Clone)]
pub struct OperationGate {
    table: HashMap<CommandKind, Permission>,
}

impl Default for OperationGate {
    fn default() -> Self {
        use ResourceState::*;
        use ResourceStatus::*;

        let workload = Permission::any().states(&[Enabled]).statuses(&[Connected]);
        let connectivity = Permission::any().states(&[Enabled, Disabled]);

        let table = HashMap::from([
            (CommandKind::Download, workload.clone()),
            (CommandKind::DeleteBits, workload.clone()),
            (CommandKind::Scan, workload),
            (CommandKind::AttachToZone, Permission::any().states(&[Enabled, Disabled])),
            (
                CommandKind::DetachFromZone,
                Permission::any().states(&[Enabled, Disabled, PendingDelete]),
            ),
            (CommandKind::Connect, connectivity.clone()),
            (CommandKind::Reconnect, connectivity.clone()),
            (CommandKind::Ping, connectivity),
            (
                CommandKind::Delete,
                Permission::any().states(&[Enabled, Disabled, PendingDelete]),
            ),
        ]);
        Self { table }
    }
}

impl OperationGate {
    /// A gate that allows everything
    pub fn permissive() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// Replace the permission of one command kind
    pub fn with_permission(mut self, kind: CommandKind, permission: Permission) -> Self {
        self.table.insert(kind, permission);
        self
    }

    pub fn permission(&self, kind: CommandKind) -> Option<&Permission> {
        self.table.get(&kind)
    }

    pub fn is_state_allowed(&self, kind: CommandKind, state: ResourceState) -> bool {
        self.table
            .get(&kind)
            .and_then(|p| p.states.as_ref())
            .map_or(true, |states| states.contains(&state))
    }

    pub fn is_status_allowed(&self, kind: CommandKind, status: ResourceStatus) -> bool {
        self.table
            .get(&kind)
            .and_then(|p| p.statuses.as_ref())
            .map_or(true, |statuses| statuses.contains(&status))
    }

    /// Status gate, then state gate. Pure: rejection never mutates anything.
    pub fn check(
        &self,
        resource_id: Uuid,
        kind: CommandKind,
        state: ResourceState,
        status: ResourceStatus,
    ) -> OrchestrationResult<()> {
        if !self.is_status_allowed(kind, status) {
            debug!(resource_id = %resource_id, command = %kind, status = %status, "🚫 GATE: Status denied");
            return Err(OrchestrationError::IllegalOperation {
                resource_id,
                operation: kind.to_string(),
                reason: format!("status is {status}"),
            });
        }
        if !self.is_state_allowed(kind, state) {
            debug!(resource_id = %resource_id, command = %kind, state = %state, "🚫 GATE: State denied");
            return Err(OrchestrationError::IllegalOperation {
                resource_id,
                operation: kind.to_string(),
                reason: format!("state is {state}"),
            });
        }
        Ok(())
    }
}
