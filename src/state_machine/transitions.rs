//! Static transition tables for the administrative state machine and the
//! operational status machine.

use super::events::StateEvent;
use super::states::{ResourceState, ResourceStatus};
use crate::error::{OrchestrationError, OrchestrationResult};

/// Every defined `(current, event) -> next` administrative transition
pub const STATE_TRANSITIONS: &[(ResourceState, StateEvent, ResourceState)] = &[
    (ResourceState::Enabled, StateEvent::Enable, ResourceState::Enabled),
    (ResourceState::Enabled, StateEvent::Disable, ResourceState::Disabled),
    (ResourceState::Disabled, StateEvent::Enable, ResourceState::Enabled),
    (ResourceState::Disabled, StateEvent::Disable, ResourceState::Disabled),
    (ResourceState::Enabled, StateEvent::PreDelete, ResourceState::PendingDelete),
    (ResourceState::Disabled, StateEvent::PreDelete, ResourceState::PendingDelete),
    (ResourceState::PendingDelete, StateEvent::Recover, ResourceState::Disabled),
    (ResourceState::PendingDelete, StateEvent::Delete, ResourceState::Deleted),
];

/// Look up the next administrative state.
///
/// Pure; an event not defined for `current` yields `IllegalTransition`.
pub fn next_state(current: ResourceState, event: StateEvent) -> OrchestrationResult<ResourceState> {
    STATE_TRANSITIONS
        .iter()
        .find(|(from, on, _)| *from == current && *on == event)
        .map(|(_, _, to)| *to)
        .ok_or_else(|| OrchestrationError::IllegalTransition {
            from: current.to_string(),
            event: event.to_string(),
        })
}

/// Status moves follow connectivity checks, so every change between distinct
/// values is defined. Same-value requests are no-ops.
pub fn is_status_transition_defined(from: ResourceStatus, to: ResourceStatus) -> bool {
    from != to
}
