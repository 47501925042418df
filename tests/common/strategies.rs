//! Proptest strategies for resource orchestration inputs

use proptest::prelude::*;

use resource_orchestrator::state_machine::{ResourceState, StateEvent};

pub fn resource_state_strategy() -> impl Strategy<Value = ResourceState> {
    prop_oneof![
        Just(ResourceState::Enabled),
        Just(ResourceState::Disabled),
        Just(ResourceState::PendingDelete),
        Just(ResourceState::Deleted),
    ]
}

pub fn state_event_strategy() -> impl Strategy<Value = StateEvent> {
    prop_oneof![
        Just(StateEvent::Enable),
        Just(StateEvent::Disable),
        Just(StateEvent::PreDelete),
        Just(StateEvent::Recover),
        Just(StateEvent::Delete),
    ]
}

/// `(total, available)` with `available <= total`
pub fn capacity_strategy() -> impl Strategy<Value = (u64, u64)> {
    (1u64..10_000).prop_flat_map(|total| (Just(total), 0..=total))
}

/// Sizes of a sequence of capacity returns, occasionally larger than any total
pub fn capacity_returns_strategy() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(prop_oneof![4 => 0u64..500, 1 => 10_000u64..20_000], 0..20)
}

/// Signature index per submitted task; few signatures so tasks collide
pub fn signature_plan_strategy() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(0usize..3, 1..24)
}
