// State machine module for resource orchestration
//
// Two orthogonal machines per resource: the administrative state driven by
// events through a static transition table, and the operational status driven
// by connectivity checks. A permission gate and lifecycle hooks sit around both.

pub mod events;
pub mod gate;
pub mod hooks;
pub mod states;
pub mod transitions;

// Re-export main types for convenient access
pub use events::StateEvent;
pub use gate::{OperationGate, Permission};
pub use hooks::{
    HookChain, LifecycleHook, LifecycleHooks, ResourceDeletion, StateTransition,
    StatusTransition, ZoneChange,
};
pub use states::{ResourceState, ResourceStatus};
pub use transitions::{is_status_transition_defined, next_state, STATE_TRANSITIONS};
