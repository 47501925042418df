//! # Cascade
//!
//! Propagation of an operation on one resource to the resources depending on
//! it. Deletion is the cascading operation: its pipeline broadcasts check and
//! delete actions to registered dependents before the resource removes itself.

pub mod deletion;
pub mod facade;

pub use deletion::{CascadeFlow, DeletionMode, DeletionPhase};
pub use facade::{CascadeAction, CascadeContext, CascadeExtension, CascadeFacade};
