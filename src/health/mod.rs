//! # Health
//!
//! Connectivity supervision of tracked resources.

pub mod supervisor;

pub use supervisor::HealthSupervisor;
