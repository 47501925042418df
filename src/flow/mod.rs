//! # Flow
//!
//! Rollback-capable sequential pipelines for multi-step operations.

pub mod pipeline;

pub use pipeline::{Flow, FlowChain, FlowData};
