#![allow(clippy::doc_markdown)] // Allow technical terms in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Resource Orchestrator
//!
//! Control-plane core for orchestrating lifecycle operations on managed
//! backend resources (backup stores, storage pools) that are remote and
//! failure-prone.
//!
//! ## Overview
//!
//! The hard problem is not CRUD on resource records but safe, observable and
//! recoverable orchestration of asynchronous multi-step operations against
//! resources that may be slow, unreachable or already mid-transition.
//!
//! ## Architecture
//!
//! An inbound command is routed by the [`messaging::MessageBus`] to the
//! [`resource::ResourceBase`] owning the target UUID. The handler gate-checks
//! it against the resource's state and status, runs exclusive work through
//! the [`sync::SyncSerializer`], calls the pluggable [`driver::ResourceDriver`]
//! and replies exactly once. Committed changes are broadcast as
//! [`events::CanonicalEvent`]s.
//!
//! ## Module Organization
//!
//! - [`messaging`] - Addressed messages, single-reply envelopes and the bus
//! - [`completion`] - Exactly-once success/failure continuation
//! - [`sync`] - Per-signature serializer
//! - [`state_machine`] - States, statuses, transition table, permission gate and hooks
//! - [`flow`] - Rollback-capable pipelines
//! - [`cascade`] - Dependent broadcast and deletion modes
//! - [`health`] - Periodic liveness checks
//! - [`resource`] - Per-resource orchestrator, shared context and manager
//! - [`store`] - External store interface and an in-memory implementation
//! - [`driver`] - Backend driver contract
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use resource_orchestrator::config::OrchestratorConfig;
//! use resource_orchestrator::messaging::Command;
//! use resource_orchestrator::models::NewResource;
//! use resource_orchestrator::resource::{OrchestratorContext, ResourceManager};
//! use resource_orchestrator::store::InMemoryResourceStore;
//!
//! # async fn example(factory: Arc<dyn resource_orchestrator::driver::DriverFactory>)
//! #     -> resource_orchestrator::error::OrchestrationResult<()> {
//! let ctx = OrchestratorContext::from_config(
//!     OrchestratorConfig::default(),
//!     Arc::new(InMemoryResourceStore::new()),
//! );
//! let manager = ResourceManager::new(ctx);
//! manager.register_factory(factory);
//!
//! let added = manager
//!     .add_resource(NewResource::new("bs-1", "sftp", 100 * 1024))
//!     .await?;
//! manager.send(added.inventory.id, Command::Scan).await?;
//! # Ok(())
//! # }
//! ```

pub mod cascade;
pub mod completion;
pub mod config;
pub mod constants;
pub mod driver;
pub mod error;
pub mod events;
pub mod flow;
pub mod health;
pub mod logging;
pub mod messaging;
pub mod models;
pub mod resource;
pub mod state_machine;
pub mod store;
pub mod sync;

pub use completion::{Completion, CompletionFuture};
pub use error::{ErrorKind, OrchestrationError, OrchestrationResult};
pub use messaging::{Command, MessageBus, ReplyPayload};
pub use resource::{OrchestratorContext, ResourceBase, ResourceManager};
pub use state_machine::{ResourceState, ResourceStatus, StateEvent};
