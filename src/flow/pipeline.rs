//! # Flow Pipeline
//!
//! Ordered steps with forward and rollback actions. Steps run strictly in
//! append order over a shared mutable [`FlowData`] map. The first failure
//! stops the pipeline, rolls back every step whose forward action completed
//! (newest first, best effort) and invokes the error handler exactly once.
//! Normal completion invokes the done handler exactly once.
//!
//! ```rust
//! use async_trait::async_trait;
//! use resource_orchestrator::error::OrchestrationResult;
//! use resource_orchestrator::flow::{Flow, FlowChain, FlowData};
//!
//! struct Count;
//!
//! #[async_trait]
//! impl Flow for Count {
//!     fn name(&self) -> &str {
//!         "count"
//!     }
//!
//!     async fn run(&self, data: &mut FlowData) -> OrchestrationResult<()> {
//!         data.insert("count".into(), serde_json::json!(1));
//!         Ok(())
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let data = FlowChain::new("example").then(Count).start().await.unwrap();
//! assert_eq!(data["count"], 1);
//! # });
//! ```

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tracing::{debug, error, info, warn};

use crate::error::{panic_message, OrchestrationError, OrchestrationResult};

/// Context shared by every step of one pipeline run
pub type FlowData = HashMap<String, Value>;

type DoneHandler = Box<dyn FnOnce(FlowData) -> BoxFuture<'static, ()> + Send>;
type ErrorHandler =
    Box<dyn FnOnce(OrchestrationError, FlowData) -> BoxFuture<'static, ()> + Send>;

/// One step of a pipeline
#[async_trait]
pub trait Flow: Send + Sync {
    fn name(&self) -> &str;

    /// Forward action. An `Err` aborts the pipeline.
    async fn run(&self, data: &mut FlowData) -> OrchestrationResult<()>;

    /// Undo the forward action. Only called if `run` succeeded and a later step failed.
    async fn rollback(&self, _data: &mut FlowData) -> OrchestrationResult<()> {
        Ok(())
    }
}

/// Builder and executor for one pipeline run
pub struct FlowChain {
    name: String,
    steps: Vec<Box<dyn Flow>>,
    data: FlowData,
    done: Option<DoneHandler>,
    error: Option<ErrorHandler>,
}

impl std::fmt::Debug for FlowChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowChain")
            .field("name", &self.name)
            .field("steps", &self.step_names())
            .finish()
    }
}

impl FlowChain {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            data: FlowData::new(),
            done: None,
            error: None,
        }
    }

    /// Append a step
    pub fn then(mut self, step: impl Flow + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Seed the shared context before the first step
    pub fn with_data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    pub fn done<F, Fut>(mut self, handler: F) -> Self
    where
        F: FnOnce(FlowData) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.done = Some(Box::new(move |data| handler(data).boxed()));
        self
    }

    pub fn error<F, Fut>(mut self, handler: F) -> Self
    where
        F: FnOnce(OrchestrationError, FlowData) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.error = Some(Box::new(move |err, data| handler(err, data).boxed()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Execute the pipeline. Returns the final context on success or the
    /// failure that aborted it, after the terminal handler has run.
    pub async fn start(self) -> OrchestrationResult<FlowData> {
        let FlowChain {
            name,
            steps,
            mut data,
            done,
            error,
        } = self;

        info!(flow = %name, steps = steps.len(), "🌊 FLOW: Starting pipeline");

        let mut completed = 0;
        let mut failure = None;
        for step in &steps {
            debug!(flow = %name, step = step.name(), "▶️ FLOW: Running step");
            let outcome = AssertUnwindSafe(step.run(&mut data))
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| {
                    Err(OrchestrationError::Internal(format!(
                        "flow step[{}] panicked: {}",
                        step.name(),
                        panic_message(payload.as_ref())
                    )))
                });

            match outcome {
                Ok(()) => completed += 1,
                Err(e) => {
                    warn!(flow = %name, step = step.name(), error = %e, "⚠️ FLOW: Step failed, unwinding");
                    failure = Some(e);
                    break;
                }
            }
        }

        match failure {
            None => {
                info!(flow = %name, "✅ FLOW: Pipeline completed");
                if let Some(handler) = done {
                    handler(data.clone()).await;
                }
                Ok(data)
            }
            Some(err) => {
                Self::rollback(&name, &steps[..completed], &mut data).await;
                if let Some(handler) = error {
                    handler(err.clone(), data).await;
                }
                Err(err)
            }
        }
    }

    async fn rollback(name: &str, completed: &[Box<dyn Flow>], data: &mut FlowData) {
        for step in completed.iter().rev() {
            debug!(flow = %name, step = step.name(), "↩️ FLOW: Rolling back step");
            let outcome = AssertUnwindSafe(step.rollback(data)).catch_unwind().await;
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(
                    flow = %name,
                    step = step.name(),
                    error = %e,
                    "Rollback failed, continuing unwind"
                ),
                Err(payload) => error!(
                    flow = %name,
                    step = step.name(),
                    panic = %panic_message(payload.as_ref()),
                    "Rollback panicked, continuing unwind"
                ),
            }
        }
    }
}
