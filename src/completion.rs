//! # Completion
//!
//! Two-outcome continuation bound to exactly one pending asynchronous
//! operation. A [`Completion`] is consumed by [`Completion::success_with`] or
//! [`Completion::fail`], so signalling twice does not compile. Dropping it
//! without an outcome signals an `Internal` failure, so a crashed or forgetful
//! handler still reports to whoever is waiting.
//!
//! ```rust
//! use resource_orchestrator::completion::Completion;
//!
//! # tokio_test::block_on(async {
//! let (completion, outcome) = Completion::<u64>::channel("reserve-capacity");
//! tokio::spawn(async move { completion.success_with(42) });
//! assert_eq!(outcome.await.unwrap(), 42);
//! # });
//! ```

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tracing::warn;

use crate::error::{OrchestrationError, OrchestrationResult};

/// Sending half of a single-outcome continuation
#[derive(Debug)]
pub struct Completion<T = ()> {
    operation: String,
    sender: Option<oneshot::Sender<OrchestrationResult<T>>>,
}

/// Receiving half; resolves to the outcome signalled by the paired [`Completion`]
#[derive(Debug)]
pub struct CompletionFuture<T = ()> {
    operation: String,
    receiver: oneshot::Receiver<OrchestrationResult<T>>,
}

impl<T> Completion<T> {
    /// Create a connected completion / future pair for `operation`
    pub fn channel(operation: impl Into<String>) -> (Self, CompletionFuture<T>) {
        let operation = operation.into();
        let (sender, receiver) = oneshot::channel();
        (
            Self {
                operation: operation.clone(),
                sender: Some(sender),
            },
            CompletionFuture {
                operation,
                receiver,
            },
        )
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// True while the waiting side still listens for the outcome
    pub fn is_waiting(&self) -> bool {
        self.sender.as_ref().is_some_and(|s| !s.is_closed())
    }

    pub fn success_with(mut self, value: T) {
        self.signal(Ok(value));
    }

    pub fn fail(mut self, error: OrchestrationError) {
        self.signal(Err(error));
    }

    /// Signal whichever outcome `result` holds
    pub fn complete(mut self, result: OrchestrationResult<T>) {
        self.signal(result);
    }

    fn signal(&mut self, result: OrchestrationResult<T>) {
        if let Some(sender) = self.sender.take() {
            if sender.send(result).is_err() {
                tracing::debug!(operation = %self.operation, "Completion outcome dropped: no one waiting");
            }
        }
    }
}

impl Completion<()> {
    pub fn success(self) {
        self.success_with(());
    }
}

impl<T> Drop for Completion<T> {
    fn drop(&mut self) {
        if self.sender.is_some() {
            warn!(
                operation = %self.operation,
                "⚠️ COMPLETION: Dropped without success or failure"
            );
            let operation = self.operation.clone();
            self.signal(Err(OrchestrationError::Internal(format!(
                "operation[{operation}] finished without signalling its completion"
            ))));
        }
    }
}

impl<T> Future for CompletionFuture<T> {
    type Output = OrchestrationResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(OrchestrationError::Internal(format!(
                "operation[{}] completion channel closed",
                self.operation
            )))),
            Poll::Pending => Poll::Pending,
        }
    }
}
