//! # Per-Resource Serializer
//!
//! Sync task chains keyed by a signature string. For one signature at most
//! `sync_level` tasks run at any instant (1 by default) and tasks start in
//! submission order. Disjoint signatures run concurrently.
//!
//! Each queued task owns a [`Completion`]; a failing or panicking task reports
//! through it and the chain advances to the next task.

use futures::FutureExt;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, error, trace};

use crate::completion::{Completion, CompletionFuture};
use crate::error::{panic_message, OrchestrationError, OrchestrationResult};

type QueuedJob = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

struct QueuedTask {
    name: String,
    job: QueuedJob,
}

struct SignatureQueue {
    pending: VecDeque<QueuedTask>,
    running: usize,
    sync_level: usize,
}

/// Serializes units of work per signature
#[derive(Clone)]
pub struct SyncSerializer {
    queues: Arc<Mutex<HashMap<String, SignatureQueue>>>,
    default_sync_level: usize,
}

impl std::fmt::Debug for SyncSerializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSerializer")
            .field("active_signatures", &self.active_signatures())
            .field("default_sync_level", &self.default_sync_level)
            .finish()
    }
}

impl Default for SyncSerializer {
    fn default() -> Self {
        Self::new(1)
    }
}

impl SyncSerializer {
    pub fn new(default_sync_level: usize) -> Self {
        Self {
            queues: Arc::new(Mutex::new(HashMap::new())),
            default_sync_level: default_sync_level.max(1),
        }
    }

    /// Enqueue `work` under `signature` with the default sync level.
    ///
    /// Await the returned future for synchronous submission; drop it for
    /// asynchronous submission (the task still runs).
    pub fn submit<T, F, Fut>(
        &self,
        signature: impl Into<String>,
        name: impl Into<String>,
        work: F,
    ) -> CompletionFuture<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = OrchestrationResult<T>> + Send + 'static,
    {
        self.submit_with_level(signature, self.default_sync_level, name, work)
    }

    /// Enqueue with an explicit sync level. The level is fixed by the first
    /// submission that creates the signature's queue.
    pub fn submit_with_level<T, F, Fut>(
        &self,
        signature: impl Into<String>,
        sync_level: usize,
        name: impl Into<String>,
        work: F,
    ) -> CompletionFuture<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = OrchestrationResult<T>> + Send + 'static,
    {
        let signature = signature.into();
        let name = name.into();
        let (completion, outcome) = Completion::channel(name.clone());
        let job = Self::wrap(signature.clone(), name.clone(), work, completion);

        let spawn_drainer = {
            let mut queues = self.queues.lock();
            let queue = queues
                .entry(signature.clone())
                .or_insert_with(|| SignatureQueue {
                    pending: VecDeque::new(),
                    running: 0,
                    sync_level: sync_level.max(1),
                });
            queue.pending.push_back(QueuedTask { name, job });
            if queue.running < queue.sync_level {
                queue.running += 1;
                true
            } else {
                trace!(
                    signature = %signature,
                    queued = queue.pending.len(),
                    "Task queued behind running task"
                );
                false
            }
        };

        if spawn_drainer {
            let serializer = self.clone();
            tokio::spawn(async move { serializer.drain(signature).await });
        }

        outcome
    }

    fn wrap<T, F, Fut>(
        signature: String,
        name: String,
        work: F,
        completion: Completion<T>,
    ) -> QueuedJob
    where
        T: Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = OrchestrationResult<T>> + Send + 'static,
    {
        Box::pin(async move {
            let result = AssertUnwindSafe(async move { work().await })
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| {
                    let message = panic_message(payload.as_ref());
                    error!(
                        signature = %signature,
                        task = %name,
                        panic = %message,
                        "💥 SERIALIZER: Task panicked, advancing chain"
                    );
                    Err(OrchestrationError::Internal(format!(
                        "sync task[{name}] panicked: {message}"
                    )))
                });
            completion.complete(result);
        })
    }

    async fn drain(&self, signature: String) {
        loop {
            let next = {
                let mut queues = self.queues.lock();
                let Some(queue) = queues.get_mut(&signature) else {
                    return;
                };
                match queue.pending.pop_front() {
                    Some(task) => task,
                    None => {
                        queue.running = queue.running.saturating_sub(1);
                        if queue.running == 0 {
                            queues.remove(&signature);
                        }
                        return;
                    }
                }
            };

            debug!(signature = %signature, task = %next.name, "🔒 SERIALIZER: Running task");
            next.job.await;
        }
    }

    /// Signatures with running or queued work
    pub fn active_signatures(&self) -> usize {
        self.queues.lock().len()
    }

    pub fn is_idle(&self) -> bool {
        self.queues.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_signature_runs_in_order_exclusively() {
        let serializer = SyncSerializer::default();
        let log = Arc::new(Mutex::new(Vec::new()));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let mut outcomes = Vec::new();

        for i in 0..10 {
            let log = log.clone();
            let in_flight = in_flight.clone();
            outcomes.push(serializer.submit("resource-a", format!("task-{i}"), move || async move {
                assert_eq!(in_flight.fetch_add(1, Ordering::SeqCst), 0);
                tokio::time::sleep(Duration::from_millis(2)).await;
                log.lock().push(i);
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(i)
            }));
        }

        for (i, outcome) in outcomes.into_iter().enumerate() {
            assert_eq!(outcome.await.unwrap(), i);
        }
        assert_eq!(*log.lock(), (0..10).collect::<Vec<_>>());
        assert!(serializer.is_idle());
    }

    #[tokio::test]
    async fn test_failure_and_panic_do_not_stall_chain() {
        let serializer = SyncSerializer::default();

        let failing = serializer.submit("sig", "fails", || async {
            Err::<(), _>(OrchestrationError::backend("connect", "refused"))
        });
        let panicking = serializer.submit("sig", "panics", || async {
            let fault: Option<()> = None;
            fault.unwrap_or_else(|| panic!("boom"));
            Ok::<(), OrchestrationError>(())
        });
        let following = serializer.submit("sig", "follows", || async { Ok("ran") });

        assert_eq!(failing.await.unwrap_err().kind(), ErrorKind::BackendFailure);
        let panicked = panicking.await.unwrap_err();
        assert_eq!(panicked.kind(), ErrorKind::Internal);
        assert!(panicked.to_string().contains("boom"));
        assert_eq!(following.await.unwrap(), "ran");
    }

    #[tokio::test]
    async fn test_disjoint_signatures_run_concurrently() {
        let serializer = SyncSerializer::default();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        let blocked = serializer.submit("sig-a", "blocked", move || async move {
            release_rx.await.map_err(|_| OrchestrationError::internal("released"))?;
            Ok(())
        });
        let other = serializer.submit("sig-b", "independent", || async { Ok(7) });

        assert_eq!(
            tokio::time::timeout(Duration::from_secs(1), other).await.unwrap().unwrap(),
            7
        );
        release_tx.send(()).unwrap();
        blocked.await.unwrap();
    }

    #[tokio::test]
    async fn test_dropped_outcome_still_runs_task() {
        let serializer = SyncSerializer::default();
        let ran = Arc::new(AtomicUsize::new(0));
        let counter = ran.clone();
        drop(serializer.submit("sig", "async", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));
        serializer.submit("sig", "barrier", || async { Ok(()) }).await.unwrap();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_sync_level_allows_bounded_parallelism() {
        let serializer = SyncSerializer::default();
        let peak = Arc::new(AtomicUsize::new(0));
        let current = Arc::new(AtomicUsize::new(0));
        let mut outcomes = Vec::new();
        for i in 0..6 {
            let peak = peak.clone();
            let current = current.clone();
            outcomes.push(serializer.submit_with_level("pool", 2, format!("t{i}"), move || async move {
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                current.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }));
        }
        for outcome in outcomes {
            outcome.await.unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }
}
