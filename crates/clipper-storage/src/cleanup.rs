//! Delayed artifact cleanup.
//!
//! Requests hand their artifacts to a [`CleanupScheduler`] and return
//! immediately. A single [`CleanupWorker`] owns a timer queue and deletes each
//! batch once its grace period has elapsed, independently of the request that
//! scheduled it.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::time::DelayQueue;
use tracing::{debug, info, warn};

use crate::store::ArtifactStore;

/// A batch of artifacts to delete after `delay`.
#[derive(Debug)]
struct CleanupRequest {
    paths: Vec<PathBuf>,
    delay: Duration,
}

/// Handle used by request handlers to schedule deletions.
#[derive(Debug, Clone)]
pub struct CleanupScheduler {
    tx: mpsc::UnboundedSender<CleanupRequest>,
    store: ArtifactStore,
}

impl CleanupScheduler {
    /// Schedule deletion of `paths` after `delay`. Never blocks.
    ///
    /// If the worker is no longer running the batch is handed to a detached
    /// timer task instead, so the deletion still happens.
    pub fn schedule(&self, paths: Vec<PathBuf>, delay: Duration) {
        if paths.is_empty() {
            return;
        }
        debug!(count = paths.len(), delay_secs = delay.as_secs(), "Scheduling artifact cleanup");

        if let Err(mpsc::error::SendError(request)) = self.tx.send(CleanupRequest { paths, delay }) {
            warn!("Cleanup worker is not running, using a detached timer");
            let store = self.store.clone();
            tokio::spawn(async move {
                tokio::time::sleep(request.delay).await;
                store.delete_all(&request.paths).await;
            });
        }
    }
}

/// Background task deleting artifacts when their grace period expires.
pub struct CleanupWorker {
    rx: mpsc::UnboundedReceiver<CleanupRequest>,
    store: ArtifactStore,
    queue: DelayQueue<u64>,
    pending: HashMap<u64, Vec<PathBuf>>,
    next_id: u64,
}

/// Create a connected scheduler/worker pair for `store`.
pub fn cleanup_channel(store: ArtifactStore) -> (CleanupScheduler, CleanupWorker) {
    let (tx, rx) = mpsc::unbounded_channel();
    let scheduler = CleanupScheduler {
        tx,
        store: store.clone(),
    };
    let worker = CleanupWorker {
        rx,
        store,
        queue: DelayQueue::new(),
        pending: HashMap::new(),
        next_id: 0,
    };
    (scheduler, worker)
}

impl CleanupWorker {
    /// Run until `shutdown` fires, or until every scheduler is dropped and
    /// the queue has drained. Batches still pending at shutdown are deleted
    /// immediately.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!("Cleanup worker started");
        let mut accepting = true;

        loop {
            if !accepting && self.queue.is_empty() {
                break;
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,

                request = self.rx.recv(), if accepting => match request {
                    Some(request) => self.enqueue(request),
                    None => accepting = false,
                },

                Some(expired) = self.queue.next(), if !self.queue.is_empty() => {
                    let id = expired.into_inner();
                    if let Some(paths) = self.pending.remove(&id) {
                        self.store.delete_all(&paths).await;
                    }
                }
            }
        }

        self.flush().await;
        info!("Cleanup worker stopped");
    }

    fn enqueue(&mut self, request: CleanupRequest) {
        let id = self.next_id;
        self.next_id += 1;
        self.queue.insert(id, request.delay);
        self.pending.insert(id, request.paths);
    }

    async fn flush(&mut self) {
        // Requests that were sent but not yet received count as pending too.
        while let Ok(request) = self.rx.try_recv() {
            self.enqueue(request);
        }
        if self.pending.is_empty() {
            return;
        }

        info!(batches = self.pending.len(), "Flushing pending artifact cleanup");
        self.queue.clear();
        for (_, paths) in self.pending.drain() {
            self.store.delete_all(&paths).await;
        }
    }
}
