//! Delivery of queued submissions.
//!
//! The [`SyncManager`] composes an [`OfflineQueue`], a [`Connectivity`]
//! signal and a caller-supplied submit function. It never performs network
//! I/O itself: the submit function does, and reports failure by returning
//! `Err`.
//!
//! # Flush
//!
//! 1. Skip if offline or the queue is empty
//! 2. Submit each entry in order, one at a time
//! 3. Drop delivered entries, bump `retries` on the rest
//!
//! A flush makes one pass only. Flushes never run concurrently: a second
//! trigger waits for the running pass and then flushes whatever is left.

use crate::{
    connectivity::Connectivity, queue::OfflineQueue, storage::QueueStorage, FormId, FormValues,
    OfflineSubmission,
};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Counts from one flush pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct FlushReport {
    pub sent: usize,
    pub failed: usize,
}

/// What happened to a submission handed to [`SyncManager::submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome<D = FormValues> {
    /// Delivered immediately
    Sent(OfflineSubmission<D>),
    /// Stored for a later flush
    Queued(OfflineSubmission<D>),
}

impl<D> SubmitOutcome<D> {
    pub fn is_sent(&self) -> bool {
        matches!(self, SubmitOutcome::Sent(_))
    }

    pub fn submission(&self) -> &OfflineSubmission<D> {
        match self {
            SubmitOutcome::Sent(s) | SubmitOutcome::Queued(s) => s,
        }
    }
}

/// Drives delivery of the offline queue.
pub struct SyncManager<S, D = FormValues> {
    queue: Arc<OfflineQueue<S, D>>,
    connectivity: Connectivity,
    flush_lock: Arc<Mutex<()>>,
}

impl<S, D> Clone for SyncManager<S, D> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
            connectivity: self.connectivity.clone(),
            flush_lock: Arc::clone(&self.flush_lock),
        }
    }
}

impl<S, D> SyncManager<S, D>
where
    S: QueueStorage + 'static,
    D: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub fn new(queue: OfflineQueue<S, D>, connectivity: Connectivity) -> Self {
        Self::from_shared(Arc::new(queue), connectivity)
    }

    /// Use a queue that is also held elsewhere.
    pub fn from_shared(queue: Arc<OfflineQueue<S, D>>, connectivity: Connectivity) -> Self {
        Self {
            queue,
            connectivity,
            flush_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn queue(&self) -> &OfflineQueue<S, D> {
        &self.queue
    }

    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    /// Deliver now if online, otherwise (or if delivery fails) queue it.
    pub async fn submit<F, Fut, E>(
        &self,
        form_id: impl Into<FormId>,
        data: D,
        mut submit_fn: F,
    ) -> SubmitOutcome<D>
    where
        F: FnMut(OfflineSubmission<D>) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Display,
    {
        let submission = self.queue.new_submission(form_id, data);
        if !self.is_online() {
            self.queue.enqueue(submission.clone());
            return SubmitOutcome::Queued(submission);
        }

        match submit_fn(submission.clone()).await {
            Ok(()) => SubmitOutcome::Sent(submission),
            Err(e) => {
                tracing::warn!(id = %submission.id, error = %e, "submit failed, queueing");
                self.queue.enqueue(submission.clone());
                SubmitOutcome::Queued(submission)
            }
        }
    }

    /// Make one delivery pass over the queue.
    pub async fn flush_offline_queue<F, Fut, E>(&self, mut submit_fn: F) -> FlushReport
    where
        F: FnMut(OfflineSubmission<D>) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Display,
    {
        if !self.is_online() {
            return FlushReport::default();
        }

        let _pass = self.flush_lock.lock().await;
        let pending = self.queue.get_queue();
        if pending.is_empty() {
            return FlushReport::default();
        }

        let mut sent = Vec::new();
        let mut failed = Vec::new();
        for entry in pending {
            let id = entry.id.clone();
            match submit_fn(entry).await {
                Ok(()) => sent.push(id),
                Err(e) => {
                    tracing::warn!(%id, error = %e, "queued submission failed");
                    failed.push(id);
                }
            }
        }

        self.queue.settle(&sent, &failed);

        let report = FlushReport {
            sent: sent.len(),
            failed: failed.len(),
        };
        tracing::info!(sent = report.sent, failed = report.failed, "offline queue flushed");
        report
    }

    /// Flush in the background every time connectivity is restored.
    ///
    /// The listener stays active until [`OnlineListener::unregister`] is
    /// called or the handle is dropped. Must be called inside a tokio runtime.
    pub fn register_online_listener<F, Fut, E>(&self, submit_fn: F) -> OnlineListener
    where
        F: FnMut(OfflineSubmission<D>) -> Fut + Clone + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let mut rx = self.connectivity.subscribe();
        let manager = self.clone();

        let task = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let online = *rx.borrow_and_update();
                if !online {
                    continue;
                }

                let manager = manager.clone();
                let submit_fn = submit_fn.clone();
                tokio::spawn(async move {
                    manager.flush_offline_queue(submit_fn).await;
                });
            }
        });

        OnlineListener { task: Some(task) }
    }
}

/// Handle to a registered online listener.
#[must_use = "dropping the listener unregisters it"]
#[derive(Debug)]
pub struct OnlineListener {
    task: Option<JoinHandle<()>>,
}

impl OnlineListener {
    /// Stop reacting to connectivity changes. Flushes already started
    /// run to completion.
    pub fn unregister(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for OnlineListener {
    fn drop(&mut self) {
        self.stop();
    }
}
