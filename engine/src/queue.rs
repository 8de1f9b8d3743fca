//! The offline queue: submissions waiting for a connection.
//!
//! The queue is the only writer of its storage slot. Every mutation reads
//! the stored queue, changes it, and writes it back whole, under a lock so
//! concurrent callers never lose each other's entries.
//!
//! Storage failures never reach the caller: a queue that cannot be read is
//! treated as empty and a failed write is logged and dropped.

use crate::{
    clock::{Clock, SystemClock},
    storage::QueueStorage,
    FormId, FormValues, OfflineSubmission, SubmissionId,
};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::{Mutex, MutexGuard};

/// Durable, ordered queue of pending submissions.
pub struct OfflineQueue<S, D = FormValues> {
    storage: S,
    clock: Box<dyn Clock>,
    lock: Mutex<()>,
    _payload: PhantomData<fn() -> D>,
}

impl<S, D> OfflineQueue<S, D>
where
    S: QueueStorage,
    D: Serialize + DeserializeOwned + Clone,
{
    /// Create a queue over `storage`, stamping entries with the system clock.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            clock: Box::new(SystemClock),
            lock: Mutex::new(()),
            _payload: PhantomData,
        }
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Build a submission stamped with the queue's clock without storing it.
    pub fn new_submission(&self, form_id: impl Into<FormId>, data: D) -> OfflineSubmission<D> {
        OfflineSubmission::new(form_id, data, self.clock.now())
    }

    /// Create a submission and append it to the queue.
    ///
    /// The returned record is correct even if persisting it failed.
    pub fn queue_submission(&self, form_id: impl Into<FormId>, data: D) -> OfflineSubmission<D> {
        let submission = self.new_submission(form_id, data);
        self.enqueue(submission.clone());
        tracing::debug!(id = %submission.id, form_id = %submission.form_id, "submission queued");
        submission
    }

    /// Append an existing submission to the queue.
    pub fn enqueue(&self, submission: OfflineSubmission<D>) {
        let _guard = self.guard();
        let mut queue = self.read();
        queue.push(submission);
        self.write(&queue);
    }

    /// All queued submissions in insertion order. Empty if storage is
    /// missing or unreadable.
    pub fn get_queue(&self) -> Vec<OfflineSubmission<D>> {
        let _guard = self.guard();
        self.read()
    }

    pub fn len(&self) -> usize {
        self.get_queue().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every queued submission.
    pub fn clear(&self) {
        let _guard = self.guard();
        if let Err(e) = self.storage.clear() {
            tracing::warn!(error = %e, "failed to clear offline queue");
        }
    }

    /// Record the outcome of a delivery pass: `sent` ids are removed and
    /// `failed` ids get one more retry. Entries added since the pass
    /// started are left untouched.
    pub fn settle(&self, sent: &[SubmissionId], failed: &[SubmissionId]) {
        let sent: HashSet<&str> = sent.iter().map(String::as_str).collect();
        let failed: HashSet<&str> = failed.iter().map(String::as_str).collect();

        let _guard = self.guard();
        let mut queue = self.read();
        queue.retain(|s| !sent.contains(s.id.as_str()));
        for submission in queue.iter_mut() {
            if failed.contains(submission.id.as_str()) {
                submission.retries += 1;
            }
        }
        self.write(&queue);
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn read(&self) -> Vec<OfflineSubmission<D>> {
        let raw = match self.storage.load() {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read offline queue");
                return Vec::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "discarding unreadable offline queue");
            Vec::new()
        })
    }

    fn write(&self, queue: &[OfflineSubmission<D>]) {
        let result = serde_json::to_string(queue)
            .map_err(crate::Error::from)
            .and_then(|json| self.storage.save(&json));

        if let Err(e) = result {
            tracing::warn!(error = %e, len = queue.len(), "failed to persist offline queue");
        }
    }
}
