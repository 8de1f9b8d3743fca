//! Submission records.

use super::Db;
use dashmap::mapref::entry::Entry;
use formsync_engine::{FormId, FormValues, SubmissionId, Timestamp};
use serde::{Deserialize, Serialize};

/// A stored form response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSubmission {
    pub id: SubmissionId,
    pub form_id: FormId,
    pub data: FormValues,
    /// When the client captured the response
    pub submitted_at: Timestamp,
    /// When the server accepted it
    pub received_at: Timestamp,
}

impl Db {
    /// Submissions, optionally for one form, in order received.
    pub fn list_submissions(&self, form_id: Option<&str>) -> Vec<StoredSubmission> {
        let mut submissions: Vec<_> = self
            .submissions
            .iter()
            .filter(|s| form_id.map_or(true, |id| s.form_id == id))
            .map(|s| s.value().clone())
            .collect();
        submissions.sort_by(|a, b| {
            a.received_at
                .cmp(&b.received_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        submissions
    }

    pub fn get_submission(&self, id: &str) -> Option<StoredSubmission> {
        self.submissions.get(id).map(|s| s.value().clone())
    }

    /// Insert a submission unless one with the same id exists.
    ///
    /// Returns false if the id was already taken; the stored record is
    /// left unchanged, which makes retried deliveries idempotent.
    pub fn insert_submission(&self, submission: StoredSubmission) -> bool {
        match self.submissions.entry(submission.id.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(submission);
                true
            }
        }
    }

    /// Submissions received strictly after `since`, oldest first.
    pub fn submissions_received_since(&self, since: Timestamp) -> Vec<StoredSubmission> {
        let mut submissions: Vec<_> = self
            .submissions
            .iter()
            .filter(|s| s.received_at > since)
            .map(|s| s.value().clone())
            .collect();
        submissions.sort_by(|a, b| {
            a.received_at
                .cmp(&b.received_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        submissions
    }

    /// Remove every submission of a form. Returns how many were removed.
    pub fn delete_submissions_for(&self, form_id: &str) -> usize {
        let before = self.submissions.len();
        self.submissions.retain(|_, s| s.form_id != form_id);
        before - self.submissions.len()
    }
}
