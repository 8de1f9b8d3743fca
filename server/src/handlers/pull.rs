//! Pull handler - serves forms and submissions changed since a checkpoint.

use super::{parse_since, to_rfc3339};
use crate::db::{Db, StoredForm, StoredSubmission};
use crate::error::Result;
use formsync_engine::{clock::now_millis, Timestamp};
use serde::{Deserialize, Serialize};

/// Query parameters for pull sync.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullQuery {
    /// RFC 3339 checkpoint from the previous pull (absent for initial sync)
    pub since: Option<String>,
    /// Maximum number of items to return
    pub limit: Option<usize>,
}

/// A changed record, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SyncItem {
    Form(StoredForm),
    Submission(StoredSubmission),
}

impl SyncItem {
    /// When the server last changed this record.
    pub fn changed_at(&self) -> Timestamp {
        match self {
            SyncItem::Form(form) => form.updated_at,
            SyncItem::Submission(submission) => submission.received_at,
        }
    }
}

/// Response for pull sync.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullResponse {
    /// Changes after `since`, oldest first
    pub items: Vec<SyncItem>,
    /// Checkpoint to send as `since` on the next pull
    pub timestamp: String,
    /// Whether more changes remain past this page
    pub has_more: bool,
}

/// Process a pull request from a client.
///
/// `limit` is clamped to `max_limit`. A page never splits records that share
/// a change time, so the returned checkpoint is always safe to resume from.
pub fn handle_pull(db: &Db, query: PullQuery, max_limit: usize) -> Result<PullResponse> {
    let since = match query.since.as_deref() {
        Some(raw) => parse_since(raw)?,
        None => 0,
    };
    let limit = query
        .limit
        .map(|l| l.clamp(1, max_limit))
        .unwrap_or(max_limit);

    // Read the clock before scanning. The checkpoint backs off one
    // millisecond so writes landing in the same millisecond as the scan are
    // seen again rather than skipped; clients apply items idempotently.
    let now = now_millis();

    let mut items: Vec<SyncItem> = db
        .forms_changed_since(since)
        .into_iter()
        .map(SyncItem::Form)
        .chain(
            db.submissions_received_since(since)
                .into_iter()
                .map(SyncItem::Submission),
        )
        .collect();
    items.sort_by_key(SyncItem::changed_at);

    let mut has_more = false;
    if items.len() > limit {
        let boundary = items[limit - 1].changed_at();
        let cut = items
            .iter()
            .position(|item| item.changed_at() > boundary)
            .unwrap_or(items.len());
        has_more = cut < items.len();
        items.truncate(cut);
    }

    let checkpoint = match items.last() {
        Some(last) if has_more => last.changed_at(),
        _ => now.saturating_sub(1).max(since),
    };

    tracing::debug!(since, returned = items.len(), has_more, "pull served");

    Ok(PullResponse {
        items,
        timestamp: to_rfc3339(checkpoint)?,
        has_more,
    })
}
