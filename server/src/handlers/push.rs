//! Push handler - accepts queued submissions from offline clients.

use super::submissions::{ingest, Rejection};
use super::to_rfc3339;
use crate::db::Db;
use crate::error::Result;
use formsync_engine::{clock::now_millis, OfflineSubmission, SubmissionId};
use serde::{Deserialize, Serialize};

/// Request body for push sync.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushRequest {
    /// Submissions drained from the client's offline queue
    pub items: Vec<OfflineSubmission>,
}

/// Response for push sync.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushResponse {
    /// Items stored now or already stored by an earlier push
    pub synced: usize,
    /// Items that were not stored
    pub failed: usize,
    /// Details for each failed item
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<RejectedItem>,
    /// Server time of this push (RFC 3339)
    pub timestamp: String,
}

/// A rejected item with reason.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedItem {
    pub id: SubmissionId,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<serde_json::Value>,
}

/// Process a push request from a client.
///
/// Each item is handled on its own: one bad item never blocks the others.
/// Re-pushing an already stored id counts as synced.
pub fn handle_push(db: &Db, request: PushRequest) -> Result<PushResponse> {
    let mut synced = 0;
    let mut rejected = Vec::new();

    for item in request.items {
        let id = item.id.clone();
        match ingest(db, item) {
            Ok((_, inserted)) => {
                if !inserted {
                    tracing::debug!(%id, "duplicate push, already stored");
                }
                synced += 1;
            }
            Err(Rejection::UnknownForm(form_id)) => {
                rejected.push(RejectedItem {
                    id,
                    reason: format!("unknown form {form_id}"),
                    errors: None,
                });
            }
            Err(Rejection::Invalid(result)) => {
                rejected.push(RejectedItem {
                    id,
                    reason: "validation failed".to_string(),
                    errors: serde_json::to_value(&result.errors).ok(),
                });
            }
        }
    }

    if !rejected.is_empty() {
        tracing::warn!(synced, failed = rejected.len(), "push had rejected items");
    }

    Ok(PushResponse {
        synced,
        failed: rejected.len(),
        rejected,
        timestamp: to_rfc3339(now_millis())?,
    })
}
