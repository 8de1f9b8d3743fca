//! Submissions captured while the server could not be reached.

use crate::{FormId, FormValues, SubmissionId, Timestamp};
use serde::{Deserialize, Serialize};

/// Length of the random suffix in generated submission ids.
const ID_SUFFIX_LEN: usize = 9;

/// A form response waiting to be delivered.
///
/// `D` is the payload type; it defaults to a JSON object of field values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineSubmission<D = FormValues> {
    /// `"{timestamp}-{random}"`; unique enough for one device's queue
    pub id: SubmissionId,
    pub form_id: FormId,
    pub data: D,
    /// Creation time (milliseconds since epoch)
    pub timestamp: Timestamp,
    /// Failed delivery attempts so far
    #[serde(default)]
    pub retries: u32,
}

impl<D> OfflineSubmission<D> {
    /// Create a submission with a freshly generated id.
    pub fn new(form_id: impl Into<FormId>, data: D, timestamp: Timestamp) -> Self {
        Self {
            id: generate_id(timestamp),
            form_id: form_id.into(),
            data,
            timestamp,
            retries: 0,
        }
    }
}

/// Generate a submission id from a timestamp and a random suffix.
pub fn generate_id(timestamp: Timestamp) -> SubmissionId {
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", timestamp, &random[..ID_SUFFIX_LEN])
}
