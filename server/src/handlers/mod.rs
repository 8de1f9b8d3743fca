//! Request handlers for forms, submissions and sync.

mod forms;
mod pull;
mod push;
mod submissions;

pub use forms::*;
pub use pull::*;
pub use push::*;
pub use submissions::*;

use crate::error::{AppError, Result};
use formsync_engine::Timestamp;

/// Render a millisecond timestamp as RFC 3339 (UTC, millisecond precision).
pub fn to_rfc3339(millis: Timestamp) -> Result<String> {
    let millis = i64::try_from(millis)
        .map_err(|_| AppError::Internal(format!("timestamp out of range: {millis}")))?;
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
        .ok_or_else(|| AppError::Internal(format!("timestamp out of range: {millis}")))
}

/// Parse an RFC 3339 `since` value into milliseconds. Instants before the
/// epoch clamp to 0.
pub fn parse_since(raw: &str) -> Result<Timestamp> {
    let parsed = chrono::DateTime::parse_from_rfc3339(raw)
        .map_err(|e| AppError::BadRequest(format!("invalid since '{raw}': {e}")))?;
    Ok(parsed.timestamp_millis().max(0) as Timestamp)
}
