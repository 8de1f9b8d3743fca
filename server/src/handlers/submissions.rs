//! Submission handlers - validated ingestion of form responses.

use crate::db::{Db, StoredForm, StoredSubmission};
use crate::error::{AppError, Result};
use formsync_engine::{
    clock::now_millis, submission::generate_id, validate_form_with_logic, FormId, FormValues,
    OfflineSubmission, SubmissionId, Timestamp,
};
use serde::Deserialize;

/// Request body for a direct (online) submission.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubmissionRequest {
    pub form_id: FormId,
    #[serde(default)]
    pub data: FormValues,
    /// Client-generated id, for idempotent retries
    pub id: Option<SubmissionId>,
    /// When the client captured the response
    pub submitted_at: Option<Timestamp>,
}

/// Query parameters for listing submissions.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionQuery {
    pub form_id: Option<FormId>,
}

/// Why a submission was not stored.
#[derive(Debug)]
pub enum Rejection {
    UnknownForm(FormId),
    Invalid(formsync_engine::ValidationResult),
}

impl From<Rejection> for AppError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::UnknownForm(id) => AppError::NotFound(format!("form {id}")),
            Rejection::Invalid(result) => AppError::Validation(result),
        }
    }
}

/// Validate a submission against its form and store it.
///
/// Returns the stored record and whether it was newly inserted (false when
/// the id had already been received).
pub fn ingest(
    db: &Db,
    submission: OfflineSubmission,
) -> std::result::Result<(StoredSubmission, bool), Rejection> {
    if let Some(existing) = db.get_submission(&submission.id) {
        return Ok((existing, false));
    }

    let form: StoredForm = db
        .get_form(&submission.form_id)
        .ok_or_else(|| Rejection::UnknownForm(submission.form_id.clone()))?;

    let result = validate_form_with_logic(&form.schema, &submission.data);
    if !result.valid {
        return Err(Rejection::Invalid(result));
    }

    let stored = StoredSubmission {
        id: submission.id,
        form_id: submission.form_id,
        data: submission.data,
        submitted_at: submission.timestamp,
        received_at: now_millis(),
    };

    let inserted = db.insert_submission(stored.clone());
    if !inserted {
        // Lost a race with a concurrent delivery of the same id
        if let Some(existing) = db.get_submission(&stored.id) {
            return Ok((existing, false));
        }
    }
    Ok((stored, inserted))
}

/// Handle a direct submission from an online client.
pub fn create_submission(db: &Db, request: CreateSubmissionRequest) -> Result<StoredSubmission> {
    let submitted_at = request.submitted_at.unwrap_or_else(now_millis);
    let submission = OfflineSubmission {
        id: request.id.unwrap_or_else(|| generate_id(submitted_at)),
        form_id: request.form_id,
        data: request.data,
        timestamp: submitted_at,
        retries: 0,
    };

    let (stored, inserted) = ingest(db, submission)?;
    if inserted {
        tracing::info!(id = %stored.id, form_id = %stored.form_id, "submission received");
    }
    Ok(stored)
}

/// List submissions, optionally filtered by form.
pub fn list_submissions(db: &Db, query: SubmissionQuery) -> Result<Vec<StoredSubmission>> {
    if let Some(form_id) = &query.form_id {
        if db.get_form(form_id).is_none() {
            return Err(AppError::NotFound(format!("form {form_id}")));
        }
    }
    Ok(db.list_submissions(query.form_id.as_deref()))
}
