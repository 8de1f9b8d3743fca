//! Form handlers - CRUD over form definitions.

use crate::db::{Db, StoredForm};
use crate::error::{AppError, Result};
use formsync_engine::{
    clock::now_millis, detect_conflict, winning_side, ConflictInfo, ConflictStrategy, FormSchema,
    Side, Timestamp,
};
use serde::{Deserialize, Serialize};

/// Request body for creating a form.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFormRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub schema: FormSchema,
    #[serde(default)]
    pub published: bool,
}

/// Request body for updating a form. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFormRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub schema: Option<FormSchema>,
    pub published: Option<bool>,
    /// When the client last pulled this form
    pub last_synced_at: Option<Timestamp>,
    /// When the client made its edit (defaults to now)
    pub updated_at: Option<Timestamp>,
}

/// Response for an update.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFormResponse {
    /// The form as stored after the update
    pub form: StoredForm,
    /// Whether the client and server both changed the form
    pub conflict: bool,
    /// Which side was kept, when there was a conflict
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<Side>,
}

/// Create a new form after checking its schema.
pub fn create_form(db: &Db, request: CreateFormRequest) -> Result<StoredForm> {
    if request.title.trim().is_empty() {
        return Err(AppError::BadRequest("title must not be empty".to_string()));
    }
    request.schema.check()?;

    let now = now_millis();
    let form = StoredForm {
        id: uuid::Uuid::new_v4().to_string(),
        title: request.title,
        description: request.description,
        schema: request.schema,
        published: request.published,
        created_at: now,
        updated_at: now,
    };

    db.upsert_form(form.clone());
    tracing::info!(form_id = %form.id, elements = form.schema.len(), "form created");
    Ok(form)
}

/// Fetch a form by id.
pub fn get_form(db: &Db, id: &str) -> Result<StoredForm> {
    db.get_form(id)
        .ok_or_else(|| AppError::NotFound(format!("form {id}")))
}

/// Apply an update, resolving a conflict with `strategy` when the form was
/// also changed on the server since the client's last sync.
pub fn update_form(
    db: &Db,
    id: &str,
    request: UpdateFormRequest,
    strategy: ConflictStrategy,
) -> Result<UpdateFormResponse> {
    let existing = get_form(db, id)?;

    if let Some(schema) = &request.schema {
        schema.check()?;
    }

    let now = now_millis();
    let mut edited = existing.clone();
    if let Some(title) = request.title {
        edited.title = title;
    }
    if let Some(description) = request.description {
        edited.description = Some(description);
    }
    if let Some(schema) = request.schema {
        edited.schema = schema;
    }
    if let Some(published) = request.published {
        edited.published = published;
    }
    edited.updated_at = request.updated_at.unwrap_or(now);

    let conflict = request
        .last_synced_at
        .is_some_and(|last| detect_conflict(&edited, &existing, last));

    let winner = if conflict {
        let side = winning_side(&ConflictInfo::new(&edited, &existing), strategy);
        tracing::info!(form_id = %id, %strategy, ?side, "form edit conflict");
        Some(side)
    } else {
        None
    };

    let form = match winner {
        Some(Side::Server) => existing,
        _ => {
            // Stored change time is the server's receipt time so pulls see it
            edited.updated_at = now.max(existing.updated_at);
            db.upsert_form(edited.clone());
            edited
        }
    };

    Ok(UpdateFormResponse {
        form,
        conflict,
        winner,
    })
}

/// Delete a form and its submissions.
pub fn delete_form(db: &Db, id: &str) -> Result<()> {
    db.delete_form(id)
        .ok_or_else(|| AppError::NotFound(format!("form {id}")))?;
    let removed = db.delete_submissions_for(id);
    tracing::info!(form_id = %id, submissions = removed, "form deleted");
    Ok(())
}
