//! Form records.

use super::Db;
use formsync_engine::{FormId, FormSchema, Timestamp, Timestamped};
use serde::{Deserialize, Serialize};

/// A stored form definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredForm {
    pub id: FormId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub schema: FormSchema,
    pub published: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Timestamped for StoredForm {
    fn updated_at(&self) -> Timestamp {
        self.updated_at
    }
}

impl Db {
    /// All forms, oldest first.
    pub fn list_forms(&self) -> Vec<StoredForm> {
        let mut forms: Vec<_> = self.forms.iter().map(|f| f.value().clone()).collect();
        forms.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        forms
    }

    pub fn get_form(&self, id: &str) -> Option<StoredForm> {
        self.forms.get(id).map(|f| f.value().clone())
    }

    /// Insert or replace a form.
    pub fn upsert_form(&self, form: StoredForm) {
        self.forms.insert(form.id.clone(), form);
    }

    /// Remove a form, returning it if it existed.
    pub fn delete_form(&self, id: &str) -> Option<StoredForm> {
        self.forms.remove(id).map(|(_, form)| form)
    }

    /// Forms modified strictly after `since`, oldest change first.
    pub fn forms_changed_since(&self, since: Timestamp) -> Vec<StoredForm> {
        let mut forms: Vec<_> = self
            .forms
            .iter()
            .filter(|f| f.updated_at > since)
            .map(|f| f.value().clone())
            .collect();
        forms.sort_by(|a, b| a.updated_at.cmp(&b.updated_at).then_with(|| a.id.cmp(&b.id)));
        forms
    }
}
