//! In-memory storage for forms and submissions.
//!
//! State lives in concurrent maps for the lifetime of the process; there is
//! no persistence across restarts.

mod forms;
mod submissions;

pub use forms::*;
pub use submissions::*;

use dashmap::DashMap;
use formsync_engine::{FormId, SubmissionId};
use std::sync::Arc;

/// Shared handle to the in-memory maps.
pub type Pool = Arc<Db>;

/// The in-memory database.
#[derive(Debug, Default)]
pub struct Db {
    forms: DashMap<FormId, StoredForm>,
    submissions: DashMap<SubmissionId, StoredSubmission>,
}

impl Db {
    /// Create an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty database wrapped in Arc for sharing.
    pub fn new_shared() -> Pool {
        Arc::new(Self::new())
    }
}
