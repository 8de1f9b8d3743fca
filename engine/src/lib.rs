//! # FormSync Engine
//!
//! Client-side core for collecting form responses offline.
//!
//! This crate validates submitted values against a form schema, evaluates
//! conditional logic, queues submissions that could not be delivered, and
//! reconciles diverged client and server records.
//!
//! ## Design Principles
//!
//! - **No network I/O**: delivery goes through a caller-supplied submit function
//! - **Validation is data**: field errors are returned, never raised
//! - **Injected state**: storage, clock and connectivity are explicit objects
//! - **Failures stay local**: storage and delivery errors are logged, not propagated
//!
//! ## Core Concepts
//!
//! ### Schemas
//!
//! A [`FormSchema`] is a tree of [`FormElement`]s. Fields hold values;
//! containers ([`ElementType::Section`], [`ElementType::Grid`], ...) hold
//! other elements. Ids are unique across the tree.
//!
//! ### Validation
//!
//! [`validate_form`] walks the tree depth-first and returns a
//! [`ValidationResult`] keyed by element id. [`validate_form_with_logic`]
//! additionally applies the schema's [`LogicRule`]s.
//!
//! ### Offline queue
//!
//! [`OfflineQueue`] persists [`OfflineSubmission`]s through a
//! [`QueueStorage`]. [`SyncManager`] flushes it through a submit function
//! and re-flushes whenever [`Connectivity`] comes back online.
//!
//! ### Conflicts
//!
//! [`detect_conflict`] flags records changed on both sides since the last
//! sync; [`resolve_conflict`] picks a winner per [`ConflictStrategy`].
//!
//! ## Quick Start
//!
//! ```rust
//! use formsync_engine::{validate_form, ElementType, FormElement, FormSchema, FormValues};
//! use serde_json::json;
//!
//! let schema = FormSchema::new(vec![
//!     FormElement::new("email", ElementType::Email)
//!         .with_label("Email")
//!         .required(),
//! ]);
//!
//! let values: FormValues = json!({"email": "ada@example.com"})
//!     .as_object()
//!     .cloned()
//!     .unwrap();
//!
//! let result = validate_form(&schema, &values);
//! assert!(result.valid);
//!
//! let result = validate_form(&schema, &FormValues::new());
//! assert_eq!(result.error("email"), Some("Email is required"));
//! ```

pub mod clock;
pub mod conflict;
pub mod connectivity;
pub mod error;
pub mod logic;
pub mod queue;
pub mod schema;
pub mod storage;
pub mod submission;
pub mod sync;
pub mod validate;

// Re-export main types at crate root
pub use clock::{Clock, ManualClock, SystemClock};
pub use conflict::{
    detect_conflict, resolve_conflict, winning_side, ConflictInfo, ConflictStrategy, Side,
    Timestamped,
};
pub use connectivity::Connectivity;
pub use error::Error;
pub use logic::{
    evaluate_logic, Condition, ConditionOperator, LogicAction, LogicMatch, LogicOutcome, LogicRule,
};
pub use queue::OfflineQueue;
pub use schema::{ElementType, FormElement, FormSchema, RuleKind, ValidationRule};
pub use storage::{FileStorage, MemoryStorage, QueueStorage};
pub use submission::OfflineSubmission;
pub use sync::{FlushReport, OnlineListener, SubmitOutcome, SyncManager};
pub use validate::{
    evaluate_rule, validate_field, validate_form, validate_form_with_logic, ValidationResult,
};

/// Type aliases for clarity
pub type ElementId = String;
pub type FormId = String;
pub type SubmissionId = String;
pub type Timestamp = u64;

/// Submitted values keyed by element id.
pub type FormValues = serde_json::Map<String, serde_json::Value>;
