//! TestRail API access.
//!
//! A thin, blocking wrapper over the TestRail v2 REST API
//! (`index.php?/api/v2/...`), covering exactly the resources the sync
//! touches: projects, milestones, suites, sections, cases, case
//! fields, plans, runs, statuses and results.
//!
//! - [`client`]: the HTTP client and per-resource calls
//! - [`model`]: typed entities
//! - [`store`]: the suite-backed [`CaseStore`](crate::mapping::CaseStore)
//!   used by case auto-creation, plus an in-memory variant for tests

pub mod client;
pub mod model;
pub mod store;

pub use client::Client;
pub use model::{
    Case, CaseDraft, CaseField, CaseFieldConfig, CaseFieldOptions, Milestone, Plan, PlanEntry,
    Project, ResultDraft, Run, Section, Status, Suite,
};
pub use store::{MemoryStore, SuiteStore};

/// Result type for TestRail operations.
pub type TestRailResult<T> = Result<T, TestRailError>;

/// Errors from talking to TestRail.
#[derive(Debug, thiserror::Error)]
pub enum TestRailError {
    #[error("TestRail request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("TestRail API returned {status} for {method}: {body}")]
    Api {
        method: String,
        status: u16,
        body: String,
    },

    #[error("Failed to decode TestRail response for {method}: {message}")]
    Decode { method: String, message: String },

    #[error("No {kind} named `{name}` found in TestRail")]
    NotFound { kind: &'static str, name: String },
}
