//! xUnit report model and parsing.
//!
//! A finished test run is consumed as a flat sequence of [`XunitCase`]
//! records read from a JUnit-style XML report. The parser accepts the
//! usual producer variants (a `<testsuites>` root or a bare
//! `<testsuite>`) and ignores everything it does not need.

pub mod parser;

use std::fmt;
use std::time::Duration;

pub use parser::{parse_report, parse_report_str};

/// Result type for report parsing.
pub type XunitResult<T> = Result<T, XunitError>;

/// Errors that can occur while reading a report file.
#[derive(Debug, thiserror::Error)]
pub enum XunitError {
    #[error("Failed to parse report at byte {position}: {message}")]
    Malformed { position: u64, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Verdict of a single executed test, as recorded in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseStatus {
    /// Test passed.
    Passed,
    /// Test failed an assertion.
    Failed,
    /// Test was skipped.
    Skipped,
    /// Test errored outside its assertions (setup/teardown).
    Errored,
}

/// One executed test from the report.
///
/// Identity for matching purposes is derived from these fields by the
/// mapping layer; nothing here is tracker-specific.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XunitCase {
    /// The `classname` attribute (module/class path of the test).
    pub classname: String,

    /// The `name` attribute (test function, including parametrization).
    pub methodname: String,

    /// Verdict recorded by the producer.
    pub status: CaseStatus,

    /// Wall-clock duration of the test.
    pub duration: Duration,

    /// Failure/error message plus captured detail text, if any.
    pub message: Option<String>,

    /// Explicit id embedded by the report producer (the optional `id`
    /// attribute), when present. Takes precedence over ids extracted
    /// from the test name.
    pub report_id: Option<String>,
}

impl XunitCase {
    /// Create a passed case with the given identity and no timing.
    ///
    /// Primarily a test helper; the parser builds cases directly.
    pub fn new(classname: impl Into<String>, methodname: impl Into<String>) -> Self {
        Self {
            classname: classname.into(),
            methodname: methodname.into(),
            status: CaseStatus::Passed,
            duration: Duration::ZERO,
            message: None,
            report_id: None,
        }
    }

    /// Set the status.
    pub fn with_status(mut self, status: CaseStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the producer-embedded report id.
    pub fn with_report_id(mut self, id: impl Into<String>) -> Self {
        self.report_id = Some(id.into());
        self
    }
}

impl fmt::Display for XunitCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.classname, self.methodname)
    }
}
