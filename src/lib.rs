//! railgun: sync xUnit test results into TestRail.
//!
//! Parses a finished test run's JUnit/xUnit XML report, matches each
//! executed test to a TestRail case, reuses or creates a plan for the
//! build under test, opens a run holding the matched cases and uploads
//! a verdict per case.
//!
//! # Architecture
//!
//! The main components are:
//!
//! - **xunit**: Parse the report into executed test records
//! - **mapping**: Match executed tests to tracker cases (the core)
//! - **testrail**: Typed, blocking TestRail v2 API access
//! - **reporter**: Drive the full sync (plan, run, verdicts)
//! - **config**: TOML configuration with CLI/env overrides
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use railgun::config::load_config;
//! use railgun::reporter::Reporter;
//! use railgun::testrail::Client;
//! use railgun::xunit::parse_report;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = load_config(Path::new("railgun.toml"))?;
//!     let cases = parse_report(Path::new("report.xml"))?;
//!     let client = Client::new(&config.testrail.url, "user", "token")?;
//!     Reporter::new(&client, &config).execute(&cases, false)?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod mapping;
pub mod reporter;
pub mod testrail;
pub mod xunit;

// Re-export commonly used types
pub use config::{Config, load_config};
pub use mapping::{CaseMapper, Correspondence, MappingOptions, TemplateCaseMatcher};
pub use reporter::Reporter;
pub use testrail::Client;
pub use xunit::{CaseStatus, XunitCase, parse_report};
