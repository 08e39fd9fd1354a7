//! Configuration schema definitions for railgun.
//!
//! All types deserialize from TOML with serde. Credentials are
//! deliberately not part of the schema — they come from CLI flags or
//! the `TESTRAIL_USER` / `TESTRAIL_PASSWORD` environment, so a config
//! file is safe to commit next to the test suite it describes.
//!
//! # Schema Overview
//!
//! ```text
//! Config (root)
//! ├── RailgunConfig   - run metadata (environment, links, build tag)
//! ├── TestRailConfig  - instance URL and entity names
//! └── MatchingConfig  - id templates and mapping toggles
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::mapping::{MappingOptions, TemplateCaseMatcher};

/// Root configuration structure for railgun.
///
/// # TOML Structure
///
/// ```toml
/// [railgun]
/// env_description = "vlan_ceph"
/// results_link = "https://ci.example.com/job/123"
///
/// [testrail]
/// url = "https://example.testrail.net"
/// project = "Test Project"
/// milestone = "10.0"
/// suite = "Smoke"
/// plan = "10.0 smoke"
///
/// [matching]
/// xunit_template = "{id}"
/// testrail_template = "{title}"
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Run metadata (optional, has defaults).
    #[serde(default)]
    pub railgun: RailgunConfig,

    /// TestRail instance and entity names.
    pub testrail: TestRailConfig,

    /// Case matching configuration (optional, has defaults).
    #[serde(default)]
    pub matching: MatchingConfig,
}

/// Metadata describing the run being reported.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RailgunConfig {
    /// Environment label appended to the run name, e.g. `"vlan_ceph"`.
    #[serde(default)]
    pub env_description: String,

    /// Link to the CI job or results page, shown in the run
    /// description.
    pub results_link: Option<String>,

    /// Build identifier under test. Used in the default plan name when
    /// no explicit plan name is configured.
    pub build_id: Option<String>,

    /// Link to the build artifact, shown in plan and run descriptions.
    pub build_link: Option<String>,
}

/// TestRail instance and the names of the entities to report into.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TestRailConfig {
    /// Instance base URL, e.g. `https://example.testrail.net`.
    /// `--testrail-url` / `TESTRAIL_URL` overrides this.
    #[serde(default)]
    pub url: String,

    /// Project name.
    pub project: String,

    /// Milestone name within the project.
    pub milestone: String,

    /// Suite name within the project.
    pub suite: String,

    /// Plan name to reuse or create. When absent, a name is derived
    /// from the milestone and `build_id`.
    pub plan: Option<String>,
}

/// Case matching configuration.
///
/// The two templates decide what gets compared: `xunit_template`
/// renders over the executed test's fields (`{classname}`,
/// `{methodname}`, `{id}`, `{uuid}`), `testrail_template` over the
/// tracker case's string fields (`{title}` and any `custom_*` field).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MatchingConfig {
    /// Template computing the executed test's id.
    #[serde(default = "default_xunit_template")]
    pub xunit_template: String,

    /// Template computing each tracker case's comparable id.
    #[serde(default = "default_testrail_template")]
    pub testrail_template: String,

    /// Truncate computed test ids to this many characters before
    /// comparison; 0 disables. Matches trackers capping the compared
    /// field's length.
    #[serde(default)]
    pub max_id_length: usize,

    /// Permit a non-1:1 correspondence instead of failing.
    #[serde(default)]
    pub allow_duplicates: bool,

    /// Create tracker cases for tests that match nothing.
    #[serde(default)]
    pub add_missing_cases: bool,

    /// Section auto-created cases are filed under.
    #[serde(default = "default_section_name")]
    pub section_name: String,

    /// Extra fields merged into every auto-created case.
    #[serde(default)]
    pub case_custom_fields: Map<String, Value>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            xunit_template: default_xunit_template(),
            testrail_template: default_testrail_template(),
            max_id_length: 0,
            allow_duplicates: false,
            add_missing_cases: false,
            section_name: default_section_name(),
            case_custom_fields: Map::new(),
        }
    }
}

impl MatchingConfig {
    /// Build the template matcher this configuration describes.
    pub fn matcher(&self) -> TemplateCaseMatcher {
        TemplateCaseMatcher::new(&self.xunit_template, &self.testrail_template)
            .with_max_id_length(self.max_id_length)
    }

    /// Build the mapping options this configuration describes.
    /// `dry_run` is a CLI concern and stays false here.
    pub fn options(&self) -> MappingOptions {
        MappingOptions {
            allow_duplicates: self.allow_duplicates,
            add_missing_cases: self.add_missing_cases,
            case_custom_fields: self.case_custom_fields.clone(),
            section_name: Some(self.section_name.clone()),
            dry_run: false,
        }
    }
}

fn default_xunit_template() -> String {
    "{id}".to_string()
}

fn default_testrail_template() -> String {
    "{title}".to_string()
}

fn default_section_name() -> String {
    "All".to_string()
}
