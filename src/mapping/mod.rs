//! Matching executed tests to TestRail cases.
//!
//! This is the heart of the tool. Given the executed tests from a
//! report and the cases of a TestRail suite, [`CaseMapper::map`]
//! computes a deterministic correspondence between the two sets,
//! optionally creating tracker cases for tests that match nothing, and
//! refuses to hand back anything ambiguous.
//!
//! The pieces:
//!
//! - [`extract`]: pull numeric ids and UUIDs out of raw test names
//! - [`descriptor`]: flat field views that templates render against
//! - [`matcher`]: the pluggable matching strategy
//! - [`collisions`]: 1:1 validation of the result

pub mod collisions;
pub mod descriptor;
pub mod extract;
pub mod matcher;

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::testrail::{Case, CaseDraft, CaseField, TestRailError};
use crate::xunit::XunitCase;

pub use collisions::{Collision, check_collisions};
pub use descriptor::{CaseDescriptor, MissingFieldError};
pub use extract::{extract_numeric_id, extract_uuid};
pub use matcher::{CaseMatcher, TemplateCaseMatcher};

/// TestRail caps case titles at this many characters; longer computed
/// ids are truncated with a hash suffix to stay identifiable.
pub const MAX_CASE_TITLE_LEN: usize = 249;

/// Errors produced by a mapping pass.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    /// The correspondence was not 1:1 and duplicates were disallowed.
    /// Fatal for the whole pass: no partial correspondence is trusted.
    #[error("ambiguous case mapping ({} collisions)", .conflicts.len())]
    Ambiguous {
        /// Every entity that collected more than one counterpart.
        conflicts: Vec<Collision>,
    },

    /// A tracker write or read failed (case auto-creation path).
    #[error(transparent)]
    TestRail(#[from] TestRailError),
}

/// The tracker-suite operations the mapper needs for case
/// auto-creation. Implemented by the live TestRail-backed store and by
/// an in-memory store for tests.
pub trait CaseStore {
    /// Name of the suite, for logging.
    fn suite_name(&self) -> &str;

    /// The custom case field definitions available in the tracker.
    fn custom_case_fields(&self) -> Result<Vec<CaseField>, TestRailError>;

    /// Id of the named section, creating the section if absent.
    fn ensure_section(&mut self, name: &str) -> Result<u64, TestRailError>;

    /// Create a case under the given section and append it to the
    /// suite's in-memory case collection.
    fn add_case(&mut self, section_id: u64, draft: CaseDraft) -> Result<Case, TestRailError>;
}

/// Toggles for a mapping pass. All default to the conservative choice.
#[derive(Debug, Clone, Default)]
pub struct MappingOptions {
    /// Permit several executed tests to land on one tracker case (and
    /// vice versa) instead of failing. Every pair is retained.
    pub allow_duplicates: bool,

    /// Create a tracker case for tests that match nothing, instead of
    /// only warning.
    pub add_missing_cases: bool,

    /// Extra fields merged into every auto-created case draft.
    pub case_custom_fields: Map<String, Value>,

    /// Section to file auto-created cases under. Defaults to `"All"`.
    pub section_name: Option<String>,

    /// Log auto-create intents without writing anything.
    pub dry_run: bool,
}

/// The computed tracker-case ↔ executed-test correspondence.
///
/// Pairs are kept as an ordered list: with duplicates allowed, every
/// pair survives — nothing collapses behind a unique key. When
/// duplicates are disallowed the collision check guarantees each case
/// and each test appears at most once.
#[derive(Debug, Clone, Default)]
pub struct Correspondence {
    pairs: Vec<(Case, XunitCase)>,
    unmatched: Vec<XunitCase>,
}

impl Correspondence {
    /// All (tracker case, executed test) pairs, in report order.
    pub fn pairs(&self) -> &[(Case, XunitCase)] {
        &self.pairs
    }

    /// Executed tests that matched nothing.
    pub fn unmatched(&self) -> &[XunitCase] {
        &self.unmatched
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True when no test matched any case.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Ids of the matched tracker cases, deduplicated, in order.
    pub fn case_ids(&self) -> Vec<u64> {
        let mut ids = Vec::new();
        for (case, _) in &self.pairs {
            if !ids.contains(&case.id) {
                ids.push(case.id);
            }
        }
        ids
    }

    /// Iterate the pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Case, &XunitCase)> {
        self.pairs.iter().map(|(c, x)| (c, x))
    }
}

/// Drives the per-test matching loop.
///
/// Generic over the [`CaseMatcher`] strategy; the tracker is reached
/// only through the [`CaseStore`] seam, and only on the auto-create
/// path.
pub struct CaseMapper<M> {
    matcher: M,
    options: MappingOptions,
}

impl<M: CaseMatcher> CaseMapper<M> {
    /// Create a mapper with default options.
    pub fn new(matcher: M) -> Self {
        Self {
            matcher,
            options: MappingOptions::default(),
        }
    }

    /// Create a mapper with explicit options.
    pub fn with_options(matcher: M, options: MappingOptions) -> Self {
        Self { matcher, options }
    }

    /// Compute the correspondence between executed tests and tracker
    /// cases.
    ///
    /// Walks every executed test, collects its matches among
    /// `candidates`, auto-creates cases for unmatched tests when
    /// configured, and validates the result is unambiguous. Skipped
    /// tests participate like any other; excluding them from verdict
    /// upload is the reporter's business.
    pub fn map(
        &self,
        xunit_cases: &[XunitCase],
        candidates: &[Case],
        store: &mut dyn CaseStore,
        milestone_id: Option<u64>,
    ) -> Result<Correspondence, MappingError> {
        self.log_custom_case_fields(store)?;

        let mut pairs: Vec<(Case, XunitCase)> = Vec::new();
        let mut unmatched = Vec::new();

        for xunit_case in xunit_cases {
            let mut matches: Vec<Case> = self
                .matcher
                .find_matches(xunit_case, candidates)
                .into_iter()
                .cloned()
                .collect();

            if matches.is_empty() {
                warn!("xUnit case `{xunit_case}` doesn't match any TestRail case");
                if self.options.add_missing_cases
                    && let Some(created) = self.add_missing_case(xunit_case, store, milestone_id)?
                {
                    matches.push(created);
                }
            }

            if matches.is_empty() {
                unmatched.push(xunit_case.clone());
            }
            for case in matches {
                pairs.push((case, xunit_case.clone()));
            }
        }

        if pairs.is_empty()
            && !xunit_cases.is_empty()
            && !candidates.is_empty()
            && let (Some(case), Some(xunit_case)) = (candidates.last(), xunit_cases.last())
        {
            print_pair_data(case, xunit_case);
        }

        check_collisions(&pairs, self.options.allow_duplicates)?;

        Ok(Correspondence { pairs, unmatched })
    }

    /// Diagnostic aid for template authors; no behavioral effect.
    fn log_custom_case_fields(&self, store: &dyn CaseStore) -> Result<(), MappingError> {
        let fields = store.custom_case_fields()?;
        let summary: Vec<String> = fields
            .iter()
            .map(|f| format!("{}:\n{}", f.system_name, f.items().unwrap_or("")))
            .collect();
        info!(
            "Available custom fields for cases: \n{}",
            summary.join("\n")
        );
        Ok(())
    }

    /// Create a tracker case for an unmatched test and return it as
    /// the sole match. Returns `None` when nothing was (or could be)
    /// created.
    fn add_missing_case(
        &self,
        xunit_case: &XunitCase,
        store: &mut dyn CaseStore,
        milestone_id: Option<u64>,
    ) -> Result<Option<Case>, MappingError> {
        let xunit_id = match self.matcher.executed_id(xunit_case) {
            Ok(id) => id,
            Err(e) => {
                warn!("{e}: can't compose a case title for `{xunit_case}`, nothing to create");
                return Ok(None);
            }
        };

        if self.options.dry_run {
            info!(
                "[dry run] Add missing case `{xunit_case}` to the TestRail suite `{}`",
                store.suite_name()
            );
            return Ok(None);
        }

        let draft = CaseDraft::new(case_title(&xunit_id))
            .with_milestone(milestone_id)
            .with_field("custom_test_case_description", Value::from(xunit_id))
            .with_field(
                "custom_test_case_steps",
                serde_json::json!([{"": "passed"}]),
            )
            .merge_fields(&self.options.case_custom_fields);

        info!(
            "Add missing case `{xunit_case}` to the TestRail suite `{}`",
            store.suite_name()
        );

        let section_name = self.options.section_name.as_deref().unwrap_or("All");
        let section_id = store.ensure_section(section_name)?;
        let case = store.add_case(section_id, draft)?;

        Ok(Some(case))
    }
}

/// Title for an auto-created case: the computed id, truncated with a
/// SHA-256 suffix when it exceeds the tracker's title cap. The suffix
/// keeps over-long titles distinguishable after truncation.
fn case_title(xunit_id: &str) -> String {
    if xunit_id.chars().count() <= MAX_CASE_TITLE_LEN {
        return xunit_id.to_string();
    }

    let digest = format!("{:x}", Sha256::digest(xunit_id.as_bytes()));
    let suffix = &digest[..16];
    let head: String = xunit_id
        .chars()
        .take(MAX_CASE_TITLE_LEN - suffix.len() - 1)
        .collect();
    warn!(
        "Case title is longer than {MAX_CASE_TITLE_LEN} chars, truncating: {}",
        xunit_id
    );
    format!("{head} {suffix}")
}

/// Side-by-side field dump, printed when nothing matched at all.
/// Usually means the templates reference the wrong fields.
fn print_pair_data(case: &Case, xunit_case: &XunitCase) {
    println!("Available TestRail fields (case {}):", case.id);
    print_fields(CaseDescriptor::from_case(case));
    println!("Available xUnit fields:");
    print_fields(CaseDescriptor::from_xunit(xunit_case));
}

fn print_fields(descriptor: CaseDescriptor) {
    let width = descriptor
        .iter()
        .map(|(name, _)| name.len())
        .max()
        .unwrap_or(0);
    for (name, value) in descriptor.iter() {
        println!(
            "  {} {}",
            console::style(format!("{name:<width$}")).bold(),
            value.unwrap_or("<unset>")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testrail::MemoryStore;

    fn case(id: u64, title: &str) -> Case {
        serde_json::from_value(serde_json::json!({ "id": id, "title": title })).unwrap()
    }

    fn mapper(options: MappingOptions) -> CaseMapper<TemplateCaseMatcher> {
        CaseMapper::with_options(TemplateCaseMatcher::new("{id}", "{title}"), options)
    }

    #[test]
    fn test_end_to_end_matching() {
        let tests = vec![
            XunitCase::new("c", "test_a[(1000)]"),
            XunitCase::new("c", "test_b[(2000)]"),
        ];
        let candidates = vec![case(1, "foo 1000"), case(2, "bar 2000")];
        let mut store = MemoryStore::new("Suite");

        let correspondence = mapper(MappingOptions::default())
            .map(&tests, &candidates, &mut store, None)
            .unwrap();

        assert_eq!(correspondence.len(), 2);
        let pairs = correspondence.pairs();
        assert_eq!(pairs[0].0.id, 1);
        assert_eq!(pairs[0].1.methodname, "test_a[(1000)]");
        assert_eq!(pairs[1].0.id, 2);
        assert_eq!(pairs[1].1.methodname, "test_b[(2000)]");
    }

    #[test]
    fn test_unmatched_test_is_reported_not_fatal() {
        let tests = vec![XunitCase::new("c", "test_a[(1000)]")];
        let candidates = vec![case(1, "unrelated 9999")];
        let mut store = MemoryStore::new("Suite");

        let correspondence = mapper(MappingOptions::default())
            .map(&tests, &candidates, &mut store, None)
            .unwrap();

        assert!(correspondence.is_empty());
        assert_eq!(correspondence.unmatched().len(), 1);
    }

    #[test]
    fn test_collision_fails_the_pass() {
        let tests = vec![
            XunitCase::new("c", "test_a[(1000)]"),
            XunitCase::new("c", "test_b[(1000)]"),
        ];
        let candidates = vec![case(1, "shared 1000")];
        let mut store = MemoryStore::new("Suite");

        let err = mapper(MappingOptions::default())
            .map(&tests, &candidates, &mut store, None)
            .unwrap_err();
        assert!(matches!(err, MappingError::Ambiguous { .. }));
    }

    #[test]
    fn test_allow_duplicates_keeps_every_pair() {
        let tests = vec![
            XunitCase::new("c", "test_a[(1000)]"),
            XunitCase::new("c", "test_b[(1000)]"),
        ];
        let candidates = vec![case(1, "shared 1000")];
        let mut store = MemoryStore::new("Suite");

        let options = MappingOptions {
            allow_duplicates: true,
            ..Default::default()
        };
        let correspondence = mapper(options)
            .map(&tests, &candidates, &mut store, None)
            .unwrap();

        assert_eq!(correspondence.len(), 2);
        assert_eq!(correspondence.case_ids(), vec![1]);
    }

    #[test]
    fn test_add_missing_case_creates_and_matches() {
        let tests = vec![XunitCase::new("c", "test_new[(4242)]")];
        let candidates = vec![case(1, "unrelated")];
        let mut store = MemoryStore::new("Suite");

        let options = MappingOptions {
            add_missing_cases: true,
            ..Default::default()
        };
        let correspondence = mapper(options)
            .map(&tests, &candidates, &mut store, Some(8))
            .unwrap();

        assert_eq!(correspondence.len(), 1);
        assert_eq!(store.cases().len(), 1);
        let created = &store.cases()[0];
        assert_eq!(created.title, "4242");
        assert_eq!(
            created.field("milestone_id").and_then(Value::as_u64),
            Some(8)
        );
        // The created case is the sole match for the test.
        assert_eq!(correspondence.pairs()[0].0.id, created.id);
        // Filed under the fallback section.
        assert_eq!(store.sections(), vec!["All".to_string()]);
    }

    #[test]
    fn test_add_missing_case_merges_custom_fields() {
        let tests = vec![XunitCase::new("c", "test_new[(4242)]")];
        let mut store = MemoryStore::new("Suite");

        let mut custom = Map::new();
        custom.insert("custom_qa_team".to_string(), Value::from("9"));
        let options = MappingOptions {
            add_missing_cases: true,
            case_custom_fields: custom,
            section_name: Some("Automation".to_string()),
            ..Default::default()
        };
        mapper(options)
            .map(&tests, &[case(1, "unrelated")], &mut store, None)
            .unwrap();

        let created = &store.cases()[0];
        assert_eq!(
            created.field("custom_qa_team").and_then(Value::as_str),
            Some("9")
        );
        assert_eq!(store.sections(), vec!["Automation".to_string()]);
    }

    #[test]
    fn test_dry_run_creates_nothing() {
        let tests = vec![XunitCase::new("c", "test_new[(4242)]")];
        let mut store = MemoryStore::new("Suite");

        let options = MappingOptions {
            add_missing_cases: true,
            dry_run: true,
            ..Default::default()
        };
        let correspondence = mapper(options)
            .map(&tests, &[case(1, "unrelated")], &mut store, None)
            .unwrap();

        assert!(store.cases().is_empty());
        assert!(correspondence.is_empty());
        assert_eq!(correspondence.unmatched().len(), 1);
    }

    #[test]
    fn test_unrenderable_test_skips_auto_create() {
        // `{uuid}` can't be rendered for a test without a UUID token;
        // the auto-create path must skip it rather than fail.
        let tests = vec![XunitCase::new("c", "test_without_uuid")];
        let mut store = MemoryStore::new("Suite");

        let options = MappingOptions {
            add_missing_cases: true,
            ..Default::default()
        };
        let correspondence = CaseMapper::with_options(
            TemplateCaseMatcher::new("{uuid}", "{title}"),
            options,
        )
        .map(&tests, &[case(1, "unrelated")], &mut store, None)
        .unwrap();

        assert!(store.cases().is_empty());
        assert_eq!(correspondence.unmatched().len(), 1);
    }

    #[test]
    fn test_long_title_is_truncated_with_hash_suffix() {
        let long_id = "x".repeat(400);
        let title = case_title(&long_id);

        assert_eq!(title.chars().count(), MAX_CASE_TITLE_LEN);
        assert!(title.starts_with(&"x".repeat(232)));
        // tail: space + 16 hex chars
        let (head, tail) = title.split_at(232);
        assert_eq!(head.len(), 232);
        assert!(tail.starts_with(' '));
        assert_eq!(tail.len(), 17);
    }

    #[test]
    fn test_short_title_is_untouched() {
        assert_eq!(case_title("short"), "short");
    }
}
