//! Case matching strategies.
//!
//! A [`CaseMatcher`] decides which tracker cases an executed test
//! corresponds to. The shipped strategy, [`TemplateCaseMatcher`],
//! compares a templated id computed from the test against a templated
//! id computed from each tracker case.
//!
//! # How template matching works
//!
//! Tracker titles often wrap the true identifier in decorative text:
//! `"Check quotas (2390f766-836d-40ef-9aeb-e810d78207fb) [network]"`.
//! Naive substring search over that title produces false positives;
//! rigid whole-title equality produces false negatives. Instead, the
//! matcher looks at which symbol classes (letters, parentheses,
//! brackets, commas) never occur in the computed test id. Those
//! classes are safe tokenizing delimiters: splitting the tracker id on
//! them isolates the identifier without ever cutting through one that
//! legitimately contains, say, letters or commas. A token equal to the
//! test id is a match. When every class occurs in the test id there is
//! no safe split, and only exact equality of the two ids counts.
//!
//! Sensitivity to template choice is deliberate: picking templates
//! that produce comparable ids is the caller's configuration
//! responsibility, not something the algorithm papers over.

use regex::Regex;
use tracing::warn;

use crate::testrail::Case;
use crate::xunit::XunitCase;

use super::descriptor::{CaseDescriptor, MissingFieldError};

/// A strategy computing which tracker cases an executed test matches.
pub trait CaseMatcher {
    /// Canonical id string of an executed test, used both for
    /// comparison and as the title of auto-created cases.
    fn executed_id(&self, case: &XunitCase) -> Result<String, MissingFieldError>;

    /// All tracker cases equivalent to the executed test. Zero, one or
    /// many; multiplicity is the orchestrator's problem.
    fn find_matches<'a>(&self, case: &XunitCase, candidates: &'a [Case]) -> Vec<&'a Case>;

    /// Strategy name for logging.
    fn name(&self) -> &'static str {
        "CaseMatcher"
    }
}

/// Symbol classes probed for absence in the computed test id. Absent
/// classes become tokenizing delimiters.
const SPLIT_SYMBOL_CLASSES: [&str; 4] = ["a-zA-Z", r"\(\)", r"\[\]", ","];

/// Template-driven case matcher.
///
/// Configured with a template over executed-test fields (`{id}`,
/// `{uuid}`, `{classname}`, `{methodname}`) and a template over
/// tracker-case fields (`{title}` and `custom_*` fields).
///
/// # Example
///
/// ```
/// use railgun::mapping::TemplateCaseMatcher;
///
/// // Compare the test's embedded UUID against the case title.
/// let matcher = TemplateCaseMatcher::new("{uuid}", "{title}");
/// ```
pub struct TemplateCaseMatcher {
    xunit_template: String,
    testrail_template: String,
    max_id_length: usize,
}

impl TemplateCaseMatcher {
    /// Create a matcher from the two id templates.
    pub fn new(xunit_template: impl Into<String>, testrail_template: impl Into<String>) -> Self {
        Self {
            xunit_template: xunit_template.into(),
            testrail_template: testrail_template.into(),
            max_id_length: 0,
        }
    }

    /// Truncate computed test ids to at most `len` characters before
    /// comparison. Zero disables truncation. Used when the tracker
    /// field the id is compared against has a length cap.
    pub fn with_max_id_length(mut self, len: usize) -> Self {
        self.max_id_length = len;
        self
    }

    /// The delimiter character classes absent from `xunit_id`, as a
    /// regex character-class body. Empty when every class occurs.
    fn split_symbols(xunit_id: &str) -> String {
        let mut symbols = String::new();
        for class in SPLIT_SYMBOL_CLASSES {
            let probe = Regex::new(&format!("[{class}]")).unwrap();
            if !probe.is_match(xunit_id) {
                symbols.push_str(class);
            }
        }
        symbols
    }
}

impl CaseMatcher for TemplateCaseMatcher {
    fn executed_id(&self, case: &XunitCase) -> Result<String, MissingFieldError> {
        let id = CaseDescriptor::from_xunit(case).render(&self.xunit_template)?;
        if self.max_id_length > 0 {
            Ok(id.chars().take(self.max_id_length).collect())
        } else {
            Ok(id)
        }
    }

    fn find_matches<'a>(&self, case: &XunitCase, candidates: &'a [Case]) -> Vec<&'a Case> {
        let xunit_id = match self.executed_id(case) {
            Ok(id) => id,
            Err(e) => {
                warn!(
                    "{e}: can't render `{}` for `{case}`",
                    self.xunit_template
                );
                return Vec::new();
            }
        };

        let symbols = Self::split_symbols(&xunit_id);
        let split_expr = (!symbols.is_empty()).then(|| Regex::new(&format!("[{symbols}]")).unwrap());

        let mut matches = Vec::new();
        for candidate in candidates {
            let descriptor = CaseDescriptor::from_case(candidate);
            let testrail_id = match descriptor.render(&self.testrail_template) {
                Ok(id) => id,
                Err(e) => {
                    warn!(
                        "{e}: skipping TestRail case {} for template `{}`",
                        candidate.id, self.testrail_template
                    );
                    continue;
                }
            };

            let accepted = match &split_expr {
                None => xunit_id == testrail_id,
                Some(expr) => {
                    let tokens: Vec<&str> =
                        expr.split(&testrail_id).filter(|t| !t.is_empty()).collect();
                    // Titles put the canonical id near the end, so scan
                    // tokens back to front.
                    tokens.iter().rev().any(|t| *t == xunit_id)
                }
            };
            if accepted {
                matches.push(candidate);
            }
        }
        matches
    }

    fn name(&self) -> &'static str {
        "TemplateCaseMatcher"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xunit::XunitCase;

    fn case(id: u64, title: &str) -> Case {
        serde_json::from_value(serde_json::json!({ "id": id, "title": title })).unwrap()
    }

    fn case_with_label(id: u64, title: &str, label: &str) -> Case {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "title": title,
            "custom_report_label": label,
        }))
        .unwrap()
    }

    #[test]
    fn test_matches_wrapped_id_in_title() {
        // `(`, `)`, `[`, `]` and letters are absent from "1234567",
        // so they all become delimiters and isolate the id.
        let matcher = TemplateCaseMatcher::new("{id}", "{title}");
        let test = XunitCase::new("tests.test_net", "test_ban_l3_agent[once][(1234567)]");
        let cases = vec![
            case(1, "Check the thing (1234567) [smoke]"),
            case(2, "Check the other thing (7654321) [smoke]"),
        ];

        let found = matcher.find_matches(&test, &cases);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 1);
    }

    #[test]
    fn test_matches_uuid_against_decorated_title() {
        let matcher = TemplateCaseMatcher::new("{uuid}", "{title}");
        let test = XunitCase::new(
            "tests.test_net",
            "test_quotas[id-2390f766-836d-40ef-9aeb-e810d78207fb,network]",
        );
        let cases = vec![case(
            7,
            "Check quotas (2390f766-836d-40ef-9aeb-e810d78207fb) [network]",
        )];

        let found = matcher.find_matches(&test, &cases);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 7);
    }

    #[test]
    fn test_exact_equality_when_no_safe_split_exists() {
        // The id contains letters, parens, brackets and a comma, so no
        // symbol class is a safe delimiter.
        let matcher = TemplateCaseMatcher::new("{methodname}", "{title}");
        let test = XunitCase::new("c", "check(a,b)[x]");
        let exact = case(1, "check(a,b)[x]");
        let wrapped = case(2, "prefix check(a,b)[x] suffix");

        let candidates = [exact.clone(), wrapped];
        let found = matcher.find_matches(&test, &candidates);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 1);
    }

    #[test]
    fn test_missing_field_yields_no_matches() {
        let matcher = TemplateCaseMatcher::new("{uuid}", "{title}");
        let test = XunitCase::new("c", "test_without_uuid");
        let cases = vec![case(1, "anything")];

        assert!(matcher.find_matches(&test, &cases).is_empty());
    }

    #[test]
    fn test_candidate_missing_template_field_is_skipped() {
        let matcher = TemplateCaseMatcher::new("{id}", "{custom_report_label}");
        let test = XunitCase::new("c", "test_x[(12345)]");
        let cases = vec![
            case(1, "no label here"),
            case_with_label(2, "labeled", "12345"),
        ];

        let found = matcher.find_matches(&test, &cases);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 2);
    }

    #[test]
    fn test_multiple_matches_are_all_returned() {
        let matcher = TemplateCaseMatcher::new("{id}", "{title}");
        let test = XunitCase::new("c", "test_x[(12345)]");
        let cases = vec![case(1, "first 12345"), case(2, "second 12345")];

        let found = matcher.find_matches(&test, &cases);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_case_accepted_once_despite_repeated_token() {
        let matcher = TemplateCaseMatcher::new("{id}", "{title}");
        let test = XunitCase::new("c", "test_x[(12345)]");
        let cases = vec![case(1, "12345 again 12345")];

        assert_eq!(matcher.find_matches(&test, &cases).len(), 1);
    }

    #[test]
    fn test_executed_id_truncation() {
        let matcher = TemplateCaseMatcher::new("{methodname}", "{title}").with_max_id_length(6);
        let test = XunitCase::new("c", "test_very_long_name");
        assert_eq!(matcher.executed_id(&test).unwrap(), "test_v");
    }

    #[test]
    fn test_substring_is_not_a_match() {
        // "1234" inside "12345" must not match once tokenized.
        let matcher = TemplateCaseMatcher::new("{id}", "{title}");
        let test = XunitCase::new("c", "test_x[(1234)]");
        let cases = vec![case(1, "Check (12345)")];

        assert!(matcher.find_matches(&test, &cases).is_empty());
    }
}
