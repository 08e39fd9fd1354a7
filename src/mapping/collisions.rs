//! 1:1 validation of a computed correspondence.
//!
//! A silently-ambiguous mapping would post verdicts against the wrong
//! tracker case, so ambiguity is fatal for the whole matching pass
//! unless duplicates were explicitly allowed.

use std::collections::BTreeMap;

use tracing::error;

use crate::testrail::Case;
use crate::xunit::XunitCase;

use super::MappingError;

/// One entity that collected more than one counterpart.
#[derive(Debug, Clone)]
pub struct Collision {
    /// The shared entity.
    pub key: String,
    /// The counterparts that collided on it.
    pub members: Vec<String>,
}

impl std::fmt::Display for Collision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <- [{}]", self.key, self.members.join(", "))
    }
}

/// Validate that the pairs form a 1:1 correspondence.
///
/// Groups the pairs by tracker case and by executed test; with
/// duplicates disallowed, any group holding two or more pairs logs
/// every offending pair and fails with [`MappingError::Ambiguous`]
/// carrying the full collision report.
pub fn check_collisions(
    pairs: &[(Case, XunitCase)],
    allow_duplicates: bool,
) -> Result<(), MappingError> {
    if allow_duplicates {
        return Ok(());
    }

    let mut conflicts = Vec::new();

    // Distinct xUnit cases that landed on a single TestRail case.
    let mut by_case: BTreeMap<u64, (&Case, Vec<&XunitCase>)> = BTreeMap::new();
    for (case, xunit) in pairs {
        by_case
            .entry(case.id)
            .or_insert_with(|| (case, Vec::new()))
            .1
            .push(xunit);
    }
    for (case, tests) in by_case.values() {
        if tests.len() > 1 {
            error!("Found xUnit cases matching a single TestRail case:");
            for test in tests {
                error!("TestRail \"{}\" - xUnit \"{}\"", case.title, test);
            }
            conflicts.push(Collision {
                key: format!("TestRail \"{}\"", case.title),
                members: tests.iter().map(|t| format!("xUnit \"{t}\"")).collect(),
            });
        }
    }

    // Distinct TestRail cases that landed on a single xUnit case.
    let mut by_test: BTreeMap<String, Vec<&Case>> = BTreeMap::new();
    for (case, xunit) in pairs {
        by_test.entry(xunit.to_string()).or_default().push(case);
    }
    for (test, cases) in &by_test {
        if cases.len() > 1 {
            error!("Found TestRail cases matching a single xUnit case:");
            for case in cases {
                error!("xUnit \"{}\" - TestRail \"{}\"", test, case.title);
            }
            conflicts.push(Collision {
                key: format!("xUnit \"{test}\""),
                members: cases
                    .iter()
                    .map(|c| format!("TestRail \"{}\"", c.title))
                    .collect(),
            });
        }
    }

    if conflicts.is_empty() {
        Ok(())
    } else {
        Err(MappingError::Ambiguous { conflicts })
    }
}
