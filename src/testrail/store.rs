//! Suite-backed case storage.
//!
//! The mapping layer reaches the tracker only through the
//! [`CaseStore`] seam, and only when auto-creating cases. The live
//! implementation wraps the API client and a suite snapshot;
//! [`MemoryStore`] backs tests and dry experiments without a TestRail
//! instance.

use serde_json::Value;

use crate::mapping::CaseStore;

use super::client::Client;
use super::model::{Case, CaseDraft, CaseField, Suite};
use super::{TestRailError, TestRailResult};

/// A TestRail suite snapshot plus the client to mutate it.
///
/// Holds the suite's case collection fetched once up front; cases
/// created through [`CaseStore::add_case`] are appended to it, so a
/// caller re-reading [`cases`](Self::cases) after a mapping pass sees
/// the created cases too.
pub struct SuiteStore<'a> {
    client: &'a Client,
    project_id: u64,
    suite: Suite,
    cases: Vec<Case>,
}

impl<'a> SuiteStore<'a> {
    /// Fetch the suite's cases and build the store.
    pub fn fetch(client: &'a Client, project_id: u64, suite: Suite) -> TestRailResult<Self> {
        let cases = client.cases(project_id, suite.id)?;
        Ok(Self {
            client,
            project_id,
            suite,
            cases,
        })
    }

    /// The suite this store wraps.
    pub fn suite(&self) -> &Suite {
        &self.suite
    }

    /// The suite's cases, auto-created ones included.
    pub fn cases(&self) -> &[Case] {
        &self.cases
    }
}

impl CaseStore for SuiteStore<'_> {
    fn suite_name(&self) -> &str {
        &self.suite.name
    }

    fn custom_case_fields(&self) -> Result<Vec<CaseField>, TestRailError> {
        self.client.case_fields()
    }

    fn ensure_section(&mut self, name: &str) -> Result<u64, TestRailError> {
        let sections = self.client.sections(self.project_id, self.suite.id)?;
        if let Some(section) = sections.iter().find(|s| s.name == name) {
            return Ok(section.id);
        }
        let section = self
            .client
            .add_section(self.project_id, self.suite.id, name)?;
        Ok(section.id)
    }

    fn add_case(&mut self, section_id: u64, draft: CaseDraft) -> Result<Case, TestRailError> {
        let case = self.client.add_case(section_id, &draft)?;
        self.cases.push(case.clone());
        Ok(case)
    }
}

/// In-memory case store.
///
/// Behaves like a suite with no cases and no sections; everything
/// created through it is observable afterwards. Used by the test
/// suites and usable wherever a tracker connection is not wanted.
#[derive(Debug, Default)]
pub struct MemoryStore {
    name: String,
    fields: Vec<CaseField>,
    sections: Vec<String>,
    cases: Vec<Case>,
    next_id: u64,
}

impl MemoryStore {
    /// Create an empty store for a suite with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            next_id: 1,
            ..Self::default()
        }
    }

    /// Pre-populate the custom case field definitions.
    pub fn with_case_fields(mut self, fields: Vec<CaseField>) -> Self {
        self.fields = fields;
        self
    }

    /// Cases created through this store.
    pub fn cases(&self) -> &[Case] {
        &self.cases
    }

    /// Names of the sections created through this store.
    pub fn sections(&self) -> &[String] {
        &self.sections
    }
}

impl CaseStore for MemoryStore {
    fn suite_name(&self) -> &str {
        &self.name
    }

    fn custom_case_fields(&self) -> Result<Vec<CaseField>, TestRailError> {
        Ok(self.fields.clone())
    }

    fn ensure_section(&mut self, name: &str) -> Result<u64, TestRailError> {
        if let Some(pos) = self.sections.iter().position(|s| s == name) {
            return Ok(pos as u64 + 1);
        }
        self.sections.push(name.to_string());
        Ok(self.sections.len() as u64)
    }

    fn add_case(&mut self, section_id: u64, draft: CaseDraft) -> Result<Case, TestRailError> {
        let decode_err = |message: String| TestRailError::Decode {
            method: "add_case".to_string(),
            message,
        };

        let mut body = match serde_json::to_value(&draft).map_err(|e| decode_err(e.to_string()))? {
            Value::Object(map) => map,
            other => return Err(decode_err(format!("expected object, got {other}"))),
        };
        body.insert("id".to_string(), Value::from(self.next_id));
        body.insert("section_id".to_string(), Value::from(section_id));
        self.next_id += 1;

        let case: Case = serde_json::from_value(Value::Object(body))
            .map_err(|e| decode_err(e.to_string()))?;
        self.cases.push(case.clone());
        Ok(case)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_assigns_ids() {
        let mut store = MemoryStore::new("Suite");
        let a = store.add_case(1, CaseDraft::new("first")).unwrap();
        let b = store.add_case(1, CaseDraft::new("second")).unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(store.cases().len(), 2);
    }

    #[test]
    fn test_memory_store_section_is_reused() {
        let mut store = MemoryStore::new("Suite");
        let first = store.ensure_section("All").unwrap();
        let again = store.ensure_section("All").unwrap();
        let other = store.ensure_section("Automation").unwrap();
        assert_eq!(first, again);
        assert_ne!(first, other);
        assert_eq!(store.sections().len(), 2);
    }

    #[test]
    fn test_memory_store_case_carries_draft_fields() {
        let mut store = MemoryStore::new("Suite");
        let draft = CaseDraft::new("titled")
            .with_milestone(Some(8))
            .with_field("custom_report_label", Value::from("12345"));
        let case = store.add_case(3, draft).unwrap();

        assert_eq!(case.title, "titled");
        assert_eq!(case.field("milestone_id").and_then(Value::as_u64), Some(8));
        assert_eq!(
            case.field("custom_report_label").and_then(Value::as_str),
            Some("12345")
        );
        assert_eq!(case.field("section_id").and_then(Value::as_u64), Some(3));
    }
}
