//! Typed TestRail API entities.
//!
//! Only the resources the sync touches are modeled. Responses carry
//! many more fields than we read; unknown keys are either ignored or,
//! for cases, kept as raw JSON so that custom fields stay reachable by
//! the matching templates.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A TestRail project.
#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

/// A milestone within a project.
#[derive(Debug, Clone, Deserialize)]
pub struct Milestone {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

/// A test suite within a project.
#[derive(Debug, Clone, Deserialize)]
pub struct Suite {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub project_id: u64,
}

/// A section grouping cases inside a suite.
#[derive(Debug, Clone, Deserialize)]
pub struct Section {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

/// A test case record owned by TestRail.
///
/// `id` and `title` are first-class; everything else the API returns
/// (including every `custom_*` field) is retained in [`Case::fields`]
/// so the matching templates can reference arbitrary custom fields.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Case {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Case {
    /// Look up a raw field value by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Iterate the case's string-valued fields, `title` included.
    ///
    /// Numeric, boolean and list-valued custom fields are excluded;
    /// templates interpolate strings only.
    pub fn string_fields(&self) -> impl Iterator<Item = (&str, &str)> {
        std::iter::once(("title", self.title.as_str())).chain(
            self.fields
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.as_str(), s))),
        )
    }
}

/// A custom case field definition, as returned by `get_case_fields`.
#[derive(Debug, Clone, Deserialize)]
pub struct CaseField {
    #[serde(default)]
    pub system_name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub configs: Vec<CaseFieldConfig>,
}

impl CaseField {
    /// The configured dropdown items for this field, if any.
    pub fn items(&self) -> Option<&str> {
        self.configs.first().and_then(|c| c.options.items.as_deref())
    }
}

/// One per-project configuration block of a custom case field.
#[derive(Debug, Clone, Deserialize)]
pub struct CaseFieldConfig {
    #[serde(default)]
    pub options: CaseFieldOptions,
}

/// Options of a case field configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaseFieldOptions {
    #[serde(default)]
    pub items: Option<String>,
}

/// Payload for creating a new case via `add_case`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CaseDraft {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone_id: Option<u64>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl CaseDraft {
    /// Create a draft with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Attach the milestone the case belongs to.
    pub fn with_milestone(mut self, milestone_id: Option<u64>) -> Self {
        self.milestone_id = milestone_id;
        self
    }

    /// Set an arbitrary (typically `custom_*`) field.
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Merge extra fields into the draft, overriding existing keys.
    ///
    /// `title` and `milestone_id` are routed to their struct fields so
    /// the flattened map never shadows them on the wire.
    pub fn merge_fields(mut self, extra: &Map<String, Value>) -> Self {
        for (k, v) in extra {
            match k.as_str() {
                "title" => {
                    if let Some(title) = v.as_str() {
                        self.title = title.to_string();
                    }
                }
                "milestone_id" => self.milestone_id = v.as_u64(),
                _ => {
                    self.fields.insert(k.clone(), v.clone());
                }
            }
        }
        self
    }
}

/// A test plan grouping runs for a milestone.
#[derive(Debug, Clone, Deserialize)]
pub struct Plan {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub entries: Vec<PlanEntry>,
}

/// One entry of a plan; holds the runs created under it.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanEntry {
    #[serde(default)]
    pub runs: Vec<Run>,
}

/// A run holding a set of cases and their verdicts.
#[derive(Debug, Clone, Deserialize)]
pub struct Run {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

/// A result status (`passed`, `failed`, `blocked`, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct Status {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

/// One verdict for `add_results_for_cases`.
#[derive(Debug, Clone, Serialize)]
pub struct ResultDraft {
    pub case_id: u64,
    pub status_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_keeps_custom_fields() {
        let case: Case = serde_json::from_str(
            r#"{
                "id": 3,
                "suite_id": 2,
                "title": "case title",
                "custom_report_label": "12345",
                "custom_case_complexity": 2,
                "custom_tags": ["smoke"]
            }"#,
        )
        .unwrap();

        assert_eq!(case.id, 3);
        assert_eq!(case.title, "case title");
        assert_eq!(
            case.field("custom_report_label").and_then(Value::as_str),
            Some("12345")
        );
    }

    #[test]
    fn test_string_fields_excludes_non_strings() {
        let case: Case = serde_json::from_str(
            r#"{"id": 1, "title": "t", "custom_a": "x", "custom_n": 7, "custom_b": true}"#,
        )
        .unwrap();

        let fields: Vec<(&str, &str)> = case.string_fields().collect();
        assert!(fields.contains(&("title", "t")));
        assert!(fields.contains(&("custom_a", "x")));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_case_field_items() {
        let field: CaseField = serde_json::from_str(
            r#"{
                "system_name": "custom_qa_team",
                "label": "QA team",
                "configs": [{"options": {"items": "1, Framework-CI\n2, Fuel", "is_required": true}}]
            }"#,
        )
        .unwrap();

        assert_eq!(field.system_name, "custom_qa_team");
        assert_eq!(field.items(), Some("1, Framework-CI\n2, Fuel"));
    }

    #[test]
    fn test_case_field_without_configs() {
        let field: CaseField =
            serde_json::from_str(r#"{"system_name": "custom_x", "configs": []}"#).unwrap();
        assert_eq!(field.items(), None);
    }

    #[test]
    fn test_plan_entries() {
        let plan: Plan = serde_json::from_str(
            r#"{
                "id": 8,
                "name": "new_test_plan",
                "entries": [{"runs": [{"id": 13, "name": "some test run"}], "id": 12}]
            }"#,
        )
        .unwrap();

        assert_eq!(plan.entries.len(), 1);
        assert_eq!(plan.entries[0].runs[0].id, 13);
    }

    #[test]
    fn test_case_draft_serializes_flat() {
        let draft = CaseDraft::new("a title")
            .with_milestone(Some(8))
            .with_field("custom_test_case_description", Value::from("{uuid}"));

        let body = serde_json::to_value(&draft).unwrap();
        assert_eq!(body["title"], "a title");
        assert_eq!(body["milestone_id"], 8);
        assert_eq!(body["custom_test_case_description"], "{uuid}");
    }

    #[test]
    fn test_case_draft_merge_overrides() {
        let mut extra = Map::new();
        extra.insert("custom_qa_team".to_string(), Value::from("9"));
        extra.insert("title".to_string(), Value::from("overridden"));

        let draft = CaseDraft::new("original").merge_fields(&extra);
        let body = serde_json::to_value(&draft).unwrap();

        assert_eq!(body["title"], "overridden");
        assert_eq!(body["custom_qa_team"], "9");
    }
}
