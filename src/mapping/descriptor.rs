//! Flat field views of executed tests and tracker cases.
//!
//! Matching templates interpolate named fields (`"{uuid}"`,
//! `"{classname}.{methodname}"`, `"{custom_report_label}"`). A
//! [`CaseDescriptor`] is the flat name → value view a template renders
//! against, with one important property: referencing a field whose
//! value is absent fails loudly instead of formatting a placeholder
//! into a match key or a generated title.

use std::collections::BTreeMap;

use regex::Regex;

use crate::testrail::Case;
use crate::xunit::XunitCase;

use super::extract::{extract_numeric_id, extract_uuid};

/// A format template referenced a field with no value.
///
/// Recoverable per test: the orchestrator logs it and treats the test
/// as matching nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("field `{field}` has no value")]
pub struct MissingFieldError {
    /// Name of the field the template referenced.
    pub field: String,
}

impl MissingFieldError {
    fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

/// Ephemeral name → value mapping built once per case for template
/// rendering. Field order is stable, which keeps diagnostics and the
/// no-match field dump deterministic.
#[derive(Debug, Clone, Default)]
pub struct CaseDescriptor {
    fields: BTreeMap<String, Option<String>>,
}

impl CaseDescriptor {
    /// Describe an executed test.
    ///
    /// Fields: `classname`, `methodname`, `id` (the producer-embedded
    /// report id, else a numeric id extracted from the test name) and
    /// `uuid` (extracted from the test name). `id` and `uuid` may be
    /// unset; templates referencing them fail for tests that lack them.
    pub fn from_xunit(case: &XunitCase) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert("classname".to_string(), Some(case.classname.clone()));
        fields.insert("methodname".to_string(), Some(case.methodname.clone()));
        fields.insert(
            "id".to_string(),
            case.report_id
                .clone()
                .or_else(|| extract_numeric_id(&case.methodname)),
        );
        fields.insert("uuid".to_string(), extract_uuid(&case.methodname));
        Self { fields }
    }

    /// Describe a tracker case: `title` plus every string-valued
    /// custom field. Non-string fields are not template material.
    pub fn from_case(case: &Case) -> Self {
        let fields = case
            .string_fields()
            .map(|(k, v)| (k.to_string(), Some(v.to_string())))
            .collect();
        Self { fields }
    }

    /// Value of a field, if present and set.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_deref())
    }

    /// Value of a field, failing loudly when the field is unknown or
    /// its value is absent.
    pub fn require(&self, name: &str) -> Result<&str, MissingFieldError> {
        self.fields
            .get(name)
            .and_then(|v| v.as_deref())
            .ok_or_else(|| MissingFieldError::new(name))
    }

    /// Iterate all fields in stable order, unset values included.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Render a `{field}`-style template against this descriptor.
    ///
    /// Every placeholder goes through [`require`](Self::require), so a
    /// single absent field fails the whole render. Text outside
    /// placeholders is copied verbatim.
    pub fn render(&self, template: &str) -> Result<String, MissingFieldError> {
        let placeholder = Regex::new(r"\{([A-Za-z0-9_]+)\}").unwrap();
        let mut out = String::with_capacity(template.len());
        let mut last = 0;

        for cap in placeholder.captures_iter(template) {
            let span = cap.get(0).unwrap();
            out.push_str(&template[last..span.start()]);
            out.push_str(self.require(&cap[1])?);
            last = span.end();
        }
        out.push_str(&template[last..]);

        Ok(out)
    }
}
