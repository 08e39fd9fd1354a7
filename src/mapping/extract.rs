//! Identifier extraction from raw test names.
//!
//! Test producers embed tracker identifiers in the test name itself,
//! either as a parenthesized numeric id or as an `id-<uuid>` marker
//! inside the parametrization brackets:
//!
//! ```text
//! test_ban_l3_agent[once][(12345)]
//! test_quotas[id-2390f766-836d-40ef-9aeb-e810d78207fb,network]
//! ```
//!
//! Both extractors are pure functions over the name; they never fail,
//! they just return `None` when the pattern is absent.

use regex::Regex;
use uuid::Uuid;

/// Extracts a parenthesized numeric id from a test name.
///
/// Matches the first run of four or more digits wrapped in parentheses
/// anywhere in the name. Shorter digit runs are ignored so that
/// parametrized values like `(80)` don't masquerade as case ids.
///
/// # Example
///
/// ```
/// use railgun::mapping::extract_numeric_id;
///
/// assert_eq!(
///     extract_numeric_id("test_ban_l3_agent[once][(12345)]"),
///     Some("12345".to_string())
/// );
/// assert_eq!(extract_numeric_id("test_ban_l3_agent"), None);
/// ```
pub fn extract_numeric_id(name: &str) -> Option<String> {
    let re = Regex::new(r"\((\d{4,})\)").unwrap();
    re.captures(name).map(|cap| cap[1].to_string())
}

/// Extracts a bracketed `id-<uuid>` token from a test name.
///
/// The token may share the brackets with comma-separated siblings on
/// either side:
///
/// ```text
/// test_quotas[id-2390f766-836d-40ef-9aeb-e810d78207fb]
/// test_quotas[id-2390f766-836d-40ef-9aeb-e810d78207fb,network]
/// test_quotas[network,id-2390f766-836d-40ef-9aeb-e810d78207fb]
/// ```
///
/// The captured value must parse as a UUID; it is returned in the
/// canonical lowercase-hyphenated form regardless of how the producer
/// spelled it. A token that is not a syntactically valid UUID yields
/// `None`.
pub fn extract_uuid(name: &str) -> Option<String> {
    let re = Regex::new(r"\[(?:.*,)?id-(.+?)(?:,.+)?\]").unwrap();
    let cap = re.captures(name)?;
    Uuid::parse_str(&cap[1]).ok().map(|u| u.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_id_in_brackets() {
        assert_eq!(
            extract_numeric_id("test_ban_l3_agent[once][(12345)]"),
            Some("12345".to_string())
        );
    }

    #[test]
    fn test_numeric_id_requires_four_digits() {
        assert_eq!(extract_numeric_id("test_x[(123)]"), None);
        assert_eq!(extract_numeric_id("test_x[(1234)]"), Some("1234".to_string()));
    }

    #[test]
    fn test_numeric_id_requires_parentheses() {
        assert_eq!(extract_numeric_id("test_x[12345]"), None);
        assert_eq!(extract_numeric_id("test_12345"), None);
    }

    #[test]
    fn test_numeric_id_first_match_wins() {
        assert_eq!(
            extract_numeric_id("test_x[(1111)][(2222)]"),
            Some("1111".to_string())
        );
    }

    #[test]
    fn test_uuid_plain() {
        assert_eq!(
            extract_uuid("test_quotas[id-2390f766-836d-40ef-9aeb-e810d78207fb]"),
            Some("2390f766-836d-40ef-9aeb-e810d78207fb".to_string())
        );
    }

    #[test]
    fn test_uuid_with_trailing_sibling() {
        assert_eq!(
            extract_uuid("test_quotas[id-2390f766-836d-40ef-9aeb-e810d78207fb,network]"),
            Some("2390f766-836d-40ef-9aeb-e810d78207fb".to_string())
        );
    }

    #[test]
    fn test_uuid_with_leading_sibling() {
        assert_eq!(
            extract_uuid("test_quotas[network,id-2390f766-836d-40ef-9aeb-e810d78207fb]"),
            Some("2390f766-836d-40ef-9aeb-e810d78207fb".to_string())
        );
    }

    #[test]
    fn test_uuid_canonicalized_to_lowercase() {
        assert_eq!(
            extract_uuid("test_x[id-2390F766-836D-40EF-9AEB-E810D78207FB]"),
            Some("2390f766-836d-40ef-9aeb-e810d78207fb".to_string())
        );
    }

    #[test]
    fn test_uuid_invalid_token() {
        assert_eq!(extract_uuid("test_x[id-not-a-uuid]"), None);
        assert_eq!(extract_uuid("test_x[id-2390f766]"), None);
    }

    #[test]
    fn test_uuid_absent() {
        assert_eq!(extract_uuid("test_quotas[network]"), None);
        assert_eq!(extract_uuid("test_quotas"), None);
    }
}
