//! CLI input validation functions.
//!
//! Used by clap's `value_parser` attribute so bad input is rejected at parse
//! time with a specific message.

use crate::domain::validate_title as validate_domain_title;
use crate::id_generation;

/// Validate and trim an issue ID prefix
pub fn validate_prefix(s: &str) -> Result<String, String> {
    let trimmed = s.trim();
    id_generation::validate_prefix(trimmed).map_err(|e| e.to_string())?;
    Ok(trimmed.to_string())
}

/// Validate issue ID format.
///
/// Expected format: `prefix-suffix`, ASCII alphanumerics and hyphens, e.g.
/// `proj-a3f8` or `web-api-x9k2`.
pub fn validate_issue_id(s: &str) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Issue ID cannot be empty".to_string());
    }
    if !s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(format!(
            "Invalid issue ID '{s}': only alphanumerics and hyphens are allowed"
        ));
    }
    if !s.contains('-') {
        return Err(format!(
            "Invalid issue ID format: '{s}'. Expected format: prefix-suffix (e.g., proj-a3f8)"
        ));
    }
    if s.starts_with('-') || s.ends_with('-') || s.contains("--") {
        return Err(format!(
            "Invalid issue ID '{s}': hyphens must separate non-empty parts"
        ));
    }

    Ok(s.to_string())
}

/// Validate an issue title
pub fn validate_title(s: &str) -> Result<String, String> {
    let trimmed = s.trim();
    validate_domain_title(trimmed)?;
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::simple("proj-a3f8")]
    #[case::hyphenated_prefix("web-api-x9k2")]
    #[case::padded("  proj-abc  ")]
    fn test_validate_issue_id_valid(#[case] id: &str) {
        assert_eq!(validate_issue_id(id).unwrap(), id.trim());
    }

    #[rstest]
    #[case::empty("", "cannot be empty")]
    #[case::no_hyphen("projabc", "Expected format")]
    #[case::leading("-abc", "hyphens")]
    #[case::trailing("proj-", "hyphens")]
    #[case::double("proj--abc", "hyphens")]
    #[case::underscore("proj_abc", "only alphanumerics")]
    fn test_validate_issue_id_invalid(#[case] id: &str, #[case] expected: &str) {
        let err = validate_issue_id(id).unwrap_err();
        assert!(err.contains(expected), "got: {err}");
    }

    #[test]
    fn test_validate_title_trims() {
        assert_eq!(validate_title("  Fix it ").unwrap(), "Fix it");
        assert!(validate_title("   ").is_err());
    }

    #[test]
    fn test_validate_prefix() {
        assert_eq!(validate_prefix(" web ").unwrap(), "web");
        assert!(validate_prefix("no spaces").is_err());
    }
}
