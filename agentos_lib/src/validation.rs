//! Local input checks. Everything here runs before any request is issued.

use crate::config::MAX_PAGE_SIZE;
use crate::error::AgentOsError;

pub const MAX_FILTER_LENGTH: usize = 100;
pub const MAX_REASON_LENGTH: usize = 500;
pub const MIN_REASON_LENGTH: usize = 3;

/// Strip ASCII control characters (0x00-0x1F except space 0x20), trim whitespace,
/// and enforce a byte-length limit.
pub fn sanitize_text(input: &str, max_len: usize) -> Result<String, AgentOsError> {
    if input.len() > max_len {
        return Err(AgentOsError::InvalidInput(format!(
            "input exceeds maximum length of {} bytes",
            max_len
        )));
    }
    let sanitized: String = input
        .chars()
        .filter(|c| !c.is_ascii_control() || *c == ' ')
        .collect::<String>()
        .trim()
        .to_string();
    if sanitized.is_empty() {
        return Err(AgentOsError::InvalidInput(
            "input is empty after sanitization".to_string(),
        ));
    }
    Ok(sanitized)
}

/// Validate a filter value. An empty value is allowed and means "clear".
pub fn validate_filter_value(input: &str) -> Result<String, AgentOsError> {
    if input.trim().is_empty() {
        return Ok(String::new());
    }
    sanitize_text(input, MAX_FILTER_LENGTH)
}

/// Validate a rejection (or other) reason: required, trimmed, bounded.
pub fn validate_reason(input: Option<&str>) -> Result<String, AgentOsError> {
    let raw = input.unwrap_or_default();
    if raw.trim().is_empty() {
        return Err(AgentOsError::InvalidInput("a reason is required".to_string()));
    }
    let reason = sanitize_text(raw, MAX_REASON_LENGTH)?;
    if reason.chars().count() < MIN_REASON_LENGTH {
        return Err(AgentOsError::InvalidInput(format!(
            "reason must be at least {} characters",
            MIN_REASON_LENGTH
        )));
    }
    Ok(reason)
}

/// Validate a page size: 1..=MAX_PAGE_SIZE.
pub fn validate_page_size(page_size: u64) -> Result<u64, AgentOsError> {
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(AgentOsError::InvalidInput(format!(
            "page size must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }
    Ok(page_size)
}

/// Split a `key=value` filter argument.
pub fn parse_filter_arg(input: &str) -> Result<(String, String), AgentOsError> {
    let (key, value) = input.split_once('=').ok_or_else(|| {
        AgentOsError::InvalidInput(format!("filter '{}' must look like key=value", input))
    })?;
    let key = key.trim();
    if key.is_empty() {
        return Err(AgentOsError::InvalidInput(format!(
            "filter '{}' has an empty key",
            input
        )));
    }
    Ok((key.to_string(), validate_filter_value(value)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_control_chars() {
        assert_eq!(sanitize_text("  ab\u{7}c \n", 50).unwrap(), "abc");
    }

    #[test]
    fn sanitize_rejects_long_input() {
        let long = "x".repeat(MAX_FILTER_LENGTH + 1);
        assert!(validate_filter_value(&long).is_err());
    }

    #[test]
    fn blank_filter_value_clears() {
        assert_eq!(validate_filter_value("   ").unwrap(), "");
    }

    #[test]
    fn reason_is_required() {
        assert!(validate_reason(None).unwrap_err().is_validation());
        assert!(validate_reason(Some("   ")).is_err());
        assert!(validate_reason(Some("no")).is_err());
        assert_eq!(
            validate_reason(Some(" exceeds budget ")).unwrap(),
            "exceeds budget"
        );
    }

    #[test]
    fn page_size_bounds() {
        assert!(validate_page_size(0).is_err());
        assert!(validate_page_size(MAX_PAGE_SIZE + 1).is_err());
        assert_eq!(validate_page_size(25).unwrap(), 25);
    }

    #[test]
    fn filter_arg_parsing() {
        assert_eq!(
            parse_filter_arg("status=running").unwrap(),
            ("status".to_string(), "running".to_string())
        );
        assert_eq!(
            parse_filter_arg("q=a=b").unwrap(),
            ("q".to_string(), "a=b".to_string())
        );
        assert!(parse_filter_arg("status").is_err());
        assert!(parse_filter_arg("=x").is_err());
    }
}
