//! Filter parsing
//!
//! Parses raw JSON filter text with size and nesting limits applied before
//! anything reaches the resolver.

use serde_json::Value as JsonValue;

use crate::core::constants::MAX_FILTER_JSON_SIZE;
use crate::error::FilterError;
use crate::utils::json::json_depth;

/// Parse a filter from JSON text
///
/// Validates JSON size, parses it, and rejects values nested deeper than
/// `max_depth`.
pub fn parse_filter(json_str: &str, max_depth: usize) -> Result<JsonValue, FilterError> {
    if json_str.len() > MAX_FILTER_JSON_SIZE {
        return Err(FilterError::FilterJsonTooLarge {
            max_bytes: MAX_FILTER_JSON_SIZE,
        });
    }

    let value: JsonValue = serde_json::from_str(json_str)
        .map_err(|e| FilterError::InvalidFilterJson(e.to_string()))?;

    check_depth(&value, max_depth)?;
    Ok(value)
}

/// Reject values nested deeper than `max_depth`
pub fn check_depth(value: &JsonValue, max_depth: usize) -> Result<(), FilterError> {
    if json_depth(value) > max_depth {
        return Err(FilterError::FilterTooDeep { max_depth });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_filter_valid_json() {
        let value = parse_filter(r#"{"name": {"equalTo": "Ada"}}"#, 16).unwrap();
        assert_eq!(value, json!({"name": {"equalTo": "Ada"}}));
    }

    #[test]
    fn parse_filter_keeps_key_order() {
        let value = parse_filter(r#"{"b": {"equalTo": 1}, "a": {"equalTo": 2}}"#, 16).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn parse_filter_invalid_json() {
        let err = parse_filter("not valid json", 16).unwrap_err();
        assert!(matches!(err, FilterError::InvalidFilterJson(_)));
        assert!(err.is_user_error());
    }

    #[test]
    fn parse_filter_too_large() {
        let json = format!(r#"{{"name": {{"equalTo": "{}"}}}}"#, "x".repeat(MAX_FILTER_JSON_SIZE));
        let err = parse_filter(&json, 16).unwrap_err();
        assert_eq!(
            err,
            FilterError::FilterJsonTooLarge {
                max_bytes: MAX_FILTER_JSON_SIZE
            }
        );
    }

    #[test]
    fn parse_filter_too_deep() {
        let json = r#"{"not": {"not": {"not": {"name": {"equalTo": "x"}}}}}"#;
        assert!(parse_filter(json, 5).is_ok());
        let err = parse_filter(json, 4).unwrap_err();
        assert_eq!(err, FilterError::FilterTooDeep { max_depth: 4 });
    }

    #[test]
    fn parse_filter_null() {
        assert_eq!(parse_filter("null", 16).unwrap(), JsonValue::Null);
    }
}
