//! JSON utility functions

use serde_json::Value as JsonValue;

/// Nesting depth of a JSON value.
///
/// Scalars have depth 0; every enclosing array or object adds one level.
pub fn json_depth(value: &JsonValue) -> usize {
    match value {
        JsonValue::Array(items) => 1 + items.iter().map(json_depth).max().unwrap_or(0),
        JsonValue::Object(map) => 1 + map.values().map(json_depth).max().unwrap_or(0),
        _ => 0,
    }
}

/// Short name of a JSON value's kind, for error messages
pub fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "list",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_depth() {
        assert_eq!(json_depth(&json!(5)), 0);
        assert_eq!(json_depth(&JsonValue::Null), 0);
    }

    #[test]
    fn test_nested_depth() {
        assert_eq!(json_depth(&json!({})), 1);
        assert_eq!(json_depth(&json!({"a": {"equalTo": 1}})), 2);
        assert_eq!(json_depth(&json!({"or": [{"a": {"equalTo": 1}}]})), 4);
    }

    #[test]
    fn test_json_kind() {
        assert_eq!(json_kind(&json!("x")), "string");
        assert_eq!(json_kind(&json!([1])), "list");
        assert_eq!(json_kind(&json!({"a": 1})), "object");
    }
}
