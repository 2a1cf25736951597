//! Operand validation and binding
//!
//! Every operand is checked against the codec it will be compared with and
//! then bound as a parameter. Nothing from the filter value is ever written
//! into SQL text.

use serde_json::Value as JsonValue;

use crate::schema::{Codec, DECIMAL_TYPES, INTEGER_TYPES};
use crate::sql::{QualifiedName, SqlFragment};
use crate::utils::json::json_kind;

/// Right-hand side of an operator after binding
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Single(SqlFragment),
    /// Element-wise bound list, for `in`-style operators
    List(Vec<SqlFragment>),
    /// Structural switch that selects the predicate shape, for `isNull`
    Flag(bool),
}

impl Operand {
    /// Apply `f` to every bound expression
    pub fn map(self, f: impl Fn(SqlFragment) -> SqlFragment) -> Self {
        match self {
            Self::Single(fragment) => Self::Single(f(fragment)),
            Self::List(items) => Self::List(items.into_iter().map(f).collect()),
            Self::Flag(flag) => Self::Flag(flag),
        }
    }

    /// Render as a single SQL expression; lists become `(a, b, ...)`
    pub fn into_fragment(self) -> SqlFragment {
        match self {
            Self::Single(fragment) => fragment,
            Self::List(items) => SqlFragment::join(items, ", ").parenthesized(),
            Self::Flag(true) => SqlFragment::raw("true"),
            Self::Flag(false) => SqlFragment::raw("false"),
        }
    }
}

/// Bind a single operand of type `codec`
pub fn bind_operand(value: &JsonValue, codec: &Codec) -> Result<Operand, String> {
    bind_value(value, codec).map(Operand::Single)
}

/// Bind a list operand whose elements have type `element`
pub fn bind_list(value: &JsonValue, element: &Codec) -> Result<Operand, String> {
    let items = value
        .as_array()
        .ok_or_else(|| format!("a list of {}, got {}", element, json_kind(value)))?;
    items
        .iter()
        .map(|item| bind_value(item, element))
        .collect::<Result<Vec<_>, _>>()
        .map(Operand::List)
}

/// Bind a boolean that chooses between two predicate shapes
pub fn bind_flag(value: &JsonValue) -> Result<Operand, String> {
    value
        .as_bool()
        .map(Operand::Flag)
        .ok_or_else(|| format!("a boolean, got {}", json_kind(value)))
}

/// Validate `value` against `codec` and bind it as a parameter
pub fn bind_value(value: &JsonValue, codec: &Codec) -> Result<SqlFragment, String> {
    check_value(value, codec)?;
    match codec.without_domains() {
        Codec::Range { name, of } => Ok(bind_range(value, name, of)),
        _ => Ok(SqlFragment::param(value.clone(), codec.name())),
    }
}

/// Ranges are built with the range type's constructor so each bound stays a
/// separate parameter: `int4range($1, $2, '[)')`.
fn bind_range(value: &JsonValue, range_name: &str, element: &Codec) -> SqlFragment {
    let bound = |key: &str| -> (SqlFragment, bool) {
        let Some(b) = value.get(key).filter(|b| !b.is_null()) else {
            return (SqlFragment::raw("null"), false);
        };
        let inclusive = b
            .get("inclusive")
            .and_then(JsonValue::as_bool)
            .unwrap_or(false);
        match b.get("value") {
            Some(v) if !v.is_null() => (SqlFragment::param(v.clone(), element.name()), inclusive),
            _ => (SqlFragment::raw("null"), inclusive),
        }
    };
    let (start, start_inclusive) = bound("start");
    let (end, end_inclusive) = bound("end");
    let bounds = match (start_inclusive, end_inclusive) {
        (true, true) => "'[]'",
        (true, false) => "'[)'",
        (false, true) => "'(]'",
        (false, false) => "'()'",
    };
    SqlFragment::call_named(
        &QualifiedName::unqualified(range_name),
        vec![start, end, SqlFragment::raw(bounds)],
    )
}

/// Check that a JSON value is acceptable for `codec`
pub fn check_value(value: &JsonValue, codec: &Codec) -> Result<(), String> {
    match codec {
        Codec::Domain { base, .. } => check_value(value, base),
        Codec::Scalar(name) => check_scalar(value, name),
        Codec::Enum { name, values } => match value.as_str() {
            Some(s) if values.iter().any(|v| v == s) => Ok(()),
            _ => Err(format!("one of {} ({})", values.join(", "), name)),
        },
        Codec::Array(inner) => {
            let items = value
                .as_array()
                .ok_or_else(|| format!("a list ({}), got {}", codec, json_kind(value)))?;
            items
                .iter()
                .filter(|item| !item.is_null())
                .try_for_each(|item| check_value(item, inner))
        }
        Codec::Range { name, of } => {
            let object = value
                .as_object()
                .ok_or_else(|| format!("a range object ({}), got {}", name, json_kind(value)))?;
            for (key, bound) in object {
                if key != "start" && key != "end" {
                    return Err(format!("a range object with start/end bounds ({})", name));
                }
                if bound.is_null() {
                    continue;
                }
                let inner = bound
                    .as_object()
                    .ok_or_else(|| format!("a range bound object with value/inclusive ({})", name))?;
                match inner.get("value") {
                    Some(v) if !v.is_null() => check_value(v, of)?,
                    _ => {}
                }
                if let Some(inclusive) = inner.get("inclusive")
                    && !inclusive.is_boolean()
                {
                    return Err(format!("a boolean 'inclusive' flag ({})", name));
                }
            }
            Ok(())
        }
        Codec::Composite(name) => {
            if value.is_object() {
                Ok(())
            } else {
                Err(format!("an object ({}), got {}", name, json_kind(value)))
            }
        }
    }
}

fn check_scalar(value: &JsonValue, name: &str) -> Result<(), String> {
    let ok = match name {
        "bool" | "boolean" => value.is_boolean(),
        "json" | "jsonb" => !value.is_null(),
        n if INTEGER_TYPES.contains(&n) => {
            value.is_i64()
                || value.is_u64()
                || value.as_str().is_some_and(|s| s.parse::<i64>().is_ok())
        }
        n if DECIMAL_TYPES.contains(&n) => {
            value.is_number() || value.as_str().is_some_and(|s| s.parse::<f64>().is_ok())
        }
        _ => value.is_string(),
    };
    if ok {
        return Ok(());
    }
    let expected = match name {
        "bool" | "boolean" => "a boolean",
        "json" | "jsonb" => "a JSON value",
        n if INTEGER_TYPES.contains(&n) => "an integer",
        n if DECIMAL_TYPES.contains(&n) => "a number",
        _ => "a string",
    };
    Err(format!("{} ({}), got {}", expected, name, json_kind(value)))
}
