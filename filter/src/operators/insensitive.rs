//! Case-insensitive operator derivation
//!
//! For ordinary text columns the `...Insensitive` variant folds both sides
//! with `lower(...)` and the base operator is left alone. For columns that
//! already compare case-insensitively (citext) the roles swap: the base
//! operator casts both sides to `text` so it becomes case-sensitive, and the
//! insensitive variant applies no folding at all.

use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::schema::TEXT_TYPES;
use crate::sql::SqlFragment;

use super::operand::Operand;
use super::spec::{OperatorContext, OperatorSpec};

/// Suffix appended to derived operator names
pub const INSENSITIVE_SUFFIX: &str = "Insensitive";

fn fold(fragment: SqlFragment) -> SqlFragment {
    SqlFragment::call("lower", vec![fragment])
}

fn as_text(fragment: SqlFragment) -> SqlFragment {
    fragment.cast("text")
}

/// Rewrap case-sensitive operators and add their insensitive variants.
///
/// Operators not marked case-sensitive pass through unchanged. The returned
/// list keeps every input operator and appends one derived operator per
/// case-sensitive input.
pub fn derive_insensitive_variants(base: Vec<OperatorSpec>) -> Vec<OperatorSpec> {
    let mut derived = Vec::new();
    let mut out = Vec::with_capacity(base.len() * 2);
    for spec in base {
        if !spec.case_sensitive {
            out.push(spec);
            continue;
        }
        derived.push(insensitive_variant(&spec));
        out.push(sensitive_variant(spec));
    }
    out.extend(derived);
    out
}

/// Base operator that stays case-sensitive even on citext columns
fn sensitive_variant(spec: OperatorSpec) -> OperatorSpec {
    let base_identifier = spec.identifier_transform.clone();
    let base_value = spec.value_transform.clone();
    OperatorSpec {
        identifier_transform: Arc::new(move |identifier, ctx: &OperatorContext<'_>| {
            let identifier = base_identifier(identifier, ctx);
            if ctx.field.is_case_insensitive() {
                as_text(identifier)
            } else {
                identifier
            }
        }),
        value_transform: Arc::new(move |value: &JsonValue, ctx: &OperatorContext<'_>| {
            let operand = base_value(value, ctx)?;
            Ok(if ctx.field.is_case_insensitive() {
                operand.map(as_text)
            } else {
                operand
            })
        }),
        ..spec
    }
}

fn insensitive_variant(spec: &OperatorSpec) -> OperatorSpec {
    let base_identifier = spec.identifier_transform.clone();
    let base_value = spec.value_transform.clone();
    let allowed: Vec<String> = match &spec.allowed_field_types {
        Some(types) => types
            .iter()
            .filter(|t| TEXT_TYPES.contains(&t.as_str()))
            .cloned()
            .collect(),
        None => TEXT_TYPES.iter().map(|t| t.to_string()).collect(),
    };
    OperatorSpec {
        name: format!("{}{}", spec.name, INSENSITIVE_SUFFIX),
        description: format!(
            "{} (case-insensitive).",
            spec.description.trim_end_matches('.')
        ),
        category: spec.category,
        allowed_field_types: Some(allowed),
        case_sensitive: false,
        backends: spec.backends.clone(),
        input_codec: spec.input_codec.clone(),
        identifier_transform: Arc::new(move |identifier, ctx: &OperatorContext<'_>| {
            let identifier = base_identifier(identifier, ctx);
            if ctx.field.is_case_insensitive() {
                identifier
            } else {
                fold(identifier)
            }
        }),
        value_transform: Arc::new(move |value: &JsonValue, ctx: &OperatorContext<'_>| {
            let operand: Operand = base_value(value, ctx)?;
            Ok(if ctx.field.is_case_insensitive() {
                operand
            } else {
                operand.map(fold)
            })
        }),
        template: spec.template.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::OperatorCategory;
    use crate::schema::Codec;
    use crate::sql::PostgresDialect;
    use serde_json::json;

    fn base() -> Vec<OperatorSpec> {
        vec![
            OperatorSpec::builder("isNull", OperatorCategory::Scalar)
                .description("Is null.")
                .binary(" is ")
                .build()
                .unwrap(),
            OperatorSpec::builder("equalTo", OperatorCategory::Scalar)
                .description("Equal to the specified value.")
                .case_sensitive()
                .binary(" = ")
                .build()
                .unwrap(),
        ]
    }

    fn render(spec: &OperatorSpec, codec: &Codec, value: serde_json::Value) -> String {
        let column = SqlFragment::column(&SqlFragment::identifier("t"), "name");
        spec.compile(column, codec, &value)
            .unwrap()
            .to_fragment()
            .render(&PostgresDialect)
            .sql
    }

    #[test]
    fn test_only_case_sensitive_operators_are_derived() {
        let ops = derive_insensitive_variants(base());
        let names: Vec<&str> = ops.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["isNull", "equalTo", "equalToInsensitive"]);
    }

    #[test]
    fn test_insensitive_is_limited_to_text() {
        let ops = derive_insensitive_variants(base());
        let insensitive = &ops[2];
        assert!(insensitive.applies_to(&Codec::scalar("text")));
        assert!(insensitive.applies_to(&Codec::scalar("citext")));
        assert!(!insensitive.applies_to(&Codec::scalar("int4")));
        assert_eq!(
            insensitive.description,
            "Equal to the specified value (case-insensitive)."
        );
    }

    #[test]
    fn test_text_column_folds_both_sides() {
        let ops = derive_insensitive_variants(base());
        let text = Codec::scalar("text");
        assert_eq!(render(&ops[1], &text, json!("ABC")), "t.name = $1");
        assert_eq!(
            render(&ops[2], &text, json!("ABC")),
            "lower(t.name) = lower($1)"
        );
    }

    #[test]
    fn test_citext_column_inverts_folding() {
        let ops = derive_insensitive_variants(base());
        let citext = Codec::scalar("citext");
        assert_eq!(
            render(&ops[1], &citext, json!("ABC")),
            "t.name::text = $1::text"
        );
        assert_eq!(render(&ops[2], &citext, json!("ABC")), "t.name = $1");
    }
}
