//! Builtin operator set
//!
//! Standard comparisons for every category, text patterns, array and range
//! operators, plus jsonb and inet operators scoped to their types.

use serde_json::Value as JsonValue;

use crate::error::FilterError;
use crate::filter::Predicate;
use crate::schema::{Codec, TEXT_TYPES};
use crate::sql::{Backend, SqlFragment};
use crate::utils::json::json_kind;
use crate::utils::sql::{LikePosition, like_pattern};

use super::insensitive::derive_insensitive_variants;
use super::operand::{Operand, bind_flag, bind_list};
use super::spec::{OperatorCategory, OperatorContext, OperatorSpec};

/// Every builtin operator, with insensitive variants already derived
pub fn builtin_operators() -> Result<Vec<OperatorSpec>, FilterError> {
    let mut scalar = comparison_operators(OperatorCategory::Scalar, true)?;
    scalar.extend(list_operators(OperatorCategory::Scalar, true)?);
    scalar.extend(pattern_operators()?);

    let mut all = derive_insensitive_variants(scalar);
    all.extend(jsonb_operators()?);
    all.extend(inet_operators()?);

    all.extend(comparison_operators(OperatorCategory::Enum, false)?);
    all.extend(list_operators(OperatorCategory::Enum, false)?);

    all.extend(comparison_operators(OperatorCategory::Array, false)?);
    all.extend(array_operators()?);

    all.extend(comparison_operators(OperatorCategory::Range, false)?);
    all.extend(range_operators()?);

    tracing::trace!(count = all.len(), "Built builtin operators");
    Ok(all)
}

fn is_null(category: OperatorCategory) -> Result<OperatorSpec, FilterError> {
    OperatorSpec::builder("isNull", category)
        .description("Is null (if `true` is specified) or is not null (if `false` is specified).")
        .input_codec(|_| Codec::scalar("bool"))
        .value_transform(|value: &JsonValue, _: &OperatorContext<'_>| bind_flag(value))
        .template(|identifier, operand| {
            let suffix = if matches!(operand, Operand::Flag(false)) {
                " is not null"
            } else {
                " is null"
            };
            Predicate::condition(identifier.append(SqlFragment::raw(suffix)))
        })
        .build()
}

/// `isNull`, equality, distinctness and ordering
fn comparison_operators(
    category: OperatorCategory,
    case_sensitive: bool,
) -> Result<Vec<OperatorSpec>, FilterError> {
    let binary = [
        ("equalTo", "Equal to the specified value.", " = "),
        ("notEqualTo", "Not equal to the specified value.", " <> "),
        (
            "distinctFrom",
            "Not equal to the specified value, treating null like an ordinary value.",
            " is distinct from ",
        ),
        (
            "notDistinctFrom",
            "Equal to the specified value, treating null like an ordinary value.",
            " is not distinct from ",
        ),
        ("lessThan", "Less than the specified value.", " < "),
        (
            "lessThanOrEqualTo",
            "Less than or equal to the specified value.",
            " <= ",
        ),
        ("greaterThan", "Greater than the specified value.", " > "),
        (
            "greaterThanOrEqualTo",
            "Greater than or equal to the specified value.",
            " >= ",
        ),
    ];

    let mut out = vec![is_null(category)?];
    for (name, description, sql_operator) in binary {
        let mut builder = OperatorSpec::builder(name, category)
            .description(description)
            .binary(sql_operator);
        if case_sensitive {
            builder = builder.case_sensitive();
        }
        out.push(builder.build()?);
    }
    Ok(out)
}

/// `in` and `notIn`; an empty list matches nothing or everything respectively
fn list_operators(
    category: OperatorCategory,
    case_sensitive: bool,
) -> Result<Vec<OperatorSpec>, FilterError> {
    let list_value = |value: &JsonValue, ctx: &OperatorContext<'_>| bind_list(value, ctx.input);

    let mut included = OperatorSpec::builder("in", category)
        .description("Included in the specified list.")
        .value_transform(list_value)
        .template(|identifier, operand| match operand {
            Operand::List(items) if items.is_empty() => Predicate::Never,
            operand => Predicate::condition(
                identifier
                    .append(SqlFragment::raw(" in "))
                    .append(operand.into_fragment()),
            ),
        });
    let mut excluded = OperatorSpec::builder("notIn", category)
        .description("Not included in the specified list.")
        .value_transform(list_value)
        .template(|identifier, operand| match operand {
            Operand::List(items) if items.is_empty() => Predicate::Unconstrained,
            operand => Predicate::condition(
                identifier
                    .append(SqlFragment::raw(" not in "))
                    .append(operand.into_fragment()),
            ),
        });
    if case_sensitive {
        included = included.case_sensitive();
        excluded = excluded.case_sensitive();
    }
    Ok(vec![included.build()?, excluded.build()?])
}

/// Bind a string as a LIKE pattern matching it literally
fn literal_pattern(
    position: LikePosition,
) -> impl Fn(&JsonValue, &OperatorContext<'_>) -> Result<Operand, String> + Send + Sync + 'static {
    move |value: &JsonValue, ctx: &OperatorContext<'_>| {
        let text = value
            .as_str()
            .ok_or_else(|| format!("a string, got {}", json_kind(value)))?;
        Ok(Operand::Single(SqlFragment::param(
            JsonValue::String(like_pattern(text, position)),
            ctx.input.name(),
        )))
    }
}

fn pattern_operators() -> Result<Vec<OperatorSpec>, FilterError> {
    let literal = [
        ("includes", "Contains the specified string.", LikePosition::Anywhere, " like "),
        (
            "notIncludes",
            "Does not contain the specified string.",
            LikePosition::Anywhere,
            " not like ",
        ),
        ("startsWith", "Starts with the specified string.", LikePosition::Prefix, " like "),
        (
            "notStartsWith",
            "Does not start with the specified string.",
            LikePosition::Prefix,
            " not like ",
        ),
        ("endsWith", "Ends with the specified string.", LikePosition::Suffix, " like "),
        (
            "notEndsWith",
            "Does not end with the specified string.",
            LikePosition::Suffix,
            " not like ",
        ),
    ];

    let mut out = Vec::with_capacity(literal.len() + 2);
    for (name, description, position, sql_operator) in literal {
        out.push(
            OperatorSpec::builder(name, OperatorCategory::Scalar)
                .description(description)
                .allowed_field_types(TEXT_TYPES.iter().copied())
                .case_sensitive()
                .value_transform(literal_pattern(position))
                .binary(sql_operator)
                .build()?,
        );
    }
    for (name, description, sql_operator) in [
        (
            "like",
            "Matches the specified pattern. An underscore (_) matches any single character; a percent sign (%) matches any sequence of zero or more characters.",
            " like ",
        ),
        (
            "notLike",
            "Does not match the specified pattern. An underscore (_) matches any single character; a percent sign (%) matches any sequence of zero or more characters.",
            " not like ",
        ),
    ] {
        out.push(
            OperatorSpec::builder(name, OperatorCategory::Scalar)
                .description(description)
                .allowed_field_types(TEXT_TYPES.iter().copied())
                .case_sensitive()
                .binary(sql_operator)
                .build()?,
        );
    }
    Ok(out)
}

/// The key-existence operators are spelled with `?`, which DuckDB reads as a
/// placeholder, so they are PostgreSQL only
fn jsonb_operators() -> Result<Vec<OperatorSpec>, FilterError> {
    let text_keys = || Codec::array_of(Codec::scalar("text"));
    Ok(vec![
        OperatorSpec::builder("contains", OperatorCategory::Scalar)
            .description("Contains the specified JSON.")
            .allowed_field_types(["jsonb"])
            .binary(" @> ")
            .build()?,
        OperatorSpec::builder("containedBy", OperatorCategory::Scalar)
            .description("Contained by the specified JSON.")
            .allowed_field_types(["jsonb"])
            .binary(" <@ ")
            .build()?,
        OperatorSpec::builder("containsKey", OperatorCategory::Scalar)
            .description("Contains the specified key.")
            .allowed_field_types(["jsonb"])
            .input_codec(|_| Codec::scalar("text"))
            .backends([Backend::Postgres])
            .binary(" ? ")
            .build()?,
        OperatorSpec::builder("containsAllKeys", OperatorCategory::Scalar)
            .description("Contains all of the specified keys.")
            .allowed_field_types(["jsonb"])
            .input_codec(move |_| text_keys())
            .backends([Backend::Postgres])
            .binary(" ?& ")
            .build()?,
        OperatorSpec::builder("containsAnyKeys", OperatorCategory::Scalar)
            .description("Contains any of the specified keys.")
            .allowed_field_types(["jsonb"])
            .input_codec(move |_| text_keys())
            .backends([Backend::Postgres])
            .binary(" ?| ")
            .build()?,
    ])
}

fn inet_operators() -> Result<Vec<OperatorSpec>, FilterError> {
    let specs = [
        ("contains", "Contains the specified internet address.", " >> "),
        (
            "containsOrEqualTo",
            "Contains or equal to the specified internet address.",
            " >>= ",
        ),
        ("containedBy", "Contained by the specified internet address.", " << "),
        (
            "containedByOrEqualTo",
            "Contained by or equal to the specified internet address.",
            " <<= ",
        ),
        (
            "containsOrContainedBy",
            "Contains or contained by the specified internet address.",
            " && ",
        ),
    ];
    specs
        .into_iter()
        .map(|(name, description, sql_operator)| {
            OperatorSpec::builder(name, OperatorCategory::Scalar)
                .description(description)
                .allowed_field_types(["inet", "cidr"])
                .binary(sql_operator)
                .build()
        })
        .collect()
}

/// Element type of an array or range field
fn element_of(field: &Codec) -> Codec {
    field.element().cloned().unwrap_or_else(|| field.clone())
}

fn array_operators() -> Result<Vec<OperatorSpec>, FilterError> {
    let mut out = Vec::new();
    for (name, description, sql_operator) in [
        ("contains", "Contains the specified list of values.", " @> "),
        ("containedBy", "Contained by the specified list of values.", " <@ "),
        (
            "overlaps",
            "Overlaps the specified list of values.",
            " && ",
        ),
    ] {
        out.push(
            OperatorSpec::builder(name, OperatorCategory::Array)
                .description(description)
                .binary(sql_operator)
                .build()?,
        );
    }

    // `value <op> any(column)`: the operator is written from the value's side
    for (name, description, sql_operator) in [
        ("anyEqualTo", "Any array item is equal to the specified value.", " = any("),
        (
            "anyNotEqualTo",
            "Any array item is not equal to the specified value.",
            " <> any(",
        ),
        (
            "anyLessThan",
            "Any array item is less than the specified value.",
            " > any(",
        ),
        (
            "anyLessThanOrEqualTo",
            "Any array item is less than or equal to the specified value.",
            " >= any(",
        ),
        (
            "anyGreaterThan",
            "Any array item is greater than the specified value.",
            " < any(",
        ),
        (
            "anyGreaterThanOrEqualTo",
            "Any array item is greater than or equal to the specified value.",
            " <= any(",
        ),
    ] {
        out.push(
            OperatorSpec::builder(name, OperatorCategory::Array)
                .description(description)
                .input_codec(element_of)
                .template(move |identifier, operand| {
                    Predicate::condition(
                        operand
                            .into_fragment()
                            .append(SqlFragment::raw(sql_operator))
                            .append(identifier)
                            .append(SqlFragment::raw(")")),
                    )
                })
                .build()?,
        );
    }
    Ok(out)
}

fn range_operators() -> Result<Vec<OperatorSpec>, FilterError> {
    let mut out = vec![
        OperatorSpec::builder("containsElement", OperatorCategory::Range)
            .description("Contains the specified value.")
            .input_codec(element_of)
            .binary(" @> ")
            .build()?,
    ];
    for (name, description, sql_operator) in [
        ("contains", "Contains the specified range.", " @> "),
        ("containedBy", "Contained by the specified range.", " <@ "),
        ("overlaps", "Overlaps the specified range.", " && "),
        ("strictlyLeftOf", "Strictly left of the specified range.", " << "),
        ("strictlyRightOf", "Strictly right of the specified range.", " >> "),
        (
            "notExtendsRightOf",
            "Does not extend right of the specified range.",
            " &< ",
        ),
        (
            "notExtendsLeftOf",
            "Does not extend left of the specified range.",
            " &> ",
        ),
        ("adjacentTo", "Adjacent to the specified range.", " -|- "),
    ] {
        out.push(
            OperatorSpec::builder(name, OperatorCategory::Range)
                .description(description)
                .binary(sql_operator)
                .build()?,
        );
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::PostgresDialect;
    use serde_json::json;

    fn find(ops: &[OperatorSpec], name: &str, category: OperatorCategory) -> OperatorSpec {
        ops.iter()
            .find(|o| o.name == name && o.category == category)
            .cloned()
            .unwrap()
    }

    fn render(spec: &OperatorSpec, codec: &Codec, value: serde_json::Value) -> String {
        let column = SqlFragment::column(&SqlFragment::identifier("t"), "c");
        spec.compile(column, codec, &value)
            .unwrap()
            .to_fragment()
            .render(&PostgresDialect)
            .sql
    }

    #[test]
    fn test_builtin_set_registers_without_conflicts() {
        let ops = builtin_operators().unwrap();
        let mut builder = crate::operators::OperatorRegistryBuilder::new();
        for op in ops {
            builder.register(op).unwrap();
        }
        assert!(!builder.is_empty());
    }

    #[test]
    fn test_is_null_shapes() {
        let ops = builtin_operators().unwrap();
        let op = find(&ops, "isNull", OperatorCategory::Scalar);
        let text = Codec::scalar("text");
        assert_eq!(render(&op, &text, json!(true)), "t.c is null");
        assert_eq!(render(&op, &text, json!(false)), "t.c is not null");
    }

    #[test]
    fn test_is_null_has_no_insensitive_variant() {
        let ops = builtin_operators().unwrap();
        assert!(!ops.iter().any(|o| o.name == "isNullInsensitive"));
        assert!(ops.iter().any(|o| o.name == "equalToInsensitive"));
        assert!(ops.iter().any(|o| o.name == "startsWithInsensitive"));
        assert!(ops.iter().any(|o| o.name == "inInsensitive"));
    }

    #[test]
    fn test_empty_lists() {
        let ops = builtin_operators().unwrap();
        let text = Codec::scalar("text");
        let included = find(&ops, "in", OperatorCategory::Scalar);
        let predicate = included
            .compile(SqlFragment::identifier("c"), &text, &json!([]))
            .unwrap();
        assert!(predicate.is_never());

        let excluded = find(&ops, "notIn", OperatorCategory::Scalar);
        let predicate = excluded
            .compile(SqlFragment::identifier("c"), &text, &json!([]))
            .unwrap();
        assert!(predicate.is_unconstrained());

        assert_eq!(render(&included, &text, json!(["a", "b"])), "t.c in ($1, $2)");
    }

    #[test]
    fn test_patterns_escape_input() {
        let ops = builtin_operators().unwrap();
        let op = find(&ops, "startsWith", OperatorCategory::Scalar);
        let column = SqlFragment::identifier("c");
        let compiled = op
            .compile(column, &Codec::scalar("text"), &json!("50%"))
            .unwrap()
            .to_fragment()
            .render(&PostgresDialect);
        assert_eq!(compiled.sql, "c like $1");
        assert_eq!(compiled.params[0].value, json!("50\\%%"));
    }

    #[test]
    fn test_insensitive_pattern_on_text() {
        let ops = builtin_operators().unwrap();
        let op = find(&ops, "includesInsensitive", OperatorCategory::Scalar);
        assert_eq!(
            render(&op, &Codec::scalar("text"), json!("Ab")),
            "lower(t.c) like lower($1)"
        );
    }

    #[test]
    fn test_array_any_operator() {
        let ops = builtin_operators().unwrap();
        let op = find(&ops, "anyLessThan", OperatorCategory::Array);
        let codec = Codec::array_of(Codec::scalar("int4"));
        assert_eq!(render(&op, &codec, json!(5)), "$1 > any(t.c)");
        assert_eq!(op.input_codec(&codec), Codec::scalar("int4"));
    }

    #[test]
    fn test_range_contains_element() {
        let ops = builtin_operators().unwrap();
        let op = find(&ops, "containsElement", OperatorCategory::Range);
        let codec = Codec::range_of("int4range", Codec::scalar("int4"));
        assert_eq!(render(&op, &codec, json!(3)), "t.c @> $1");
    }

    #[test]
    fn test_jsonb_operators_are_scoped() {
        let ops = builtin_operators().unwrap();
        let jsonb = Codec::scalar("jsonb");
        let op = ops
            .iter()
            .find(|o| o.name == "containsKey" && o.applies_to(&jsonb))
            .unwrap();
        assert!(!op.applies_to(&Codec::scalar("text")));
        assert_eq!(render(op, &jsonb, json!("k")), "t.c ? $1");
    }

    #[test]
    fn test_jsonb_key_operators_are_postgres_only() {
        let ops = builtin_operators().unwrap();
        for name in ["containsKey", "containsAllKeys", "containsAnyKeys"] {
            let op = find(&ops, name, OperatorCategory::Scalar);
            assert!(op.supports(Backend::Postgres), "{}", name);
            assert!(!op.supports(Backend::Duckdb), "{}", name);
        }
        let jsonb = Codec::scalar("jsonb");
        let contains = ops
            .iter()
            .find(|o| o.name == "contains" && o.applies_to(&jsonb))
            .unwrap();
        assert!(contains.supports(Backend::Duckdb));
    }
}
