//! Parameterized SQL fragments
//!
//! A fragment is an ordered list of trusted SQL text, identifiers and bound
//! parameters. Trusted text is restricted to `&'static str`, so user input can
//! only enter a fragment as a parameter or as a quoted identifier.

use serde::Serialize;
use serde_json::Value as JsonValue;

use super::SqlDialect;
use super::ident::{QualifiedName, quote_identifier};

/// A bound parameter and the SQL type it is compared against
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlParam {
    pub value: JsonValue,
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq)]
enum Part {
    Raw(&'static str),
    Identifier(String),
    Name(QualifiedName),
    Param(SqlParam),
}

/// Composable SQL fragment with an append-only parameter list
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SqlFragment {
    parts: Vec<Part>,
}

/// Rendered SQL text plus parameters in placeholder order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledSql {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl SqlFragment {
    /// Trusted SQL text (keywords, operators, punctuation)
    pub fn raw(text: &'static str) -> Self {
        Self {
            parts: vec![Part::Raw(text)],
        }
    }

    /// A single identifier, quoted on render when needed
    pub fn identifier(name: impl Into<String>) -> Self {
        Self {
            parts: vec![Part::Identifier(name.into())],
        }
    }

    /// A schema-qualified table or function name
    pub fn name(name: &QualifiedName) -> Self {
        Self {
            parts: vec![Part::Name(name.clone())],
        }
    }

    /// A bound parameter
    pub fn param(value: JsonValue, type_name: impl Into<String>) -> Self {
        Self {
            parts: vec![Part::Param(SqlParam {
                value,
                type_name: type_name.into(),
            })],
        }
    }

    /// `row.column`
    pub fn column(row: &SqlFragment, column: &str) -> Self {
        row.clone()
            .append(Self::raw("."))
            .append(Self::identifier(column))
    }

    /// `function(arg, ...)` for a builtin SQL function
    pub fn call(function: &'static str, args: Vec<SqlFragment>) -> Self {
        Self::raw(function)
            .append(Self::raw("("))
            .append(Self::join(args, ", "))
            .append(Self::raw(")"))
    }

    /// `schema.function(arg, ...)` for a schema-defined function
    pub fn call_named(function: &QualifiedName, args: Vec<SqlFragment>) -> Self {
        Self::name(function)
            .append(Self::raw("("))
            .append(Self::join(args, ", "))
            .append(Self::raw(")"))
    }

    /// Join fragments with a trusted separator
    pub fn join(items: impl IntoIterator<Item = SqlFragment>, separator: &'static str) -> Self {
        let mut out = Self::default();
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                out.push_raw(separator);
            }
            out.push(item);
        }
        out
    }

    pub fn append(mut self, other: SqlFragment) -> Self {
        self.push(other);
        self
    }

    pub fn push(&mut self, other: SqlFragment) {
        self.parts.extend(other.parts);
    }

    pub fn push_raw(&mut self, text: &'static str) {
        self.parts.push(Part::Raw(text));
    }

    pub fn parenthesized(self) -> Self {
        Self::raw("(").append(self).append(Self::raw(")"))
    }

    /// `expr::type` for a trusted type name
    pub fn cast(self, type_name: &'static str) -> Self {
        self.append(Self::raw("::")).append(Self::raw(type_name))
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Number of parameters bound in this fragment
    pub fn param_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|p| matches!(p, Part::Param(_)))
            .count()
    }

    /// Render SQL text, numbering placeholders in order of appearance
    pub fn render(&self, dialect: &dyn SqlDialect) -> CompiledSql {
        let mut sql = String::new();
        let mut params = Vec::with_capacity(self.param_count());
        for part in &self.parts {
            match part {
                Part::Raw(text) => sql.push_str(text),
                Part::Identifier(name) => sql.push_str(&quote_identifier(name)),
                Part::Name(name) => sql.push_str(&name.to_string()),
                Part::Param(param) => {
                    params.push(param.clone());
                    sql.push_str(&dialect.placeholder(params.len()));
                }
            }
        }
        CompiledSql { sql, params }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::{DuckdbDialect, PostgresDialect};
    use serde_json::json;

    #[test]
    fn test_placeholders_follow_parameter_order() {
        let fragment = SqlFragment::column(&SqlFragment::identifier("t"), "a")
            .append(SqlFragment::raw(" = "))
            .append(SqlFragment::param(json!("x"), "text"))
            .append(SqlFragment::raw(" and "))
            .append(SqlFragment::column(&SqlFragment::identifier("t"), "b"))
            .append(SqlFragment::raw(" > "))
            .append(SqlFragment::param(json!(3), "int4"));

        let compiled = fragment.render(&PostgresDialect);
        assert_eq!(compiled.sql, "t.a = $1 and t.b > $2");
        assert_eq!(compiled.params.len(), 2);
        assert_eq!(compiled.params[0].value, json!("x"));
        assert_eq!(compiled.params[1].type_name, "int4");

        let compiled = fragment.render(&DuckdbDialect);
        assert_eq!(compiled.sql, "t.a = ? and t.b > ?");
    }

    #[test]
    fn test_user_text_never_reaches_sql_unquoted() {
        let fragment = SqlFragment::identifier("x\"; drop table users; --")
            .append(SqlFragment::raw(" = "))
            .append(SqlFragment::param(json!("'; drop table users; --"), "text"));
        let compiled = fragment.render(&PostgresDialect);
        assert_eq!(compiled.sql, "\"x\"\"; drop table users; --\" = $1");
    }

    #[test]
    fn test_call_and_join() {
        let fragment = SqlFragment::call(
            "lower",
            vec![SqlFragment::param(json!("A"), "text")],
        );
        assert_eq!(fragment.render(&PostgresDialect).sql, "lower($1)");

        let joined = SqlFragment::join(
            vec![
                SqlFragment::param(json!(1), "int4"),
                SqlFragment::param(json!(2), "int4"),
            ],
            ", ",
        )
        .parenthesized();
        assert_eq!(joined.render(&PostgresDialect).sql, "($1, $2)");
    }

    #[test]
    fn test_call_named_and_cast() {
        let function = QualifiedName::new("app", "full_name");
        let fragment = SqlFragment::call_named(&function, vec![SqlFragment::identifier("u")])
            .cast("text");
        assert_eq!(
            fragment.render(&PostgresDialect).sql,
            "app.full_name(u)::text"
        );
    }

    #[test]
    fn test_empty_join() {
        let joined = SqlFragment::join(Vec::new(), " and ");
        assert!(joined.is_empty());
        assert_eq!(joined.param_count(), 0);
    }
}
