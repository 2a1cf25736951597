//! Identifier quoting
//!
//! Identifiers are emitted bare only when PostgreSQL would read them back
//! unchanged; everything else is double-quoted with embedded quotes doubled.

use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Keywords that cannot appear as bare column or table names
const RESERVED_WORDS: &[&str] = &[
    "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "asymmetric", "both", "case",
    "cast", "check", "collate", "column", "constraint", "create", "current_catalog",
    "current_date", "current_role", "current_time", "current_timestamp", "current_user",
    "default", "deferrable", "desc", "distinct", "do", "else", "end", "except", "false", "fetch",
    "for", "foreign", "from", "grant", "group", "having", "in", "initially", "intersect", "into",
    "lateral", "leading", "limit", "localtime", "localtimestamp", "not", "null", "offset", "on",
    "only", "or", "order", "placing", "primary", "references", "returning", "select",
    "session_user", "some", "symmetric", "table", "then", "to", "trailing", "true", "union",
    "unique", "user", "using", "variadic", "when", "where", "window", "with",
];

fn simple_identifier() -> &'static regex::Regex {
    static RE_SIMPLE: OnceLock<regex::Regex> = OnceLock::new();
    RE_SIMPLE.get_or_init(|| regex::Regex::new(r"^[a-z_][a-z0-9_$]*$").expect("Invalid regex"))
}

/// Quote an identifier if it cannot be written bare
pub fn quote_identifier(name: &str) -> String {
    if simple_identifier().is_match(name) && !RESERVED_WORDS.contains(&name) {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

/// Schema-qualified name of a table or function
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualifiedName {
    pub schema: Option<String>,
    pub name: String,
}

impl QualifiedName {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            name: name.into(),
        }
    }

    /// Name resolved through the connection's search path
    pub fn unqualified(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(
                f,
                "{}.{}",
                quote_identifier(schema),
                quote_identifier(&self.name)
            ),
            None => write!(f, "{}", quote_identifier(&self.name)),
        }
    }
}
