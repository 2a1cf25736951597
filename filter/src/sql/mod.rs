//! SQL fragment layer
//!
//! Everything the engine emits goes through this module:
//! - `fragment` - parameterized fragments and rendering
//! - `ident` - identifier quoting and qualified names
//! - `alias` - per-request correlation aliases
//! - `query` - the host-facing `WHERE` target
//! - dialects - placeholder syntax for PostgreSQL and DuckDB

use serde::{Deserialize, Serialize};

mod alias;
mod dialect;
mod duckdb_dialect;
mod fragment;
mod ident;
mod postgres_dialect;
mod query;

pub use alias::AliasGenerator;
pub use dialect::SqlDialect;
pub use duckdb_dialect::DuckdbDialect;
pub use fragment::{CompiledSql, SqlFragment, SqlParam};
pub use ident::{QualifiedName, quote_identifier};
pub use postgres_dialect::PostgresDialect;
pub use query::{SelectQuery, WhereTarget};

/// Database backend identifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Postgres,
    Duckdb,
}

impl Backend {
    /// Get the SQL dialect for this backend
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Backend::Postgres => &PostgresDialect,
            Backend::Duckdb => &DuckdbDialect,
        }
    }

    /// Get the backend name
    pub fn name(&self) -> &'static str {
        self.dialect().name()
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
