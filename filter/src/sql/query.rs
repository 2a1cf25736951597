//! Host query integration
//!
//! The engine never builds complete statements itself; it hands a finished
//! condition to whatever implements [`WhereTarget`].

use super::fragment::SqlFragment;
use super::ident::QualifiedName;

/// A query under construction that accepts `WHERE` conjuncts
pub trait WhereTarget {
    /// Alias the scanned table is bound to
    fn alias(&self) -> &str;

    /// Add one conjunct to the `WHERE` clause
    fn and_where(&mut self, condition: SqlFragment);
}

/// Minimal `select ... from ... where ...` builder
#[derive(Debug, Clone)]
pub struct SelectQuery {
    table: QualifiedName,
    alias: String,
    conditions: Vec<SqlFragment>,
}

impl SelectQuery {
    pub fn new(table: QualifiedName, alias: impl Into<String>) -> Self {
        Self {
            table,
            alias: alias.into(),
            conditions: Vec::new(),
        }
    }

    pub fn conditions(&self) -> &[SqlFragment] {
        &self.conditions
    }

    pub fn to_fragment(&self) -> SqlFragment {
        let alias = SqlFragment::identifier(self.alias.as_str());
        let mut sql = SqlFragment::raw("select ")
            .append(alias.clone())
            .append(SqlFragment::raw(".* from "))
            .append(SqlFragment::name(&self.table))
            .append(SqlFragment::raw(" as "))
            .append(alias);
        match self.conditions.as_slice() {
            [] => {}
            [only] => {
                sql.push_raw(" where ");
                sql.push(only.clone());
            }
            many => {
                sql.push_raw(" where ");
                sql.push(SqlFragment::join(
                    many.iter().cloned().map(SqlFragment::parenthesized),
                    " and ",
                ));
            }
        }
        sql
    }
}

impl WhereTarget for SelectQuery {
    fn alias(&self) -> &str {
        &self.alias
    }

    fn and_where(&mut self, condition: SqlFragment) {
        self.conditions.push(condition);
    }
}
