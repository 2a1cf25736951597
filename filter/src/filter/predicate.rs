//! Boolean predicate tree
//!
//! Constructors normalize as they build: `Unconstrained` disappears from
//! conjunctions, `Never` from disjunctions, nested `And`/`Or` flatten and
//! double negation collapses. Rendering therefore never has to special-case
//! degenerate input.

use crate::sql::{QualifiedName, SqlFragment};

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// No constraint; matches every row
    Unconstrained,
    /// Matches no row
    Never,
    /// A leaf comparison
    Condition(SqlFragment),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
    /// `exists (select 1 from table as alias where condition)`
    Exists {
        table: QualifiedName,
        alias: String,
        condition: Box<Predicate>,
    },
}

impl Predicate {
    pub fn condition(fragment: SqlFragment) -> Self {
        Self::Condition(fragment)
    }

    /// Conjunction; empty input is `Unconstrained`
    pub fn all(items: impl IntoIterator<Item = Predicate>) -> Self {
        let mut out = Vec::new();
        for item in items {
            match item {
                Self::Unconstrained => {}
                Self::Never => return Self::Never,
                Self::And(inner) => out.extend(inner),
                other => out.push(other),
            }
        }
        match out.len() {
            0 => Self::Unconstrained,
            1 => out.remove(0),
            _ => Self::And(out),
        }
    }

    /// Disjunction; empty input is `Never`
    pub fn any(items: impl IntoIterator<Item = Predicate>) -> Self {
        let mut out = Vec::new();
        for item in items {
            match item {
                Self::Never => {}
                Self::Unconstrained => return Self::Unconstrained,
                Self::Or(inner) => out.extend(inner),
                other => out.push(other),
            }
        }
        match out.len() {
            0 => Self::Never,
            1 => out.remove(0),
            _ => Self::Or(out),
        }
    }

    pub fn negate(self) -> Self {
        match self {
            Self::Unconstrained => Self::Never,
            Self::Never => Self::Unconstrained,
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }

    /// Correlated existence test; a condition that never holds is `Never`
    pub fn exists(table: QualifiedName, alias: impl Into<String>, condition: Predicate) -> Self {
        if condition.is_never() {
            return Self::Never;
        }
        Self::Exists {
            table,
            alias: alias.into(),
            condition: Box::new(condition),
        }
    }

    pub fn is_unconstrained(&self) -> bool {
        matches!(self, Self::Unconstrained)
    }

    pub fn is_never(&self) -> bool {
        matches!(self, Self::Never)
    }

    pub fn to_fragment(&self) -> SqlFragment {
        match self {
            Self::Unconstrained => SqlFragment::raw("true"),
            Self::Never => SqlFragment::raw("false"),
            Self::Condition(fragment) => fragment.clone(),
            Self::And(items) => SqlFragment::join(
                items.iter().map(|p| p.to_fragment().parenthesized()),
                " and ",
            ),
            Self::Or(items) => SqlFragment::join(
                items.iter().map(|p| p.to_fragment().parenthesized()),
                " or ",
            )
            .parenthesized(),
            Self::Not(inner) => SqlFragment::raw("not ").append(inner.to_fragment().parenthesized()),
            Self::Exists {
                table,
                alias,
                condition,
            } => {
                let mut sql = SqlFragment::raw("exists (select 1 from ")
                    .append(SqlFragment::name(table))
                    .append(SqlFragment::raw(" as "))
                    .append(SqlFragment::identifier(alias.as_str()));
                if !condition.is_unconstrained() {
                    sql.push_raw(" where ");
                    sql.push(condition.to_fragment());
                }
                sql.append(SqlFragment::raw(")"))
            }
        }
    }
}
