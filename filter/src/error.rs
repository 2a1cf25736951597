//! Unified error type for filter construction and resolution
//!
//! Errors fall into three classes:
//! - build-time errors abort engine construction
//! - input errors reject a single request
//! - internal errors indicate an inconsistent schema model

use thiserror::Error;

/// Classification of a [`FilterError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Schema or operator registration problem, fatal at startup
    Build,
    /// Rejected filter input, reported back to the caller
    InvalidInput,
    /// Invariant violation inside the engine
    Internal,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    // =========================================================================
    // Build-time
    // =========================================================================
    #[error("Operator '{name}' is already registered for {category} fields in an overlapping scope")]
    DuplicateOperator {
        category: &'static str,
        name: String,
    },

    #[error("Operator '{name}' is missing required field: {field}")]
    MissingOperatorField { name: String, field: &'static str },

    #[error("Cannot rename operator '{from}' to '{to}': {reason}")]
    InvalidOperatorOverride {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Type '{0}' is declared more than once")]
    DuplicateType(String),

    #[error("Attribute '{attribute}' of '{owner}' references unknown composite type '{target}'")]
    UnknownCompositeType {
        owner: String,
        attribute: String,
        target: String,
    },

    #[error("Relation '{relation}' on table '{table}' references unknown table '{target}'")]
    UnknownRelationTarget {
        table: String,
        relation: String,
        target: String,
    },

    #[error("Relation '{relation}' on table '{table}' references unknown column '{column}'")]
    UnknownRelationKey {
        table: String,
        relation: String,
        column: String,
    },

    #[error("Set function '{function}' returns unknown table '{table}'")]
    UnknownFunctionTable { function: String, table: String },

    // =========================================================================
    // Request-time input validation
    // =========================================================================
    #[error("Null literals are forbidden in filter input (at '{path}')")]
    NullInputForbidden { path: String },

    #[error("Empty objects are forbidden in filter input (at '{path}')")]
    EmptyObjectForbidden { path: String },

    #[error("Unknown operator '{operator}' for field '{path}'")]
    UnknownOperator { path: String, operator: String },

    #[error("Unknown field '{field}' for filter type '{type_name}' (at '{path}')")]
    UnknownField {
        type_name: String,
        field: String,
        path: String,
    },

    #[error("Invalid value for '{path}': expected {expected}")]
    InvalidOperand { path: String, expected: String },

    #[error("Filter nesting exceeds maximum depth of {max_depth}")]
    FilterTooDeep { max_depth: usize },

    #[error("Filter JSON exceeds maximum size of {max_bytes} bytes")]
    FilterJsonTooLarge { max_bytes: usize },

    #[error("Invalid filter JSON: {0}")]
    InvalidFilterJson(String),

    // =========================================================================
    // Internal invariants
    // =========================================================================
    #[error("Generated alias '{0}' collides with an alias already in use")]
    AliasCollision(String),

    #[error("Relation '{relation}' has no correlation key columns")]
    MissingCorrelationKey { relation: String },

    #[error("No filter type named '{0}'")]
    UnknownDescriptor(String),
}

impl FilterError {
    pub fn null_input(path: impl Into<String>) -> Self {
        Self::NullInputForbidden { path: path.into() }
    }

    pub fn empty_object(path: impl Into<String>) -> Self {
        Self::EmptyObjectForbidden { path: path.into() }
    }

    pub fn unknown_operator(path: impl Into<String>, operator: impl Into<String>) -> Self {
        Self::UnknownOperator {
            path: path.into(),
            operator: operator.into(),
        }
    }

    pub fn invalid_operand(path: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::InvalidOperand {
            path: path.into(),
            expected: expected.into(),
        }
    }

    pub fn missing_field(name: impl Into<String>, field: &'static str) -> Self {
        Self::MissingOperatorField {
            name: name.into(),
            field,
        }
    }

    /// Which class of failure this is
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateOperator { .. }
            | Self::MissingOperatorField { .. }
            | Self::InvalidOperatorOverride { .. }
            | Self::DuplicateType(_)
            | Self::UnknownCompositeType { .. }
            | Self::UnknownRelationTarget { .. }
            | Self::UnknownRelationKey { .. }
            | Self::UnknownFunctionTable { .. } => ErrorKind::Build,
            Self::NullInputForbidden { .. }
            | Self::EmptyObjectForbidden { .. }
            | Self::UnknownOperator { .. }
            | Self::UnknownField { .. }
            | Self::InvalidOperand { .. }
            | Self::FilterTooDeep { .. }
            | Self::FilterJsonTooLarge { .. }
            | Self::InvalidFilterJson(_) => ErrorKind::InvalidInput,
            Self::AliasCollision(_)
            | Self::MissingCorrelationKey { .. }
            | Self::UnknownDescriptor(_) => ErrorKind::Internal,
        }
    }

    /// Whether the caller should report this as a rejected request
    pub fn is_user_error(&self) -> bool {
        self.kind() == ErrorKind::InvalidInput
    }
}
