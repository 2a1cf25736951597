//! SQL dialect trait for placeholder rendering
//!
//! Fragments are dialect-neutral until rendered; the dialect decides how
//! bound parameters appear in the final SQL text.

/// SQL dialect trait for generating database-specific SQL
pub trait SqlDialect: Send + Sync {
    /// Get the dialect name
    fn name(&self) -> &'static str;

    /// Generate a parameter placeholder for the given index (1-based)
    ///
    /// - PostgreSQL: Returns "$1", "$2", etc.
    /// - DuckDB: Always returns "?"
    fn placeholder(&self, index: usize) -> String;
}
