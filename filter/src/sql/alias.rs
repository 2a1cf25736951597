//! Per-request table alias allocation

use rustc_hash::FxHashSet;

use crate::error::FilterError;

/// Hands out unique correlation aliases for one filter resolution
#[derive(Debug, Default)]
pub struct AliasGenerator {
    next: usize,
    in_use: FxHashSet<String>,
}

impl AliasGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a caller-supplied alias as taken
    pub fn reserve(&mut self, alias: &str) {
        self.in_use.insert(alias.to_string());
    }

    /// Allocate `__<table>_<n>__`, failing if it was already taken
    pub fn next_alias(&mut self, table: &str) -> Result<String, FilterError> {
        self.next += 1;
        let stem: String = table
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let alias = format!("__{}_{}__", stem, self.next);
        if !self.in_use.insert(alias.clone()) {
            return Err(FilterError::AliasCollision(alias));
        }
        Ok(alias)
    }
}
