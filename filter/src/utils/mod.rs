//! Utility functions for the crate

pub mod json;
pub mod sql;
pub mod string;
