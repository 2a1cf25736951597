// =============================================================================
// Crate Identity
// =============================================================================

/// Crate name in lowercase (for log filters)
pub const APP_NAME_LOWER: &str = "rowfilter";

// =============================================================================
// Environment Variables
// =============================================================================

/// Environment variable for the options file path
pub const ENV_CONFIG: &str = "ROWFILTER_CONFIG";

/// Environment variable for the log filter (falls back to RUST_LOG)
pub const ENV_LOG: &str = "ROWFILTER_LOG";

// =============================================================================
// Input Limits
// =============================================================================

/// Maximum accepted size of a raw JSON filter (64KB)
pub const MAX_FILTER_JSON_SIZE: usize = 64 * 1024;

/// Default maximum nesting depth of a filter value
pub const DEFAULT_MAX_DEPTH: usize = 16;

// =============================================================================
// Field Naming
// =============================================================================

/// Suffix of the boolean existence field of a one-relation
pub const EXISTS_SUFFIX: &str = "Exists";

/// Suffix of the boolean existence field of a many-relation
pub const EXIST_SUFFIX: &str = "Exist";
