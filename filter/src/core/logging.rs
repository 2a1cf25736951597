//! Tracing subscriber setup for binaries and tests embedding the engine

use super::constants::{APP_NAME_LOWER, ENV_LOG};

/// Default filter when neither environment variable is set
pub fn default_filter() -> String {
    format!("info,{}=info", APP_NAME_LOWER)
}

/// Install a compact fmt subscriber.
///
/// The filter comes from `ROWFILTER_LOG`, then `RUST_LOG`, then
/// [`default_filter`]. Calling this twice is harmless; the second call keeps
/// the existing subscriber.
pub fn init_logging() {
    let filter = std::env::var(ENV_LOG)
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| default_filter());

    let result = tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .with_ansi(true)
        .compact()
        .with_env_filter(filter)
        .try_init();

    if result.is_err() {
        tracing::trace!("Global subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter(), "info,rowfilter=info");
    }

    #[test]
    fn test_init_logging_twice() {
        init_logging();
        init_logging();
    }
}
