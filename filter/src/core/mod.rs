pub mod config;
pub mod constants;
pub mod logging;

pub use config::FilterOptions;
pub use logging::init_logging;
