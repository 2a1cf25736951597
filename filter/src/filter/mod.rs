//! Filter types and resolution
//!
//! - `descriptor` - per-type legal filter fields
//! - `builder` - memoized descriptor construction
//! - `catalog` - the built descriptor set
//! - `predicate` - boolean predicate tree
//! - `resolver` - filter value to predicate compilation
//! - `parse` - raw JSON input limits
//! - `engine` - build phase and request entry points

mod builder;
mod catalog;
mod descriptor;
mod engine;
mod parse;
mod predicate;
mod resolver;

pub use builder::{attribute_type_name, build_catalog, descriptor_name, many_type_name};
pub use catalog::FilterCatalog;
pub use descriptor::{DescriptorId, FieldDescription, FilterField, FilterTypeDescriptor};
pub use engine::{FilterEngine, FilterEngineBuilder};
pub use parse::{check_depth, parse_filter};
pub use predicate::Predicate;
pub use resolver::FilterResolver;
