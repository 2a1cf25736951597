//! Compiles nested filter values into parameterized SQL `WHERE` predicates.
//!
//! A [`Schema`] describes tables, composite types and relations. From it the
//! [`FilterEngine`] derives, once, the legal filter fields of every type and
//! then compiles request-time filter values into a [`Predicate`] whose
//! operands are always bound parameters.
//!
//! ```
//! use rowfilter::schema::{Attribute, Codec, Schema, TableType};
//! use rowfilter::sql::QualifiedName;
//! use rowfilter::{FilterEngine, FilterOptions};
//! use serde_json::json;
//!
//! let schema = Schema::builder()
//!     .table(TableType::new(
//!         QualifiedName::new("app", "person"),
//!         vec![
//!             Attribute::new("name", Codec::scalar("text")),
//!             Attribute::new("age", Codec::scalar("int4")),
//!         ],
//!     ))
//!     .build()
//!     .unwrap();
//! let engine = FilterEngine::new(schema, FilterOptions::default()).unwrap();
//!
//! let filter = json!({"name": {"equalTo": "Ada"}, "age": {"greaterThan": 30}});
//! let compiled = engine.compile("person", "p", &filter).unwrap();
//! assert_eq!(compiled.sql, "(p.name = $1) and (p.age > $2)");
//! assert_eq!(compiled.params.len(), 2);
//! ```

pub mod core;
pub mod error;
pub mod filter;
pub mod operators;
pub mod schema;
pub mod sql;
pub mod utils;

pub use crate::core::{FilterOptions, init_logging};
pub use error::{ErrorKind, FilterError};
pub use filter::{FilterCatalog, FilterEngine, FilterEngineBuilder, Predicate, parse_filter};
pub use sql::{CompiledSql, SqlParam, WhereTarget};
