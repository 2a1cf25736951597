//! Operator registry
//!
//! - `spec` - operator specifications and their builder
//! - `operand` - operand validation and parameter binding
//! - `insensitive` - derivation of `...Insensitive` variants
//! - `builtin` - the default operator set
//! - `registry` - registration and per-field lookup

mod builtin;
mod insensitive;
mod operand;
mod registry;
mod spec;

pub use builtin::builtin_operators;
pub use insensitive::{INSENSITIVE_SUFFIX, derive_insensitive_variants};
pub use operand::{Operand, bind_flag, bind_list, bind_operand, bind_value, check_value};
pub use registry::{OperatorRegistry, OperatorRegistryBuilder};
pub use spec::{
    IdentifierTransform, InputCodecFn, OperatorCategory, OperatorContext, OperatorSpec,
    OperatorSpecBuilder, PredicateTemplate, ValueTransform,
};
