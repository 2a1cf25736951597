//! Filter engine
//!
//! The engine owns everything built once per schema: the operator registry
//! and the descriptor catalog. It is immutable after [`FilterEngineBuilder::build`]
//! and can be shared across request threads behind an `Arc`.

use serde_json::Value as JsonValue;

use crate::core::FilterOptions;
use crate::error::FilterError;
use crate::operators::{OperatorRegistry, OperatorRegistryBuilder, OperatorSpec};
use crate::schema::Schema;
use crate::sql::{CompiledSql, QualifiedName, SqlFragment, WhereTarget};

use super::builder::{build_catalog, descriptor_name};
use super::catalog::FilterCatalog;
use super::descriptor::DescriptorId;
use super::parse::check_depth;
use super::predicate::Predicate;
use super::resolver::FilterResolver;

/// Build phase: operators may still be registered
pub struct FilterEngineBuilder {
    schema: Schema,
    options: FilterOptions,
    operators: OperatorRegistryBuilder,
}

impl FilterEngineBuilder {
    /// Register an additional operator under its category
    pub fn register_operator(mut self, spec: OperatorSpec) -> Result<Self, FilterError> {
        self.operators.register(spec)?;
        Ok(self)
    }

    /// Freeze operators and build every descriptor
    pub fn build(self) -> Result<FilterEngine, FilterError> {
        let registry = self.operators.finish(&self.options)?;
        let catalog = build_catalog(&self.schema, &registry, &self.options);
        tracing::debug!(
            operators = registry.len(),
            descriptors = catalog.len(),
            backend = %self.options.backend,
            "Filter engine built"
        );
        Ok(FilterEngine {
            schema: self.schema,
            options: self.options,
            registry,
            catalog,
        })
    }
}

/// Immutable filter compiler for one schema
#[derive(Debug)]
pub struct FilterEngine {
    schema: Schema,
    options: FilterOptions,
    registry: OperatorRegistry,
    catalog: FilterCatalog,
}

impl FilterEngine {
    /// Start building an engine with the builtin operator set
    pub fn builder(schema: Schema, options: FilterOptions) -> Result<FilterEngineBuilder, FilterError> {
        Ok(FilterEngineBuilder {
            schema,
            options,
            operators: OperatorRegistryBuilder::with_builtin_operators()?,
        })
    }

    /// Build with builtin operators only
    pub fn new(schema: Schema, options: FilterOptions) -> Result<Self, FilterError> {
        Self::builder(schema, options)?.build()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    pub fn registry(&self) -> &OperatorRegistry {
        &self.registry
    }

    pub fn catalog(&self) -> &FilterCatalog {
        &self.catalog
    }

    /// Resolve a filter over `table` rows bound to `alias`
    pub fn resolve(
        &self,
        table: &str,
        alias: &str,
        value: &JsonValue,
    ) -> Result<Predicate, FilterError> {
        let id = self
            .catalog
            .id_for(table)
            .ok_or_else(|| FilterError::UnknownDescriptor(descriptor_name(table)))?;
        self.resolve_with(id, alias, value)
    }

    /// Resolve a filter over the rows of a set-returning function
    pub fn resolve_set_function(
        &self,
        function: &QualifiedName,
        alias: &str,
        value: &JsonValue,
    ) -> Result<Predicate, FilterError> {
        let id = self
            .catalog
            .id_for_function(function)
            .ok_or_else(|| FilterError::UnknownDescriptor(function.to_string()))?;
        self.resolve_with(id, alias, value)
    }

    fn resolve_with(
        &self,
        descriptor: DescriptorId,
        alias: &str,
        value: &JsonValue,
    ) -> Result<Predicate, FilterError> {
        check_depth(value, self.options.max_depth)?;
        let mut resolver = FilterResolver::new(&self.catalog, &self.registry, &self.options);
        resolver.reserve_alias(alias);
        let predicate = resolver.resolve(descriptor, &SqlFragment::identifier(alias), value)?;
        tracing::trace!(alias = %alias, predicate = ?predicate, "Resolved filter");
        Ok(predicate)
    }

    /// Resolve and render with the configured backend's placeholders
    pub fn compile(
        &self,
        table: &str,
        alias: &str,
        value: &JsonValue,
    ) -> Result<CompiledSql, FilterError> {
        let predicate = self.resolve(table, alias, value)?;
        Ok(predicate.to_fragment().render(self.options.backend.dialect()))
    }

    /// Resolve and attach the result to `target` as one `WHERE` conjunct.
    ///
    /// Nothing is attached when resolution fails or the filter places no
    /// constraint.
    pub fn apply<T: WhereTarget + ?Sized>(
        &self,
        target: &mut T,
        table: &str,
        value: &JsonValue,
    ) -> Result<(), FilterError> {
        let predicate = self.resolve(table, target.alias(), value)?;
        if !predicate.is_unconstrained() {
            target.and_where(predicate.to_fragment());
        }
        Ok(())
    }
}
