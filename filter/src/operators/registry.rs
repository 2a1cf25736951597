//! Operator registry
//!
//! Operators are registered on an [`OperatorRegistryBuilder`] during engine
//! construction. [`OperatorRegistryBuilder::finish`] applies the allow-list and
//! name overrides and returns an immutable [`OperatorRegistry`] that is shared
//! across request threads.

use std::collections::BTreeMap;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::core::FilterOptions;
use crate::error::FilterError;
use crate::schema::Codec;

use super::builtin::builtin_operators;
use super::spec::{OperatorCategory, OperatorSpec};

/// Mutable registration phase
#[derive(Debug, Default)]
pub struct OperatorRegistryBuilder {
    categories: BTreeMap<OperatorCategory, Vec<OperatorSpec>>,
}

impl OperatorRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the builtin operator set
    pub fn with_builtin_operators() -> Result<Self, FilterError> {
        let mut builder = Self::new();
        for spec in builtin_operators()? {
            builder.register(spec)?;
        }
        Ok(builder)
    }

    /// Add an operator under its category.
    ///
    /// Fails if an operator with the same name is already registered for the
    /// same category and the two could apply to a common field type.
    pub fn register(&mut self, spec: OperatorSpec) -> Result<(), FilterError> {
        let specs = self.categories.entry(spec.category).or_default();
        if specs
            .iter()
            .any(|existing| existing.name == spec.name && existing.overlaps(&spec))
        {
            return Err(FilterError::DuplicateOperator {
                category: spec.category.as_str(),
                name: spec.name,
            });
        }
        tracing::trace!(name = %spec.name, category = %spec.category, "Registered operator");
        specs.push(spec);
        Ok(())
    }

    /// Number of registered operators across all categories
    pub fn len(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply options and freeze the registry
    pub fn finish(self, options: &FilterOptions) -> Result<OperatorRegistry, FilterError> {
        for from in options.operator_name_overrides.keys() {
            let known = self
                .categories
                .values()
                .flatten()
                .any(|spec| &spec.name == from);
            if !known {
                tracing::warn!(operator = %from, "Override for unknown operator ignored");
            }
        }

        let mut categories = FxHashMap::default();
        let mut total = 0;
        for (category, specs) in self.categories {
            // (registered name, spec under its exposed name)
            let mut kept: Vec<(String, OperatorSpec)> = Vec::with_capacity(specs.len());
            for mut spec in specs {
                if !options.operator_allowed(&spec.name) {
                    continue;
                }
                if !spec.supports(options.backend) {
                    tracing::trace!(
                        operator = %spec.name,
                        backend = %options.backend,
                        "Operator not expressible on backend, skipping"
                    );
                    continue;
                }
                let exposed = options.operator_name(&spec.name).to_string();
                if let Some((clash_registered, _)) = kept
                    .iter()
                    .find(|(_, other)| other.name == exposed && other.overlaps(&spec))
                {
                    let from = if exposed != spec.name {
                        spec.name
                    } else {
                        clash_registered.clone()
                    };
                    return Err(FilterError::InvalidOperatorOverride {
                        from,
                        to: exposed,
                        reason: format!(
                            "another {} operator with that name applies to the same field types",
                            category
                        ),
                    });
                }
                let registered = std::mem::replace(&mut spec.name, exposed);
                kept.push((registered, spec));
            }

            total += kept.len();
            categories.insert(
                category,
                kept.into_iter().map(|(_, spec)| Arc::new(spec)).collect(),
            );
        }

        tracing::debug!(operators = total, "Operator registry finalized");
        Ok(OperatorRegistry { categories })
    }
}

/// Immutable operator table
#[derive(Debug, Clone, Default)]
pub struct OperatorRegistry {
    categories: FxHashMap<OperatorCategory, Vec<Arc<OperatorSpec>>>,
}

impl OperatorRegistry {
    /// Operators applicable to a field of `codec`, keyed by exposed name.
    ///
    /// Domains see their base codec's operators, with operators registered
    /// for the domain category taking precedence. Composites and categories
    /// without registrations yield an empty map.
    pub fn operators_for(&self, codec: &Codec) -> BTreeMap<String, Arc<OperatorSpec>> {
        let Some(category) = OperatorCategory::of(codec) else {
            return BTreeMap::new();
        };
        let mut out = match codec {
            Codec::Domain { base, .. } => self.operators_for(base),
            _ => BTreeMap::new(),
        };
        for spec in self.categories.get(&category).into_iter().flatten() {
            if spec.applies_to(codec) {
                out.insert(spec.name.clone(), Arc::clone(spec));
            }
        }
        out
    }

    /// A single operator applicable to `codec`
    pub fn operator_for(&self, codec: &Codec, name: &str) -> Option<Arc<OperatorSpec>> {
        self.operators_for(codec).remove(name)
    }

    pub fn len(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::Backend;

    fn op(name: &str, category: OperatorCategory, types: Option<&[&str]>) -> OperatorSpec {
        let builder = OperatorSpec::builder(name, category)
            .description("Test operator.")
            .binary(" = ");
        match types {
            Some(types) => builder.allowed_field_types(types.iter().copied()),
            None => builder,
        }
        .build()
        .unwrap()
    }

    #[test]
    fn test_duplicate_in_overlapping_scope() {
        let mut builder = OperatorRegistryBuilder::new();
        builder
            .register(op("same", OperatorCategory::Scalar, None))
            .unwrap();
        let err = builder
            .register(op("same", OperatorCategory::Scalar, Some(&["text"])))
            .unwrap_err();
        assert_eq!(
            err,
            FilterError::DuplicateOperator {
                category: "scalar",
                name: "same".into()
            }
        );
    }

    #[test]
    fn test_same_name_in_disjoint_scopes() {
        let mut builder = OperatorRegistryBuilder::new();
        builder
            .register(op("contains", OperatorCategory::Scalar, Some(&["jsonb"])))
            .unwrap();
        builder
            .register(op("contains", OperatorCategory::Scalar, Some(&["inet"])))
            .unwrap();
        builder
            .register(op("contains", OperatorCategory::Array, None))
            .unwrap();
        assert_eq!(builder.len(), 3);
    }

    #[test]
    fn test_operators_filtered_by_field_type() {
        let mut builder = OperatorRegistryBuilder::new();
        builder
            .register(op("equalTo", OperatorCategory::Scalar, None))
            .unwrap();
        builder
            .register(op("containsKey", OperatorCategory::Scalar, Some(&["jsonb"])))
            .unwrap();
        let registry = builder.finish(&FilterOptions::default()).unwrap();

        let text: Vec<String> = registry
            .operators_for(&Codec::scalar("text"))
            .into_keys()
            .collect();
        assert_eq!(text, vec!["equalTo"]);
        let jsonb: Vec<String> = registry
            .operators_for(&Codec::scalar("jsonb"))
            .into_keys()
            .collect();
        assert_eq!(jsonb, vec!["containsKey", "equalTo"]);
    }

    #[test]
    fn test_unregistered_category_is_empty() {
        let registry = OperatorRegistryBuilder::new()
            .finish(&FilterOptions::default())
            .unwrap();
        assert!(
            registry
                .operators_for(&Codec::range_of("int4range", Codec::scalar("int4")))
                .is_empty()
        );
        assert!(registry.operators_for(&Codec::composite("address")).is_empty());
    }

    #[test]
    fn test_domain_merges_base_operators() {
        let mut builder = OperatorRegistryBuilder::new();
        builder
            .register(op("equalTo", OperatorCategory::Scalar, None))
            .unwrap();
        builder
            .register(op("isValid", OperatorCategory::Domain, Some(&["email"])))
            .unwrap();
        let registry = builder.finish(&FilterOptions::default()).unwrap();

        let email = Codec::domain("email", Codec::scalar("text"));
        let names: Vec<String> = registry.operators_for(&email).into_keys().collect();
        assert_eq!(names, vec!["equalTo", "isValid"]);
        assert!(registry.operator_for(&email, "isValid").is_some());
        assert!(registry
            .operator_for(&Codec::domain("url", Codec::scalar("text")), "isValid")
            .is_none());
    }

    #[test]
    fn test_allow_list_and_override() {
        let mut builder = OperatorRegistryBuilder::new();
        builder
            .register(op("equalTo", OperatorCategory::Scalar, None))
            .unwrap();
        builder
            .register(op("notEqualTo", OperatorCategory::Scalar, None))
            .unwrap();
        let options = FilterOptions {
            allowed_operators: Some(vec!["equalTo".into()]),
            operator_name_overrides: [("equalTo".to_string(), "eq".to_string())].into(),
            ..Default::default()
        };
        let registry = builder.finish(&options).unwrap();
        let names: Vec<String> = registry
            .operators_for(&Codec::scalar("int4"))
            .into_keys()
            .collect();
        assert_eq!(names, vec!["eq"]);
    }

    #[test]
    fn test_operators_unsupported_by_backend_are_dropped() {
        let mut builder = OperatorRegistryBuilder::new();
        builder
            .register(op("equalTo", OperatorCategory::Scalar, None))
            .unwrap();
        builder
            .register(
                OperatorSpec::builder("containsKey", OperatorCategory::Scalar)
                    .description("Test operator.")
                    .backends([Backend::Postgres])
                    .binary(" ? ")
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let options = FilterOptions {
            backend: Backend::Duckdb,
            ..Default::default()
        };
        let registry = builder.finish(&options).unwrap();
        let names: Vec<String> = registry
            .operators_for(&Codec::scalar("jsonb"))
            .into_keys()
            .collect();
        assert_eq!(names, vec!["equalTo"]);
    }

    #[test]
    fn test_override_collision() {
        let mut builder = OperatorRegistryBuilder::new();
        builder
            .register(op("equalTo", OperatorCategory::Scalar, None))
            .unwrap();
        builder
            .register(op("notEqualTo", OperatorCategory::Scalar, None))
            .unwrap();
        let options = FilterOptions {
            operator_name_overrides: [("notEqualTo".to_string(), "equalTo".to_string())].into(),
            ..Default::default()
        };
        let err = builder.finish(&options).unwrap_err();
        assert!(matches!(
            err,
            FilterError::InvalidOperatorOverride { ref from, ref to, .. }
                if from == "notEqualTo" && to == "equalTo"
        ));
    }

    #[test]
    fn test_override_collision_with_later_operator() {
        let mut builder = OperatorRegistryBuilder::new();
        builder
            .register(op("equalTo", OperatorCategory::Scalar, None))
            .unwrap();
        builder
            .register(op("eq", OperatorCategory::Scalar, None))
            .unwrap();
        let options = FilterOptions {
            operator_name_overrides: [("equalTo".to_string(), "eq".to_string())].into(),
            ..Default::default()
        };
        let err = builder.finish(&options).unwrap_err();
        assert!(matches!(
            err,
            FilterError::InvalidOperatorOverride { ref from, ref to, .. }
                if from == "equalTo" && to == "eq"
        ));
    }
}
