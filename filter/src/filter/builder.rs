//! Filter-type construction
//!
//! Descriptors are built depth-first and memoized by source name. The arena
//! entry for a type is created before any of its fields are computed, so a
//! relation leading back to a type under construction resolves to that same
//! entry instead of recursing.
//!
//! Emptiness is only known once the whole graph is built. A final pass
//! removes fields pointing at empty descriptors and clears descriptors left
//! with nothing but `and`/`or`/`not`, repeating until nothing changes.
//! Existence fields survive: they only need the related table, not its
//! filter fields.

use rustc_hash::FxHashMap;

use crate::core::FilterOptions;
use crate::core::constants::{EXIST_SUFFIX, EXISTS_SUFFIX};
use crate::operators::OperatorRegistry;
use crate::schema::{Cardinality, Codec, CompositeType, RelationKind, Schema, TableType};
use crate::utils::string::pascal_case;

use super::catalog::FilterCatalog;
use super::descriptor::{DescriptorId, FilterField, FilterTypeDescriptor};

/// Build the descriptor of every filterable table in `schema`
pub fn build_catalog(
    schema: &Schema,
    registry: &OperatorRegistry,
    options: &FilterOptions,
) -> FilterCatalog {
    let mut builder = DescriptorBuilder {
        schema,
        registry,
        options,
        descriptors: Vec::new(),
        index: FxHashMap::default(),
    };
    for table in schema.tables() {
        builder.descriptor_for(table.name());
    }
    builder.prune();

    let mut by_function = FxHashMap::default();
    if options.enable_set_function_filters {
        for function in schema.set_functions() {
            if let Some(&id) = builder.index.get(&function.returns) {
                by_function.insert(function.name.clone(), id);
            }
        }
    }

    let catalog = FilterCatalog {
        descriptors: builder.descriptors,
        by_source: builder.index,
        by_function,
    };
    tracing::debug!(
        descriptors = catalog.len(),
        set_functions = catalog.by_function.len(),
        "Filter catalog built"
    );
    catalog
}

/// Exposed name of a descriptor, e.g. `BlogPostFilter`
pub fn descriptor_name(source: &str) -> String {
    format!("{}Filter", pascal_case(source))
}

/// Exposed name of an attribute's operator set: `TextFilter`, `Int4ListFilter`
pub fn attribute_type_name(codec: &Codec) -> String {
    fn stem(codec: &Codec) -> String {
        match codec {
            Codec::Array(inner) => format!("{}List", stem(inner)),
            other => pascal_case(&other.name().replace(' ', "_")),
        }
    }
    format!("{}Filter", stem(codec))
}

/// Exposed name of a many-relation quantifier type
pub fn many_type_name(parent: &str, child: &str) -> String {
    format!("{}To{}ManyFilter", pascal_case(parent), pascal_case(child))
}

struct DescriptorBuilder<'a> {
    schema: &'a Schema,
    registry: &'a OperatorRegistry,
    options: &'a FilterOptions,
    descriptors: Vec<FilterTypeDescriptor>,
    index: FxHashMap<String, DescriptorId>,
}

impl<'a> DescriptorBuilder<'a> {
    fn descriptor_for(&mut self, source: &str) -> Option<DescriptorId> {
        if let Some(&id) = self.index.get(source) {
            return Some(id);
        }

        let schema = self.schema;
        let table = schema.table(source);
        if table.is_some_and(|t| !t.filterable) {
            tracing::trace!(table = %source, "Table hidden from filtering");
            return None;
        }
        let composite = schema.composite(source)?;

        let id = DescriptorId(self.descriptors.len());
        self.descriptors.push(FilterTypeDescriptor::placeholder(
            descriptor_name(source),
            source.to_string(),
            table.map(|t| t.sql_name.clone()),
        ));
        self.index.insert(source.to_string(), id);

        let mut fields = Vec::new();
        self.attribute_fields(composite, &mut fields);
        if let Some(table) = table
            && self.options.enable_relation_filters
        {
            self.relation_fields(table, &mut fields);
        }
        if self.options.enable_logical_operators && !fields.is_empty() {
            fields.push(("and".to_string(), FilterField::And));
            fields.push(("or".to_string(), FilterField::Or));
            fields.push(("not".to_string(), FilterField::Not));
        }

        tracing::trace!(
            descriptor = %self.descriptors[id.0].name,
            fields = fields.len(),
            "Built filter descriptor"
        );
        self.descriptors[id.0].fields = fields;
        Some(id)
    }

    fn attribute_fields(
        &mut self,
        composite: &'a CompositeType,
        fields: &mut Vec<(String, FilterField)>,
    ) {
        for attr in &composite.attributes {
            if !attr.filterable
                || (attr.is_computed() && !self.options.enable_computed_field_filters)
                || (attr.codec.is_array() && !self.options.enable_array_filters)
                || !self.options.field_type_allowed(&attr.codec.underlying_name())
            {
                continue;
            }

            let field = match &attr.codec {
                Codec::Composite(target) if !attr.is_computed() => {
                    match self.descriptor_for(target) {
                        Some(descriptor) => FilterField::Composite {
                            column: attr.name.clone(),
                            descriptor,
                        },
                        None => continue,
                    }
                }
                codec if codec.innermost().is_composite() => {
                    tracing::trace!(
                        attribute = %attr.name,
                        "Composite-valued attribute has no operator filter"
                    );
                    continue;
                }
                codec => {
                    if self.registry.operators_for(codec).is_empty() {
                        continue;
                    }
                    FilterField::Attribute {
                        column: attr.name.clone(),
                        codec: codec.clone(),
                        computed: attr.computed.clone(),
                        type_name: attribute_type_name(codec),
                    }
                }
            };
            push_field(&composite.name, fields, attr.field_name.clone(), field);
        }
    }

    fn relation_fields(&mut self, table: &'a TableType, fields: &mut Vec<(String, FilterField)>) {
        for relation in &table.relations {
            let Some(descriptor) = self.descriptor_for(&relation.foreign_table) else {
                tracing::warn!(
                    table = %table.name(),
                    relation = %relation.field_name,
                    target = %relation.foreign_table,
                    "Relation target has no filter type, skipping"
                );
                continue;
            };

            match relation.cardinality {
                Cardinality::One => {
                    push_field(
                        table.name(),
                        fields,
                        relation.field_name.clone(),
                        FilterField::Relation {
                            relation: relation.clone(),
                            descriptor,
                        },
                    );
                    let needs_exists = match relation.kind {
                        RelationKind::Forward => relation
                            .local_attrs
                            .iter()
                            .any(|c| table.attribute(c).is_some_and(|a| a.nullable)),
                        RelationKind::Backward => true,
                    };
                    if needs_exists {
                        push_field(
                            table.name(),
                            fields,
                            format!("{}{}", relation.field_name, EXISTS_SUFFIX),
                            FilterField::RelationExists {
                                relation: relation.clone(),
                                descriptor,
                            },
                        );
                    }
                }
                Cardinality::Many => {
                    push_field(
                        table.name(),
                        fields,
                        relation.field_name.clone(),
                        FilterField::ManyRelation {
                            relation: relation.clone(),
                            descriptor,
                            type_name: many_type_name(table.name(), &relation.foreign_table),
                        },
                    );
                    push_field(
                        table.name(),
                        fields,
                        format!("{}{}", relation.field_name, EXIST_SUFFIX),
                        FilterField::RelationExists {
                            relation: relation.clone(),
                            descriptor,
                        },
                    );
                }
            }
        }
    }

    fn prune(&mut self) {
        loop {
            let empty: Vec<bool> = self.descriptors.iter().map(|d| d.is_empty()).collect();
            let mut changed = false;
            for descriptor in &mut self.descriptors {
                let before = descriptor.fields.len();
                descriptor
                    .fields
                    .retain(|(_, field)| match field {
                        FilterField::RelationExists { .. } => true,
                        other => other.target().is_none_or(|t| !empty[t.0]),
                    });
                if descriptor.is_logical_only() {
                    descriptor.fields.clear();
                }
                if descriptor.fields.len() != before {
                    tracing::trace!(
                        descriptor = %descriptor.name,
                        removed = before - descriptor.fields.len(),
                        "Pruned fields without filterable targets"
                    );
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
    }
}

fn push_field(
    owner: &str,
    fields: &mut Vec<(String, FilterField)>,
    name: String,
    field: FilterField,
) {
    if fields.iter().any(|(n, _)| *n == name) {
        tracing::warn!(owner = %owner, field = %name, "Duplicate filter field name, skipping");
        return;
    }
    fields.push((name, field));
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
