//! Built descriptor set

use rustc_hash::FxHashMap;

use crate::error::FilterError;
use crate::sql::QualifiedName;

use super::descriptor::{DescriptorId, FieldDescription, FilterField, FilterTypeDescriptor};

/// Every descriptor derived from one schema, immutable once built
#[derive(Debug, Clone, Default)]
pub struct FilterCatalog {
    pub(crate) descriptors: Vec<FilterTypeDescriptor>,
    pub(crate) by_source: FxHashMap<String, DescriptorId>,
    pub(crate) by_function: FxHashMap<QualifiedName, DescriptorId>,
}

impl FilterCatalog {
    /// Descriptor by id; ids only come from this catalog
    pub(crate) fn descriptor(&self, id: DescriptorId) -> &FilterTypeDescriptor {
        &self.descriptors[id.0]
    }

    /// Id of the descriptor filtering `source`, when it has any fields
    pub fn id_for(&self, source: &str) -> Option<DescriptorId> {
        self.by_source
            .get(source)
            .copied()
            .filter(|id| !self.descriptor(*id).is_empty())
    }

    /// Descriptor filtering a table (or composite type) by name
    pub fn for_table(&self, table: &str) -> Option<&FilterTypeDescriptor> {
        self.id_for(table).map(|id| self.descriptor(id))
    }

    /// Id of the descriptor filtering a set function's rows
    pub fn id_for_function(&self, function: &QualifiedName) -> Option<DescriptorId> {
        self.by_function
            .get(function)
            .copied()
            .filter(|id| !self.descriptor(*id).is_empty())
    }

    /// Descriptor filtering the rows returned by a set function
    pub fn for_set_function(&self, function: &QualifiedName) -> Option<&FilterTypeDescriptor> {
        self.id_for_function(function).map(|id| self.descriptor(id))
    }

    /// Non-empty descriptors in build order
    pub fn iter(&self) -> impl Iterator<Item = &FilterTypeDescriptor> {
        self.descriptors.iter().filter(|d| !d.is_empty())
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Field names and value types of a filter input type.
    ///
    /// Accepts descriptor names (`PostFilter`) and many-relation quantifier
    /// type names (`PersonToPostManyFilter`).
    pub fn describe(&self, type_name: &str) -> Result<Vec<FieldDescription>, FilterError> {
        if let Some(descriptor) = self.iter().find(|d| d.name == type_name) {
            return Ok(descriptor
                .fields()
                .map(|(name, field)| self.describe_field(descriptor, name, field))
                .collect());
        }

        let quantified = self.iter().flat_map(|d| d.fields()).find_map(|(_, field)| match field {
            FilterField::ManyRelation {
                descriptor,
                type_name: many,
                ..
            } if many == type_name => Some(*descriptor),
            _ => None,
        });
        if let Some(target) = quantified {
            let target_name = &self.descriptor(target).name;
            return Ok(["every", "some", "none"]
                .into_iter()
                .map(|name| FieldDescription {
                    name: name.to_string(),
                    type_name: target_name.clone(),
                    is_list: false,
                })
                .collect());
        }

        Err(FilterError::UnknownDescriptor(type_name.to_string()))
    }

    fn describe_field(
        &self,
        owner: &FilterTypeDescriptor,
        name: &str,
        field: &FilterField,
    ) -> FieldDescription {
        let (type_name, is_list) = match field {
            FilterField::Attribute { type_name, .. }
            | FilterField::ManyRelation { type_name, .. } => (type_name.clone(), false),
            FilterField::Composite { descriptor, .. } | FilterField::Relation { descriptor, .. } => {
                (self.descriptor(*descriptor).name.clone(), false)
            }
            FilterField::RelationExists { .. } => ("Boolean".to_string(), false),
            FilterField::And | FilterField::Or => (owner.name.clone(), true),
            FilterField::Not => (owner.name.clone(), false),
        };
        FieldDescription {
            name: name.to_string(),
            type_name,
            is_list,
        }
    }
}
