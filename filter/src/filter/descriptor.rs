//! Filter type descriptors
//!
//! A descriptor is the legal field set of one filter input type. Descriptors
//! live in an arena and refer to each other by [`DescriptorId`], so cyclic
//! table graphs are plain data.

use serde::Serialize;

use crate::schema::{Codec, Relation};
use crate::sql::QualifiedName;

/// Index of a descriptor in its catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorId(pub(crate) usize);

/// What a filter field does when present in input
#[derive(Debug, Clone, PartialEq)]
pub enum FilterField {
    /// Operator map over a column or computed attribute
    Attribute {
        column: String,
        codec: Codec,
        /// Function applied to the row for computed attributes
        computed: Option<QualifiedName>,
        /// Exposed operator-set type name, e.g. `TextFilter`
        type_name: String,
    },
    /// Nested filter over a composite-typed column
    Composite {
        column: String,
        descriptor: DescriptorId,
    },
    /// Forward or backward relation to a single row
    Relation {
        relation: Relation,
        descriptor: DescriptorId,
    },
    /// Boolean existence test over a relation
    RelationExists {
        relation: Relation,
        descriptor: DescriptorId,
    },
    /// `every`/`some`/`none` over a backward many-relation
    ManyRelation {
        relation: Relation,
        descriptor: DescriptorId,
        /// Exposed quantifier type name, e.g. `PersonToPostManyFilter`
        type_name: String,
    },
    And,
    Or,
    Not,
}

impl FilterField {
    /// Descriptor this field's value is resolved against, if any
    pub fn target(&self) -> Option<DescriptorId> {
        match self {
            Self::Composite { descriptor, .. }
            | Self::Relation { descriptor, .. }
            | Self::RelationExists { descriptor, .. }
            | Self::ManyRelation { descriptor, .. } => Some(*descriptor),
            _ => None,
        }
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, Self::And | Self::Or | Self::Not)
    }
}

/// The legal filter fields of one composite or table type
#[derive(Debug, Clone, PartialEq)]
pub struct FilterTypeDescriptor {
    /// Exposed input type name, e.g. `PostFilter`
    pub name: String,
    /// Composite or table this descriptor filters
    pub source: String,
    /// SQL name when the source is a table
    pub table: Option<QualifiedName>,
    pub(crate) fields: Vec<(String, FilterField)>,
}

impl FilterTypeDescriptor {
    pub(crate) fn placeholder(
        name: String,
        source: String,
        table: Option<QualifiedName>,
    ) -> Self {
        Self {
            name,
            source,
            table,
            fields: Vec::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FilterField> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, f)| f)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FilterField)> {
        self.fields.iter().map(|(n, f)| (n.as_str(), f))
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether only `and`/`or`/`not` remain
    pub(crate) fn is_logical_only(&self) -> bool {
        !self.fields.is_empty() && self.fields.iter().all(|(_, f)| f.is_logical())
    }
}

/// One field of a descriptor, as reported by introspection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescription {
    pub name: String,
    /// Input type of the field value, e.g. `TextFilter` or `Boolean`
    pub type_name: String,
    /// Whether the value is a list of `type_name`
    pub is_list: bool,
}
