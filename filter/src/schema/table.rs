//! Tables, composite types and relations

use crate::sql::QualifiedName;
use crate::utils::string::camel_case;

use super::codec::Codec;

/// One attribute of a composite type or table
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Column name in SQL
    pub name: String,
    /// Field name exposed in filter input
    pub field_name: String,
    pub codec: Codec,
    pub nullable: bool,
    /// Function computing the value from the row, for virtual attributes
    pub computed: Option<QualifiedName>,
    pub filterable: bool,
}

impl Attribute {
    pub fn new(name: impl Into<String>, codec: Codec) -> Self {
        let name = name.into();
        Self {
            field_name: camel_case(&name),
            name,
            codec,
            nullable: true,
            computed: None,
            filterable: true,
        }
    }

    /// A virtual attribute computed by `function(row)`
    pub fn computed(field_name: impl Into<String>, function: QualifiedName, codec: Codec) -> Self {
        let field_name = field_name.into();
        Self {
            name: function.name.clone(),
            field_name,
            codec,
            nullable: true,
            computed: Some(function),
            filterable: true,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn with_field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = field_name.into();
        self
    }

    /// Hide this attribute from filter input
    pub fn hidden(mut self) -> Self {
        self.filterable = false;
        self
    }

    pub fn is_computed(&self) -> bool {
        self.computed.is_some()
    }
}

/// A named record type
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeType {
    pub name: String,
    pub attributes: Vec<Attribute>,
}

impl CompositeType {
    pub fn new(name: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        Self {
            name: name.into(),
            attributes,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// From this table's columns to a unique key elsewhere
    Forward,
    /// From a referenced table back to the referencing rows
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    One,
    Many,
}

/// A foreign key as declared by the schema author
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    pub local_attrs: Vec<String>,
    pub foreign_table: String,
    pub foreign_attrs: Vec<String>,
    /// Field name on the referencing table
    pub forward_field: String,
    /// Field name on the referenced table
    pub backward_field: String,
    /// Whether the referencing columns are themselves unique
    pub unique: bool,
}

impl ForeignKey {
    pub fn new<S: Into<String>>(
        local_attrs: impl IntoIterator<Item = S>,
        foreign_table: impl Into<String>,
        foreign_attrs: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            local_attrs: local_attrs.into_iter().map(Into::into).collect(),
            foreign_table: foreign_table.into(),
            foreign_attrs: foreign_attrs.into_iter().map(Into::into).collect(),
            forward_field: String::new(),
            backward_field: String::new(),
            unique: false,
        }
    }

    pub fn fields(
        mut self,
        forward_field: impl Into<String>,
        backward_field: impl Into<String>,
    ) -> Self {
        self.forward_field = forward_field.into();
        self.backward_field = backward_field.into();
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// A navigable relation from one table to another
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub kind: RelationKind,
    pub field_name: String,
    /// Columns on the table owning this relation
    pub local_attrs: Vec<String>,
    pub foreign_table: String,
    /// Matching columns on the foreign table, pairwise with `local_attrs`
    pub foreign_attrs: Vec<String>,
    pub cardinality: Cardinality,
}

/// A table: a composite row type stored under a SQL name
#[derive(Debug, Clone, PartialEq)]
pub struct TableType {
    pub row: CompositeType,
    pub sql_name: QualifiedName,
    pub foreign_keys: Vec<ForeignKey>,
    pub relations: Vec<Relation>,
    pub filterable: bool,
}

impl TableType {
    pub fn new(sql_name: QualifiedName, attributes: Vec<Attribute>) -> Self {
        Self {
            row: CompositeType::new(sql_name.name.clone(), attributes),
            sql_name,
            foreign_keys: Vec::new(),
            relations: Vec::new(),
            filterable: true,
        }
    }

    pub fn with_foreign_key(mut self, foreign_key: ForeignKey) -> Self {
        self.foreign_keys.push(foreign_key);
        self
    }

    /// Exclude this table from filtering entirely
    pub fn hidden(mut self) -> Self {
        self.filterable = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.row.name
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.row.attribute(name)
    }
}

/// A function returning a set of table rows
#[derive(Debug, Clone, PartialEq)]
pub struct SetFunction {
    pub name: QualifiedName,
    pub returns: String,
}

impl SetFunction {
    pub fn new(name: QualifiedName, returns: impl Into<String>) -> Self {
        Self {
            name,
            returns: returns.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_defaults() {
        let attr = Attribute::new("author_id", Codec::scalar("int4"));
        assert_eq!(attr.field_name, "authorId");
        assert!(attr.nullable);
        assert!(attr.filterable);
        assert!(!attr.is_computed());

        let attr = attr.not_null().hidden();
        assert!(!attr.nullable);
        assert!(!attr.filterable);
    }

    #[test]
    fn test_computed_attribute() {
        let attr = Attribute::computed(
            "fullName",
            QualifiedName::new("app", "person_full_name"),
            Codec::scalar("text"),
        );
        assert!(attr.is_computed());
        assert_eq!(attr.name, "person_full_name");
        assert_eq!(attr.field_name, "fullName");
    }

    #[test]
    fn test_foreign_key_builder() {
        let fk = ForeignKey::new(["author_id"], "person", ["id"])
            .fields("author", "posts")
            .unique();
        assert_eq!(fk.local_attrs, vec!["author_id"]);
        assert_eq!(fk.forward_field, "author");
        assert!(fk.unique);
    }
}
