//! Schema model
//!
//! Declarative description of tables, composite types and their relations.
//! A [`Schema`] is validated once by [`SchemaBuilder::build`] and is immutable
//! afterwards; backward relations are derived from declared foreign keys.

mod codec;
mod table;

pub use codec::{
    CASE_INSENSITIVE_TYPES, Codec, DECIMAL_TYPES, INTEGER_TYPES, TEXT_TYPES,
};
pub use table::{
    Attribute, Cardinality, CompositeType, ForeignKey, Relation, RelationKind, SetFunction,
    TableType,
};

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::FilterError;
use crate::utils::string::{camel_case, pascal_case};

/// Validated, immutable schema
#[derive(Debug, Clone)]
pub struct Schema {
    tables: Vec<TableType>,
    table_index: FxHashMap<String, usize>,
    composites: FxHashMap<String, CompositeType>,
    functions: Vec<SetFunction>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    pub fn tables(&self) -> &[TableType] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&TableType> {
        self.table_index.get(name).map(|&i| &self.tables[i])
    }

    /// Standalone composite type or the row type of a table
    pub fn composite(&self, name: &str) -> Option<&CompositeType> {
        self.composites
            .get(name)
            .or_else(|| self.table(name).map(|t| &t.row))
    }

    pub fn set_functions(&self) -> &[SetFunction] {
        &self.functions
    }
}

/// Collects schema declarations before validation
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    tables: Vec<TableType>,
    composites: Vec<CompositeType>,
    functions: Vec<SetFunction>,
}

impl SchemaBuilder {
    pub fn table(mut self, table: TableType) -> Self {
        self.tables.push(table);
        self
    }

    pub fn composite(mut self, composite: CompositeType) -> Self {
        self.composites.push(composite);
        self
    }

    pub fn set_function(mut self, function: SetFunction) -> Self {
        self.functions.push(function);
        self
    }

    /// Validate references and derive backward relations
    pub fn build(self) -> Result<Schema, FilterError> {
        let mut seen = FxHashSet::default();
        for name in self
            .composites
            .iter()
            .map(|c| c.name.as_str())
            .chain(self.tables.iter().map(|t| t.name()))
        {
            if !seen.insert(name) {
                return Err(FilterError::DuplicateType(name.to_string()));
            }
        }

        for composite in self
            .composites
            .iter()
            .chain(self.tables.iter().map(|t| &t.row))
        {
            for attr in &composite.attributes {
                if let Codec::Composite(target) = attr.codec.innermost()
                    && !seen.contains(target.as_str())
                {
                    return Err(FilterError::UnknownCompositeType {
                        owner: composite.name.clone(),
                        attribute: attr.name.clone(),
                        target: target.clone(),
                    });
                }
            }
        }

        let table_index: FxHashMap<String, usize> = self
            .tables
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name().to_string(), i))
            .collect();

        let mut forward: Vec<Vec<Relation>> = vec![Vec::new(); self.tables.len()];
        let mut backward: Vec<Vec<Relation>> = vec![Vec::new(); self.tables.len()];
        for (i, table) in self.tables.iter().enumerate() {
            for fk in &table.foreign_keys {
                let (forward_field, backward_field) = relation_field_names(table, fk);
                let target =
                    validate_foreign_key(&self.tables, &table_index, table, fk, &forward_field)?;
                forward[i].push(Relation {
                    kind: RelationKind::Forward,
                    field_name: forward_field,
                    local_attrs: fk.local_attrs.clone(),
                    foreign_table: fk.foreign_table.clone(),
                    foreign_attrs: fk.foreign_attrs.clone(),
                    cardinality: Cardinality::One,
                });
                backward[target].push(Relation {
                    kind: RelationKind::Backward,
                    field_name: backward_field,
                    local_attrs: fk.foreign_attrs.clone(),
                    foreign_table: table.name().to_string(),
                    foreign_attrs: fk.local_attrs.clone(),
                    cardinality: if fk.unique {
                        Cardinality::One
                    } else {
                        Cardinality::Many
                    },
                });
            }
        }

        let mut tables = self.tables;
        for ((table, fwd), bwd) in tables.iter_mut().zip(forward).zip(backward) {
            table.relations = fwd.into_iter().chain(bwd).collect();
        }

        for function in &self.functions {
            if !table_index.contains_key(&function.returns) {
                return Err(FilterError::UnknownFunctionTable {
                    function: function.name.to_string(),
                    table: function.returns.clone(),
                });
            }
        }

        let relation_count: usize = tables.iter().map(|t| t.relations.len()).sum();
        tracing::debug!(
            tables = tables.len(),
            composites = self.composites.len(),
            relations = relation_count,
            "Schema built"
        );

        Ok(Schema {
            tables,
            table_index,
            composites: self
                .composites
                .into_iter()
                .map(|c| (c.name.clone(), c))
                .collect(),
            functions: self.functions,
        })
    }
}

/// Declared relation field names, or `personByAuthorId` / `postsByAuthorId`
fn relation_field_names(table: &TableType, fk: &ForeignKey) -> (String, String) {
    let keys = fk
        .local_attrs
        .iter()
        .map(|c| pascal_case(c))
        .collect::<Vec<_>>()
        .join("And");
    let forward = if fk.forward_field.is_empty() {
        format!("{}By{}", camel_case(&fk.foreign_table), keys)
    } else {
        fk.forward_field.clone()
    };
    let backward = if !fk.backward_field.is_empty() {
        fk.backward_field.clone()
    } else if fk.unique {
        format!("{}By{}", camel_case(table.name()), keys)
    } else {
        format!("{}sBy{}", camel_case(table.name()), keys)
    };
    (forward, backward)
}

/// Check a foreign key against both tables, returning the target's index
fn validate_foreign_key(
    tables: &[TableType],
    table_index: &FxHashMap<String, usize>,
    table: &TableType,
    fk: &ForeignKey,
    relation: &str,
) -> Result<usize, FilterError> {
    let relation = relation.to_string();
    let target = *table_index.get(&fk.foreign_table).ok_or_else(|| {
        FilterError::UnknownRelationTarget {
            table: table.name().to_string(),
            relation: relation.clone(),
            target: fk.foreign_table.clone(),
        }
    })?;

    if fk.local_attrs.is_empty() || fk.local_attrs.len() != fk.foreign_attrs.len() {
        return Err(FilterError::MissingCorrelationKey { relation });
    }

    let foreign = &tables[target];
    let missing = fk
        .local_attrs
        .iter()
        .find(|c| table.attribute(c).is_none())
        .map(|c| (table.name(), c))
        .or_else(|| {
            fk.foreign_attrs
                .iter()
                .find(|c| foreign.attribute(c).is_none())
                .map(|c| (foreign.name(), c))
        });
    if let Some((owner, column)) = missing {
        return Err(FilterError::UnknownRelationKey {
            table: owner.to_string(),
            relation,
            column: column.clone(),
        });
    }

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::QualifiedName;

    fn person() -> TableType {
        TableType::new(
            QualifiedName::new("app", "person"),
            vec![
                Attribute::new("id", Codec::scalar("int4")).not_null(),
                Attribute::new("name", Codec::scalar("text")),
            ],
        )
    }

    fn post() -> TableType {
        TableType::new(
            QualifiedName::new("app", "post"),
            vec![
                Attribute::new("id", Codec::scalar("int4")).not_null(),
                Attribute::new("author_id", Codec::scalar("int4")),
            ],
        )
        .with_foreign_key(
            ForeignKey::new(["author_id"], "person", ["id"]).fields("author", "posts"),
        )
    }

    #[test]
    fn test_backward_relation_is_derived() {
        let schema = Schema::builder().table(person()).table(post()).build().unwrap();

        let post = schema.table("post").unwrap();
        assert_eq!(post.relations.len(), 1);
        assert_eq!(post.relations[0].kind, RelationKind::Forward);
        assert_eq!(post.relations[0].cardinality, Cardinality::One);

        let person = schema.table("person").unwrap();
        assert_eq!(person.relations.len(), 1);
        let posts = &person.relations[0];
        assert_eq!(posts.kind, RelationKind::Backward);
        assert_eq!(posts.cardinality, Cardinality::Many);
        assert_eq!(posts.field_name, "posts");
        assert_eq!(posts.local_attrs, vec!["id"]);
        assert_eq!(posts.foreign_attrs, vec!["author_id"]);
        assert_eq!(posts.foreign_table, "post");
    }

    #[test]
    fn test_unique_foreign_key_gives_backward_one() {
        let profile = TableType::new(
            QualifiedName::new("app", "profile"),
            vec![Attribute::new("person_id", Codec::scalar("int4")).not_null()],
        )
        .with_foreign_key(
            ForeignKey::new(["person_id"], "person", ["id"])
                .fields("person", "profile")
                .unique(),
        );
        let schema = Schema::builder().table(person()).table(profile).build().unwrap();
        let person = schema.table("person").unwrap();
        assert_eq!(person.relations[0].cardinality, Cardinality::One);
    }

    #[test]
    fn test_unknown_relation_target() {
        let err = Schema::builder().table(post()).build().unwrap_err();
        assert_eq!(
            err,
            FilterError::UnknownRelationTarget {
                table: "post".into(),
                relation: "author".into(),
                target: "person".into(),
            }
        );
    }

    #[test]
    fn test_unknown_relation_key() {
        let broken = TableType::new(
            QualifiedName::new("app", "comment"),
            vec![Attribute::new("id", Codec::scalar("int4"))],
        )
        .with_foreign_key(ForeignKey::new(["writer_id"], "person", ["id"]).fields("w", "c"));
        let err = Schema::builder()
            .table(person())
            .table(broken)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            FilterError::UnknownRelationKey { ref column, .. } if column == "writer_id"
        ));
    }

    #[test]
    fn test_default_relation_field_names() {
        let comment = TableType::new(
            QualifiedName::new("app", "blog_comment"),
            vec![Attribute::new("author_id", Codec::scalar("int4"))],
        )
        .with_foreign_key(ForeignKey::new(["author_id"], "person", ["id"]));
        let schema = Schema::builder()
            .table(person())
            .table(comment)
            .build()
            .unwrap();
        let comment = schema.table("blog_comment").unwrap();
        assert_eq!(comment.relations[0].field_name, "personByAuthorId");
        let person = schema.table("person").unwrap();
        assert_eq!(person.relations[0].field_name, "blogCommentsByAuthorId");
    }

    #[test]
    fn test_duplicate_type() {
        let err = Schema::builder()
            .table(person())
            .table(person())
            .build()
            .unwrap_err();
        assert_eq!(err, FilterError::DuplicateType("person".into()));
    }

    #[test]
    fn test_unknown_composite_attribute() {
        let table = TableType::new(
            QualifiedName::new("app", "place"),
            vec![Attribute::new("address", Codec::composite("address"))],
        );
        let err = Schema::builder().table(table).build().unwrap_err();
        assert!(matches!(err, FilterError::UnknownCompositeType { .. }));
    }

    #[test]
    fn test_composite_lookup_includes_table_rows() {
        let address = CompositeType::new(
            "address",
            vec![Attribute::new("city", Codec::scalar("text"))],
        );
        let schema = Schema::builder()
            .composite(address)
            .table(person())
            .build()
            .unwrap();
        assert!(schema.composite("address").is_some());
        assert!(schema.composite("person").is_some());
        assert!(schema.composite("missing").is_none());
    }

    #[test]
    fn test_set_function_must_return_known_table() {
        let err = Schema::builder()
            .table(person())
            .set_function(SetFunction::new(
                QualifiedName::new("app", "search_posts"),
                "post",
            ))
            .build()
            .unwrap_err();
        assert!(matches!(err, FilterError::UnknownFunctionTable { .. }));
    }
}
