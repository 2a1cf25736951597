//! Filter resolution
//!
//! Compiles a runtime filter value against a descriptor into a [`Predicate`].
//! Every key present in a filter object contributes one conjunct; omitted
//! keys contribute nothing. Relation traversals allocate a fresh alias from
//! the resolver's own [`AliasGenerator`], so a resolver must not be shared
//! between requests.

use serde_json::{Map, Value as JsonValue};

use crate::core::FilterOptions;
use crate::error::FilterError;
use crate::operators::OperatorRegistry;
use crate::schema::{Codec, Relation};
use crate::sql::{AliasGenerator, QualifiedName, SqlFragment};
use crate::utils::json::json_kind;

use super::catalog::FilterCatalog;
use super::descriptor::{DescriptorId, FilterField};
use super::predicate::Predicate;

/// Per-request resolver state
pub struct FilterResolver<'a> {
    catalog: &'a FilterCatalog,
    registry: &'a OperatorRegistry,
    options: &'a FilterOptions,
    aliases: AliasGenerator,
}

/// Correlated relation scan: the related table, its alias and the key match
struct Correlation {
    table: QualifiedName,
    alias: String,
    key_match: Predicate,
}

impl<'a> FilterResolver<'a> {
    pub fn new(
        catalog: &'a FilterCatalog,
        registry: &'a OperatorRegistry,
        options: &'a FilterOptions,
    ) -> Self {
        Self {
            catalog,
            registry,
            options,
            aliases: AliasGenerator::new(),
        }
    }

    /// Keep generated aliases away from one already used by the host query
    pub fn reserve_alias(&mut self, alias: &str) {
        self.aliases.reserve(alias);
    }

    /// Resolve `value` against `descriptor` for rows bound to `row`
    pub fn resolve(
        &mut self,
        descriptor: DescriptorId,
        row: &SqlFragment,
        value: &JsonValue,
    ) -> Result<Predicate, FilterError> {
        self.resolve_object(descriptor, row, value, "")
    }

    fn resolve_object(
        &mut self,
        descriptor: DescriptorId,
        row: &SqlFragment,
        value: &JsonValue,
        path: &str,
    ) -> Result<Predicate, FilterError> {
        let catalog = self.catalog;
        let target = catalog.descriptor(descriptor);
        let map = match value {
            JsonValue::Null => return self.null_value(path),
            JsonValue::Object(map) => map,
            other => {
                return Err(FilterError::invalid_operand(
                    display_path(path),
                    format!("an object ({}), got {}", target.name, json_kind(other)),
                ));
            }
        };
        if map.is_empty() {
            return self.empty_object(path);
        }

        let mut parts = Vec::with_capacity(map.len());
        for (key, field_value) in map {
            let field_path = join_path(path, key);
            let field = target
                .field(key)
                .ok_or_else(|| FilterError::UnknownField {
                    type_name: target.name.clone(),
                    field: key.clone(),
                    path: display_path(path),
                })?;
            if field_value.is_null() {
                parts.push(self.null_value(&field_path)?);
                continue;
            }
            parts.push(self.resolve_field(descriptor, field, row, field_value, &field_path)?);
        }
        Ok(Predicate::all(parts))
    }

    fn resolve_field(
        &mut self,
        owner: DescriptorId,
        field: &FilterField,
        row: &SqlFragment,
        value: &JsonValue,
        path: &str,
    ) -> Result<Predicate, FilterError> {
        match field {
            FilterField::Attribute {
                column,
                codec,
                computed,
                ..
            } => {
                let identifier = match computed {
                    Some(function) => SqlFragment::call_named(function, vec![row.clone()]),
                    None => SqlFragment::column(row, column),
                };
                self.resolve_operators(codec, identifier, value, path)
            }
            FilterField::Composite { column, descriptor } => {
                let nested = SqlFragment::column(row, column).parenthesized();
                self.resolve_object(*descriptor, &nested, value, path)
            }
            FilterField::And => {
                let items = self.resolve_list(owner, row, value, path)?;
                Ok(Predicate::all(items))
            }
            FilterField::Or => {
                let items = self.resolve_list(owner, row, value, path)?;
                Ok(Predicate::any(items))
            }
            FilterField::Not => {
                // `not` over no constraint is still no constraint
                let inner = self.resolve_object(owner, row, value, path)?;
                Ok(if inner.is_unconstrained() {
                    Predicate::Unconstrained
                } else {
                    inner.negate()
                })
            }
            FilterField::Relation {
                relation,
                descriptor,
            } => {
                let scan = self.correlate(row, relation, *descriptor)?;
                let nested = SqlFragment::identifier(scan.alias.as_str());
                let condition = self.resolve_object(*descriptor, &nested, value, path)?;
                Ok(Predicate::exists(
                    scan.table,
                    scan.alias,
                    Predicate::all([scan.key_match, condition]),
                ))
            }
            FilterField::RelationExists {
                relation,
                descriptor,
            } => {
                let expected = value.as_bool().ok_or_else(|| {
                    FilterError::invalid_operand(
                        path,
                        format!("a boolean, got {}", json_kind(value)),
                    )
                })?;
                let scan = self.correlate(row, relation, *descriptor)?;
                let exists = Predicate::exists(scan.table, scan.alias, scan.key_match);
                Ok(if expected { exists } else { exists.negate() })
            }
            FilterField::ManyRelation {
                relation,
                descriptor,
                type_name,
            } => {
                let map = value.as_object().ok_or_else(|| {
                    FilterError::invalid_operand(
                        path,
                        format!("an object ({}), got {}", type_name, json_kind(value)),
                    )
                })?;
                self.resolve_quantifiers(relation, *descriptor, type_name, row, map, path)
            }
        }
    }

    /// `and`/`or` operands: a list of sibling filters on the same row
    fn resolve_list(
        &mut self,
        owner: DescriptorId,
        row: &SqlFragment,
        value: &JsonValue,
        path: &str,
    ) -> Result<Vec<Predicate>, FilterError> {
        let items = value.as_array().ok_or_else(|| {
            FilterError::invalid_operand(
                path,
                format!(
                    "a list of {}, got {}",
                    self.catalog.descriptor(owner).name,
                    json_kind(value)
                ),
            )
        })?;
        items
            .iter()
            .enumerate()
            .map(|(i, item)| self.resolve_object(owner, row, item, &format!("{}[{}]", path, i)))
            .collect()
    }

    fn resolve_operators(
        &mut self,
        codec: &Codec,
        identifier: SqlFragment,
        value: &JsonValue,
        path: &str,
    ) -> Result<Predicate, FilterError> {
        let map = value.as_object().ok_or_else(|| {
            FilterError::invalid_operand(
                path,
                format!("an object of operators, got {}", json_kind(value)),
            )
        })?;
        if map.is_empty() {
            return self.empty_object(path);
        }

        let operators = self.registry.operators_for(codec);
        let mut parts = Vec::with_capacity(map.len());
        for (name, operand) in map {
            let spec = operators
                .get(name)
                .ok_or_else(|| FilterError::unknown_operator(path, name.as_str()))?;
            let operator_path = join_path(path, name);
            if operand.is_null() {
                parts.push(self.null_value(&operator_path)?);
                continue;
            }
            let predicate = spec
                .compile(identifier.clone(), codec, operand)
                .map_err(|expected| FilterError::invalid_operand(&operator_path, expected))?;
            tracing::trace!(path = %operator_path, operator = %spec.name, "Resolved operator");
            parts.push(predicate);
        }
        Ok(Predicate::all(parts))
    }

    /// `every`/`some`/`none` over the related rows of a many-relation
    fn resolve_quantifiers(
        &mut self,
        relation: &Relation,
        descriptor: DescriptorId,
        type_name: &str,
        row: &SqlFragment,
        map: &Map<String, JsonValue>,
        path: &str,
    ) -> Result<Predicate, FilterError> {
        if map.is_empty() {
            return self.empty_object(path);
        }

        let mut parts = Vec::with_capacity(map.len());
        for (key, nested) in map {
            let quantifier_path = join_path(path, key);
            if !matches!(key.as_str(), "every" | "some" | "none") {
                return Err(FilterError::UnknownField {
                    type_name: type_name.to_string(),
                    field: key.clone(),
                    path: display_path(path),
                });
            }
            if nested.is_null() {
                parts.push(self.null_value(&quantifier_path)?);
                continue;
            }

            let scan = self.correlate(row, relation, descriptor)?;
            let related = SqlFragment::identifier(scan.alias.as_str());
            let condition = self.resolve_object(descriptor, &related, nested, &quantifier_path)?;
            let predicate = match key.as_str() {
                "some" => Predicate::exists(
                    scan.table,
                    scan.alias,
                    Predicate::all([scan.key_match, condition]),
                ),
                "none" => Predicate::exists(
                    scan.table,
                    scan.alias,
                    Predicate::all([scan.key_match, condition]),
                )
                .negate(),
                _ => Predicate::exists(
                    scan.table,
                    scan.alias,
                    Predicate::all([scan.key_match, condition.negate()]),
                )
                .negate(),
            };
            parts.push(predicate);
        }
        Ok(Predicate::all(parts))
    }

    /// Allocate an alias for the related table and match its keys to `row`
    fn correlate(
        &mut self,
        row: &SqlFragment,
        relation: &Relation,
        descriptor: DescriptorId,
    ) -> Result<Correlation, FilterError> {
        let catalog = self.catalog;
        let target = catalog.descriptor(descriptor);
        let table = target
            .table
            .clone()
            .ok_or_else(|| FilterError::UnknownDescriptor(target.name.clone()))?;
        if relation.local_attrs.is_empty()
            || relation.local_attrs.len() != relation.foreign_attrs.len()
        {
            return Err(FilterError::MissingCorrelationKey {
                relation: relation.field_name.clone(),
            });
        }

        let alias = self.aliases.next_alias(&target.source)?;
        let related = SqlFragment::identifier(alias.as_str());
        let key_match = Predicate::all(relation.local_attrs.iter().zip(&relation.foreign_attrs).map(
            |(local, foreign)| {
                Predicate::condition(
                    SqlFragment::column(&related, foreign)
                        .append(SqlFragment::raw(" = "))
                        .append(SqlFragment::column(row, local)),
                )
            },
        ));
        tracing::trace!(relation = %relation.field_name, alias = %alias, "Correlated relation");
        Ok(Correlation {
            table,
            alias,
            key_match,
        })
    }

    fn null_value(&self, path: &str) -> Result<Predicate, FilterError> {
        if self.options.allow_null_input {
            Ok(Predicate::Unconstrained)
        } else {
            Err(FilterError::null_input(display_path(path)))
        }
    }

    fn empty_object(&self, path: &str) -> Result<Predicate, FilterError> {
        if self.options.allow_empty_object_input {
            Ok(Predicate::Unconstrained)
        } else {
            Err(FilterError::empty_object(display_path(path)))
        }
    }
}

fn join_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "filter".to_string()
    } else {
        path.to_string()
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
