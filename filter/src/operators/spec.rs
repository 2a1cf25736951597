//! Operator specifications
//!
//! An operator is data plus four small functions: the operand's expected
//! type, a transform for the column expression, a transform that binds the
//! operand, and a template joining both into a boolean predicate.

use std::fmt;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::error::FilterError;
use crate::filter::Predicate;
use crate::schema::Codec;
use crate::sql::{Backend, SqlFragment};

use super::operand::{Operand, bind_operand};

/// Closed set of codec categories operators are registered under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperatorCategory {
    Array,
    Range,
    Enum,
    Domain,
    Scalar,
}

impl OperatorCategory {
    /// Category of a codec's outermost layer; composites have none
    pub fn of(codec: &Codec) -> Option<Self> {
        match codec {
            Codec::Array(_) => Some(Self::Array),
            Codec::Range { .. } => Some(Self::Range),
            Codec::Enum { .. } => Some(Self::Enum),
            Codec::Domain { .. } => Some(Self::Domain),
            Codec::Scalar(_) => Some(Self::Scalar),
            Codec::Composite(_) => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Array => "array",
            Self::Range => "range",
            Self::Enum => "enum",
            Self::Domain => "domain",
            Self::Scalar => "scalar",
        }
    }
}

impl fmt::Display for OperatorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Codecs an operator is being applied with
#[derive(Debug, Clone, Copy)]
pub struct OperatorContext<'a> {
    /// The filtered field's codec
    pub field: &'a Codec,
    /// The codec the operand must conform to
    pub input: &'a Codec,
}

pub type InputCodecFn = Arc<dyn Fn(&Codec) -> Codec + Send + Sync>;
pub type IdentifierTransform = Arc<dyn Fn(SqlFragment, &OperatorContext<'_>) -> SqlFragment + Send + Sync>;
/// Binds an operand; the error string describes what was expected
pub type ValueTransform =
    Arc<dyn Fn(&JsonValue, &OperatorContext<'_>) -> Result<Operand, String> + Send + Sync>;
pub type PredicateTemplate = Arc<dyn Fn(SqlFragment, Operand) -> Predicate + Send + Sync>;

/// A named filter operator
#[derive(Clone)]
pub struct OperatorSpec {
    pub name: String,
    pub description: String,
    pub category: OperatorCategory,
    /// Field types this operator is limited to; `None` means every type
    pub allowed_field_types: Option<Vec<String>>,
    /// Eligible for an `...Insensitive` variant
    pub case_sensitive: bool,
    /// Backends whose SQL can express this operator; `None` means all
    pub backends: Option<Vec<Backend>>,
    pub(crate) input_codec: InputCodecFn,
    pub(crate) identifier_transform: IdentifierTransform,
    pub(crate) value_transform: ValueTransform,
    pub(crate) template: PredicateTemplate,
}

impl fmt::Debug for OperatorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorSpec")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("allowed_field_types", &self.allowed_field_types)
            .field("case_sensitive", &self.case_sensitive)
            .field("backends", &self.backends)
            .finish_non_exhaustive()
    }
}

impl OperatorSpec {
    pub fn builder(name: impl Into<String>, category: OperatorCategory) -> OperatorSpecBuilder {
        OperatorSpecBuilder::new(name.into(), category)
    }

    /// Whether this operator may be applied to a field of `codec`
    pub fn applies_to(&self, codec: &Codec) -> bool {
        match &self.allowed_field_types {
            None => true,
            Some(types) => types.iter().any(|t| codec.matches_type_name(t)),
        }
    }

    /// Whether this operator can be rendered for `backend`
    pub fn supports(&self, backend: Backend) -> bool {
        self.backends
            .as_ref()
            .is_none_or(|backends| backends.contains(&backend))
    }

    /// Whether two operators could both apply to some field type
    pub fn overlaps(&self, other: &OperatorSpec) -> bool {
        match (&self.allowed_field_types, &other.allowed_field_types) {
            (Some(a), Some(b)) => a.iter().any(|t| b.contains(t)),
            _ => true,
        }
    }

    /// Codec the operand must conform to for a field of `field`
    pub fn input_codec(&self, field: &Codec) -> Codec {
        (self.input_codec)(field)
    }

    /// Build the predicate for `identifier <op> value`
    pub fn compile(
        &self,
        identifier: SqlFragment,
        field: &Codec,
        value: &JsonValue,
    ) -> Result<Predicate, String> {
        let input = self.input_codec(field);
        let ctx = OperatorContext {
            field,
            input: &input,
        };
        let operand = (self.value_transform)(value, &ctx)?;
        let identifier = (self.identifier_transform)(identifier, &ctx);
        Ok((self.template)(identifier, operand))
    }
}

/// Incremental construction of an [`OperatorSpec`]
pub struct OperatorSpecBuilder {
    name: String,
    category: OperatorCategory,
    description: Option<String>,
    allowed_field_types: Option<Vec<String>>,
    case_sensitive: bool,
    backends: Option<Vec<Backend>>,
    input_codec: Option<InputCodecFn>,
    identifier_transform: Option<IdentifierTransform>,
    value_transform: Option<ValueTransform>,
    template: Option<PredicateTemplate>,
}

impl OperatorSpecBuilder {
    fn new(name: String, category: OperatorCategory) -> Self {
        Self {
            name,
            category,
            description: None,
            allowed_field_types: None,
            case_sensitive: false,
            backends: None,
            input_codec: None,
            identifier_transform: None,
            value_transform: None,
            template: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn allowed_field_types<S: Into<String>>(
        mut self,
        types: impl IntoIterator<Item = S>,
    ) -> Self {
        self.allowed_field_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn case_sensitive(mut self) -> Self {
        self.case_sensitive = true;
        self
    }

    /// Limit the operator to backends whose SQL can express it
    pub fn backends(mut self, backends: impl IntoIterator<Item = Backend>) -> Self {
        self.backends = Some(backends.into_iter().collect());
        self
    }

    pub fn input_codec(
        mut self,
        f: impl Fn(&Codec) -> Codec + Send + Sync + 'static,
    ) -> Self {
        self.input_codec = Some(Arc::new(f));
        self
    }

    pub fn identifier_transform(
        mut self,
        f: impl Fn(SqlFragment, &OperatorContext<'_>) -> SqlFragment + Send + Sync + 'static,
    ) -> Self {
        self.identifier_transform = Some(Arc::new(f));
        self
    }

    pub fn value_transform(
        mut self,
        f: impl Fn(&JsonValue, &OperatorContext<'_>) -> Result<Operand, String>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.value_transform = Some(Arc::new(f));
        self
    }

    pub fn template(
        mut self,
        f: impl Fn(SqlFragment, Operand) -> Predicate + Send + Sync + 'static,
    ) -> Self {
        self.template = Some(Arc::new(f));
        self
    }

    /// `identifier <sql_operator> operand`
    pub fn binary(self, sql_operator: &'static str) -> Self {
        self.template(move |identifier, operand| {
            Predicate::condition(
                identifier
                    .append(SqlFragment::raw(sql_operator))
                    .append(operand.into_fragment()),
            )
        })
    }

    /// Finish the spec; description and template are required.
    ///
    /// The operand defaults to the field's own type, bound as a parameter,
    /// and the identifier is used unchanged.
    pub fn build(self) -> Result<OperatorSpec, FilterError> {
        if self.name.is_empty() {
            return Err(FilterError::missing_field("<unnamed>", "name"));
        }
        let description = self
            .description
            .ok_or_else(|| FilterError::missing_field(&self.name, "description"))?;
        let template = self
            .template
            .ok_or_else(|| FilterError::missing_field(&self.name, "template"))?;
        Ok(OperatorSpec {
            description,
            category: self.category,
            allowed_field_types: self.allowed_field_types,
            case_sensitive: self.case_sensitive,
            backends: self.backends,
            input_codec: self.input_codec.unwrap_or_else(|| Arc::new(Codec::clone)),
            identifier_transform: self
                .identifier_transform
                .unwrap_or_else(|| {
                    Arc::new(|identifier: SqlFragment, _: &OperatorContext<'_>| identifier)
                }),
            value_transform: self
                .value_transform
                .unwrap_or_else(|| {
                    Arc::new(|value: &JsonValue, ctx: &OperatorContext<'_>| {
                        bind_operand(value, ctx.input)
                    })
                }),
            template,
            name: self.name,
        })
    }
}
