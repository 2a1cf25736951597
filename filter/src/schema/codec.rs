//! Physical type descriptions
//!
//! A codec describes how a column's value is stored. Operator applicability
//! is decided from the codec alone, so every wrapper (domain, array, range)
//! stays visible until something explicitly unwraps it.

use std::fmt;

/// Scalar types compared as text
pub const TEXT_TYPES: &[&str] = &["text", "varchar", "bpchar", "char", "name", "citext"];

/// Scalar types that already compare case-insensitively
pub const CASE_INSENSITIVE_TYPES: &[&str] = &["citext"];

/// Integer scalar types bound from JSON integers
pub const INTEGER_TYPES: &[&str] = &["int2", "int4", "int8", "smallint", "integer", "bigint"];

/// Non-integer numeric scalar types
pub const DECIMAL_TYPES: &[&str] = &["float4", "float8", "numeric", "real", "double precision"];

/// Physical type of a column, attribute or operator operand
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Codec {
    Scalar(String),
    Enum { name: String, values: Vec<String> },
    Array(Box<Codec>),
    Range { name: String, of: Box<Codec> },
    Domain { name: String, base: Box<Codec> },
    /// Record type, resolved by name through the schema
    Composite(String),
}

impl Codec {
    pub fn scalar(name: impl Into<String>) -> Self {
        Self::Scalar(name.into())
    }

    pub fn array_of(inner: Codec) -> Self {
        Self::Array(Box::new(inner))
    }

    pub fn range_of(name: impl Into<String>, of: Codec) -> Self {
        Self::Range {
            name: name.into(),
            of: Box::new(of),
        }
    }

    pub fn domain(name: impl Into<String>, base: Codec) -> Self {
        Self::Domain {
            name: name.into(),
            base: Box::new(base),
        }
    }

    pub fn enumeration<S: Into<String>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::Enum {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn composite(name: impl Into<String>) -> Self {
        Self::Composite(name.into())
    }

    /// Strip domains, arrays and ranges down to a scalar, enum or composite
    pub fn innermost(&self) -> &Codec {
        match self {
            Self::Array(inner) => inner.innermost(),
            Self::Range { of, .. } => of.innermost(),
            Self::Domain { base, .. } => base.innermost(),
            other => other,
        }
    }

    /// Strip domains only
    pub fn without_domains(&self) -> &Codec {
        match self {
            Self::Domain { base, .. } => base.without_domains(),
            other => other,
        }
    }

    /// Element type of an array or range
    pub fn element(&self) -> Option<&Codec> {
        match self.without_domains() {
            Self::Array(inner) => Some(inner),
            Self::Range { of, .. } => Some(of),
            _ => None,
        }
    }

    /// SQL type name, `inner[]` for arrays
    pub fn name(&self) -> String {
        match self {
            Self::Scalar(name)
            | Self::Enum { name, .. }
            | Self::Range { name, .. }
            | Self::Domain { name, .. }
            | Self::Composite(name) => name.clone(),
            Self::Array(inner) => format!("{}[]", inner.name()),
        }
    }

    /// Name of the innermost type, used for field type allow-lists
    pub fn underlying_name(&self) -> String {
        self.innermost().name()
    }

    pub fn is_array(&self) -> bool {
        matches!(self.without_domains(), Self::Array(_))
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Composite(_))
    }

    /// Whether a scalar (through domains) is one of the text types
    pub fn is_text(&self) -> bool {
        matches!(self.without_domains(), Self::Scalar(name) if TEXT_TYPES.contains(&name.as_str()))
    }

    /// Whether comparisons on this type already ignore case
    pub fn is_case_insensitive(&self) -> bool {
        matches!(
            self.without_domains(),
            Self::Scalar(name) if CASE_INSENSITIVE_TYPES.contains(&name.as_str())
        )
    }

    /// Whether `type_name` names this codec or any type it wraps
    pub fn matches_type_name(&self, type_name: &str) -> bool {
        if self.name() == type_name {
            return true;
        }
        match self {
            Self::Domain { base, .. } => base.matches_type_name(type_name),
            _ => false,
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_innermost_strips_wrappers() {
        let codec = Codec::domain(
            "tags",
            Codec::array_of(Codec::domain("tag", Codec::scalar("citext"))),
        );
        assert_eq!(codec.innermost(), &Codec::scalar("citext"));
        assert_eq!(codec.underlying_name(), "citext");
    }

    #[test]
    fn test_innermost_keeps_enum_and_composite() {
        let status = Codec::enumeration("status", ["a", "b"]);
        assert_eq!(Codec::array_of(status.clone()).innermost(), &status);
        let address = Codec::composite("address");
        assert_eq!(address.innermost(), &address);
    }

    #[test]
    fn test_names() {
        assert_eq!(Codec::array_of(Codec::scalar("int4")).name(), "int4[]");
        assert_eq!(
            Codec::range_of("int4range", Codec::scalar("int4")).name(),
            "int4range"
        );
    }

    #[test]
    fn test_case_insensitivity_through_domain() {
        let email = Codec::domain("email", Codec::scalar("citext"));
        assert!(email.is_case_insensitive());
        assert!(email.is_text());
        assert!(!Codec::scalar("text").is_case_insensitive());
        assert!(!Codec::array_of(Codec::scalar("citext")).is_case_insensitive());
    }

    #[test]
    fn test_element() {
        let range = Codec::range_of("tstzrange", Codec::scalar("timestamptz"));
        assert_eq!(range.element(), Some(&Codec::scalar("timestamptz")));
        assert_eq!(Codec::scalar("int4").element(), None);
    }

    #[test]
    fn test_matches_type_name_through_domain() {
        let email = Codec::domain("email", Codec::scalar("citext"));
        assert!(email.matches_type_name("email"));
        assert!(email.matches_type_name("citext"));
        assert!(!email.matches_type_name("text"));
    }
}
