//! Semantic field types
//!
//! Provides [`FieldType`], the type identifier carried by every field. Two
//! fields are type-equivalent when their types are structurally equal; the
//! textual spelling used to declare them does not matter.

use crate::error::SchemaError;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Semantic type of a stored field
///
/// # Text form
/// - primitives: `bool`, `int` / `int32`, `long` / `int64`, `double`,
///   `decimal`, `string`, `binary`, `datetime`, `objectid`
/// - arrays: `T[]` or `array<T>`
/// - nullable: `T?`
/// - any other identifier names an embedded document type
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldType {
    /// Boolean
    Bool,
    /// 32-bit integer
    Int32,
    /// 64-bit integer
    Int64,
    /// 64-bit float
    Double,
    /// 128-bit decimal
    Decimal,
    /// UTF-8 string
    String,
    /// Raw bytes
    Binary,
    /// Timestamp
    DateTime,
    /// Store-generated object identifier
    ObjectId,
    /// Homogeneous array
    Array(Box<FieldType>),
    /// Value that may be null
    Nullable(Box<FieldType>),
    /// Embedded document of a named record type
    Document(String),
}

impl FieldType {
    /// Array of `inner`
    #[inline]
    #[must_use]
    pub fn array(inner: FieldType) -> Self {
        Self::Array(Box::new(inner))
    }

    /// Nullable `inner` (idempotent)
    #[inline]
    #[must_use]
    pub fn nullable(inner: FieldType) -> Self {
        match inner {
            Self::Nullable(_) => inner,
            other => Self::Nullable(Box::new(other)),
        }
    }

    /// Structural type equivalence
    ///
    /// Used by the field differ to decide whether a same-named field kept its
    /// type across snapshots.
    #[inline]
    #[must_use]
    pub fn is_equivalent_to(&self, other: &Self) -> bool {
        self == other
    }

    /// Primitive aliases are lowercase; capitalized names are record types
    fn primitive(name: &str) -> Option<Self> {
        let ty = match name {
            "bool" | "boolean" => Self::Bool,
            "int" | "int32" | "i32" => Self::Int32,
            "long" | "int64" | "i64" => Self::Int64,
            "double" | "float" | "f64" => Self::Double,
            "decimal" => Self::Decimal,
            "string" | "str" => Self::String,
            "binary" | "bytes" => Self::Binary,
            "datetime" | "date" => Self::DateTime,
            "objectid" | "oid" => Self::ObjectId,
            _ => return None,
        };
        Some(ty)
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::Int32 => f.write_str("int32"),
            Self::Int64 => f.write_str("int64"),
            Self::Double => f.write_str("double"),
            Self::Decimal => f.write_str("decimal"),
            Self::String => f.write_str("string"),
            Self::Binary => f.write_str("binary"),
            Self::DateTime => f.write_str("datetime"),
            Self::ObjectId => f.write_str("objectid"),
            Self::Array(inner) => write!(f, "{inner}[]"),
            Self::Nullable(inner) => write!(f, "{inner}?"),
            Self::Document(name) => f.write_str(name),
        }
    }
}

impl FromStr for FieldType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() {
            return Err(SchemaError::invalid_type(s, "empty type"));
        }

        if let Some(inner) = text.strip_suffix('?') {
            return Ok(Self::nullable(inner.parse()?));
        }
        if let Some(inner) = text.strip_suffix("[]") {
            return Ok(Self::array(inner.parse()?));
        }
        if let Some(rest) = text.strip_prefix("array<") {
            let inner = rest
                .strip_suffix('>')
                .ok_or_else(|| SchemaError::invalid_type(s, "unclosed array<...>"))?;
            return Ok(Self::array(inner.parse()?));
        }

        if let Some(ty) = Self::primitive(text) {
            return Ok(ty);
        }

        let mut chars = text.chars();
        let valid_start = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.') {
            return Err(SchemaError::invalid_type(s, "not a type identifier"));
        }
        Ok(Self::Document(text.to_string()))
    }
}

impl TryFrom<String> for FieldType {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        value.to_string()
    }
}
