//! Record type and field descriptors
//!
//! [`TypeDescriptor`] maps 1:1 to a store collection; [`FieldDescriptor`]
//! is one declared field of it. Both are immutable once built.

use crate::error::SchemaError;
use crate::field_type::FieldType;
use std::collections::HashSet;

/// One declared field of a record type
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    name: String,
    field_type: FieldType,
    indexed: bool,
    default: Option<serde_json::Value>,
}

impl FieldDescriptor {
    /// Create unindexed field without default
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            indexed: false,
            default: None,
        }
    }

    /// Mark field as backed by a store index
    #[inline]
    #[must_use]
    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    /// Set index annotation explicitly
    #[inline]
    #[must_use]
    pub fn with_index(mut self, indexed: bool) -> Self {
        self.indexed = indexed;
        self
    }

    /// Attach a default value for newly inserted documents
    ///
    /// The default is never applied to documents that already exist.
    #[inline]
    #[must_use]
    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Field name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Semantic type
    #[inline]
    #[must_use]
    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    /// Whether the field carries an index annotation
    #[inline]
    #[must_use]
    pub fn has_index(&self) -> bool {
        self.indexed
    }

    /// Whether the field carries a default value annotation
    #[inline]
    #[must_use]
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Default value, if any
    #[inline]
    #[must_use]
    pub fn default_value(&self) -> Option<&serde_json::Value> {
        self.default.as_ref()
    }
}

/// One record type ("model") of a schema snapshot
///
/// # Invariants
/// - `name` is non-empty
/// - field names are non-empty and unique within the type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl TypeDescriptor {
    /// Create type descriptor
    ///
    /// # Errors
    /// - `SchemaError::EmptyName` for an unnamed type or field
    /// - `SchemaError::DuplicateField` if two fields share a name
    pub fn new(
        name: impl Into<String>,
        fields: impl IntoIterator<Item = FieldDescriptor>,
    ) -> Result<Self, SchemaError> {
        let name = name.into();
        if name.is_empty() {
            return Err(SchemaError::EmptyName { kind: "type" });
        }

        let fields: Vec<FieldDescriptor> = fields.into_iter().collect();
        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            if field.name.is_empty() {
                return Err(SchemaError::EmptyName { kind: "field" });
            }
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    type_name: name,
                    field: field.name.clone(),
                });
            }
        }

        Ok(Self { name, fields })
    }

    /// Type name (also the collection name)
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Look up field by name
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields carrying an index annotation
    pub fn indexed_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.indexed)
    }

    /// Number of fields
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if type declares no fields
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_builder() {
        let field = FieldDescriptor::new("gold", FieldType::Int64)
            .indexed()
            .with_default(serde_json::json!(0));

        assert_eq!(field.name(), "gold");
        assert!(field.has_index());
        assert!(field.has_default());
        assert_eq!(field.default_value(), Some(&serde_json::json!(0)));
    }

    #[test]
    fn type_rejects_duplicate_fields() {
        let result = TypeDescriptor::new(
            "Player",
            [
                FieldDescriptor::new("name", FieldType::String),
                FieldDescriptor::new("name", FieldType::Int32),
            ],
        );

        assert!(matches!(
            result,
            Err(SchemaError::DuplicateField { ref type_name, ref field })
                if type_name == "Player" && field == "name"
        ));
    }

    #[test]
    fn type_rejects_empty_names() {
        assert!(matches!(
            TypeDescriptor::new("", []),
            Err(SchemaError::EmptyName { kind: "type" })
        ));
        assert!(matches!(
            TypeDescriptor::new("Player", [FieldDescriptor::new("", FieldType::Bool)]),
            Err(SchemaError::EmptyName { kind: "field" })
        ));
    }

    #[test]
    fn type_lookup() {
        let ty = TypeDescriptor::new(
            "Player",
            [
                FieldDescriptor::new("name", FieldType::String).indexed(),
                FieldDescriptor::new("level", FieldType::Int32),
            ],
        )
        .unwrap();

        assert_eq!(ty.len(), 2);
        assert_eq!(ty.field("level").map(FieldDescriptor::name), Some("level"));
        assert!(ty.field("gold").is_none());

        let indexed: Vec<_> = ty.indexed_fields().map(FieldDescriptor::name).collect();
        assert_eq!(indexed, vec!["name"]);
    }

    #[test]
    fn zero_field_type_is_valid() {
        let ty = TypeDescriptor::new("Marker", []).unwrap();
        assert!(ty.is_empty());
    }
}
