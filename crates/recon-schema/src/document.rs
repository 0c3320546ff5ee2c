//! Declarative snapshot documents
//!
//! Snapshots can be described in YAML or JSON:
//!
//! ```yaml
//! snapshots:
//!   - role: old
//!     label: v1
//!     types:
//!       - name: Player
//!         fields:
//!           - { name: name, type: string, index: true }
//!           - { name: gold, type: long, default: 0 }
//! ```
//!
//! Converting a document into [`SchemaSnapshot`]s runs every construction
//! check (duplicate names, empty names, field type syntax).

use crate::descriptor::{FieldDescriptor, TypeDescriptor};
use crate::error::SchemaError;
use crate::field_type::FieldType;
use crate::snapshot::{select_snapshots, SchemaSnapshot, SnapshotPair, SnapshotRole};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level snapshot document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotDocument {
    /// Declared snapshots (normally one old and one new)
    pub snapshots: Vec<SnapshotSpec>,
}

/// One snapshot entry of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotSpec {
    /// Role of this snapshot
    pub role: SnapshotRole,
    /// Optional revision label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Record types
    #[serde(default)]
    pub types: Vec<TypeSpec>,
}

/// One record type entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeSpec {
    /// Type / collection name
    pub name: String,
    /// Fields in declaration order
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

/// One field entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    /// Field name
    pub name: String,
    /// Semantic type in text form
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Index annotation
    #[serde(default)]
    pub index: bool,
    /// Default for newly inserted documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

impl SnapshotDocument {
    /// Parse YAML document
    ///
    /// # Errors
    /// `SchemaError::Yaml` on malformed input
    pub fn from_yaml_str(input: &str) -> Result<Self, SchemaError> {
        Ok(serde_yaml::from_str(input)?)
    }

    /// Parse JSON document
    ///
    /// # Errors
    /// `SchemaError::Json` on malformed input
    pub fn from_json_str(input: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Read document from disk, choosing the format by extension
    ///
    /// # Errors
    /// - `SchemaError::Io` if the file cannot be read
    /// - `SchemaError::UnsupportedFormat` for anything but `.yaml`, `.yml`, `.json`
    /// - decode errors from the chosen format
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let parse: fn(&str) -> Result<Self, SchemaError> = match extension.as_deref() {
            Some("yaml" | "yml") => Self::from_yaml_str,
            Some("json") => Self::from_json_str,
            _ => return Err(SchemaError::UnsupportedFormat(path.to_path_buf())),
        };

        let input =
            std::fs::read_to_string(path).map_err(|e| SchemaError::io_error(path, e))?;
        tracing::debug!(path = %path.display(), "loading snapshot document");
        parse(&input)
    }

    /// Build validated snapshots in document order
    ///
    /// # Errors
    /// Any construction error of the contained types and fields
    pub fn into_snapshots(self) -> Result<Vec<SchemaSnapshot>, SchemaError> {
        self.snapshots
            .into_iter()
            .map(SnapshotSpec::into_snapshot)
            .collect()
    }

    /// Build snapshots and select the old/new pair
    ///
    /// # Errors
    /// Construction errors, or `SchemaError::RoleCount`
    pub fn into_pair(self) -> Result<SnapshotPair, SchemaError> {
        select_snapshots(self.into_snapshots()?)
    }
}

impl SnapshotSpec {
    /// Build validated snapshot
    ///
    /// # Errors
    /// Any construction error of the contained types and fields
    pub fn into_snapshot(self) -> Result<SchemaSnapshot, SchemaError> {
        let types = self
            .types
            .into_iter()
            .map(TypeSpec::into_descriptor)
            .collect::<Result<Vec<_>, _>>()?;

        let snapshot = SchemaSnapshot::new(self.role, types)?;
        Ok(match self.label {
            Some(label) => snapshot.with_label(label),
            None => snapshot,
        })
    }
}

impl TypeSpec {
    /// Build validated type descriptor
    ///
    /// # Errors
    /// `SchemaError::EmptyName` or `SchemaError::DuplicateField`
    pub fn into_descriptor(self) -> Result<TypeDescriptor, SchemaError> {
        let fields = self.fields.into_iter().map(|spec| {
            let field = FieldDescriptor::new(spec.name, spec.field_type).with_index(spec.index);
            match spec.default {
                Some(value) => field.with_default(value),
                None => field,
            }
        });
        TypeDescriptor::new(self.name, fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const DOC: &str = r"
snapshots:
  - role: old
    label: v1
    types:
      - name: Player
        fields:
          - { name: name, type: string, index: true }
          - { name: level, type: int }
          - { name: gold, type: long, default: 0 }
  - role: new
    types:
      - name: Player
        fields:
          - { name: name, type: string }
          - { name: level, type: int32, index: true }
";

    #[test]
    fn yaml_document_to_pair() {
        let pair = SnapshotDocument::from_yaml_str(DOC)
            .unwrap()
            .into_pair()
            .unwrap();

        assert_eq!(pair.old.label(), Some("v1"));
        let old_player = pair.old.get("Player").unwrap();
        assert_eq!(old_player.len(), 3);
        assert!(old_player.field("name").unwrap().has_index());
        assert_eq!(
            old_player.field("gold").unwrap().default_value(),
            Some(&serde_json::json!(0))
        );

        let new_player = pair.new.get("Player").unwrap();
        assert!(new_player.field("level").unwrap().has_index());
        assert!(old_player
            .field("level")
            .unwrap()
            .field_type()
            .is_equivalent_to(new_player.field("level").unwrap().field_type()));
    }

    #[test]
    fn json_document() {
        let doc = SnapshotDocument::from_json_str(
            r#"{"snapshots":[{"role":"new","types":[{"name":"Log","fields":[{"name":"id","type":"objectid","index":true}]}]}]}"#,
        )
        .unwrap();

        let snapshots = doc.into_snapshots().unwrap();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].role(), SnapshotRole::New);
    }

    #[test]
    fn bad_field_type_is_rejected() {
        let result = SnapshotDocument::from_yaml_str(
            "snapshots:\n  - role: old\n    types:\n      - name: A\n        fields:\n          - { name: x, type: 'array<int' }\n",
        );
        assert!(matches!(result, Err(SchemaError::Yaml(_))));
    }

    #[test]
    fn duplicate_field_surfaces_on_conversion() {
        let doc = SnapshotDocument::from_yaml_str(
            "snapshots:\n  - role: old\n    types:\n      - name: A\n        fields:\n          - { name: x, type: int }\n          - { name: x, type: string }\n",
        )
        .unwrap();
        assert!(matches!(
            doc.into_snapshots(),
            Err(SchemaError::DuplicateField { .. })
        ));
    }

    #[test]
    fn from_path_picks_format() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        file.write_all(DOC.as_bytes()).unwrap();

        let doc = SnapshotDocument::from_path(file.path()).unwrap();
        assert_eq!(doc.snapshots.len(), 2);
    }

    #[test]
    fn from_path_rejects_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        assert!(matches!(
            SnapshotDocument::from_path(file.path()),
            Err(SchemaError::UnsupportedFormat(_))
        ));
    }
}
