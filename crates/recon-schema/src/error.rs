//! Error types for schema construction and loading
//!
//! Every variant is a configuration problem: it is raised while a snapshot is
//! being built, before any store is touched.

use crate::snapshot::SnapshotRole;
use std::path::PathBuf;

/// Errors raised while building or loading schema snapshots
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Field type text could not be parsed
    #[error("invalid field type '{input}': {reason}")]
    InvalidFieldType { input: String, reason: String },

    /// A type or field was declared without a name
    #[error("{kind} name must not be empty")]
    EmptyName { kind: &'static str },

    /// Two fields of one type share a name
    #[error("type '{type_name}' declares field '{field}' more than once")]
    DuplicateField { type_name: String, field: String },

    /// Two types of one snapshot share a name
    #[error("snapshot declares type '{0}' more than once")]
    DuplicateType(String),

    /// Not exactly one snapshot supplied for a role
    #[error("expected exactly one {role} snapshot, found {found}")]
    RoleCount { role: SnapshotRole, found: usize },

    /// Snapshot document has an unknown file extension
    #[error("unsupported snapshot document format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// IO error reading a snapshot document
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML document could not be decoded
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON document could not be decoded
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SchemaError {
    /// Create invalid field type error
    pub fn invalid_type(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFieldType {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
