//! Error types for reconciliation
//!
//! Two families:
//! - [`ReconcileError`]: fatal, aborts the run (configuration, invariant breaks)
//! - [`StoreError`]: per-operation store failure, recorded in the run report

use recon_diff::DiffInconsistency;
use recon_schema::SchemaError;
use serde::{Deserialize, Serialize};

/// Fatal reconciliation error
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// Invalid run configuration
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Invalid or ambiguous schema snapshots
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Differ broke its own invariants
    #[error("internal invariant violated: {0}")]
    DiffInconsistency(#[from] DiffInconsistency),
}

impl ReconcileError {
    /// Check if error was raised before any store operation could be issued
    /// because of bad input
    #[inline]
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Schema(_))
    }
}

/// Failure reported by the document store for one operation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreError {
    /// Store unreachable or connection dropped
    #[error("connection error on {collection}: {message}")]
    Connection { collection: String, message: String },

    /// Insufficient privileges
    #[error("permission denied on {collection}: {message}")]
    Permission { collection: String, message: String },

    /// Store rejected the operation (e.g. conflicting index shape)
    #[error("constraint violation on {collection}: {message}")]
    Constraint { collection: String, message: String },

    /// Operation exceeded the adapter's deadline
    #[error("operation on {collection} timed out after {after_ms}ms")]
    Timeout { collection: String, after_ms: u64 },

    /// Anything else
    #[error("store error on {collection}: {message}")]
    Other { collection: String, message: String },
}

impl StoreError {
    /// Create connection error
    pub fn connection(collection: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            collection: collection.into(),
            message: message.into(),
        }
    }

    /// Create permission error
    pub fn permission(collection: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Permission {
            collection: collection.into(),
            message: message.into(),
        }
    }

    /// Create constraint error
    pub fn constraint(collection: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Constraint {
            collection: collection.into(),
            message: message.into(),
        }
    }

    /// Create timeout error
    pub fn timeout(collection: impl Into<String>, after_ms: u64) -> Self {
        Self::Timeout {
            collection: collection.into(),
            after_ms,
        }
    }

    /// Create generic error
    pub fn other(collection: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Other {
            collection: collection.into(),
            message: message.into(),
        }
    }

    /// Collection the failing operation targeted
    #[must_use]
    pub fn collection(&self) -> &str {
        match self {
            Self::Connection { collection, .. }
            | Self::Permission { collection, .. }
            | Self::Constraint { collection, .. }
            | Self::Timeout { collection, .. }
            | Self::Other { collection, .. } => collection,
        }
    }

    /// Check if a re-run is likely to succeed without intervention
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recon_schema::SnapshotRole;

    #[test]
    fn store_error_accessors() {
        let err = StoreError::timeout("Player", 500);
        assert_eq!(err.collection(), "Player");
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "operation on Player timed out after 500ms");

        assert!(!StoreError::permission("Log", "read-only user").is_retryable());
    }

    #[test]
    fn store_error_serializes_with_kind() {
        let json = serde_json::to_value(StoreError::connection("Log", "reset")).unwrap();
        assert_eq!(json["kind"], "connection");
        assert_eq!(json["collection"], "Log");
    }

    #[test]
    fn schema_errors_are_configuration() {
        let err = ReconcileError::from(SchemaError::RoleCount {
            role: SnapshotRole::Old,
            found: 2,
        });
        assert!(err.is_configuration());

        let err = ReconcileError::from(DiffInconsistency::new("types", "Player", "broken"));
        assert!(!err.is_configuration());
    }
}
