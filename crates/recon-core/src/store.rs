//! Document store capability
//!
//! The core never talks to a concrete driver. It issues every mutation
//! through [`DocumentStore`], which the surrounding shell implements for its
//! store and hands to the [`Reconciler`](crate::Reconciler). Implementations
//! must be safe to share across concurrent operations.

use crate::error::StoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Index key direction
///
/// The planner only ever emits `Ascending`; descending and compound indexes
/// are not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexDirection {
    /// Ascending single-field index
    #[default]
    Ascending,
    /// Descending single-field index
    Descending,
}

impl IndexDirection {
    /// Key value used in index specifications (`1` / `-1`)
    #[inline]
    #[must_use]
    pub fn key(self) -> i32 {
        match self {
            Self::Ascending => 1,
            Self::Descending => -1,
        }
    }
}

impl Display for IndexDirection {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => f.write_str("asc"),
            Self::Descending => f.write_str("desc"),
        }
    }
}

/// Name of the single-field index created for `field`
///
/// Mirrors the store's default naming (`<field>_<key>`), so a drop always
/// targets exactly what a create produced without an index-name registry.
#[inline]
#[must_use]
pub fn index_name(field: &str, direction: IndexDirection) -> String {
    format!("{field}_{}", direction.key())
}

/// Mutation primitives the reconciler needs from a document store
///
/// Every primitive must be idempotent: creating an index that already exists
/// in the same shape, dropping a missing index, unsetting an absent field and
/// deleting from an empty collection all succeed.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Store name for logging
    fn name(&self) -> &str {
        "store"
    }

    /// Remove `field` from every document in `collection`
    async fn unset_field(&self, collection: &str, field: &str) -> Result<(), StoreError>;

    /// Create a single-field index on `field`
    async fn create_index(
        &self,
        collection: &str,
        field: &str,
        direction: IndexDirection,
    ) -> Result<(), StoreError>;

    /// Drop the ascending single-field index on `field`
    async fn drop_index(&self, collection: &str, field: &str) -> Result<(), StoreError>;

    /// Delete every document in `collection`, returning how many were removed
    async fn delete_all_documents(&self, collection: &str) -> Result<u64, StoreError>;

    /// Drop every index on `collection`
    async fn drop_all_indexes(&self, collection: &str) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: DocumentStore + ?Sized> DocumentStore for Arc<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn unset_field(&self, collection: &str, field: &str) -> Result<(), StoreError> {
        (**self).unset_field(collection, field).await
    }

    async fn create_index(
        &self,
        collection: &str,
        field: &str,
        direction: IndexDirection,
    ) -> Result<(), StoreError> {
        (**self).create_index(collection, field, direction).await
    }

    async fn drop_index(&self, collection: &str, field: &str) -> Result<(), StoreError> {
        (**self).drop_index(collection, field).await
    }

    async fn delete_all_documents(&self, collection: &str) -> Result<u64, StoreError> {
        (**self).delete_all_documents(collection).await
    }

    async fn drop_all_indexes(&self, collection: &str) -> Result<(), StoreError> {
        (**self).drop_all_indexes(collection).await
    }
}

#[async_trait]
impl<S: DocumentStore + ?Sized> DocumentStore for &S {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn unset_field(&self, collection: &str, field: &str) -> Result<(), StoreError> {
        (**self).unset_field(collection, field).await
    }

    async fn create_index(
        &self,
        collection: &str,
        field: &str,
        direction: IndexDirection,
    ) -> Result<(), StoreError> {
        (**self).create_index(collection, field, direction).await
    }

    async fn drop_index(&self, collection: &str, field: &str) -> Result<(), StoreError> {
        (**self).drop_index(collection, field).await
    }

    async fn delete_all_documents(&self, collection: &str) -> Result<u64, StoreError> {
        (**self).delete_all_documents(collection).await
    }

    async fn drop_all_indexes(&self, collection: &str) -> Result<(), StoreError> {
        (**self).drop_all_indexes(collection).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_names() {
        assert_eq!(index_name("level", IndexDirection::Ascending), "level_1");
        assert_eq!(index_name("level", IndexDirection::Descending), "level_-1");
    }

    #[test]
    fn direction_defaults_to_ascending() {
        assert_eq!(IndexDirection::default(), IndexDirection::Ascending);
        assert_eq!(IndexDirection::Ascending.to_string(), "asc");
    }
}
