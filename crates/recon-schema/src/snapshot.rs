//! Schema snapshots
//!
//! A [`SchemaSnapshot`] is one labeled generation of the data model. A
//! migration run compares exactly one `Old` snapshot against exactly one
//! `New` snapshot; [`select_snapshots`] enforces that at the boundary.

use crate::descriptor::TypeDescriptor;
use crate::error::SchemaError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};

/// Role a snapshot plays in a migration run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotRole {
    /// Schema currently reflected by the store
    Old,
    /// Target schema
    New,
}

impl Display for SnapshotRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Old => f.write_str("old"),
            Self::New => f.write_str("new"),
        }
    }
}

/// One immutable generation of the data model
///
/// Type order carries no meaning for correctness; it is preserved so that
/// diffs and plans come out in a deterministic order.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaSnapshot {
    role: SnapshotRole,
    label: Option<String>,
    types: Vec<TypeDescriptor>,
}

impl SchemaSnapshot {
    /// Create snapshot
    ///
    /// # Errors
    /// `SchemaError::DuplicateType` if two types share a name
    pub fn new(
        role: SnapshotRole,
        types: impl IntoIterator<Item = TypeDescriptor>,
    ) -> Result<Self, SchemaError> {
        let types: Vec<TypeDescriptor> = types.into_iter().collect();
        let mut seen = HashSet::with_capacity(types.len());
        for ty in &types {
            if !seen.insert(ty.name()) {
                return Err(SchemaError::DuplicateType(ty.name().to_string()));
            }
        }

        Ok(Self {
            role,
            label: None,
            types,
        })
    }

    /// Empty snapshot
    #[inline]
    #[must_use]
    pub fn empty(role: SnapshotRole) -> Self {
        Self {
            role,
            label: None,
            types: Vec::new(),
        }
    }

    /// Attach a revision label
    #[inline]
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Snapshot role
    #[inline]
    #[must_use]
    pub fn role(&self) -> SnapshotRole {
        self.role
    }

    /// Revision label
    #[inline]
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Types in declaration order
    #[inline]
    #[must_use]
    pub fn types(&self) -> &[TypeDescriptor] {
        &self.types
    }

    /// Look up type by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.iter().find(|t| t.name() == name)
    }

    /// Check if snapshot declares a type
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Type names in declaration order
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(TypeDescriptor::name)
    }

    /// Number of types
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if snapshot declares no types
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// The old/new snapshot pair of one migration run
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotPair {
    /// Schema the store currently follows
    pub old: SchemaSnapshot,
    /// Target schema
    pub new: SchemaSnapshot,
}

/// Pick the single `Old` and single `New` snapshot from a collection
///
/// # Errors
/// `SchemaError::RoleCount` if zero or more than one snapshot plays either role
pub fn select_snapshots(
    snapshots: impl IntoIterator<Item = SchemaSnapshot>,
) -> Result<SnapshotPair, SchemaError> {
    let (old, new): (Vec<_>, Vec<_>) = snapshots
        .into_iter()
        .partition(|s| s.role() == SnapshotRole::Old);

    let old = exactly_one(old, SnapshotRole::Old)?;
    let new = exactly_one(new, SnapshotRole::New)?;

    tracing::debug!(
        old_label = old.label().unwrap_or("-"),
        new_label = new.label().unwrap_or("-"),
        old_types = old.len(),
        new_types = new.len(),
        "selected snapshots"
    );

    Ok(SnapshotPair { old, new })
}

fn exactly_one(
    mut snapshots: Vec<SchemaSnapshot>,
    role: SnapshotRole,
) -> Result<SchemaSnapshot, SchemaError> {
    match snapshots.len() {
        1 => Ok(snapshots.remove(0)),
        found => Err(SchemaError::RoleCount { role, found }),
    }
}
