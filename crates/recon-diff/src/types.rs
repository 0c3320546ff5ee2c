//! Type-set differ
//!
//! Partitions two snapshots' record types by exact, case-sensitive name.
//! No structural comparison happens here: a type present on both sides is
//! mutual even if every one of its fields changed.

use crate::error::DiffInconsistency;
use crate::pair::{Pair, Partition};
use recon_schema::{SchemaSnapshot, TypeDescriptor};
use std::collections::HashMap;

/// Type-level partition of two snapshots
pub type TypeDiff<'a> = Partition<'a, TypeDescriptor>;

/// Compare two snapshots by type name
///
/// - `mutual`: names present in both, in `new` order
/// - `added`: names only in `new`, in `new` order
/// - `removed`: names only in `old`, in `old` order
#[must_use]
pub fn diff_types<'a>(old: &'a SchemaSnapshot, new: &'a SchemaSnapshot) -> TypeDiff<'a> {
    let old_by_name: HashMap<&str, &TypeDescriptor> =
        old.types().iter().map(|t| (t.name(), t)).collect();
    let new_by_name: HashMap<&str, &TypeDescriptor> =
        new.types().iter().map(|t| (t.name(), t)).collect();

    let mut diff = TypeDiff::default();

    for to in new.types() {
        match old_by_name.get(to.name()) {
            Some(&from) => diff.mutual.push(Pair::mutual(from, to)),
            None => diff.added.push(Pair::added(to)),
        }
    }

    diff.removed.extend(
        old.types()
            .iter()
            .filter(|from| !new_by_name.contains_key(from.name()))
            .map(Pair::removed),
    );

    diff
}

impl TypeDiff<'_> {
    /// Verify the three partitions are pairwise disjoint
    ///
    /// # Errors
    /// `DiffInconsistency` naming the first offending type
    pub fn check_consistency(&self) -> Result<(), DiffInconsistency> {
        self.verify("types", false)
    }
}
