//! Field differ
//!
//! Matches fields by name AND type. A field whose name survives but whose
//! type changed is reported in both `added` (new type) and `removed` (old
//! type), never in `mutual`: the old-typed values must be unset and the
//! new-typed field indexed independently. Matching by name alone would push
//! type changes through the mutual path and under-migrate indexes.

use crate::error::DiffInconsistency;
use crate::pair::{Pair, Partition};
use recon_schema::{FieldDescriptor, TypeDescriptor};
use std::collections::HashMap;

/// Field-level partition of one mutual type pair
pub type FieldDiff<'a> = Partition<'a, FieldDescriptor>;

/// Compare the field lists of two generations of one record type
///
/// - `mutual`: same name, equivalent type (`new` order)
/// - `added`: name absent from `old`, or type changed (`new` order)
/// - `removed`: name absent from `new`, or type changed (`old` order)
#[must_use]
pub fn diff_fields<'a>(old: &'a TypeDescriptor, new: &'a TypeDescriptor) -> FieldDiff<'a> {
    let old_by_name = index_by_name(old);
    let new_by_name = index_by_name(new);

    let mut diff = FieldDiff::default();

    for to in new.fields() {
        match old_by_name.get(to.name()) {
            Some(&from) if same_type(from, to) => diff.mutual.push(Pair::mutual(from, to)),
            _ => diff.added.push(Pair::added(to)),
        }
    }

    for from in old.fields() {
        let kept = new_by_name
            .get(from.name())
            .is_some_and(|&to| same_type(from, to));
        if !kept {
            diff.removed.push(Pair::removed(from));
        }
    }

    diff
}

fn index_by_name(ty: &TypeDescriptor) -> HashMap<&str, &FieldDescriptor> {
    ty.fields().iter().map(|f| (f.name(), f)).collect()
}

#[inline]
fn same_type(a: &FieldDescriptor, b: &FieldDescriptor) -> bool {
    a.field_type().is_equivalent_to(b.field_type())
}

impl<'a> FieldDiff<'a> {
    /// Verify no field is both mutual and added/removed
    ///
    /// A field may sit in both `added` and `removed` (type change).
    ///
    /// # Errors
    /// `DiffInconsistency` naming the first offending field
    pub fn check_consistency(&self, type_name: &str) -> Result<(), DiffInconsistency> {
        self.verify(&format!("fields of {type_name}"), true)
    }

    /// Names present in both `added` and `removed`
    pub fn type_changes(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.added_names()
            .filter(move |name| self.removed_names().any(|r| r == *name))
    }
}
