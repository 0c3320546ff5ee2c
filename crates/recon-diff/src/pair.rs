//! Old/new pairs and three-way partitions
//!
//! Both differs emit [`Pair`]s sorted into a [`Partition`].

use crate::error::DiffInconsistency;
use recon_schema::{FieldDescriptor, TypeDescriptor};
use std::collections::HashSet;

/// Anything a differ can match by name
pub trait Named {
    /// Matching key
    fn name(&self) -> &str;
}

impl Named for TypeDescriptor {
    fn name(&self) -> &str {
        TypeDescriptor::name(self)
    }
}

impl Named for FieldDescriptor {
    fn name(&self) -> &str {
        FieldDescriptor::name(self)
    }
}

/// Optional old value and optional new value of the same kind
///
/// # Invariants
/// - mutual pairs carry both sides, under the same name
/// - added pairs carry only `new`, removed pairs only `old`
#[derive(Debug, PartialEq)]
pub struct Pair<'a, T> {
    name: &'a str,
    old: Option<&'a T>,
    new: Option<&'a T>,
}

impl<T> Clone for Pair<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Pair<'_, T> {}

impl<'a, T: Named> Pair<'a, T> {
    /// Present in both generations (named after `new`)
    #[inline]
    #[must_use]
    pub fn mutual(old: &'a T, new: &'a T) -> Self {
        Self {
            name: new.name(),
            old: Some(old),
            new: Some(new),
        }
    }

    /// Present only in the new generation
    #[inline]
    #[must_use]
    pub fn added(new: &'a T) -> Self {
        Self {
            name: new.name(),
            old: None,
            new: Some(new),
        }
    }

    /// Present only in the old generation
    #[inline]
    #[must_use]
    pub fn removed(old: &'a T) -> Self {
        Self {
            name: old.name(),
            old: Some(old),
            new: None,
        }
    }
}

impl<'a, T> Pair<'a, T> {
    /// Matching name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Old side
    #[inline]
    #[must_use]
    pub fn old(&self) -> Option<&'a T> {
        self.old
    }

    /// New side
    #[inline]
    #[must_use]
    pub fn new(&self) -> Option<&'a T> {
        self.new
    }

    /// Both sides, if this is a mutual pair
    #[inline]
    #[must_use]
    pub fn both(&self) -> Option<(&'a T, &'a T)> {
        self.old.zip(self.new)
    }
}

/// Three-way classification produced by a differ
#[derive(Debug, PartialEq)]
pub struct Partition<'a, T> {
    /// Present in both generations
    pub mutual: Vec<Pair<'a, T>>,
    /// Only in the new generation (or, for fields, type changed)
    pub added: Vec<Pair<'a, T>>,
    /// Only in the old generation (or, for fields, type changed)
    pub removed: Vec<Pair<'a, T>>,
}

impl<T> Default for Partition<'_, T> {
    fn default() -> Self {
        Self {
            mutual: Vec::new(),
            added: Vec::new(),
            removed: Vec::new(),
        }
    }
}

impl<T> Clone for Partition<'_, T> {
    fn clone(&self) -> Self {
        Self {
            mutual: self.mutual.clone(),
            added: self.added.clone(),
            removed: self.removed.clone(),
        }
    }
}

impl<'a, T> Partition<'a, T> {
    /// Check if nothing was classified
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mutual.is_empty() && self.added.is_empty() && self.removed.is_empty()
    }

    /// Names in the mutual partition
    pub fn mutual_names(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.mutual.iter().map(Pair::name)
    }

    /// Names in the added partition
    pub fn added_names(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.added.iter().map(Pair::name)
    }

    /// Names in the removed partition
    pub fn removed_names(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.removed.iter().map(Pair::name)
    }

    /// Verify pair shapes and partition disjointness
    ///
    /// `mutual` must be disjoint from `added` and `removed`. When
    /// `allow_added_removed_overlap` is false, `added` and `removed` must be
    /// disjoint too (type sets); fields may overlap there on a type change.
    pub(crate) fn verify(
        &self,
        subject: &str,
        allow_added_removed_overlap: bool,
    ) -> Result<(), DiffInconsistency> {
        let shape_error = |name: &str, reason| DiffInconsistency::new(subject, name, reason);

        for pair in &self.mutual {
            if pair.both().is_none() {
                return Err(shape_error(pair.name, "mutual pair missing a side"));
            }
        }
        for pair in &self.added {
            if pair.old.is_some() || pair.new.is_none() {
                return Err(shape_error(pair.name, "added pair must carry only the new side"));
            }
        }
        for pair in &self.removed {
            if pair.new.is_some() || pair.old.is_none() {
                return Err(shape_error(pair.name, "removed pair must carry only the old side"));
            }
        }

        let mutual: HashSet<&str> = self.mutual_names().collect();
        if let Some(name) = self.added_names().find(|n| mutual.contains(n)) {
            return Err(shape_error(name, "classified as both mutual and added"));
        }
        if let Some(name) = self.removed_names().find(|n| mutual.contains(n)) {
            return Err(shape_error(name, "classified as both mutual and removed"));
        }
        if !allow_added_removed_overlap {
            let added: HashSet<&str> = self.added_names().collect();
            if let Some(name) = self.removed_names().find(|n| added.contains(n)) {
                return Err(shape_error(name, "classified as both added and removed"));
            }
        }
        Ok(())
    }
}
