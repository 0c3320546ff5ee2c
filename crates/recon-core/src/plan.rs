//! Store operations and change plans
//!
//! A [`ChangePlan`] always holds the three phases in execution order. Each
//! phase is a list of per-collection [`WorkUnit`]s; units of one phase are
//! independent of each other, operations inside a unit are sequential.

use crate::store::{index_name, IndexDirection};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// One abstract, idempotent mutation against the document store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    /// Strip a field from every document of a collection
    UnsetField { collection: String, field: String },
    /// Create a single-field index
    CreateIndex {
        collection: String,
        field: String,
        direction: IndexDirection,
    },
    /// Drop the single-field index on a field
    DropIndex { collection: String, field: String },
    /// Delete every document of a collection
    DeleteAllDocuments { collection: String },
    /// Drop every index of a collection
    DropAllIndexes { collection: String },
}

/// Operation discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// [`Operation::UnsetField`]
    UnsetField,
    /// [`Operation::CreateIndex`]
    CreateIndex,
    /// [`Operation::DropIndex`]
    DropIndex,
    /// [`Operation::DeleteAllDocuments`]
    DeleteAllDocuments,
    /// [`Operation::DropAllIndexes`]
    DropAllIndexes,
}

impl Display for OperationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::UnsetField => "unset_field",
            Self::CreateIndex => "create_index",
            Self::DropIndex => "drop_index",
            Self::DeleteAllDocuments => "delete_all_documents",
            Self::DropAllIndexes => "drop_all_indexes",
        })
    }
}

impl Operation {
    /// Unset `field` in `collection`
    pub fn unset_field(collection: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnsetField {
            collection: collection.into(),
            field: field.into(),
        }
    }

    /// Ascending index on `field` in `collection`
    pub fn create_index(collection: impl Into<String>, field: impl Into<String>) -> Self {
        Self::CreateIndex {
            collection: collection.into(),
            field: field.into(),
            direction: IndexDirection::Ascending,
        }
    }

    /// Drop index on `field` in `collection`
    pub fn drop_index(collection: impl Into<String>, field: impl Into<String>) -> Self {
        Self::DropIndex {
            collection: collection.into(),
            field: field.into(),
        }
    }

    /// Delete all documents of `collection`
    pub fn delete_all_documents(collection: impl Into<String>) -> Self {
        Self::DeleteAllDocuments {
            collection: collection.into(),
        }
    }

    /// Drop all indexes of `collection`
    pub fn drop_all_indexes(collection: impl Into<String>) -> Self {
        Self::DropAllIndexes {
            collection: collection.into(),
        }
    }

    /// Operation discriminant
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::UnsetField { .. } => OperationKind::UnsetField,
            Self::CreateIndex { .. } => OperationKind::CreateIndex,
            Self::DropIndex { .. } => OperationKind::DropIndex,
            Self::DeleteAllDocuments { .. } => OperationKind::DeleteAllDocuments,
            Self::DropAllIndexes { .. } => OperationKind::DropAllIndexes,
        }
    }

    /// Target collection
    #[must_use]
    pub fn collection(&self) -> &str {
        match self {
            Self::UnsetField { collection, .. }
            | Self::CreateIndex { collection, .. }
            | Self::DropIndex { collection, .. }
            | Self::DeleteAllDocuments { collection }
            | Self::DropAllIndexes { collection } => collection,
        }
    }

    /// Target field, for field-level operations
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::UnsetField { field, .. }
            | Self::CreateIndex { field, .. }
            | Self::DropIndex { field, .. } => Some(field),
            Self::DeleteAllDocuments { .. } | Self::DropAllIndexes { .. } => None,
        }
    }

    /// Index direction, for index creation
    #[must_use]
    pub fn direction(&self) -> Option<IndexDirection> {
        match self {
            Self::CreateIndex { direction, .. } => Some(*direction),
            _ => None,
        }
    }

    /// Name of the index this operation creates or drops
    #[must_use]
    pub fn index_name(&self) -> Option<String> {
        match self {
            Self::CreateIndex {
                field, direction, ..
            } => Some(index_name(field, *direction)),
            Self::DropIndex { field, .. } => Some(index_name(field, IndexDirection::Ascending)),
            _ => None,
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsetField { collection, field } => {
                write!(f, "unset_field {collection}.{field}")
            }
            Self::CreateIndex {
                collection,
                field,
                direction,
            } => write!(f, "create_index {collection}.{field} ({direction})"),
            Self::DropIndex { collection, field } => {
                write!(f, "drop_index {collection}.{field}")
            }
            Self::DeleteAllDocuments { collection } => {
                write!(f, "delete_all_documents {collection}")
            }
            Self::DropAllIndexes { collection } => write!(f, "drop_all_indexes {collection}"),
        }
    }
}

/// Reconciliation phase, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Field and index reconciliation on types present in both snapshots
    MutualTypes,
    /// Index creation for brand-new types
    AddedTypes,
    /// Teardown of types that disappeared
    RemovedTypes,
}

impl Phase {
    /// All phases in execution order
    pub const ALL: [Phase; 3] = [Phase::MutualTypes, Phase::AddedTypes, Phase::RemovedTypes];
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MutualTypes => "mutual-types",
            Self::AddedTypes => "added-types",
            Self::RemovedTypes => "removed-types",
        })
    }
}

/// Sequential operations against one collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkUnit {
    collection: String,
    operations: Vec<Operation>,
}

impl WorkUnit {
    /// Create empty unit for `collection`
    #[inline]
    #[must_use]
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            operations: Vec::new(),
        }
    }

    /// Append operation
    #[inline]
    pub fn push(&mut self, operation: Operation) {
        self.operations.push(operation);
    }

    /// Target collection
    #[inline]
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Operations in issue order
    #[inline]
    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Number of operations
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Check if unit has nothing to do
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Work units of one phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhasePlan {
    phase: Phase,
    units: Vec<WorkUnit>,
}

impl PhasePlan {
    /// Create empty phase plan
    #[inline]
    #[must_use]
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            units: Vec::new(),
        }
    }

    /// Phase
    #[inline]
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Units in plan order
    #[inline]
    #[must_use]
    pub fn units(&self) -> &[WorkUnit] {
        &self.units
    }

    /// Operations of all units in plan order
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.units.iter().flat_map(|u| u.operations.iter())
    }

    /// Total operation count
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.iter().map(WorkUnit::len).sum()
    }

    /// Check if phase has nothing to do
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.iter().all(WorkUnit::is_empty)
    }
}

/// Ordered store operations of one migration run
///
/// Constructed fresh per run, consumed once by the executor, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangePlan {
    phases: Vec<PhasePlan>,
}

impl ChangePlan {
    /// Empty plan with all three phases
    #[must_use]
    pub fn new() -> Self {
        Self {
            phases: Phase::ALL.into_iter().map(PhasePlan::new).collect(),
        }
    }

    /// Add a unit to a phase; empty units are dropped
    pub fn push_unit(&mut self, phase: Phase, unit: WorkUnit) {
        if unit.is_empty() {
            return;
        }
        if let Some(plan) = self.phases.iter_mut().find(|p| p.phase == phase) {
            plan.units.push(unit);
        }
    }

    /// Phases in execution order
    #[inline]
    #[must_use]
    pub fn phases(&self) -> &[PhasePlan] {
        &self.phases
    }

    /// Plan of one phase
    #[must_use]
    pub fn phase(&self, phase: Phase) -> Option<&PhasePlan> {
        self.phases.iter().find(|p| p.phase == phase)
    }

    /// All operations in execution order
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.phases.iter().flat_map(PhasePlan::operations)
    }

    /// Total operation count
    #[must_use]
    pub fn len(&self) -> usize {
        self.phases.iter().map(PhasePlan::len).sum()
    }

    /// Check if the run would not touch the store
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phases.iter().all(PhasePlan::is_empty)
    }
}

impl Default for ChangePlan {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_accessors() {
        let op = Operation::create_index("Player", "level");
        assert_eq!(op.kind(), OperationKind::CreateIndex);
        assert_eq!(op.collection(), "Player");
        assert_eq!(op.field(), Some("level"));
        assert_eq!(op.direction(), Some(IndexDirection::Ascending));
        assert_eq!(op.index_name().as_deref(), Some("level_1"));
        assert_eq!(op.to_string(), "create_index Player.level (asc)");

        let op = Operation::delete_all_documents("Jinwoo");
        assert_eq!(op.field(), None);
        assert_eq!(op.index_name(), None);
    }

    #[test]
    fn drop_and_create_target_same_index() {
        let create = Operation::create_index("Player", "name");
        let drop = Operation::drop_index("Player", "name");
        assert_eq!(create.index_name(), drop.index_name());
    }

    #[test]
    fn operation_serializes_tagged() {
        let json = serde_json::to_value(Operation::unset_field("Player", "jinwoo")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "unset_field", "collection": "Player", "field": "jinwoo"})
        );
    }

    #[test]
    fn new_plan_has_three_empty_phases() {
        let plan = ChangePlan::new();
        let phases: Vec<_> = plan.phases().iter().map(PhasePlan::phase).collect();
        assert_eq!(phases, Phase::ALL.to_vec());
        assert!(plan.is_empty());
        assert_eq!(plan.len(), 0);
    }

    #[test]
    fn empty_units_are_dropped() {
        let mut plan = ChangePlan::new();
        plan.push_unit(Phase::AddedTypes, WorkUnit::new("Log"));
        assert!(plan.phase(Phase::AddedTypes).unwrap().units().is_empty());

        let mut unit = WorkUnit::new("Log");
        unit.push(Operation::create_index("Log", "id"));
        plan.push_unit(Phase::AddedTypes, unit);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.operations().count(), 1);
    }
}
