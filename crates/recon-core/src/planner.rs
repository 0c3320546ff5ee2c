//! Reconciliation planner
//!
//! Turns a type-level diff into a three-phase [`ChangePlan`]. Planning is
//! pure: no store access, output fully determined by the input order.

use crate::error::ReconcileError;
use crate::plan::{ChangePlan, Operation, Phase, WorkUnit};
use recon_diff::{diff_fields, diff_types, TypeDiff};
use recon_schema::{SchemaSnapshot, TypeDescriptor};
use tracing::debug;

/// Plan the operations that bring a store shaped like `old` to `new`
///
/// # Errors
/// `ReconcileError::DiffInconsistency` if a partition breaks its invariants
pub fn plan(old: &SchemaSnapshot, new: &SchemaSnapshot) -> Result<ChangePlan, ReconcileError> {
    let diff = diff_types(old, new);
    plan_from_diff(&diff)
}

/// Plan from an already computed type diff
///
/// # Errors
/// `ReconcileError::DiffInconsistency` if a partition breaks its invariants
pub fn plan_from_diff(diff: &TypeDiff<'_>) -> Result<ChangePlan, ReconcileError> {
    diff.check_consistency()?;

    let mut plan = ChangePlan::new();

    for pair in &diff.mutual {
        if let Some((old, new)) = pair.both() {
            plan.push_unit(Phase::MutualTypes, mutual_unit(old, new)?);
        }
    }

    for ty in diff.added.iter().filter_map(|p| p.new()) {
        plan.push_unit(Phase::AddedTypes, added_unit(ty));
    }

    for ty in diff.removed.iter().filter_map(|p| p.old()) {
        plan.push_unit(Phase::RemovedTypes, removed_unit(ty));
    }

    debug!(
        mutual = diff.mutual.len(),
        added = diff.added.len(),
        removed = diff.removed.len(),
        operations = plan.len(),
        "Planned reconciliation"
    );

    Ok(plan)
}

fn mutual_unit(old: &TypeDescriptor, new: &TypeDescriptor) -> Result<WorkUnit, ReconcileError> {
    let collection = new.name();
    let fields = diff_fields(old, new);
    fields.check_consistency(collection)?;

    let mut unit = WorkUnit::new(collection);

    for field in fields.removed.iter().filter_map(|p| p.old()) {
        unit.push(Operation::unset_field(collection, field.name()));
    }

    for (from, to) in fields.mutual.iter().filter_map(|p| p.both()) {
        match (from.has_index(), to.has_index()) {
            (true, false) => unit.push(Operation::drop_index(collection, to.name())),
            (false, true) => unit.push(Operation::create_index(collection, to.name())),
            _ => {}
        }
    }

    for field in fields.added.iter().filter_map(|p| p.new()) {
        if field.has_index() {
            unit.push(Operation::create_index(collection, field.name()));
        }
    }

    Ok(unit)
}

fn added_unit(ty: &TypeDescriptor) -> WorkUnit {
    let mut unit = WorkUnit::new(ty.name());
    for field in ty.indexed_fields() {
        unit.push(Operation::create_index(ty.name(), field.name()));
    }
    unit
}

fn removed_unit(ty: &TypeDescriptor) -> WorkUnit {
    let mut unit = WorkUnit::new(ty.name());
    unit.push(Operation::delete_all_documents(ty.name()));
    unit.push(Operation::drop_all_indexes(ty.name()));
    unit
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use recon_diff::Pair;
    use recon_schema::{FieldDescriptor, FieldType, SnapshotRole};

    fn snapshot(role: SnapshotRole, types: Vec<TypeDescriptor>) -> SchemaSnapshot {
        SchemaSnapshot::new(role, types).unwrap()
    }

    fn ty(name: &str, fields: Vec<FieldDescriptor>) -> TypeDescriptor {
        TypeDescriptor::new(name, fields).unwrap()
    }

    fn ops(plan: &ChangePlan, phase: Phase) -> Vec<Operation> {
        plan.phase(phase).unwrap().operations().cloned().collect()
    }

    #[test]
    fn field_removal_and_index_flip() {
        let old = snapshot(
            SnapshotRole::Old,
            vec![ty(
                "Player",
                vec![
                    FieldDescriptor::new("name", FieldType::String).indexed(),
                    FieldDescriptor::new("level", FieldType::Int32),
                    FieldDescriptor::new("gold", FieldType::Int64),
                    FieldDescriptor::new("jinwoo", FieldType::String),
                ],
            )],
        );
        let new = snapshot(
            SnapshotRole::New,
            vec![ty(
                "Player",
                vec![
                    FieldDescriptor::new("name", FieldType::String),
                    FieldDescriptor::new("level", FieldType::Int32).indexed(),
                    FieldDescriptor::new("gold", FieldType::Int64),
                ],
            )],
        );

        let plan = plan(&old, &new).unwrap();

        assert_eq!(
            ops(&plan, Phase::MutualTypes),
            vec![
                Operation::unset_field("Player", "jinwoo"),
                Operation::drop_index("Player", "name"),
                Operation::create_index("Player", "level"),
            ]
        );
        assert!(plan.phase(Phase::AddedTypes).unwrap().is_empty());
        assert!(plan.phase(Phase::RemovedTypes).unwrap().is_empty());
    }

    #[test]
    fn added_and_removed_types() {
        let old = snapshot(
            SnapshotRole::Old,
            vec![ty(
                "Jinwoo",
                vec![FieldDescriptor::new("note", FieldType::String).indexed()],
            )],
        );
        let new = snapshot(
            SnapshotRole::New,
            vec![ty(
                "Log",
                vec![
                    FieldDescriptor::new("at", FieldType::DateTime).indexed(),
                    FieldDescriptor::new("message", FieldType::String),
                    FieldDescriptor::new("actor", FieldType::ObjectId).indexed(),
                ],
            )],
        );

        let plan = plan(&old, &new).unwrap();

        assert!(plan.phase(Phase::MutualTypes).unwrap().is_empty());
        assert_eq!(
            ops(&plan, Phase::AddedTypes),
            vec![
                Operation::create_index("Log", "at"),
                Operation::create_index("Log", "actor"),
            ]
        );
        assert_eq!(
            ops(&plan, Phase::RemovedTypes),
            vec![
                Operation::delete_all_documents("Jinwoo"),
                Operation::drop_all_indexes("Jinwoo"),
            ]
        );
    }

    #[test]
    fn type_change_unsets_then_indexes() {
        let old = snapshot(
            SnapshotRole::Old,
            vec![ty("Player", vec![FieldDescriptor::new("score", FieldType::Int32)])],
        );
        let new = snapshot(
            SnapshotRole::New,
            vec![ty(
                "Player",
                vec![FieldDescriptor::new("score", FieldType::String).indexed()],
            )],
        );

        let plan = plan(&old, &new).unwrap();

        assert_eq!(
            ops(&plan, Phase::MutualTypes),
            vec![
                Operation::unset_field("Player", "score"),
                Operation::create_index("Player", "score"),
            ]
        );
    }

    #[test]
    fn empty_snapshots_plan_nothing() {
        let plan = plan(
            &SchemaSnapshot::empty(SnapshotRole::Old),
            &SchemaSnapshot::empty(SnapshotRole::New),
        )
        .unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.phases().len(), 3);
    }

    #[test]
    fn zero_field_mutual_type_has_no_unit() {
        let old = snapshot(SnapshotRole::Old, vec![ty("Empty", vec![])]);
        let new = snapshot(SnapshotRole::New, vec![ty("Empty", vec![])]);

        let plan = plan(&old, &new).unwrap();
        assert!(plan.phase(Phase::MutualTypes).unwrap().units().is_empty());
    }

    #[test]
    fn added_type_without_indexes_is_omitted() {
        let old = SchemaSnapshot::empty(SnapshotRole::Old);
        let new = snapshot(
            SnapshotRole::New,
            vec![ty("Log", vec![FieldDescriptor::new("message", FieldType::String)])],
        );

        let plan = plan(&old, &new).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn units_follow_input_order() {
        let names = ["C", "A", "B"];
        let old = snapshot(
            SnapshotRole::Old,
            names.iter().map(|n| ty(n, vec![])).collect(),
        );
        let new = SchemaSnapshot::empty(SnapshotRole::New);

        let plan = plan(&old, &new).unwrap();
        let collections: Vec<_> = plan
            .phase(Phase::RemovedTypes)
            .unwrap()
            .units()
            .iter()
            .map(WorkUnit::collection)
            .collect();
        assert_eq!(collections, names.to_vec());
    }

    #[test]
    fn inconsistent_diff_is_fatal() {
        let old = snapshot(SnapshotRole::Old, vec![ty("Player", vec![])]);
        let new = snapshot(SnapshotRole::New, vec![ty("Player", vec![])]);

        let mut diff = diff_types(&old, &new);
        diff.removed.push(Pair::removed(&old.types()[0]));

        let err = plan_from_diff(&diff).unwrap_err();
        assert!(matches!(err, ReconcileError::DiffInconsistency(_)));
    }
}
