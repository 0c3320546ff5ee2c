//! End-to-end migrations against the in-memory store

use pretty_assertions::assert_eq;
use recon_core::{
    plan, Operation, Phase, PhaseStatus, ReconcileConfig, ReconcileError, Reconciler,
};
use recon_schema::{SchemaSnapshot, SnapshotRole};
use recon_test_utils::{
    field_removal_and_index_flip, field_type_change, type_added_and_removed, types_replaced,
    MemoryStore,
};

fn reconciler(store: MemoryStore) -> Reconciler<MemoryStore> {
    Reconciler::new(store, ReconcileConfig::default()).unwrap()
}

#[tokio::test]
async fn test_field_removal_and_index_flip() {
    let pair = field_removal_and_index_flip();
    let store = MemoryStore::new();
    store.seed(&pair.old, 3);
    assert_eq!(store.indexes("Player"), vec!["name_1"]);

    let reconciler = reconciler(store);
    let report = reconciler.run(&pair.old, &pair.new).await.unwrap();

    assert!(report.is_success());
    assert_eq!(
        reconciler.store().calls(),
        vec![
            Operation::unset_field("Player", "jinwoo"),
            Operation::drop_index("Player", "name"),
            Operation::create_index("Player", "level"),
        ]
    );
    assert_eq!(reconciler.store().indexes("Player"), vec!["level_1"]);
    for doc in reconciler.store().documents("Player") {
        assert!(!doc.contains_key("jinwoo"));
        assert!(doc.contains_key("gold"));
    }
}

#[tokio::test]
async fn test_type_added_and_removed() {
    let pair = type_added_and_removed();
    let store = MemoryStore::new();
    store.seed(&pair.old, 2);

    let reconciler = reconciler(store);
    let report = reconciler.run(&pair.old, &pair.new).await.unwrap();

    assert!(report.is_success());
    assert!(report.phase(Phase::MutualTypes).unwrap().outcomes.is_empty());

    let store = reconciler.store();
    assert_eq!(store.indexes("Log"), vec!["at_1"]);
    assert!(store.documents("Jinwoo").is_empty());
    assert!(store.indexes("Jinwoo").is_empty());
    assert_eq!(store.documents("Player").len(), 2);
    assert_eq!(store.indexes("Player"), vec!["name_1"]);

    let deleted = report
        .outcomes()
        .find(|o| matches!(o.operation, Operation::DeleteAllDocuments { .. }))
        .unwrap();
    assert_eq!(
        deleted.status,
        recon_core::OutcomeStatus::Succeeded { affected: Some(2) }
    );
}

#[tokio::test]
async fn test_all_types_replaced() {
    let pair = types_replaced();
    let store = MemoryStore::new();
    store.seed(&pair.old, 2);

    let reconciler = reconciler(store);
    let report = reconciler.run(&pair.old, &pair.new).await.unwrap();

    assert!(report.is_success());
    assert!(report.plan.phase(Phase::MutualTypes).unwrap().is_empty());
    assert_eq!(
        reconciler.store().calls(),
        vec![
            Operation::create_index("Player", "name"),
            Operation::create_index("Log", "id"),
            Operation::delete_all_documents("Jinwoo"),
            Operation::drop_all_indexes("Jinwoo"),
        ]
    );

    let store = reconciler.store();
    assert_eq!(store.indexes("Player"), vec!["name_1"]);
    assert_eq!(store.indexes("Log"), vec!["id_1"]);
    assert!(store.documents("Jinwoo").is_empty());
    assert!(store.indexes("Jinwoo").is_empty());

    let again = reconciler.run(&pair.old, &pair.new).await.unwrap();
    let counts = again.counts();
    assert_eq!((counts.succeeded, counts.failed), (4, 0));
}

#[tokio::test]
async fn test_field_type_change() {
    let pair = field_type_change();
    let store = MemoryStore::new();
    store.seed(&pair.old, 2);

    let reconciler = reconciler(store);
    let report = reconciler.run(&pair.old, &pair.new).await.unwrap();

    assert!(report.is_success());
    assert_eq!(
        reconciler.store().calls(),
        vec![
            Operation::unset_field("Player", "score"),
            Operation::create_index("Player", "score"),
        ]
    );
    assert_eq!(reconciler.store().indexes("Player"), vec!["score_1"]);
    assert!(reconciler
        .store()
        .documents("Player")
        .iter()
        .all(|d| !d.contains_key("score")));
}

#[tokio::test]
async fn test_second_run_changes_nothing() {
    for pair in [
        field_removal_and_index_flip(),
        type_added_and_removed(),
        types_replaced(),
        field_type_change(),
    ] {
        let store = MemoryStore::new();
        store.seed(&pair.old, 2);
        let reconciler = reconciler(store);

        reconciler.run(&pair.old, &pair.new).await.unwrap();
        let names: Vec<_> = pair
            .old
            .type_names()
            .chain(pair.new.type_names())
            .collect();
        let before: Vec<_> = names.iter().map(|n| reconciler.store().collection(n)).collect();

        let report = reconciler.run(&pair.old, &pair.new).await.unwrap();
        let after: Vec<_> = names.iter().map(|n| reconciler.store().collection(n)).collect();

        assert!(report.is_success());
        assert_eq!(before, after);
    }
}

#[tokio::test]
async fn test_dry_run_matches_executed_plan() {
    let pair = type_added_and_removed();

    let dry = Reconciler::new(
        MemoryStore::new(),
        ReconcileConfig::default().with_dry_run(true),
    )
    .unwrap();
    let dry_report = dry.run(&pair.old, &pair.new).await.unwrap();

    let wet = reconciler(MemoryStore::new());
    let wet_report = wet.run(&pair.old, &pair.new).await.unwrap();

    assert_eq!(dry.store().call_count(), 0);
    assert_eq!(dry_report.plan, wet_report.plan);
    assert_eq!(
        wet.store().calls(),
        dry_report.plan.operations().cloned().collect::<Vec<_>>()
    );
    assert!(dry_report
        .phases
        .iter()
        .all(|p| p.status == PhaseStatus::Planned));
    assert_eq!(dry_report.counts().planned, dry_report.plan.len());
}

#[tokio::test]
async fn test_empty_snapshots_touch_nothing() {
    let reconciler = reconciler(MemoryStore::new());
    let report = reconciler
        .run(
            &SchemaSnapshot::empty(SnapshotRole::Old),
            &SchemaSnapshot::empty(SnapshotRole::New),
        )
        .await
        .unwrap();

    assert!(report.plan.is_empty());
    assert_eq!(report.phases.len(), 3);
    assert_eq!(reconciler.store().call_count(), 0);
}

#[tokio::test]
async fn test_role_count_errors_before_store_calls() {
    let pair = field_type_change();
    let reconciler = reconciler(MemoryStore::new());

    let err = reconciler
        .run_snapshots([pair.old.clone(), pair.old.clone(), pair.new.clone()])
        .await
        .unwrap_err();
    assert!(err.is_configuration());
    assert!(matches!(err, ReconcileError::Schema(_)));

    let err = reconciler.run_snapshots([pair.old.clone()]).await.unwrap_err();
    assert!(err.is_configuration());

    assert_eq!(reconciler.store().call_count(), 0);

    let report = reconciler.run_snapshots([pair.new, pair.old]).await.unwrap();
    assert!(report.is_success());
}

#[test]
fn test_plan_is_deterministic() {
    let pair = type_added_and_removed();
    assert_eq!(
        plan(&pair.old, &pair.new).unwrap(),
        plan(&pair.old, &pair.new).unwrap()
    );
}
