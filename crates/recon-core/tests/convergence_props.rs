//! After a successful run the store is shaped like the new snapshot

use proptest::prelude::*;
use recon_core::{plan, ReconcileConfig, Reconciler};
use recon_schema::{FieldDescriptor, FieldType, SchemaSnapshot, SnapshotRole, TypeDescriptor};
use recon_test_utils::MemoryStore;
use std::collections::BTreeMap;

fn field_type() -> impl Strategy<Value = FieldType> {
    prop_oneof![
        Just(FieldType::Int32),
        Just(FieldType::String),
        Just(FieldType::Bool),
    ]
}

fn snapshot(role: SnapshotRole) -> impl Strategy<Value = SchemaSnapshot> {
    let fields = prop::collection::btree_map("f[0-3]", (field_type(), any::<bool>()), 0..4);
    prop::collection::btree_map("T[0-3]", fields, 0..4).prop_map(move |types| {
        let types = types.into_iter().map(|(name, fields)| to_type(&name, fields));
        SchemaSnapshot::new(role, types).unwrap()
    })
}

fn to_type(name: &str, fields: BTreeMap<String, (FieldType, bool)>) -> TypeDescriptor {
    TypeDescriptor::new(
        name,
        fields
            .into_iter()
            .map(|(f, (ty, indexed))| FieldDescriptor::new(f, ty).with_index(indexed)),
    )
    .unwrap()
}

fn block_on<F: std::future::Future>(f: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(f)
}

proptest! {
    #[test]
    fn store_converges_to_new_snapshot(
        old in snapshot(SnapshotRole::Old),
        new in snapshot(SnapshotRole::New),
    ) {
        let store = MemoryStore::new();
        store.seed(&old, 2);
        let reconciler = Reconciler::new(store, ReconcileConfig::default()).unwrap();

        let report = block_on(reconciler.run(&old, &new)).unwrap();
        prop_assert!(report.is_success());
        let store = reconciler.store();

        for ty in new.types() {
            let indexes = store.indexes(ty.name());
            for field in ty.fields() {
                // A type change leaves the old field's index in place
                let stale = old
                    .get(ty.name())
                    .and_then(|o| o.field(field.name()))
                    .is_some_and(|o| o.has_index() && o.field_type() != field.field_type());
                let name = format!("{}_1", field.name());
                prop_assert_eq!(indexes.contains(&name), field.has_index() || stale);
            }
            for doc in store.documents(ty.name()) {
                for key in doc.keys() {
                    let kept = ty.field(key).zip(old.get(ty.name()).and_then(|o| o.field(key)));
                    prop_assert!(kept.is_some_and(|(n, o)| n.field_type() == o.field_type()));
                }
            }
        }

        for ty in old.types().iter().filter(|t| !new.contains(t.name())) {
            prop_assert!(store.documents(ty.name()).is_empty());
            prop_assert!(store.indexes(ty.name()).is_empty());
        }

        // Second run leaves the store as it is
        let calls = store.call_count();
        let before: Vec<_> = new.type_names().map(|n| store.collection(n)).collect();
        let again = block_on(reconciler.run(&old, &new)).unwrap();
        let after: Vec<_> = new.type_names().map(|n| store.collection(n)).collect();
        prop_assert!(again.is_success());
        prop_assert_eq!(before, after);
        prop_assert_eq!(store.call_count() - calls, again.plan.len());
    }

    #[test]
    fn identical_snapshots_plan_nothing(old in snapshot(SnapshotRole::Old)) {
        let new = SchemaSnapshot::new(SnapshotRole::New, old.types().to_vec()).unwrap();
        prop_assert!(plan(&old, &new).unwrap().is_empty());
    }
}
