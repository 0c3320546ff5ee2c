//! Testing utilities for the recon workspace
//!
//! An in-memory [`DocumentStore`] with failure injection and call recording,
//! plus snapshot fixtures for the common migration scenarios.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use recon_core::{
    index_name, CancellationToken, DocumentStore, IndexDirection, Operation, OperationKind,
    StoreError,
};
use recon_schema::{
    FieldDescriptor, FieldType, SchemaSnapshot, SnapshotPair, SnapshotRole, TypeDescriptor,
};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub type Document = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    pub documents: Vec<Document>,
    pub indexes: BTreeSet<String>,
}

#[derive(Debug, Default)]
struct State {
    collections: BTreeMap<String, Collection>,
    calls: Vec<Operation>,
    failures: Vec<(OperationKind, String)>,
    cancel_after: Option<(usize, CancellationToken)>,
}

/// Document store held in memory
///
/// Every primitive is idempotent, matching what the reconciler expects from a
/// real store. Calls are recorded even when an injected failure rejects them.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Reject every `kind` operation on `collection`
    pub fn fail_on(&self, kind: OperationKind, collection: &str) {
        self.state.lock().failures.push((kind, collection.to_string()));
    }

    pub fn clear_failures(&self) {
        self.state.lock().failures.clear();
    }

    /// Fire `token` once `calls` operations have completed
    pub fn cancel_after(&self, calls: usize, token: CancellationToken) {
        self.state.lock().cancel_after = Some((calls, token));
    }

    pub fn insert(&self, collection: &str, document: Value) {
        let document = match document {
            Value::Object(map) => map,
            _ => panic!("documents must be JSON objects"),
        };
        self.state
            .lock()
            .collections
            .entry(collection.to_string())
            .or_default()
            .documents
            .push(document);
    }

    pub fn add_index(&self, collection: &str, field: &str) {
        self.state
            .lock()
            .collections
            .entry(collection.to_string())
            .or_default()
            .indexes
            .insert(index_name(field, IndexDirection::Ascending));
    }

    /// Seed one collection per type with `docs` documents each and the
    /// snapshot's indexes
    pub fn seed(&self, snapshot: &SchemaSnapshot, docs: usize) {
        for ty in snapshot.types() {
            for i in 0..docs {
                self.insert(ty.name(), sample_document(ty, i));
            }
            for field in ty.indexed_fields() {
                self.add_index(ty.name(), field.name());
            }
            self.state
                .lock()
                .collections
                .entry(ty.name().to_string())
                .or_default();
        }
    }

    pub fn collection(&self, name: &str) -> Option<Collection> {
        self.state.lock().collections.get(name).cloned()
    }

    pub fn has_collection(&self, name: &str) -> bool {
        self.state.lock().collections.contains_key(name)
    }

    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.collection(collection)
            .map(|c| c.documents)
            .unwrap_or_default()
    }

    pub fn indexes(&self, collection: &str) -> Vec<String> {
        self.collection(collection)
            .map(|c| c.indexes.into_iter().collect())
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<Operation> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().calls.len()
    }

    pub fn reset_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Highest number of calls observed running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self) -> InFlight<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        InFlight(&self.in_flight)
    }

    /// Record the call, then apply `f` unless a failure is injected
    fn call<T>(
        &self,
        op: Operation,
        f: impl FnOnce(&mut BTreeMap<String, Collection>) -> T,
    ) -> Result<T, StoreError> {
        let mut state = self.state.lock();
        let kind = op.kind();
        let collection = op.collection().to_string();
        state.calls.push(op);

        let injected = state
            .failures
            .iter()
            .any(|(k, c)| *k == kind && *c == collection);
        let result = if injected {
            Err(StoreError::other(collection, format!("injected {kind} failure")))
        } else {
            Ok(f(&mut state.collections))
        };

        if let Some((after, token)) = &state.cancel_after {
            if state.calls.len() >= *after {
                token.cancel();
            }
        }
        result
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn unset_field(&self, collection: &str, field: &str) -> Result<(), StoreError> {
        let _guard = self.enter().await;
        self.call(Operation::unset_field(collection, field), |cols| {
            if let Some(c) = cols.get_mut(collection) {
                for doc in &mut c.documents {
                    doc.remove(field);
                }
            }
        })
    }

    async fn create_index(
        &self,
        collection: &str,
        field: &str,
        direction: IndexDirection,
    ) -> Result<(), StoreError> {
        let _guard = self.enter().await;
        let op = Operation::CreateIndex {
            collection: collection.to_string(),
            field: field.to_string(),
            direction,
        };
        self.call(op, |cols| {
            cols.entry(collection.to_string())
                .or_default()
                .indexes
                .insert(index_name(field, direction));
        })
    }

    async fn drop_index(&self, collection: &str, field: &str) -> Result<(), StoreError> {
        let _guard = self.enter().await;
        self.call(Operation::drop_index(collection, field), |cols| {
            if let Some(c) = cols.get_mut(collection) {
                c.indexes
                    .remove(&index_name(field, IndexDirection::Ascending));
            }
        })
    }

    async fn delete_all_documents(&self, collection: &str) -> Result<u64, StoreError> {
        let _guard = self.enter().await;
        self.call(Operation::delete_all_documents(collection), |cols| {
            cols.get_mut(collection)
                .map(|c| std::mem::take(&mut c.documents).len() as u64)
                .unwrap_or(0)
        })
    }

    async fn drop_all_indexes(&self, collection: &str) -> Result<(), StoreError> {
        let _guard = self.enter().await;
        self.call(Operation::drop_all_indexes(collection), |cols| {
            if let Some(c) = cols.get_mut(collection) {
                c.indexes.clear();
            }
        })
    }
}

/// Document with a value for every field of `ty`
pub fn sample_document(ty: &TypeDescriptor, seq: usize) -> Value {
    let doc: Document = ty
        .fields()
        .iter()
        .map(|f| {
            let value = f
                .default_value()
                .cloned()
                .unwrap_or_else(|| Value::String(format!("{}-{seq}", f.name())));
            (f.name().to_string(), value)
        })
        .collect();
    Value::Object(doc)
}

pub fn snapshot(role: SnapshotRole, types: Vec<TypeDescriptor>) -> SchemaSnapshot {
    SchemaSnapshot::new(role, types).unwrap()
}

pub fn record_type(name: &str, fields: Vec<FieldDescriptor>) -> TypeDescriptor {
    TypeDescriptor::new(name, fields).unwrap()
}

/// Player loses `jinwoo`; `name` loses its index, `level` gains one
pub fn field_removal_and_index_flip() -> SnapshotPair {
    let old = snapshot(
        SnapshotRole::Old,
        vec![record_type(
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
        vec![record_type(
            "Player",
            vec![
                FieldDescriptor::new("name", FieldType::String),
                FieldDescriptor::new("level", FieldType::Int32).indexed(),
                FieldDescriptor::new("gold", FieldType::Int64),
            ],
        )],
    );
    SnapshotPair { old, new }
}

/// `Jinwoo` is dropped, `Log` is introduced, `Player` is untouched
pub fn type_added_and_removed() -> SnapshotPair {
    let player = || {
        record_type(
            "Player",
            vec![
                FieldDescriptor::new("name", FieldType::String).indexed(),
                FieldDescriptor::new("level", FieldType::Int32),
            ],
        )
    };
    let old = snapshot(
        SnapshotRole::Old,
        vec![
            player(),
            record_type(
                "Jinwoo",
                vec![FieldDescriptor::new("note", FieldType::String).indexed()],
            ),
        ],
    );
    let new = snapshot(
        SnapshotRole::New,
        vec![
            player(),
            record_type(
                "Log",
                vec![
                    FieldDescriptor::new("at", FieldType::DateTime).indexed(),
                    FieldDescriptor::new("message", FieldType::String),
                ],
            ),
        ],
    );
    SnapshotPair { old, new }
}

/// `Jinwoo` is the only old type; `Player` and `Log` are both new
pub fn types_replaced() -> SnapshotPair {
    let old = snapshot(
        SnapshotRole::Old,
        vec![record_type(
            "Jinwoo",
            vec![FieldDescriptor::new("iidex", FieldType::Int32).indexed()],
        )],
    );
    let new = snapshot(
        SnapshotRole::New,
        vec![
            record_type(
                "Player",
                vec![
                    FieldDescriptor::new("name", FieldType::String).indexed(),
                    FieldDescriptor::new("level", FieldType::Int32),
                ],
            ),
            record_type(
                "Log",
                vec![
                    FieldDescriptor::new("id", FieldType::ObjectId).indexed(),
                    FieldDescriptor::new("message", FieldType::String),
                ],
            ),
        ],
    );
    SnapshotPair { old, new }
}

/// `Player.score` changes from int32 to an indexed string
pub fn field_type_change() -> SnapshotPair {
    let old = snapshot(
        SnapshotRole::Old,
        vec![record_type(
            "Player",
            vec![
                FieldDescriptor::new("name", FieldType::String),
                FieldDescriptor::new("score", FieldType::Int32),
            ],
        )],
    );
    let new = snapshot(
        SnapshotRole::New,
        vec![record_type(
            "Player",
            vec![
                FieldDescriptor::new("name", FieldType::String),
                FieldDescriptor::new("score", FieldType::String).indexed(),
            ],
        )],
    );
    SnapshotPair { old, new }
}

/// Several independent collections in every phase
pub fn many_collections(count: usize) -> SnapshotPair {
    let old_types = (0..count)
        .flat_map(|i| {
            [
                record_type(
                    &format!("Kept{i}"),
                    vec![FieldDescriptor::new("stale", FieldType::String)],
                ),
                record_type(
                    &format!("Gone{i}"),
                    vec![FieldDescriptor::new("id", FieldType::ObjectId)],
                ),
            ]
        })
        .collect();
    let new_types = (0..count)
        .flat_map(|i| {
            [
                record_type(&format!("Kept{i}"), vec![]),
                record_type(
                    &format!("Fresh{i}"),
                    vec![FieldDescriptor::new("id", FieldType::ObjectId).indexed()],
                ),
            ]
        })
        .collect();
    SnapshotPair {
        old: snapshot(SnapshotRole::Old, old_types),
        new: snapshot(SnapshotRole::New, new_types),
    }
}
