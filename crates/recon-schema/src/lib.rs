//! Recon Schema Model
//!
//! Immutable, language-neutral descriptions of a data model generation.
//!
//! # Core Concepts
//!
//! - [`FieldType`]: Semantic field type with structural equivalence
//! - [`FieldDescriptor`]: Named, typed field with index/default annotations
//! - [`TypeDescriptor`]: Record type, mapped 1:1 to a store collection
//! - [`SchemaSnapshot`]: One labeled generation (`old` or `new`)
//! - [`SnapshotDocument`]: YAML/JSON description of snapshots
//!
//! # Example
//!
//! ```rust,ignore
//! use recon_schema::{FieldDescriptor, FieldType, SchemaSnapshot, SnapshotRole, TypeDescriptor};
//!
//! let player = TypeDescriptor::new(
//!     "Player",
//!     [
//!         FieldDescriptor::new("name", FieldType::String).indexed(),
//!         FieldDescriptor::new("level", FieldType::Int32),
//!     ],
//! )?;
//! let snapshot = SchemaSnapshot::new(SnapshotRole::New, [player])?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod descriptor;
mod document;
mod error;
mod field_type;
mod snapshot;

// Re-exports
pub use descriptor::{FieldDescriptor, TypeDescriptor};
pub use document::{FieldSpec, SnapshotDocument, SnapshotSpec, TypeSpec};
pub use error::SchemaError;
pub use field_type::FieldType;
pub use snapshot::{select_snapshots, SchemaSnapshot, SnapshotPair, SnapshotRole};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
