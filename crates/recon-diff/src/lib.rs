//! Recon Diff
//!
//! Pure, synchronous structural comparison of two schema snapshots.
//!
//! # Core Concepts
//!
//! - [`Pair`]: optional old side + optional new side of one type or field
//! - [`Partition`]: mutual / added / removed classification
//! - [`diff_types`]: type-set differ (by name)
//! - [`diff_fields`]: field differ (by name and type)
//!
//! # Example
//!
//! ```rust,ignore
//! use recon_diff::{diff_fields, diff_types};
//!
//! let types = diff_types(&old, &new);
//! for pair in &types.mutual {
//!     let (from, to) = pair.both().unwrap();
//!     let fields = diff_fields(from, to);
//!     println!("{}: {} removed", pair.name(), fields.removed.len());
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod fields;
mod pair;
mod types;

// Re-exports
pub use error::DiffInconsistency;
pub use fields::{diff_fields, FieldDiff};
pub use pair::{Named, Pair, Partition};
pub use types::{diff_types, TypeDiff};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
