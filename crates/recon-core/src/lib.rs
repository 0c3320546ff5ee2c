//! Recon Core
//!
//! Plans and applies the store changes that carry a document store from one
//! schema generation to the next.
//!
//! # Core Concepts
//!
//! - [`DocumentStore`]: Idempotent mutation primitives supplied by the host
//! - [`ChangePlan`]: Three ordered phases of per-collection [`WorkUnit`]s
//! - [`plan`]: Pure planner from two [`SchemaSnapshot`](recon_schema::SchemaSnapshot)s
//! - [`Reconciler`]: Executes a plan with phase barriers and bounded fan-out
//! - [`RunReport`]: Per-operation outcomes, the only record of store failures
//!
//! # Example
//!
//! ```rust,ignore
//! use recon_core::{ReconcileConfig, Reconciler};
//!
//! let reconciler = Reconciler::new(store, ReconcileConfig::default())?;
//! let report = reconciler.run(&old, &new).await?;
//! for outcome in report.failed() {
//!     eprintln!("{}: {:?}", outcome.operation, outcome.error());
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod config;
mod error;
mod plan;
mod planner;
mod reconciler;
mod report;
mod store;

// Re-exports
pub use config::ReconcileConfig;
pub use error::{ReconcileError, StoreError};
pub use plan::{ChangePlan, Operation, OperationKind, Phase, PhasePlan, WorkUnit};
pub use planner::{plan, plan_from_diff};
pub use reconciler::Reconciler;
pub use report::{
    OperationOutcome, OutcomeCounts, OutcomeStatus, PhaseReport, PhaseStatus, RunReport,
    SkipReason,
};
pub use store::{index_name, DocumentStore, IndexDirection};

pub use tokio_util::sync::CancellationToken;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
