//! Reconciler: plan execution against a document store
//!
//! Phases run strictly in order. Units of one phase fan out up to the
//! configured concurrency limit; operations of one unit run sequentially and
//! stop at the first failure. A failed phase blocks every later phase.

use crate::config::ReconcileConfig;
use crate::error::{ReconcileError, StoreError};
use crate::plan::{ChangePlan, Operation, Phase, PhasePlan, WorkUnit};
use crate::planner;
use crate::report::{OperationOutcome, PhaseReport, PhaseStatus, RunReport, SkipReason};
use crate::store::DocumentStore;
use futures::stream::{self, StreamExt};
use recon_schema::{select_snapshots, SchemaSnapshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Drives change plans against one store
#[derive(Debug)]
pub struct Reconciler<S> {
    store: S,
    config: ReconcileConfig,
}

impl<S: DocumentStore> Reconciler<S> {
    /// Create reconciler
    ///
    /// # Errors
    /// `ReconcileError::Configuration` if `config` does not validate
    pub fn new(store: S, config: ReconcileConfig) -> Result<Self, ReconcileError> {
        config.validate()?;
        Ok(Self { store, config })
    }

    #[inline]
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Plan and apply the migration from `old` to `new`
    ///
    /// Store failures are recorded in the report, never returned.
    ///
    /// # Errors
    /// `ReconcileError::DiffInconsistency` if planning breaks an invariant
    pub async fn run(
        &self,
        old: &SchemaSnapshot,
        new: &SchemaSnapshot,
    ) -> Result<RunReport, ReconcileError> {
        self.run_with_cancel(old, new, CancellationToken::new())
            .await
    }

    /// Like [`run`](Self::run), stopping early when `cancel` fires
    ///
    /// # Errors
    /// `ReconcileError::DiffInconsistency` if planning breaks an invariant
    pub async fn run_with_cancel(
        &self,
        old: &SchemaSnapshot,
        new: &SchemaSnapshot,
        cancel: CancellationToken,
    ) -> Result<RunReport, ReconcileError> {
        let plan = planner::plan(old, new)?;
        Ok(self.execute(plan, &cancel).await)
    }

    /// Select the old/new pair from `snapshots`, then run
    ///
    /// # Errors
    /// `ReconcileError::Schema` unless there is exactly one snapshot per role;
    /// no store operation is issued in that case
    pub async fn run_snapshots(
        &self,
        snapshots: impl IntoIterator<Item = SchemaSnapshot>,
    ) -> Result<RunReport, ReconcileError> {
        let pair = select_snapshots(snapshots)?;
        self.run(&pair.old, &pair.new).await
    }

    /// Execute a prepared plan
    #[tracing::instrument(
        skip_all,
        fields(
            store = self.store.name(),
            operations = plan.len(),
            dry_run = self.config.dry_run,
        )
    )]
    pub async fn execute(&self, plan: ChangePlan, cancel: &CancellationToken) -> RunReport {
        if self.config.dry_run {
            info!("Dry run, no store operations issued");
            let phases = plan.phases().iter().map(planned_phase).collect();
            return RunReport {
                plan,
                dry_run: true,
                phases,
            };
        }

        let mut phases = Vec::with_capacity(plan.phases().len());
        let mut blocked_by: Option<Phase> = None;

        for phase_plan in plan.phases() {
            let phase = phase_plan.phase();

            let report = if let Some(by) = blocked_by {
                warn!(%phase, blocked_by = %by, "Skipping phase after earlier failure");
                skipped_phase(phase_plan, PhaseStatus::Skipped, SkipReason::PhaseBlocked { by })
            } else if cancel.is_cancelled() {
                warn!(%phase, "Run cancelled before phase started");
                skipped_phase(phase_plan, PhaseStatus::Cancelled, SkipReason::Cancelled)
            } else {
                self.execute_phase(phase_plan, cancel).await
            };

            if report.is_failed() {
                blocked_by = Some(phase);
            }
            phases.push(report);
        }

        let report = RunReport {
            plan,
            dry_run: false,
            phases,
        };
        let counts = report.counts();
        info!(
            succeeded = counts.succeeded,
            failed = counts.failed,
            skipped = counts.skipped,
            "Reconciliation finished"
        );
        report
    }

    #[tracing::instrument(skip_all, fields(phase = %phase_plan.phase(), units = phase_plan.units().len()))]
    async fn execute_phase(&self, phase_plan: &PhasePlan, cancel: &CancellationToken) -> PhaseReport {
        info!("Phase started");

        let outcomes: Vec<Vec<OperationOutcome>> = stream::iter(phase_plan.units())
            .map(|unit| self.execute_unit(unit, cancel))
            .buffered(self.config.concurrency_limit)
            .collect()
            .await;

        let report = PhaseReport::from_outcomes(
            phase_plan.phase(),
            outcomes.into_iter().flatten().collect(),
        );
        match report.status {
            PhaseStatus::Failed => warn!("Phase failed"),
            PhaseStatus::Cancelled => warn!("Phase cancelled"),
            _ => info!("Phase completed"),
        }
        report
    }

    async fn execute_unit(&self, unit: &WorkUnit, cancel: &CancellationToken) -> Vec<OperationOutcome> {
        if cancel.is_cancelled() {
            debug!(collection = unit.collection(), "Unit not started, run cancelled");
            return unit
                .operations()
                .iter()
                .map(|op| OperationOutcome::skipped(op.clone(), SkipReason::Cancelled))
                .collect();
        }

        let mut outcomes = Vec::with_capacity(unit.len());
        let mut pending = unit.operations().iter();

        for op in pending.by_ref() {
            match self.apply(op).await {
                Ok(affected) => {
                    debug!(operation = %op, ?affected, "Operation succeeded");
                    outcomes.push(OperationOutcome::succeeded(op.clone(), affected));
                }
                Err(error) => {
                    warn!(operation = %op, %error, "Operation failed");
                    outcomes.push(OperationOutcome::failed(op.clone(), error));
                    break;
                }
            }
        }

        outcomes.extend(
            pending.map(|op| OperationOutcome::skipped(op.clone(), SkipReason::EarlierFailureInUnit)),
        );
        outcomes
    }

    async fn apply(&self, op: &Operation) -> Result<Option<u64>, StoreError> {
        match op {
            Operation::UnsetField { collection, field } => {
                self.store.unset_field(collection, field).await?;
                Ok(None)
            }
            Operation::CreateIndex {
                collection,
                field,
                direction,
            } => {
                self.store.create_index(collection, field, *direction).await?;
                Ok(None)
            }
            Operation::DropIndex { collection, field } => {
                self.store.drop_index(collection, field).await?;
                Ok(None)
            }
            Operation::DeleteAllDocuments { collection } => {
                self.store.delete_all_documents(collection).await.map(Some)
            }
            Operation::DropAllIndexes { collection } => {
                self.store.drop_all_indexes(collection).await?;
                Ok(None)
            }
        }
    }
}

fn planned_phase(phase_plan: &PhasePlan) -> PhaseReport {
    PhaseReport {
        phase: phase_plan.phase(),
        status: PhaseStatus::Planned,
        outcomes: phase_plan
            .operations()
            .cloned()
            .map(OperationOutcome::planned)
            .collect(),
    }
}

fn skipped_phase(phase_plan: &PhasePlan, status: PhaseStatus, reason: SkipReason) -> PhaseReport {
    PhaseReport {
        phase: phase_plan.phase(),
        status,
        outcomes: phase_plan
            .operations()
            .map(|op| OperationOutcome::skipped(op.clone(), reason.clone()))
            .collect(),
    }
}
