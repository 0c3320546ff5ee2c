//! Run report
//!
//! Per-operation outcomes grouped by phase. The report mirrors the plan
//! one-to-one: every planned operation appears exactly once, in plan order.

use crate::error::StoreError;
use crate::plan::{ChangePlan, Operation, Phase};
use serde::{Deserialize, Serialize};

/// Why an operation was not issued
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// An earlier phase had a failure
    PhaseBlocked { by: Phase },
    /// An earlier operation of the same unit failed
    EarlierFailureInUnit,
    /// The run was cancelled before this operation started
    Cancelled,
}

/// Result of one operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Dry run, not issued
    Planned,
    /// Store accepted the operation
    Succeeded { affected: Option<u64> },
    /// Store rejected the operation
    Failed { error: StoreError },
    /// Never issued
    Skipped { reason: SkipReason },
}

/// One operation with its outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationOutcome {
    pub operation: Operation,
    pub status: OutcomeStatus,
}

impl OperationOutcome {
    #[inline]
    #[must_use]
    pub fn planned(operation: Operation) -> Self {
        Self {
            operation,
            status: OutcomeStatus::Planned,
        }
    }

    #[inline]
    #[must_use]
    pub fn succeeded(operation: Operation, affected: Option<u64>) -> Self {
        Self {
            operation,
            status: OutcomeStatus::Succeeded { affected },
        }
    }

    #[inline]
    #[must_use]
    pub fn failed(operation: Operation, error: StoreError) -> Self {
        Self {
            operation,
            status: OutcomeStatus::Failed { error },
        }
    }

    #[inline]
    #[must_use]
    pub fn skipped(operation: Operation, reason: SkipReason) -> Self {
        Self {
            operation,
            status: OutcomeStatus::Skipped { reason },
        }
    }

    /// Check if the store accepted the operation
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Succeeded { .. })
    }

    #[inline]
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self.status, OutcomeStatus::Failed { .. })
    }

    #[inline]
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(self.status, OutcomeStatus::Skipped { .. })
    }

    /// Store error, if the operation failed
    #[must_use]
    pub fn error(&self) -> Option<&StoreError> {
        match &self.status {
            OutcomeStatus::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// Aggregate status of one phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    /// Dry run
    Planned,
    /// Every operation succeeded (or there were none)
    Completed,
    /// At least one operation failed
    Failed,
    /// Blocked by an earlier phase
    Skipped,
    /// Cancellation stopped the phase before all work started
    Cancelled,
}

/// Outcomes of one phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseReport {
    pub phase: Phase,
    pub status: PhaseStatus,
    pub outcomes: Vec<OperationOutcome>,
}

impl PhaseReport {
    /// Derive the phase status from its outcomes
    ///
    /// Failure wins over cancellation.
    #[must_use]
    pub fn from_outcomes(phase: Phase, outcomes: Vec<OperationOutcome>) -> Self {
        let status = if outcomes.iter().any(OperationOutcome::is_failure) {
            PhaseStatus::Failed
        } else if outcomes.iter().any(|o| {
            matches!(
                o.status,
                OutcomeStatus::Skipped {
                    reason: SkipReason::Cancelled
                }
            )
        }) {
            PhaseStatus::Cancelled
        } else {
            PhaseStatus::Completed
        };
        Self {
            phase,
            status,
            outcomes,
        }
    }

    /// Check if the phase blocks the ones after it
    #[inline]
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.status == PhaseStatus::Failed
    }
}

/// Outcome counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub planned: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl OutcomeCounts {
    /// Total operations counted
    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.planned + self.succeeded + self.failed + self.skipped
    }
}

/// Everything a run did, or would have done
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub plan: ChangePlan,
    pub dry_run: bool,
    pub phases: Vec<PhaseReport>,
}

impl RunReport {
    /// Check if every operation succeeded
    ///
    /// A dry run is never a success: nothing was applied.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.dry_run && self.outcomes().all(OperationOutcome::is_success)
    }

    /// All outcomes in plan order
    pub fn outcomes(&self) -> impl Iterator<Item = &OperationOutcome> {
        self.phases.iter().flat_map(|p| p.outcomes.iter())
    }

    /// Successful outcomes
    pub fn succeeded(&self) -> impl Iterator<Item = &OperationOutcome> {
        self.outcomes().filter(|o| o.is_success())
    }

    /// Failed outcomes
    pub fn failed(&self) -> impl Iterator<Item = &OperationOutcome> {
        self.outcomes().filter(|o| o.is_failure())
    }

    /// Skipped outcomes
    pub fn skipped(&self) -> impl Iterator<Item = &OperationOutcome> {
        self.outcomes().filter(|o| o.is_skipped())
    }

    /// Report of one phase
    #[must_use]
    pub fn phase(&self, phase: Phase) -> Option<&PhaseReport> {
        self.phases.iter().find(|p| p.phase == phase)
    }

    /// Count outcomes by status
    #[must_use]
    pub fn counts(&self) -> OutcomeCounts {
        self.outcomes()
            .fold(OutcomeCounts::default(), |mut counts, o| {
                match o.status {
                    OutcomeStatus::Planned => counts.planned += 1,
                    OutcomeStatus::Succeeded { .. } => counts.succeeded += 1,
                    OutcomeStatus::Failed { .. } => counts.failed += 1,
                    OutcomeStatus::Skipped { .. } => counts.skipped += 1,
                }
                counts
            })
    }

    /// First phase with a failure
    #[must_use]
    pub fn failed_phase(&self) -> Option<Phase> {
        self.phases.iter().find(|p| p.is_failed()).map(|p| p.phase)
    }
}
