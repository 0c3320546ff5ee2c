//! Diff invariant violations

/// A differ produced a classification that breaks its own invariants
///
/// Unreachable for well-formed snapshots; callers treat it as fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("diff inconsistency in {subject}: '{name}' {reason}")]
pub struct DiffInconsistency {
    /// What was being diffed (`types` or `fields of <Type>`)
    pub subject: String,
    /// Offending type or field name
    pub name: String,
    /// Which invariant broke
    pub reason: &'static str,
}

impl DiffInconsistency {
    /// Create inconsistency report
    pub fn new(subject: impl Into<String>, name: impl Into<String>, reason: &'static str) -> Self {
        Self {
            subject: subject.into(),
            name: name.into(),
            reason,
        }
    }
}
