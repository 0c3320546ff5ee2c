//! Run configuration

use crate::error::ReconcileError;
use serde::{Deserialize, Serialize};

/// Per-run tuning
///
/// Missing keys take their defaults, so an empty document is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconcileConfig {
    /// Maximum work units of one phase executing at once
    pub concurrency_limit: usize,
    /// Produce and report the plan without touching the store
    pub dry_run: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: 1,
            dry_run: false,
        }
    }
}

impl ReconcileConfig {
    /// Set concurrency limit
    #[must_use]
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit;
        self
    }

    /// Set dry-run mode
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Check the configuration can drive a run
    ///
    /// # Errors
    /// `ReconcileError::Configuration` if `concurrency_limit` is zero
    pub fn validate(&self) -> Result<(), ReconcileError> {
        if self.concurrency_limit == 0 {
            return Err(ReconcileError::Configuration(
                "concurrency_limit must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a TOML document
    ///
    /// # Errors
    /// `ReconcileError::Configuration` on malformed TOML or invalid values
    pub fn from_toml_str(input: &str) -> Result<Self, ReconcileError> {
        let config: Self = toml::from_str(input)
            .map_err(|e| ReconcileError::Configuration(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}
