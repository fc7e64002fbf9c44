//! Limits for the diff engine.
//!
//! `DiffLimits` bounds every comparison so pathological input terminates
//! with an error (or a degraded result) instead of exhausting memory or stack.

use serde::{Deserialize, Serialize};

use crate::errors::{DriftError, Result};

/// What to do when an ordered list is too large to align
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitBehavior {
    /// Fail the comparison with `ListLimitExceeded`
    #[default]
    ReturnError,
    /// Compare the list as an unordered set; no Moved entries are produced
    FallbackUnordered,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffLimits {
    /// Maximum path depth compared (root = 0)
    pub max_depth: usize,
    /// Maximum element count of either side of an ordered list
    pub max_list_len: usize,
    /// Maximum LCS table cells per list, after prefix/suffix trimming
    pub lcs_work_limit: usize,
    pub on_limit_exceeded: LimitBehavior,
}

impl Default for DiffLimits {
    fn default() -> Self {
        Self {
            max_depth: 64,
            max_list_len: 4096,
            lcs_work_limit: 4_000_000,
            on_limit_exceeded: LimitBehavior::ReturnError,
        }
    }
}

impl DiffLimits {
    /// Reject limits that would make every comparison fail.
    ///
    /// # Errors
    ///
    /// Returns `DriftError::InvalidConfig` when a limit is zero.
    pub fn validate(&self) -> Result<()> {
        ensure_non_zero(self.max_depth, "max_depth")?;
        ensure_non_zero(self.max_list_len, "max_list_len")?;
        ensure_non_zero(self.lcs_work_limit, "lcs_work_limit")?;
        Ok(())
    }

    pub fn with_max_depth(mut self, value: usize) -> Self {
        self.max_depth = value;
        self
    }

    pub fn with_max_list_len(mut self, value: usize) -> Self {
        self.max_list_len = value;
        self
    }

    pub fn with_lcs_work_limit(mut self, value: usize) -> Self {
        self.lcs_work_limit = value;
        self
    }

    pub fn with_on_limit_exceeded(mut self, value: LimitBehavior) -> Self {
        self.on_limit_exceeded = value;
        self
    }
}

fn ensure_non_zero(value: usize, field: &str) -> Result<()> {
    if value == 0 {
        return Err(DriftError::InvalidConfig {
            reason: format!("{} must be greater than zero", field),
        });
    }
    Ok(())
}
