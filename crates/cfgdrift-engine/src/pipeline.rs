//! Per-device comparison pipeline.
//!
//! ## Stages (in order):
//! 1. Parse the before backup
//! 2. Parse the after backup
//! 3. Diff under the configured limits
//! 4. Classify every entry against the rule table
//! 5. Synthesize the rollback plan (optional)
//! 6. Verify the plan restores the before digest (optional, complete plans only)
//!
//! A failing stage ends the device's comparison with a `Failed` status
//! naming the stage; no stage can fail another device's comparison.

use std::fmt;
use std::time::Instant;

use cfgdrift_core::errors::{ExError, ExErrorKind};
use cfgdrift_core::model::{ConfigTree, DeltaResult, DeltaSummary, VendorTag};
use cfgdrift_core::{
    apply_plan, classify_all, diff_with_limits, log_op_end, log_op_error, log_op_start,
    synthesize, ClassifyContext, ParseOptions, RollbackPlan,
};
use cfgdrift_core_types::{RequestContext, RequestId, TraceId};
use serde::{Deserialize, Serialize};

use crate::batch::{DeviceJob, RawBackup};
use crate::config::EngineConfig;
use crate::tables::Tables;

/// Where a device comparison stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ParseBefore,
    ParseAfter,
    Diff,
    VerifyRollback,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::ParseBefore => "parse_before",
            Stage::ParseAfter => "parse_after",
            Stage::Diff => "diff",
            Stage::VerifyRollback => "verify_rollback",
        })
    }
}

/// Result of a successful comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub summary: DeltaSummary,
    pub delta: DeltaResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollback: Option<RollbackPlan>,
    /// True only when the plan was applied and reproduced the before digest
    pub rollback_verified: bool,
}

impl Comparison {
    pub fn has_incomplete_rollback(&self) -> bool {
        self.rollback.as_ref().is_some_and(|plan| !plan.is_complete())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeviceStatus {
    Succeeded {
        comparison: Box<Comparison>,
    },
    Failed {
        stage: Stage,
        code: String,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceOutcome {
    pub device_id: String,
    pub vendor: VendorTag,
    pub request_id: RequestId,
    #[serde(flatten)]
    pub status: DeviceStatus,
}

impl DeviceOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, DeviceStatus::Succeeded { .. })
    }

    pub fn comparison(&self) -> Option<&Comparison> {
        match &self.status {
            DeviceStatus::Succeeded { comparison } => Some(comparison),
            DeviceStatus::Failed { .. } => None,
        }
    }
}

/// Loaded tables plus configuration; shared read-only by batch workers
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: EngineConfig,
    tables: Tables,
    parse_options: ParseOptions,
}

impl Pipeline {
    pub fn new(config: EngineConfig, tables: Tables) -> Self {
        Self {
            config,
            tables,
            parse_options: ParseOptions::default(),
        }
    }

    /// Load the tables `config` names and build a pipeline.
    ///
    /// # Errors
    ///
    /// `ERR_INVALID_CONFIG` or `ERR_INVALID_SCHEMA_TABLE`.
    pub fn from_config(config: EngineConfig) -> Result<Self, ExError> {
        config.validate()?;
        let tables = Tables::load(&config)?;
        Ok(Self::new(config, tables))
    }

    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse_options = options;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    /// Parse one backup with the pipeline's registry and options
    ///
    /// # Errors
    ///
    /// `ERR_PARSE` or `ERR_UNKNOWN_VENDOR`.
    pub fn parse(&self, vendor: VendorTag, backup: &RawBackup) -> Result<ConfigTree, ExError> {
        self.tables
            .registry
            .parse(&backup.bytes, vendor, backup.captured_at, &self.parse_options)
            .map_err(ExError::from)
    }

    /// Run stages 3 to 6 on already parsed trees.
    ///
    /// # Errors
    ///
    /// The failing stage and its error.
    pub fn compare(
        &self,
        before: &ConfigTree,
        after: &ConfigTree,
    ) -> Result<Comparison, (Stage, ExError)> {
        let delta = diff_with_limits(before, after, &self.config.limits)
            .map_err(|e| (Stage::Diff, ExError::from(e).with_op("diff")))?;
        let ctx = ClassifyContext::for_result(&delta);
        let delta = classify_all(delta, &self.tables.rules, &ctx);

        let rollback = self
            .config
            .synthesize_rollback
            .then(|| synthesize(&delta));

        let rollback_verified = match &rollback {
            Some(plan) if self.config.verify_rollback && plan.is_complete() => {
                verify(after, plan).map_err(|e| (Stage::VerifyRollback, e))?;
                true
            }
            _ => false,
        };

        Ok(Comparison {
            summary: delta.summary(),
            delta,
            rollback,
            rollback_verified,
        })
    }

    /// Compare one device's before and after backups.
    ///
    /// Never fails as a whole; errors become a `Failed` status carrying the
    /// device id and a fresh request id.
    pub fn compare_device(&self, job: &DeviceJob) -> DeviceOutcome {
        self.compare_device_in(job, RequestContext::new())
    }

    /// Like [`Pipeline::compare_device`] with a caller-supplied context
    /// (batch runs attach their trace id).
    pub fn compare_device_in(&self, job: &DeviceJob, ctx: RequestContext) -> DeviceOutcome {
        let ctx = ctx.with_device_id(job.device_id.clone());
        let trace_id = ctx.trace_id.as_ref().map(TraceId::as_str).unwrap_or_default();
        let start = Instant::now();
        log_op_start!(
            "compare_device",
            device_id = %job.device_id,
            vendor = %job.vendor,
            request_id = %ctx.request_id,
            trace_id = %trace_id
        );

        let status = match self.run_stages(job) {
            Ok(comparison) => {
                log_op_end!(
                    "compare_device",
                    duration_ms = start.elapsed().as_millis() as u64,
                    device_id = %job.device_id,
                    request_id = %ctx.request_id,
                    entry_count = comparison.delta.len(),
                    security_impacting = comparison.summary.security_impacting()
                );
                DeviceStatus::Succeeded {
                    comparison: Box::new(comparison),
                }
            }
            Err((stage, err)) => {
                let mut err = err
                    .with_device_id(job.device_id.clone())
                    .with_request_id(ctx.request_id.clone());
                if let Some(trace_id) = &ctx.trace_id {
                    err = err.with_trace_id(trace_id.clone());
                }
                log_op_error!(
                    "compare_device",
                    err.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    device_id = %job.device_id,
                    request_id = %ctx.request_id,
                    stage = %stage
                );
                DeviceStatus::Failed {
                    stage,
                    code: err.code().to_string(),
                    message: err.to_string(),
                }
            }
        };

        DeviceOutcome {
            device_id: job.device_id.clone(),
            vendor: job.vendor,
            request_id: ctx.request_id,
            status,
        }
    }

    fn run_stages(&self, job: &DeviceJob) -> Result<Comparison, (Stage, ExError)> {
        let before = self
            .parse(job.vendor, &job.before)
            .map_err(|e| (Stage::ParseBefore, e.with_op("parse_before")))?;
        let after = self
            .parse(job.vendor, &job.after)
            .map_err(|e| (Stage::ParseAfter, e.with_op("parse_after")))?;
        self.compare(&before, &after)
    }
}

fn verify(after: &ConfigTree, plan: &RollbackPlan) -> Result<(), ExError> {
    let restored =
        apply_plan(after, plan).map_err(|e| ExError::from(e).with_op("verify_rollback"))?;
    let identity = restored
        .identity()
        .map_err(|e| ExError::from(e).with_op("verify_rollback"))?;
    if identity.digest != plan.source.digest {
        return Err(ExError::new(ExErrorKind::Internal)
            .with_op("verify_rollback")
            .with_vendor(identity.vendor)
            .with_message(format!(
                "rolled-back tree digest {} does not match before digest {}",
                identity.digest, plan.source.digest
            )));
    }
    Ok(())
}
