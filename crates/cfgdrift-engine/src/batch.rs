//! Batch comparison across many devices

use std::path::Path;
use std::time::Instant;

use cfgdrift_core::errors::{ExError, ExErrorKind};
use cfgdrift_core::model::VendorTag;
use cfgdrift_core::{log_op_end, log_op_error, log_op_start};
use cfgdrift_core_types::{RequestContext, TraceId};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::pipeline::{DeviceOutcome, Pipeline};

/// One captured configuration, undecoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBackup {
    pub bytes: Vec<u8>,
    pub captured_at: DateTime<Utc>,
}

impl RawBackup {
    pub fn new(bytes: impl Into<Vec<u8>>, captured_at: DateTime<Utc>) -> Self {
        Self {
            bytes: bytes.into(),
            captured_at,
        }
    }

    /// Read a backup file; without an explicit capture time the file's
    /// modification time is used.
    ///
    /// # Errors
    ///
    /// `ERR_IO` when the file or its metadata cannot be read.
    pub fn read(path: &Path, captured_at: Option<DateTime<Utc>>) -> Result<Self, ExError> {
        let io_err = |e: std::io::Error| {
            ExError::new(ExErrorKind::Io)
                .with_op("read_backup")
                .with_message(format!("{}: {}", path.display(), e))
        };
        let bytes = std::fs::read(path).map_err(io_err)?;
        let captured_at = match captured_at {
            Some(at) => at,
            None => std::fs::metadata(path)
                .and_then(|meta| meta.modified())
                .map(DateTime::<Utc>::from)
                .map_err(io_err)?,
        };
        Ok(Self { bytes, captured_at })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceJob {
    pub device_id: String,
    pub vendor: VendorTag,
    pub before: RawBackup,
    pub after: RawBackup,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub trace_id: TraceId,
    pub succeeded: usize,
    pub failed: usize,
    /// Succeeded devices whose rollback plan lists unsynthesizable entries
    pub incomplete_rollbacks: usize,
    /// Sorted by device id
    pub outcomes: Vec<DeviceOutcome>,
}

impl BatchReport {
    pub fn outcome(&self, device_id: &str) -> Option<&DeviceOutcome> {
        self.outcomes.iter().find(|o| o.device_id == device_id)
    }
}

/// Compare every job on a dedicated worker pool.
///
/// Jobs run independently; a failing device shows up as a failed outcome
/// and never stops the batch.
///
/// # Errors
///
/// `ERR_INTERNAL` only if the worker pool cannot be created.
pub fn run_batch(pipeline: &Pipeline, jobs: &[DeviceJob]) -> Result<BatchReport, ExError> {
    let trace_id = TraceId::new();
    let start = Instant::now();
    log_op_start!(
        "run_batch",
        trace_id = %trace_id.as_str(),
        device_count = jobs.len()
    );

    let pool = match rayon::ThreadPoolBuilder::new()
        .num_threads(pipeline.config().worker_threads)
        .thread_name(|i| format!("cfgdrift-worker-{}", i))
        .build()
    {
        Ok(pool) => pool,
        Err(e) => {
            let err = ExError::new(ExErrorKind::Internal)
                .with_op("run_batch")
                .with_trace_id(trace_id.clone())
                .with_message(format!("failed to start worker pool: {}", e));
            log_op_error!(
                "run_batch",
                err.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                trace_id = %trace_id.as_str()
            );
            return Err(err);
        }
    };
    info!(
        trace_id = %trace_id.as_str(),
        workers = pool.current_num_threads(),
        "batch worker pool ready"
    );

    let mut outcomes: Vec<DeviceOutcome> = pool.install(|| {
        jobs.par_iter()
            .map(|job| {
                let ctx = RequestContext::new().with_trace_id(trace_id.clone());
                pipeline.compare_device_in(job, ctx)
            })
            .collect()
    });
    outcomes.sort_by(|a, b| a.device_id.cmp(&b.device_id));

    let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
    let incomplete_rollbacks = outcomes
        .iter()
        .filter_map(DeviceOutcome::comparison)
        .filter(|c| c.has_incomplete_rollback())
        .count();
    let report = BatchReport {
        failed: outcomes.len() - succeeded,
        succeeded,
        incomplete_rollbacks,
        outcomes,
        trace_id,
    };

    log_op_end!(
        "run_batch",
        duration_ms = start.elapsed().as_millis() as u64,
        trace_id = %report.trace_id.as_str(),
        succeeded = report.succeeded,
        failed = report.failed,
        incomplete_rollbacks = report.incomplete_rollbacks
    );
    Ok(report)
}
