//! Batch command
//!
//! Usage: cfgdrift batch <MANIFEST> [--strict]
//!
//! The manifest is a YAML list of devices:
//!
//! ```yaml
//! - device_id: edge-1
//!   vendor: cisco_ios
//!   before: backups/edge-1/2026-04-01.cfg
//!   after: backups/edge-1/2026-04-02.cfg
//!   after_captured_at: 2026-04-02T01:30:00Z
//! ```
//!
//! Relative paths resolve against the manifest's directory. Exits 2 when
//! any device failed.

use std::path::{Path, PathBuf};

use cfgdrift_core::model::VendorTag;
use cfgdrift_engine::{run_batch, DeviceJob, RawBackup};
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Deserialize;
use tracing::info;

use super::{build_pipeline, print_json, CommandResult, CommonArgs};

#[derive(Debug, Args)]
pub struct BatchArgs {
    /// Device manifest (YAML)
    pub manifest: PathBuf,

    /// Reject unknown top-level directives
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestEntry {
    device_id: String,
    vendor: VendorTag,
    before: PathBuf,
    after: PathBuf,
    #[serde(default)]
    before_captured_at: Option<DateTime<Utc>>,
    #[serde(default)]
    after_captured_at: Option<DateTime<Utc>>,
}

pub fn execute(common: &CommonArgs, args: BatchArgs) -> CommandResult {
    let pipeline = build_pipeline(common.engine_config()?, args.strict)?;
    let jobs = load_manifest(&args.manifest)?;
    info!(manifest = %args.manifest.display(), device_count = jobs.len(), "manifest loaded");

    let report = run_batch(&pipeline, &jobs)?;
    print_json(&report)?;
    Ok(if report.failed > 0 { 2 } else { 0 })
}

fn load_manifest(path: &Path) -> Result<Vec<DeviceJob>, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read manifest {}: {}", path.display(), e))?;
    let entries: Vec<ManifestEntry> = serde_yaml::from_str(&content)
        .map_err(|e| format!("invalid manifest {}: {}", path.display(), e))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));

    let mut jobs = Vec::with_capacity(entries.len());
    for entry in entries {
        jobs.push(DeviceJob {
            before: RawBackup::read(&base.join(&entry.before), entry.before_captured_at)?,
            after: RawBackup::read(&base.join(&entry.after), entry.after_captured_at)?,
            device_id: entry.device_id,
            vendor: entry.vendor,
        });
    }
    Ok(jobs)
}
