//! Diff command
//!
//! Usage: cfgdrift diff --vendor <VENDOR> <BEFORE> <AFTER> [--rollback] [--strict]

use std::path::PathBuf;

use cfgdrift_core::model::VendorTag;
use cfgdrift_engine::RawBackup;
use chrono::{DateTime, Utc};
use clap::Args;

use super::{build_pipeline, parse_timestamp, print_json, CommandResult, CommonArgs};

#[derive(Debug, Args)]
pub struct DiffArgs {
    #[arg(long)]
    pub vendor: VendorTag,

    pub before: PathBuf,

    pub after: PathBuf,

    /// Include the rollback plan (verified against the before backup)
    #[arg(long)]
    pub rollback: bool,

    /// Reject unknown top-level directives
    #[arg(long)]
    pub strict: bool,

    #[arg(long, value_parser = parse_timestamp)]
    pub before_captured_at: Option<DateTime<Utc>>,

    #[arg(long, value_parser = parse_timestamp)]
    pub after_captured_at: Option<DateTime<Utc>>,
}

pub fn execute(common: &CommonArgs, args: DiffArgs) -> CommandResult {
    let mut config = common.engine_config()?;
    config.synthesize_rollback = args.rollback;
    let pipeline = build_pipeline(config, args.strict)?;

    let before = pipeline.parse(
        args.vendor,
        &RawBackup::read(&args.before, args.before_captured_at)?,
    )?;
    let after = pipeline.parse(
        args.vendor,
        &RawBackup::read(&args.after, args.after_captured_at)?,
    )?;

    let comparison = pipeline
        .compare(&before, &after)
        .map_err(|(stage, err)| format!("{} failed: {}", stage, err))?;
    print_json(&comparison)?;
    Ok(0)
}
