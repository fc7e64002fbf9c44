//! Parse command
//!
//! Usage: cfgdrift parse --vendor <VENDOR> <FILE> [--strict]

use std::path::PathBuf;

use cfgdrift_core::model::VendorTag;
use cfgdrift_engine::RawBackup;
use chrono::{DateTime, Utc};
use clap::Args;

use super::{build_pipeline, parse_timestamp, print_json, CommandResult, CommonArgs};

#[derive(Debug, Args)]
pub struct ParseArgs {
    #[arg(long)]
    pub vendor: VendorTag,

    /// Backup file
    pub file: PathBuf,

    /// Reject unknown top-level directives
    #[arg(long)]
    pub strict: bool,

    /// Capture time (RFC 3339); defaults to the file's modification time
    #[arg(long, value_parser = parse_timestamp)]
    pub captured_at: Option<DateTime<Utc>>,
}

pub fn execute(common: &CommonArgs, args: ParseArgs) -> CommandResult {
    let pipeline = build_pipeline(common.engine_config()?, args.strict)?;
    let backup = RawBackup::read(&args.file, args.captured_at)?;
    let tree = pipeline.parse(args.vendor, &backup)?;
    print_json(&tree)?;
    Ok(0)
}
