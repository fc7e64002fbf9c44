//! Subcommands and the options they share

use std::path::PathBuf;

use cfgdrift_core::logging_facility;
use cfgdrift_core::ParseOptions;
use cfgdrift_engine::{EngineConfig, Pipeline};
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;

pub mod batch;
pub mod diff;
pub mod parse;

pub type CommandResult = Result<i32, Box<dyn std::error::Error>>;

#[derive(Debug, Args)]
pub struct CommonArgs {
    /// Engine configuration (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory of vendor schema tables overriding the built-in ones
    #[arg(long, global = true)]
    pub schema_dir: Option<PathBuf>,

    /// Classification rule table (YAML)
    #[arg(long, global = true)]
    pub rules: Option<PathBuf>,
}

impl CommonArgs {
    /// Config file (or defaults) with command-line overrides applied
    pub fn engine_config(&self) -> Result<EngineConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::default(),
        };
        if let Some(dir) = &self.schema_dir {
            config.schema_dir = Some(dir.clone());
        }
        if let Some(rules) = &self.rules {
            config.rules_file = Some(rules.clone());
        }
        logging_facility::init(config.log_profile);
        Ok(config)
    }
}

pub fn build_pipeline(
    config: EngineConfig,
    strict: bool,
) -> Result<Pipeline, Box<dyn std::error::Error>> {
    let options = if strict {
        ParseOptions::strict()
    } else {
        ParseOptions::default()
    };
    Ok(Pipeline::from_config(config)?.with_parse_options(options))
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 timestamp '{}': {}", value, e))
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
