//! Schema and classification table loading

use std::path::{Path, PathBuf};
use std::time::Instant;

use cfgdrift_core::errors::{DriftError, ExError};
use cfgdrift_core::parser::ParserRegistry;
use cfgdrift_core::{log_op_end, log_op_error, log_op_start, RuleTable, VendorSchema};
use tracing::debug;

use crate::config::EngineConfig;

/// Everything a comparison looks up, loaded once per batch
#[derive(Debug, Clone)]
pub struct Tables {
    pub registry: ParserRegistry,
    pub rules: RuleTable,
}

impl Tables {
    /// Embedded schemas and rules only
    ///
    /// # Errors
    ///
    /// `ERR_INVALID_SCHEMA_TABLE` if an embedded table fails validation.
    pub fn builtin() -> Result<Self, ExError> {
        Ok(Self {
            registry: ParserRegistry::with_builtin_schemas()?,
            rules: RuleTable::builtin()?,
        })
    }

    /// Embedded tables, overridden by `schema_dir` and `rules_file`.
    ///
    /// Every `*.yaml` / `*.yml` file in `schema_dir` is a vendor schema; a
    /// later file (by name) replaces an earlier one for the same vendor.
    ///
    /// # Errors
    ///
    /// `ERR_INVALID_SCHEMA_TABLE` for an unreadable directory or any invalid
    /// table.
    pub fn load(config: &EngineConfig) -> Result<Self, ExError> {
        let start = Instant::now();
        log_op_start!("load_tables");

        let result = load_inner(config);
        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(tables) => log_op_end!(
                "load_tables",
                duration_ms = duration_ms,
                vendor_count = tables.registry.vendors().count(),
                rule_count = tables.rules.rules().len()
            ),
            Err(err) => log_op_error!("load_tables", err.clone(), duration_ms = duration_ms),
        }
        result
    }
}

fn load_inner(config: &EngineConfig) -> Result<Tables, ExError> {
    let mut tables = Tables::builtin()?;

    if let Some(dir) = &config.schema_dir {
        for file in schema_files(dir)? {
            let schema = VendorSchema::from_file(&file)?;
            let vendor = schema.vendor();
            if tables.registry.register(schema).is_some() {
                debug!(vendor = %vendor, table = %file.display(), "schema table overrides builtin");
            }
        }
    }

    if let Some(file) = &config.rules_file {
        tables.rules = RuleTable::from_file(file)?;
    }

    Ok(tables)
}

fn schema_files(dir: &Path) -> Result<Vec<PathBuf>, ExError> {
    let unreadable = |e: std::io::Error| {
        ExError::from(DriftError::schema_table(
            dir.display().to_string(),
            format!("failed to read schema directory: {}", e),
        ))
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(unreadable)? {
        let path = entry.map_err(unreadable)?.path();
        let is_yaml = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yaml") | Some("yml")
        );
        if is_yaml && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
