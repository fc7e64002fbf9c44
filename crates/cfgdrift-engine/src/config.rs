//! Engine configuration
//!
//! Loaded from a TOML file; every key is optional.
//!
//! ```toml
//! worker_threads = 8
//! verify_rollback = true
//! schema_dir = "/etc/cfgdrift/schemas"
//! rules_file = "/etc/cfgdrift/classification.yaml"
//! log_profile = "production"
//!
//! [limits]
//! max_list_len = 10000
//! on_limit_exceeded = "fallback_unordered"
//! ```

use std::path::{Path, PathBuf};

use cfgdrift_core::config::DiffLimits;
use cfgdrift_core::errors::{ExError, ExErrorKind};
use cfgdrift_core::logging_facility::Profile;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub limits: DiffLimits,
    /// Batch worker count; 0 lets rayon pick one per core
    pub worker_threads: usize,
    pub synthesize_rollback: bool,
    /// Apply each complete plan to the after tree and compare digests
    pub verify_rollback: bool,
    /// Directory of vendor schema tables overriding the embedded ones
    pub schema_dir: Option<PathBuf>,
    pub rules_file: Option<PathBuf>,
    pub log_profile: Profile,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            limits: DiffLimits::default(),
            worker_threads: 0,
            synthesize_rollback: true,
            verify_rollback: true,
            schema_dir: None,
            rules_file: None,
            log_profile: Profile::default(),
        }
    }
}

impl EngineConfig {
    /// Read and validate a TOML file.
    ///
    /// Relative `schema_dir` and `rules_file` entries resolve against the
    /// file's directory.
    ///
    /// # Errors
    ///
    /// `ERR_IO` when the file cannot be read, `ERR_INVALID_CONFIG` when it
    /// is not valid TOML or fails validation.
    pub fn load(path: &Path) -> Result<Self, ExError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ExError::new(ExErrorKind::Io)
                .with_op("load_config")
                .with_message(format!("failed to read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_toml(&content)?;
        if let Some(base) = path.parent() {
            config.schema_dir = config.schema_dir.map(|dir| base.join(dir));
            config.rules_file = config.rules_file.map(|file| base.join(file));
        }
        Ok(config)
    }

    /// # Errors
    ///
    /// `ERR_INVALID_CONFIG` on TOML errors, unknown keys or invalid limits.
    pub fn from_toml(content: &str) -> Result<Self, ExError> {
        let config: EngineConfig = toml::from_str(content).map_err(|e| {
            ExError::new(ExErrorKind::InvalidConfig)
                .with_op("load_config")
                .with_message(e.to_string())
        })?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// `ERR_INVALID_CONFIG` when the diff limits are unusable.
    pub fn validate(&self) -> Result<(), ExError> {
        self.limits
            .validate()
            .map_err(|e| ExError::from(e).with_op("load_config"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfgdrift_core::config::LimitBehavior;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(EngineConfig::from_toml("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_partial_limits_keep_defaults() {
        let config = EngineConfig::from_toml(
            "worker_threads = 2\n[limits]\non_limit_exceeded = \"fallback_unordered\"\n",
        )
        .unwrap();
        assert_eq!(config.worker_threads, 2);
        assert_eq!(config.limits.on_limit_exceeded, LimitBehavior::FallbackUnordered);
        assert_eq!(config.limits.max_depth, DiffLimits::default().max_depth);
        assert!(config.verify_rollback);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = EngineConfig::from_toml("wrker_threads = 2\n").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidConfig);
    }

    #[test]
    fn test_zero_depth_rejected() {
        let err = EngineConfig::from_toml("[limits]\nmax_depth = 0\n").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidConfig);
        assert_eq!(err.op(), Some("load_config"));
    }
}
