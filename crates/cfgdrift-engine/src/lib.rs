//! cfgdrift engine - orchestration layer
//!
//! Loads configuration and tables, then drives the core parse / diff /
//! classify / rollback operations per device and across batches.

pub mod batch;
pub mod config;
pub mod pipeline;
pub mod tables;

pub use batch::{run_batch, BatchReport, DeviceJob, RawBackup};
pub use config::EngineConfig;
pub use pipeline::{Comparison, DeviceOutcome, DeviceStatus, Pipeline, Stage};
pub use tables::Tables;
