//! cfgdrift core - semantic configuration diff kernel
//!
//! This crate turns raw network-device configuration backups into a
//! vendor-neutral tree model and compares them:
//! - Normalized tree model (scalars, ordered lists, unordered sets, keyed maps)
//! - Per-vendor parsers driven by versioned schema tables
//! - Deterministic structural diff with LCS alignment of ordered lists
//! - Rule-table change classification
//! - Rollback plan synthesis and application
//!
//! Everything here is a pure transformation over in-memory values. Fetching
//! backups, scheduling and reporting belong to the calling layers.

pub mod classify;
pub mod config;
pub mod diff;
pub mod digest;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod parser;
pub mod rollback;
pub mod schema;

// Re-export commonly used types
pub use classify::{classify, classify_all, ClassifyContext, RuleTable};
pub use config::{DiffLimits, LimitBehavior};
pub use diff::{diff, diff_with_limits};
pub use errors::{DriftError, ExError, ExErrorKind, Result};
pub use model::{
    Classification, ConfigNode, ConfigPath, ConfigTree, DeltaEntry, DeltaOp, DeltaResult,
    NodeKind, TreeIdentity, VendorTag,
};
pub use parser::{parse, ParseOptions, ParserRegistry, VendorParser};
pub use rollback::{apply_plan, synthesize, RollbackOp, RollbackPlan, UnsynthesizableEntry};
pub use schema::VendorSchema;
