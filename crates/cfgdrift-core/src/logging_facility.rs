//! Structured logging facility
//!
//! - Single initialization point via `init(profile)`
//! - Operation macros (`log_op_start!`, `log_op_end!`, `log_op_error!`) that
//!   stamp every event with `component`, `op` and `event`
//! - Test capture mode for deterministic assertions
//!
//! Raw configuration text is never logged. Parsers log sizes and offsets,
//! the diff engine logs paths and counts.
//!
//! # Usage
//!
//! ```rust
//! use cfgdrift_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
