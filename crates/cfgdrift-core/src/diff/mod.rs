//! Tree diff engine.
//!
//! Compares two normalized trees of the same vendor and produces a flat,
//! deterministic list of [`DeltaEntry`](crate::model::DeltaEntry) values.
//!
//! ## Entry point
//!
//! ```ignore
//! use cfgdrift_core::diff::diff;
//!
//! let delta = diff(&before, &after)?;
//! for entry in &delta.entries {
//!     println!("{} {}", entry.op, entry.path);
//! }
//! ```
//!
//! ## Guarantees
//!
//! - **Idempotence**: `diff(t, t)` is empty for every tree.
//! - **Determinism**: the same inputs give the same entries in the same order.
//! - **Minimality**: one entry per changed node; unchanged siblings and
//!   identical subtrees produce nothing.
//! - **Per-kind semantics**: ordered lists are aligned by an LCS over element
//!   keys (elements outside the common subsequence but present on both sides
//!   are reported as `Moved`); unordered sets and keyed maps are matched by
//!   key only.

pub mod engine;
pub(crate) mod lcs;

pub use engine::{diff, diff_with_limits};
