//! Rollback plans.
//!
//! [`synthesize`] inverts a [`DeltaResult`](crate::model::DeltaResult) into a
//! [`RollbackPlan`] expressed in the normalized model; rendering the plan as
//! vendor commands happens outside this crate. [`apply_plan`] executes a plan
//! against the `after` tree, which is how the inverse law is checked.

pub mod apply;
pub mod synthesize;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::DriftError;
use crate::model::{ConfigNode, ConfigPath, TreeIdentity};

pub use apply::apply_plan;
pub use synthesize::synthesize;

/// One inverse operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RollbackOp {
    /// Delete the node at `path` (reverts an addition)
    Remove { path: ConfigPath },
    /// Restore a removed node; `ordinal` is its index in an ordered list
    Insert {
        path: ConfigPath,
        node: ConfigNode,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ordinal: Option<usize>,
    },
    /// Replace the node at `path` with its previous value
    Set { path: ConfigPath, node: ConfigNode },
    /// Move a list element back to its previous index
    Reposition { path: ConfigPath, ordinal: usize },
}

impl RollbackOp {
    pub fn path(&self) -> &ConfigPath {
        match self {
            RollbackOp::Remove { path }
            | RollbackOp::Insert { path, .. }
            | RollbackOp::Set { path, .. }
            | RollbackOp::Reposition { path, .. } => path,
        }
    }

    /// Target index inside an ordered list, if the operation places an element
    pub fn ordinal(&self) -> Option<usize> {
        match self {
            RollbackOp::Insert { ordinal, .. } => *ordinal,
            RollbackOp::Reposition { ordinal, .. } => Some(*ordinal),
            RollbackOp::Remove { .. } | RollbackOp::Set { .. } => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RollbackOp::Remove { .. } => "remove",
            RollbackOp::Insert { .. } => "insert",
            RollbackOp::Set { .. } => "set",
            RollbackOp::Reposition { .. } => "reposition",
        }
    }
}

impl fmt::Display for RollbackOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ordinal() {
            Some(ordinal) => write!(f, "{} {} @{}", self.name(), self.path(), ordinal),
            None => write!(f, "{} {}", self.name(), self.path()),
        }
    }
}

/// A delta entry with no generic inverse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsynthesizableEntry {
    pub path: ConfigPath,
    pub reason: String,
}

impl UnsynthesizableEntry {
    pub fn to_error(&self) -> DriftError {
        DriftError::Unsynthesizable {
            path: self.path.clone(),
            reason: self.reason.clone(),
        }
    }
}

/// Inverse of one delta.
///
/// `target` identifies the tree the plan is applied to (the `after` side of
/// the delta), `source` the tree it restores (the `before` side).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackPlan {
    pub source: TreeIdentity,
    pub target: TreeIdentity,
    pub ops: Vec<RollbackOp>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unsynthesizable: Vec<UnsynthesizableEntry>,
}

impl RollbackPlan {
    /// Every entry of the delta has an inverse operation
    pub fn is_complete(&self) -> bool {
        self.unsynthesizable.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty() && self.unsynthesizable.is_empty()
    }
}
