//! Delta output types.
//!
//! All types implement `Debug, Clone, Serialize, Deserialize, PartialEq`.
//! Counters use `BTreeMap` for deterministic serialization.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::node::ConfigNode;
use super::path::ConfigPath;
use super::tree::TreeIdentity;

/// Kind of change a delta entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaOp {
    Added,
    Removed,
    Modified,
    /// Same element, different ordinal inside an ordered list
    Moved,
}

impl fmt::Display for DeltaOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeltaOp::Added => "added",
            DeltaOp::Removed => "removed",
            DeltaOp::Modified => "modified",
            DeltaOp::Moved => "moved",
        };
        f.write_str(name)
    }
}

/// Semantic category assigned by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Not yet seen by the classifier
    Unclassified,
    SecurityImpacting,
    Cosmetic,
    Structural,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Classification::Unclassified => "unclassified",
            Classification::SecurityImpacting => "security_impacting",
            Classification::Cosmetic => "cosmetic",
            Classification::Structural => "structural",
        };
        f.write_str(name)
    }
}

/// One atomic change between two trees.
///
/// `old_value` is the subtree from `before`, `new_value` the one from `after`:
///
/// | op       | old_value | new_value |
/// |----------|-----------|-----------|
/// | Added    | -         | yes       |
/// | Removed  | yes       | -         |
/// | Modified | yes       | yes       |
/// | Moved    | -         | -         |
///
/// Positions are only set for elements of ordered lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaEntry {
    pub path: ConfigPath,
    pub op: DeltaOp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<ConfigNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<ConfigNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_position: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_position: Option<usize>,
    pub classification: Classification,
}

impl DeltaEntry {
    pub fn added(node: ConfigNode, position: Option<usize>) -> Self {
        Self {
            path: node.path.clone(),
            op: DeltaOp::Added,
            old_value: None,
            new_value: Some(node),
            old_position: None,
            new_position: position,
            classification: Classification::Unclassified,
        }
    }

    pub fn removed(node: ConfigNode, position: Option<usize>) -> Self {
        Self {
            path: node.path.clone(),
            op: DeltaOp::Removed,
            old_value: Some(node),
            new_value: None,
            old_position: position,
            new_position: None,
            classification: Classification::Unclassified,
        }
    }

    pub fn modified(before: ConfigNode, after: ConfigNode) -> Self {
        Self {
            path: after.path.clone(),
            op: DeltaOp::Modified,
            old_value: Some(before),
            new_value: Some(after),
            old_position: None,
            new_position: None,
            classification: Classification::Unclassified,
        }
    }

    pub fn moved(path: ConfigPath, old_position: usize, new_position: usize) -> Self {
        Self {
            path,
            op: DeltaOp::Moved,
            old_value: None,
            new_value: None,
            old_position: Some(old_position),
            new_position: Some(new_position),
            classification: Classification::Unclassified,
        }
    }

    /// Kind changed between the two sides (scalar became a block, ...)
    pub fn changes_kind(&self) -> bool {
        match (&self.old_value, &self.new_value) {
            (Some(old), Some(new)) => old.kind() != new.kind(),
            _ => false,
        }
    }
}

/// Result of one diff invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaResult {
    pub before: TreeIdentity,
    pub after: TreeIdentity,
    pub entries: Vec<DeltaEntry>,
}

impl DeltaResult {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn summary(&self) -> DeltaSummary {
        let mut summary = DeltaSummary {
            total: self.entries.len(),
            ..DeltaSummary::default()
        };
        for entry in &self.entries {
            *summary.by_op.entry(entry.op).or_insert(0) += 1;
            *summary
                .by_classification
                .entry(entry.classification)
                .or_insert(0) += 1;
        }
        summary
    }
}

/// Entry counts of a delta result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaSummary {
    pub total: usize,
    pub by_op: BTreeMap<DeltaOp, usize>,
    pub by_classification: BTreeMap<Classification, usize>,
}

impl DeltaSummary {
    pub fn count(&self, op: DeltaOp) -> usize {
        self.by_op.get(&op).copied().unwrap_or(0)
    }

    pub fn security_impacting(&self) -> usize {
        self.by_classification
            .get(&Classification::SecurityImpacting)
            .copied()
            .unwrap_or(0)
    }
}
