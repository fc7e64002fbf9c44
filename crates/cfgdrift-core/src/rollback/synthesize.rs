use std::time::Instant;

use super::{RollbackOp, RollbackPlan, UnsynthesizableEntry};
use crate::errors::DriftError;
use crate::model::{DeltaEntry, DeltaOp, DeltaResult};
use crate::{log_op_end, log_op_start};

/// Invert a delta.
///
/// - Added -> `Remove`
/// - Removed -> `Insert` of the old subtree at its old ordinal
/// - Modified -> `Set` to the old subtree
/// - Moved -> `Reposition` to the old ordinal
///
/// A modification that changed the node kind has no generic inverse and is
/// listed in `unsynthesizable`; every other entry still gets its operation.
///
/// Operations are ordered parent first (by path depth), then grouped by parent
/// with list placements in ascending target ordinal. Sorting is stable, so
/// siblings without ordinals keep delta order.
pub fn synthesize(delta: &DeltaResult) -> RollbackPlan {
    let start = Instant::now();
    log_op_start!("synthesize", entry_count = delta.entries.len());

    let mut ops = Vec::with_capacity(delta.entries.len());
    let mut unsynthesizable = Vec::new();

    for entry in &delta.entries {
        match invert(entry) {
            Ok(op) => ops.push(op),
            Err(DriftError::Unsynthesizable { path, reason }) => {
                tracing::debug!(path = %path, reason = %reason, "entry has no generic inverse");
                unsynthesizable.push(UnsynthesizableEntry { path, reason });
            }
            Err(other) => unsynthesizable.push(UnsynthesizableEntry {
                path: entry.path.clone(),
                reason: other.to_string(),
            }),
        }
    }

    ops.sort_by(|a, b| {
        let (pa, pb) = (a.path(), b.path());
        pa.depth()
            .cmp(&pb.depth())
            .then_with(|| pa.parent().cmp(&pb.parent()))
            .then_with(|| a.ordinal().cmp(&b.ordinal()))
    });

    log_op_end!(
        "synthesize",
        duration_ms = start.elapsed().as_millis() as u64,
        op_count = ops.len(),
        unsynthesizable = unsynthesizable.len()
    );

    RollbackPlan {
        source: delta.before.clone(),
        target: delta.after.clone(),
        ops,
        unsynthesizable,
    }
}

/// Inverse operation of a single entry
///
/// # Errors
///
/// Returns `DriftError::Unsynthesizable` for kind-changing modifications and
/// for entries missing the value or position their inverse needs.
pub fn invert(entry: &DeltaEntry) -> Result<RollbackOp, DriftError> {
    let missing = |what: &str| DriftError::Unsynthesizable {
        path: entry.path.clone(),
        reason: format!("{} entry carries no {}", entry.op, what),
    };

    match entry.op {
        DeltaOp::Added => Ok(RollbackOp::Remove {
            path: entry.path.clone(),
        }),
        DeltaOp::Removed => {
            let node = entry.old_value.clone().ok_or_else(|| missing("old value"))?;
            Ok(RollbackOp::Insert {
                path: entry.path.clone(),
                node,
                ordinal: entry.old_position,
            })
        }
        DeltaOp::Modified => {
            if entry.changes_kind() {
                let (old, new) = match (&entry.old_value, &entry.new_value) {
                    (Some(old), Some(new)) => (old.kind(), new.kind()),
                    _ => return Err(missing("old or new value")),
                };
                return Err(DriftError::Unsynthesizable {
                    path: entry.path.clone(),
                    reason: format!("node kind changed from {} to {}", old, new),
                });
            }
            let node = entry.old_value.clone().ok_or_else(|| missing("old value"))?;
            Ok(RollbackOp::Set {
                path: entry.path.clone(),
                node,
            })
        }
        DeltaOp::Moved => {
            let ordinal = entry.old_position.ok_or_else(|| missing("old position"))?;
            Ok(RollbackOp::Reposition {
                path: entry.path.clone(),
                ordinal,
            })
        }
    }
}
