//! Structural diff between two normalized trees.
//!
//! The entry point is [`diff_with_limits`] (or [`diff`] with default limits).
//! Traversal uses an explicit work stack of frames instead of recursion, so
//! stack usage is constant and the depth limit is a plain check.
//!
//! ## Output order
//!
//! Entries follow a pre-order walk of the overlay of both trees:
//! - keyed maps and unordered sets: children in ascending key order
//! - ordered lists: the edit script order. Removed elements come before the
//!   elements inserted at the same gap; moved elements appear at their new
//!   position.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::Instant;

use super::lcs;
use crate::config::{DiffLimits, LimitBehavior};
use crate::errors::{DriftError, Result};
use crate::model::{ConfigNode, ConfigTree, DeltaEntry, DeltaResult, NodeBody};
use crate::{log_op_end, log_op_error, log_op_start};

enum Frame<'a> {
    Emit(DeltaEntry),
    Compare {
        before: &'a ConfigNode,
        after: &'a ConfigNode,
    },
}

/// Diff with [`DiffLimits::default`].
///
/// # Errors
///
/// See [`diff_with_limits`].
pub fn diff(before: &ConfigTree, after: &ConfigTree) -> Result<DeltaResult> {
    diff_with_limits(before, after, &DiffLimits::default())
}

/// Compute the delta that turns `before` into `after`.
///
/// # Errors
///
/// - `IncompatibleTrees` if the vendors differ (no partial result)
/// - `DepthExceeded` if differing content sits deeper than `limits.max_depth`
/// - `ListLimitExceeded` if an ordered list is too large to align and
///   `limits.on_limit_exceeded` is `return_error`
/// - `InvalidConfig` if the limits themselves are invalid
pub fn diff_with_limits(
    before: &ConfigTree,
    after: &ConfigTree,
    limits: &DiffLimits,
) -> Result<DeltaResult> {
    let start = Instant::now();
    log_op_start!("diff", vendor = %after.vendor());

    match run(before, after, limits) {
        Ok(result) => {
            log_op_end!(
                "diff",
                duration_ms = start.elapsed().as_millis() as u64,
                entry_count = result.entries.len()
            );
            Ok(result)
        }
        Err(err) => {
            log_op_error!("diff", err.clone(), duration_ms = start.elapsed().as_millis() as u64);
            Err(err)
        }
    }
}

fn run(before: &ConfigTree, after: &ConfigTree, limits: &DiffLimits) -> Result<DeltaResult> {
    if before.vendor() != after.vendor() {
        return Err(DriftError::IncompatibleTrees {
            before: before.vendor(),
            after: after.vendor(),
        });
    }
    limits.validate()?;

    let entries = diff_nodes(before.root(), after.root(), limits)?;
    Ok(DeltaResult {
        before: before.identity()?,
        after: after.identity()?,
        entries,
    })
}

/// Diff two subtrees rooted at the same path
pub(crate) fn diff_nodes(
    before: &ConfigNode,
    after: &ConfigNode,
    limits: &DiffLimits,
) -> Result<Vec<DeltaEntry>> {
    let mut entries = Vec::new();
    let mut stack = vec![Frame::Compare { before, after }];

    while let Some(frame) = stack.pop() {
        let (before, after) = match frame {
            Frame::Emit(entry) => {
                entries.push(entry);
                continue;
            }
            Frame::Compare { before, after } => (before, after),
        };

        if before == after {
            continue;
        }
        if after.path.depth() > limits.max_depth {
            return Err(DriftError::DepthExceeded {
                path: after.path.clone(),
                limit: limits.max_depth,
            });
        }

        let frames = match (&before.body, &after.body) {
            (NodeBody::Scalar(_), NodeBody::Scalar(_)) => {
                vec![Frame::Emit(DeltaEntry::modified(before.clone(), after.clone()))]
            }
            (NodeBody::KeyedMap(_), NodeBody::KeyedMap(_))
            | (NodeBody::UnorderedSet(_), NodeBody::UnorderedSet(_)) => keyed_frames(before, after),
            (NodeBody::OrderedList(old), NodeBody::OrderedList(new)) => {
                ordered_frames(before, old, new, limits)?
            }
            _ => vec![Frame::Emit(DeltaEntry::modified(before.clone(), after.clone()))],
        };
        stack.extend(frames.into_iter().rev());
    }

    Ok(entries)
}

/// Children matched by key; position is irrelevant
fn keyed_frames<'a>(before: &'a ConfigNode, after: &'a ConfigNode) -> Vec<Frame<'a>> {
    let by_key = |node: &'a ConfigNode| {
        let mut map: BTreeMap<&'a str, &'a ConfigNode> = BTreeMap::new();
        for child in node.children() {
            map.entry(child.key()).or_insert(child);
        }
        map
    };
    let old = by_key(before);
    let mut new = by_key(after);

    let mut union: BTreeMap<&'a str, (Option<&'a ConfigNode>, Option<&'a ConfigNode>)> =
        BTreeMap::new();
    for (key, child) in old {
        union.insert(key, (Some(child), new.remove(key)));
    }
    for (key, child) in new {
        union.insert(key, (None, Some(child)));
    }

    union
        .into_values()
        .filter_map(|pair| match pair {
            (Some(b), Some(a)) => Some(Frame::Compare { before: b, after: a }),
            (Some(b), None) => Some(Frame::Emit(DeltaEntry::removed(b.clone(), None))),
            (None, Some(a)) => Some(Frame::Emit(DeltaEntry::added(a.clone(), None))),
            (None, None) => None,
        })
        .collect()
}

fn ordered_frames<'a>(
    before: &'a ConfigNode,
    old: &'a [ConfigNode],
    new: &'a [ConfigNode],
    limits: &DiffLimits,
) -> Result<Vec<Frame<'a>>> {
    let old_keys: Vec<&str> = old.iter().map(ConfigNode::key).collect();
    let new_keys: Vec<&str> = new.iter().map(ConfigNode::key).collect();

    let longest = old.len().max(new.len());
    let matches = if longest > limits.max_list_len {
        None
    } else {
        lcs::align(&old_keys, &new_keys, limits.lcs_work_limit)
    };

    let Some(matches) = matches else {
        return match limits.on_limit_exceeded {
            LimitBehavior::ReturnError => Err(DriftError::ListLimitExceeded {
                path: before.path.clone(),
                before_len: old.len(),
                after_len: new.len(),
                limit: if longest > limits.max_list_len {
                    limits.max_list_len
                } else {
                    limits.lcs_work_limit
                },
            }),
            LimitBehavior::FallbackUnordered => {
                tracing::warn!(
                    path = %before.path,
                    before_len = old.len(),
                    after_len = new.len(),
                    "ordered list exceeds alignment limits, comparing as unordered set"
                );
                Ok(unordered_fallback(old, new))
            }
        };
    };

    let mut old_matched = vec![false; old.len()];
    let mut new_matched = vec![false; new.len()];
    for &(i, j) in &matches {
        old_matched[i] = true;
        new_matched[j] = true;
    }

    // Same key on both sides but outside the common subsequence: a move
    let mut unmatched_old: HashMap<&str, VecDeque<usize>> = HashMap::new();
    for (i, key) in old_keys.iter().enumerate() {
        if !old_matched[i] {
            unmatched_old.entry(*key).or_default().push_back(i);
        }
    }
    let mut moved_from: Vec<Option<usize>> = vec![None; new.len()];
    let mut old_moved = vec![false; old.len()];
    for (j, key) in new_keys.iter().enumerate() {
        if new_matched[j] {
            continue;
        }
        if let Some(i) = unmatched_old.get_mut(key).and_then(VecDeque::pop_front) {
            moved_from[j] = Some(i);
            old_moved[i] = true;
        }
    }

    let mut frames = Vec::new();
    let (mut i, mut j) = (0usize, 0usize);
    let anchors = matches
        .iter()
        .copied()
        .chain(std::iter::once((old.len(), new.len())));
    for (anchor_i, anchor_j) in anchors {
        for (k, node) in old.iter().enumerate().take(anchor_i).skip(i) {
            if !old_moved[k] {
                frames.push(Frame::Emit(DeltaEntry::removed(node.clone(), Some(k))));
            }
        }
        for (k, node) in new.iter().enumerate().take(anchor_j).skip(j) {
            match moved_from[k] {
                Some(from) => {
                    frames.push(Frame::Emit(DeltaEntry::moved(node.path.clone(), from, k)));
                    frames.push(Frame::Compare {
                        before: &old[from],
                        after: node,
                    });
                }
                None => frames.push(Frame::Emit(DeltaEntry::added(node.clone(), Some(k)))),
            }
        }
        if anchor_i < old.len() && anchor_j < new.len() {
            frames.push(Frame::Compare {
                before: &old[anchor_i],
                after: &new[anchor_j],
            });
        }
        i = anchor_i + 1;
        j = anchor_j + 1;
    }

    Ok(frames)
}

/// Match list elements by key only (no Moved entries)
fn unordered_fallback<'a>(old: &'a [ConfigNode], new: &'a [ConfigNode]) -> Vec<Frame<'a>> {
    let mut remaining: HashMap<&str, VecDeque<&'a ConfigNode>> = HashMap::new();
    for node in old {
        remaining.entry(node.key()).or_default().push_back(node);
    }

    let mut frames = Vec::new();
    for (k, node) in new.iter().enumerate() {
        match remaining.get_mut(node.key()).and_then(VecDeque::pop_front) {
            Some(prev) => frames.push(Frame::Compare {
                before: prev,
                after: node,
            }),
            None => frames.push(Frame::Emit(DeltaEntry::added(node.clone(), Some(k)))),
        }
    }
    for (k, node) in old.iter().enumerate() {
        if let Some(queue) = remaining.get_mut(node.key()) {
            if queue.front().is_some_and(|n| std::ptr::eq(*n, node)) {
                queue.pop_front();
                frames.push(Frame::Emit(DeltaEntry::removed(node.clone(), Some(k))));
            }
        }
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConfigPath, DeltaOp};

    fn leaf(key: &str) -> ConfigNode {
        ConfigNode::scalar(ConfigPath::from_segments([key]), key)
    }

    fn list(keys: &[&str]) -> ConfigNode {
        ConfigNode::ordered_list(ConfigPath::root(), keys.iter().map(|k| leaf(k)))
    }

    fn ops(entries: &[DeltaEntry]) -> Vec<(DeltaOp, String)> {
        entries
            .iter()
            .map(|e| (e.op, e.path.last().unwrap_or("").to_string()))
            .collect()
    }

    #[test]
    fn test_removed_before_added_in_same_gap() {
        let entries =
            diff_nodes(&list(&["a", "x", "c"]), &list(&["a", "y", "c"]), &DiffLimits::default())
                .unwrap();
        assert_eq!(
            ops(&entries),
            vec![(DeltaOp::Removed, "x".into()), (DeltaOp::Added, "y".into())]
        );
        assert_eq!(entries[0].old_position, Some(1));
        assert_eq!(entries[1].new_position, Some(1));
    }

    #[test]
    fn test_rotation_yields_single_move() {
        let entries =
            diff_nodes(&list(&["a", "b", "c"]), &list(&["b", "c", "a"]), &DiffLimits::default())
                .unwrap();
        assert_eq!(ops(&entries), vec![(DeltaOp::Moved, "a".into())]);
        assert_eq!(entries[0].old_position, Some(0));
        assert_eq!(entries[0].new_position, Some(2));
    }

    #[test]
    fn test_fallback_unordered_drops_moves() {
        let limits = DiffLimits::default()
            .with_max_list_len(2)
            .with_on_limit_exceeded(LimitBehavior::FallbackUnordered);
        let entries =
            diff_nodes(&list(&["a", "b", "c"]), &list(&["c", "b", "d"]), &limits).unwrap();
        assert_eq!(
            ops(&entries),
            vec![(DeltaOp::Added, "d".into()), (DeltaOp::Removed, "a".into())]
        );
    }

    #[test]
    fn test_list_limit_error() {
        let limits = DiffLimits::default().with_lcs_work_limit(4);
        let err = diff_nodes(&list(&["a", "b", "c"]), &list(&["c", "b", "a"]), &limits).unwrap_err();
        assert!(matches!(
            err,
            DriftError::ListLimitExceeded { before_len: 3, after_len: 3, limit: 4, .. }
        ));
    }
}
