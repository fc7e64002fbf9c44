use std::collections::BTreeMap;
use std::time::Instant;

use super::{RollbackOp, RollbackPlan};
use crate::errors::{DriftError, Result};
use crate::model::{ConfigNode, ConfigPath, ConfigTree, NodeBody};
use crate::{log_op_end, log_op_error, log_op_start};

/// Element placed at a fixed index of an ordered list
struct Placement {
    key: String,
    ordinal: usize,
    /// `None` for a reposition of an element already in the list
    node: Option<ConfigNode>,
}

/// Apply a rollback plan to the tree it was synthesized for.
///
/// Removals, replacements and map/set insertions run in plan order. Inserts
/// and repositions addressed to the same ordered list are then placed
/// together: the named elements go to their target ordinals and the other
/// elements fill the remaining slots in their current order.
///
/// # Errors
///
/// Returns `DriftError::ApplyConflict` if the tree is not the plan's target,
/// or an operation does not fit the tree (missing parent, duplicate key,
/// ordinal out of range, ...).
pub fn apply_plan(tree: &ConfigTree, plan: &RollbackPlan) -> Result<ConfigTree> {
    let start = Instant::now();
    log_op_start!("apply_plan", op_count = plan.ops.len());

    match apply_inner(tree, plan) {
        Ok(result) => {
            log_op_end!("apply_plan", duration_ms = start.elapsed().as_millis() as u64);
            Ok(result)
        }
        Err(err) => {
            log_op_error!("apply_plan", err.clone(), duration_ms = start.elapsed().as_millis() as u64);
            Err(err)
        }
    }
}

fn apply_inner(tree: &ConfigTree, plan: &RollbackPlan) -> Result<ConfigTree> {
    let identity = tree.identity()?;
    if identity.vendor != plan.target.vendor || identity.digest != plan.target.digest {
        return Err(conflict(
            &ConfigPath::root(),
            format!(
                "tree {} does not match plan target {}",
                identity.digest, plan.target.digest
            ),
        ));
    }

    let mut root = tree.root().clone();
    let mut placements: BTreeMap<ConfigPath, Vec<Placement>> = BTreeMap::new();

    for op in &plan.ops {
        match op {
            RollbackOp::Remove { path } => remove(&mut root, path)?,
            RollbackOp::Set { path, node } => {
                let target = root
                    .get_mut(path)
                    .ok_or_else(|| conflict(path, "nothing to replace"))?;
                *target = node.clone().with_path(path.clone());
            }
            RollbackOp::Insert {
                path,
                node,
                ordinal,
            } => {
                let (parent_path, key) = split(path)?;
                let parent = root
                    .get_mut(&parent_path)
                    .ok_or_else(|| conflict(path, "parent does not exist"))?;
                let node = node.clone().with_path(path.clone());
                match &mut parent.body {
                    NodeBody::OrderedList(_) => {
                        let ordinal = ordinal
                            .ok_or_else(|| conflict(path, "ordered insert without ordinal"))?;
                        placements.entry(parent_path).or_default().push(Placement {
                            key: key.to_string(),
                            ordinal,
                            node: Some(node),
                        });
                    }
                    NodeBody::UnorderedSet(items) => {
                        if items.iter().any(|c| c.key() == key) {
                            return Err(conflict(path, "element already present"));
                        }
                        items.push(node);
                        items.sort_by(|a, b| a.key().cmp(b.key()));
                    }
                    NodeBody::KeyedMap(map) => {
                        if map.contains_key(key) {
                            return Err(conflict(path, "key already present"));
                        }
                        map.insert(key.to_string(), node);
                    }
                    NodeBody::Scalar(_) => return Err(conflict(path, "parent is a scalar")),
                }
            }
            RollbackOp::Reposition { path, ordinal } => {
                let (parent_path, key) = split(path)?;
                placements.entry(parent_path).or_default().push(Placement {
                    key: key.to_string(),
                    ordinal: *ordinal,
                    node: None,
                });
            }
        }
    }

    for (list_path, list_placements) in placements {
        place(&mut root, &list_path, list_placements)?;
    }

    Ok(ConfigTree::new(tree.vendor(), tree.captured_at(), root))
}

fn conflict(path: &ConfigPath, reason: impl Into<String>) -> DriftError {
    DriftError::ApplyConflict {
        path: path.clone(),
        reason: reason.into(),
    }
}

fn split(path: &ConfigPath) -> Result<(ConfigPath, &str)> {
    match (path.parent(), path.last()) {
        (Some(parent), Some(key)) => Ok((parent, key)),
        _ => Err(conflict(path, "the root has no parent")),
    }
}

fn remove(root: &mut ConfigNode, path: &ConfigPath) -> Result<()> {
    let (parent_path, key) = split(path)?;
    let parent = root
        .get_mut(&parent_path)
        .ok_or_else(|| conflict(path, "parent does not exist"))?;
    let removed = match &mut parent.body {
        NodeBody::OrderedList(items) | NodeBody::UnorderedSet(items) => {
            match items.iter().position(|c| c.key() == key) {
                Some(idx) => {
                    items.remove(idx);
                    true
                }
                None => false,
            }
        }
        NodeBody::KeyedMap(map) => map.remove(key).is_some(),
        NodeBody::Scalar(_) => false,
    };
    if removed {
        Ok(())
    } else {
        Err(conflict(path, "nothing to remove"))
    }
}

/// Rebuild one ordered list with the given elements at fixed indices
fn place(root: &mut ConfigNode, list_path: &ConfigPath, placements: Vec<Placement>) -> Result<()> {
    let list = root
        .get_mut(list_path)
        .ok_or_else(|| conflict(list_path, "list does not exist"))?;
    let NodeBody::OrderedList(items) = &mut list.body else {
        return Err(conflict(list_path, "repositioning requires an ordered list"));
    };

    let mut fixed: Vec<(usize, ConfigNode)> = Vec::with_capacity(placements.len());
    for placement in placements {
        let element_path = list_path.child(placement.key.as_str());
        let position = items.iter().position(|c| c.key() == placement.key);
        let node = match (placement.node, position) {
            (Some(node), None) => node,
            (None, Some(idx)) => items.remove(idx),
            (Some(_), Some(_)) => return Err(conflict(&element_path, "element already present")),
            (None, None) => return Err(conflict(&element_path, "element to reposition is missing")),
        };
        fixed.push((placement.ordinal, node));
    }
    fixed.sort_by_key(|(ordinal, _)| *ordinal);

    let total = items.len() + fixed.len();
    let mut slots: Vec<Option<ConfigNode>> = vec![None; total];
    for (ordinal, node) in fixed {
        let Some(slot) = slots.get_mut(ordinal) else {
            return Err(conflict(
                &node.path,
                format!("ordinal {} beyond list of {} elements", ordinal, total),
            ));
        };
        if slot.is_some() {
            return Err(conflict(&node.path, format!("ordinal {} placed twice", ordinal)));
        }
        *slot = Some(node);
    }

    let mut rest = std::mem::take(items).into_iter();
    *items = slots
        .into_iter()
        .filter_map(|slot| slot.or_else(|| rest.next()))
        .collect();
    Ok(())
}
