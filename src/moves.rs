//! Move Executor
//!
//! Applies a finished drag (active id dropped on over id) to the computed
//! tree. Five cases, decided purely from the shape of the two ids:
//!
//! 1. child -> sibling child of the same group: reorder inside the group
//! 2. child -> dropzone of another group: append to that group
//! 3. child -> root id: insert into the root list at the target's index
//! 4. root item -> dropzone: append to the group
//! 5. root id -> root id: reorder the root list (groups included)
//!
//! Anything outside the touched region is left exactly as it was.
//! No-ops return `None` so callers keep their tree untouched.

use log::{debug, info, warn};

use crate::identity::{NodeRef, RootId, SortableId};
use crate::models::{ComputedTree, Entry};
use crate::tree::{child_index, group_index, root_index};

/// A resolved move, before it touches any tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovePlan {
    WithinGroup {
        group_id: String,
        from: NodeRef,
        to: NodeRef,
    },
    BetweenGroups {
        from_group: String,
        node: NodeRef,
        to_group: String,
    },
    GroupToRoot {
        from_group: String,
        node: NodeRef,
        target: RootId,
    },
    RootToGroup {
        node: NodeRef,
        to_group: String,
    },
    Root {
        from: RootId,
        to: RootId,
    },
}

/// Classify a drop. `None` for self-drops, missing targets, malformed ids
/// and combinations with no meaning (a group into a group, a child onto a
/// child of a different group, a child onto its own group's dropzone).
pub fn plan_move(active_id: &str, over_id: Option<&str>) -> Option<MovePlan> {
    let over_id = over_id?;
    if active_id == over_id {
        return None;
    }
    let active = SortableId::parse(active_id)?;
    let over = SortableId::parse(over_id)?;

    match (active, over) {
        (SortableId::Child(a), SortableId::Child(o)) if a.group_id == o.group_id => {
            Some(MovePlan::WithinGroup {
                group_id: a.group_id,
                from: a.node,
                to: o.node,
            })
        }
        (SortableId::Child(a), SortableId::Dropzone(to_group)) if a.group_id != to_group => {
            Some(MovePlan::BetweenGroups {
                from_group: a.group_id,
                node: a.node,
                to_group,
            })
        }
        (SortableId::Child(a), SortableId::Root(target)) => Some(MovePlan::GroupToRoot {
            from_group: a.group_id,
            node: a.node,
            target,
        }),
        (SortableId::Root(RootId::Node(node)), SortableId::Dropzone(to_group)) => {
            Some(MovePlan::RootToGroup { node, to_group })
        }
        (SortableId::Root(from), SortableId::Root(to)) => Some(MovePlan::Root { from, to }),
        _ => None,
    }
}

/// Plan and execute in one step
pub fn apply_move(tree: &ComputedTree, active_id: &str, over_id: Option<&str>) -> Option<ComputedTree> {
    let plan = plan_move(active_id, over_id)?;
    let next = execute(tree, &plan);
    match &next {
        Some(_) => info!("[MOVE] {} -> {:?}", active_id, plan),
        None => debug!("[MOVE] {} -> {:?} did not resolve, ignoring", active_id, plan),
    }
    next
}

/// Execute a plan on a copy of the tree. `None` if a referenced node is
/// no longer present.
pub fn execute(tree: &ComputedTree, plan: &MovePlan) -> Option<ComputedTree> {
    match plan {
        MovePlan::WithinGroup { group_id, from, to } => {
            let g = group_index(tree, group_id)?;
            let group = tree[g].as_group()?;
            let from_idx = child_index(group, from)?;
            let to_idx = child_index(group, to)?;

            let mut next = tree.clone();
            let children = &mut next[g].as_group_mut()?.children;
            array_move(children, from_idx, to_idx);
            Some(next)
        }

        MovePlan::BetweenGroups {
            from_group,
            node,
            to_group,
        } => {
            let s = group_index(tree, from_group)?;
            let t = group_index(tree, to_group)?;
            let from_idx = child_index(tree[s].as_group()?, node)?;

            let mut next = tree.clone();
            let child = next[s].as_group_mut()?.children.remove(from_idx);
            // Dropzones carry no position: always append
            next[t].as_group_mut()?.children.push(child);
            Some(next)
        }

        MovePlan::GroupToRoot {
            from_group,
            node,
            target,
        } => {
            let s = group_index(tree, from_group)?;
            let from_idx = child_index(tree[s].as_group()?, node)?;

            let mut next = tree.clone();
            let child = next[s].as_group_mut()?.children.remove(from_idx);
            match root_index(&next, target) {
                Some(at) => next.insert(at, Entry::from(child)),
                None => {
                    // Target vanished between hit-test and drop
                    warn!("[MOVE] Root target {} not found, appending", target);
                    next.push(Entry::from(child));
                }
            }
            Some(next)
        }

        MovePlan::RootToGroup { node, to_group } => {
            let from_idx = root_index(tree, &RootId::Node(node.clone()))?;
            let mut to_idx = group_index(tree, to_group)?;

            let mut next = tree.clone();
            let child = next.remove(from_idx).into_child().ok()?;
            if from_idx < to_idx {
                to_idx -= 1;
            }
            next[to_idx].as_group_mut()?.children.push(child);
            Some(next)
        }

        MovePlan::Root { from, to } => {
            let from_idx = root_index(tree, from)?;
            let to_idx = root_index(tree, to)?;

            let mut next = tree.clone();
            array_move(&mut next, from_idx, to_idx);
            Some(next)
        }
    }
}

/// Remove at `from`, reinsert at `to`
fn array_move<T>(items: &mut Vec<T>, from: usize, to: usize) {
    let item = items.remove(from);
    items.insert(to, item);
}
