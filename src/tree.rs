//! Tree Utilities
//!
//! Conversion between the minimal and computed forms, plus lookups shared
//! by the move executor and sidebar edits.

use std::collections::{BTreeSet, HashMap};

use log::debug;

use crate::identity::{self, NodeRef, RootId};
use crate::models::{
    BuiltinKey, ChildEntry, ComputedTree, Entry, Group, MinimalChild, MinimalEntry, MinimalTree,
    Reference, ReferenceInfo,
};

/// Read-only collaborator data: reference id -> name and content types
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    references: HashMap<String, ReferenceInfo>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, info: ReferenceInfo) {
        self.references.insert(id.into(), info);
    }

    pub fn with(mut self, id: impl Into<String>, info: ReferenceInfo) -> Self {
        self.insert(id, info);
        self
    }

    pub fn get(&self, id: &str) -> Option<&ReferenceInfo> {
        self.references.get(id)
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}

impl FromIterator<(String, ReferenceInfo)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (String, ReferenceInfo)>>(iter: I) -> Self {
        Self {
            references: iter.into_iter().collect(),
        }
    }
}

// ========================
// Representation conversion
// ========================

/// Strip display fields, keeping order at both levels
pub fn to_minimal(tree: &ComputedTree) -> MinimalTree {
    tree.iter()
        .map(|entry| match entry {
            Entry::Builtin { key } => MinimalEntry::Builtin { key: *key },
            Entry::Reference(reference) => MinimalEntry::Reference {
                id: reference.id.clone(),
            },
            Entry::Group(group) => MinimalEntry::Group {
                id: group.id.clone(),
                name: group.name.clone(),
                children: group.children.iter().map(child_to_minimal).collect(),
            },
        })
        .collect()
}

fn child_to_minimal(child: &ChildEntry) -> MinimalChild {
    match child {
        ChildEntry::Builtin { key } => MinimalChild::Builtin { key: *key },
        ChildEntry::Reference(reference) => MinimalChild::Reference {
            id: reference.id.clone(),
        },
    }
}

/// Join against the snapshot. References whose object is gone are dropped;
/// the next full load reconciles them.
pub fn to_computed(tree: &MinimalTree, snapshot: &Snapshot) -> ComputedTree {
    tree.iter()
        .filter_map(|entry| match entry {
            MinimalEntry::Builtin { key } => Some(Entry::Builtin { key: *key }),
            MinimalEntry::Reference { id } => join(id, snapshot).map(Entry::Reference),
            MinimalEntry::Group { id, name, children } => Some(Entry::Group(Group {
                id: id.clone(),
                name: name.clone(),
                children: children
                    .iter()
                    .filter_map(|child| match child {
                        MinimalChild::Builtin { key } => Some(ChildEntry::Builtin { key: *key }),
                        MinimalChild::Reference { id } => join(id, snapshot).map(ChildEntry::Reference),
                    })
                    .collect(),
            })),
        })
        .collect()
}

fn join(id: &str, snapshot: &Snapshot) -> Option<Reference> {
    match snapshot.get(id) {
        Some(info) => Some(Reference::new(id, info.clone())),
        None => {
            debug!("[TREE] Dropping reference {} missing from snapshot", id);
            None
        }
    }
}

/// First-run tree: the given builtins in order
pub fn default_tree(keys: &[BuiltinKey]) -> MinimalTree {
    keys.iter().map(|key| MinimalEntry::Builtin { key: *key }).collect()
}

/// Render the tree as indented rows in display order.
/// Returns (sortable id, depth) pairs; children of collapsed groups are skipped.
pub fn visible_rows(tree: &ComputedTree, collapsed: &BTreeSet<String>) -> Vec<(String, usize)> {
    let mut rows = Vec::new();
    for entry in tree {
        rows.push((identity::entry_id(entry), 0));
        if let Entry::Group(group) = entry {
            if collapsed.contains(&group.id) {
                continue;
            }
            for child in &group.children {
                rows.push((identity::child_id(&group.id, child), 1));
            }
        }
    }
    rows
}

// ========================
// Lookups
// ========================

pub(crate) fn root_index(tree: &ComputedTree, id: &RootId) -> Option<usize> {
    tree.iter().position(|entry| id.matches(entry))
}

pub(crate) fn group_index(tree: &ComputedTree, group_id: &str) -> Option<usize> {
    tree.iter()
        .position(|entry| entry.as_group().is_some_and(|g| g.id == group_id))
}

pub(crate) fn child_index(group: &Group, node: &NodeRef) -> Option<usize> {
    group.children.iter().position(|child| node.matches_child(child))
}

/// Find a group by id
pub fn find_group<'a>(tree: &'a ComputedTree, group_id: &str) -> Option<&'a Group> {
    tree.iter()
        .filter_map(Entry::as_group)
        .find(|group| group.id == group_id)
}

/// True if a reference with this id sits anywhere in the tree
pub fn contains_reference(tree: &ComputedTree, id: &str) -> bool {
    tree.iter().any(|entry| match entry {
        Entry::Reference(reference) => reference.id == id,
        Entry::Group(group) => group
            .children
            .iter()
            .any(|child| matches!(child, ChildEntry::Reference(r) if r.id == id)),
        Entry::Builtin { .. } => false,
    })
}
