//! Sortable Identity Codec
//!
//! Stable string ids for everything that can be dragged or dropped onto:
//! - `builtin:{key}`, `ref:{id}`, `group:{id}` at the root
//! - `inchild:{group}:{builtin|ref}:{key-or-id}` inside a group
//! - `dropzone:{group}` for the whole area of a group
//!
//! Parsing never fails loudly. Anything that does not match a pattern is
//! `None`, so callers fall through to root-level handling.

use std::fmt;

use crate::models::{BuiltinKey, ChildEntry, Entry};

const BUILTIN: &str = "builtin";
const REF: &str = "ref";
const GROUP: &str = "group";
const IN_CHILD: &str = "inchild";
const DROPZONE: &str = "dropzone";

/// A builtin or a reference, independent of where it sits in the tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Builtin(BuiltinKey),
    Reference(String),
}

impl NodeRef {
    fn variant(&self) -> &'static str {
        match self {
            NodeRef::Builtin(_) => BUILTIN,
            NodeRef::Reference(_) => REF,
        }
    }

    fn key(&self) -> &str {
        match self {
            NodeRef::Builtin(key) => key.as_str(),
            NodeRef::Reference(id) => id,
        }
    }

    fn parse(variant: &str, key: &str) -> Option<Self> {
        if key.is_empty() {
            return None;
        }
        match variant {
            BUILTIN => BuiltinKey::from_key(key).map(NodeRef::Builtin),
            REF => Some(NodeRef::Reference(key.to_string())),
            _ => None,
        }
    }

    pub fn of_child(child: &ChildEntry) -> Self {
        match child {
            ChildEntry::Builtin { key } => NodeRef::Builtin(*key),
            ChildEntry::Reference(reference) => NodeRef::Reference(reference.id.clone()),
        }
    }

    pub fn matches_child(&self, child: &ChildEntry) -> bool {
        match (self, child) {
            (NodeRef::Builtin(a), ChildEntry::Builtin { key }) => a == key,
            (NodeRef::Reference(a), ChildEntry::Reference(reference)) => *a == reference.id,
            _ => false,
        }
    }
}

/// Identity of a root-level entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RootId {
    Node(NodeRef),
    Group(String),
}

impl RootId {
    pub fn of_entry(entry: &Entry) -> Self {
        match entry {
            Entry::Builtin { key } => RootId::Node(NodeRef::Builtin(*key)),
            Entry::Reference(reference) => RootId::Node(NodeRef::Reference(reference.id.clone())),
            Entry::Group(group) => RootId::Group(group.id.clone()),
        }
    }

    pub fn matches(&self, entry: &Entry) -> bool {
        match (self, entry) {
            (RootId::Node(NodeRef::Builtin(a)), Entry::Builtin { key }) => a == key,
            (RootId::Node(NodeRef::Reference(a)), Entry::Reference(reference)) => *a == reference.id,
            (RootId::Group(a), Entry::Group(group)) => *a == group.id,
            _ => false,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, RootId::Group(_))
    }
}

impl fmt::Display for RootId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RootId::Node(node) => write!(f, "{}:{}", node.variant(), node.key()),
            RootId::Group(id) => write!(f, "{}:{}", GROUP, id),
        }
    }
}

/// A parsed `inchild:` id
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChildId {
    pub group_id: String,
    pub node: NodeRef,
}

impl fmt::Display for ChildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            IN_CHILD,
            self.group_id,
            self.node.variant(),
            self.node.key()
        )
    }
}

/// Any id the drag surface can report
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SortableId {
    Root(RootId),
    Child(ChildId),
    Dropzone(String),
}

impl SortableId {
    pub fn parse(raw: &str) -> Option<Self> {
        let (prefix, rest) = raw.split_once(':')?;
        match prefix {
            IN_CHILD => parse_child_id(raw).map(SortableId::Child),
            DROPZONE => non_empty(rest).map(|g| SortableId::Dropzone(g.to_string())),
            GROUP => non_empty(rest).map(|g| SortableId::Root(RootId::Group(g.to_string()))),
            _ => NodeRef::parse(prefix, rest).map(|node| SortableId::Root(RootId::Node(node))),
        }
    }
}

impl fmt::Display for SortableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortableId::Root(root) => fmt::Display::fmt(root, f),
            SortableId::Child(child) => fmt::Display::fmt(child, f),
            SortableId::Dropzone(group_id) => write!(f, "{}:{}", DROPZONE, group_id),
        }
    }
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}

// ========================
// Codec functions
// ========================

/// Id of a root entry
pub fn entry_id(entry: &Entry) -> String {
    RootId::of_entry(entry).to_string()
}

/// Id of a child entry inside group `group_id`
pub fn child_id(group_id: &str, child: &ChildEntry) -> String {
    ChildId {
        group_id: group_id.to_string(),
        node: NodeRef::of_child(child),
    }
    .to_string()
}

/// Drop target covering the whole area of a group
pub fn dropzone_id(group_id: &str) -> String {
    format!("{}:{}", DROPZONE, group_id)
}

/// Parse `inchild:{group}:{variant}:{key}`.
///
/// Group ids never contain `:`; the key is everything after the third
/// separator so reference ids may. Fewer than four segments, an empty
/// segment, an unknown variant or an unknown builtin key is not a child id.
pub fn parse_child_id(raw: &str) -> Option<ChildId> {
    let mut parts = raw.splitn(4, ':');
    let prefix = parts.next()?;
    let group_id = parts.next()?;
    let variant = parts.next()?;
    let key = parts.next()?;
    if prefix != IN_CHILD || group_id.is_empty() {
        return None;
    }
    let node = NodeRef::parse(variant, key)?;
    Some(ChildId {
        group_id: group_id.to_string(),
        node,
    })
}

/// Group id of a `dropzone:` id
pub fn parse_dropzone_id(raw: &str) -> Option<&str> {
    raw.strip_prefix(DROPZONE)?
        .strip_prefix(':')
        .and_then(non_empty)
}

/// True for `builtin:`, `ref:` and `group:` ids
pub fn is_root_id(raw: &str) -> bool {
    matches!(SortableId::parse(raw), Some(SortableId::Root(_)))
}
