//! Sidebar Models
//!
//! Two shapes of the same two-level tree:
//! - minimal: what is persisted (identity only)
//! - computed: what is displayed (joined with collaborator data)

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Fixed, non-deletable navigation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuiltinKey {
    /// Every item
    All,
    Favorites,
    Archived,
    Trash,
}

impl BuiltinKey {
    /// Default sidebar order on first run
    pub const DEFAULTS: [BuiltinKey; 4] = [
        BuiltinKey::All,
        BuiltinKey::Favorites,
        BuiltinKey::Archived,
        BuiltinKey::Trash,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuiltinKey::All => "all",
            BuiltinKey::Favorites => "favorites",
            BuiltinKey::Archived => "archived",
            BuiltinKey::Trash => "trash",
        }
    }

    /// Unknown keys return `None`, never a default
    pub fn from_key(s: &str) -> Option<Self> {
        match s {
            "all" => Some(BuiltinKey::All),
            "favorites" => Some(BuiltinKey::Favorites),
            "archived" => Some(BuiltinKey::Archived),
            "trash" => Some(BuiltinKey::Trash),
            _ => None,
        }
    }
}

/// Content kinds a referenced object holds (icon selection only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Note,
    Bookmark,
    Image,
    File,
    Task,
}

/// Collaborator data for one external object (a saved filter)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceInfo {
    pub name: String,
    #[serde(default)]
    pub content_types: BTreeSet<ContentType>,
}

impl ReferenceInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content_types: BTreeSet::new(),
        }
    }

    pub fn with_types(name: impl Into<String>, types: impl IntoIterator<Item = ContentType>) -> Self {
        Self {
            name: name.into(),
            content_types: types.into_iter().collect(),
        }
    }
}

// ========================
// Minimal (persisted) form
// ========================

/// Persisted root entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MinimalEntry {
    Builtin { key: BuiltinKey },
    Reference { id: String },
    Group {
        id: String,
        name: String,
        #[serde(default)]
        children: Vec<MinimalChild>,
    },
}

/// Persisted child of a group (never a group)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MinimalChild {
    Builtin { key: BuiltinKey },
    Reference { id: String },
}

pub type MinimalTree = Vec<MinimalEntry>;

// ========================
// Computed (display) form
// ========================

/// A reference joined with its external object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub id: String,
    pub name: String,
    pub content_types: BTreeSet<ContentType>,
}

impl Reference {
    pub fn new(id: impl Into<String>, info: ReferenceInfo) -> Self {
        Self {
            id: id.into(),
            name: info.name,
            content_types: info.content_types,
        }
    }
}

/// A named container of child entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub children: Vec<ChildEntry>,
}

impl Group {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            children: Vec::new(),
        }
    }
}

/// Displayed root entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Entry {
    Builtin { key: BuiltinKey },
    Reference(Reference),
    Group(Group),
}

/// Displayed child entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChildEntry {
    Builtin { key: BuiltinKey },
    Reference(Reference),
}

pub type ComputedTree = Vec<Entry>;

impl Entry {
    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Entry::Group(group) => Some(group),
            _ => None,
        }
    }

    pub fn as_group_mut(&mut self) -> Option<&mut Group> {
        match self {
            Entry::Group(group) => Some(group),
            _ => None,
        }
    }

    /// Demote to a child entry. Groups cannot nest and come back unchanged.
    pub fn into_child(self) -> Result<ChildEntry, Entry> {
        match self {
            Entry::Builtin { key } => Ok(ChildEntry::Builtin { key }),
            Entry::Reference(reference) => Ok(ChildEntry::Reference(reference)),
            group @ Entry::Group(_) => Err(group),
        }
    }
}

impl From<ChildEntry> for Entry {
    fn from(child: ChildEntry) -> Self {
        match child {
            ChildEntry::Builtin { key } => Entry::Builtin { key },
            ChildEntry::Reference(reference) => Entry::Reference(reference),
        }
    }
}
