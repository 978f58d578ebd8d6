//! Navtree Sidebar Core
//!
//! Layered like the rest of the app:
//! - models, identity, tree: data shapes, sortable ids, conversions
//! - collision, moves, edit: pure drag resolution and tree edits
//! - store, scheduler, remote: optimistic state and debounced persistence
//! - controller: the piece the presentation layer talks to

pub mod collision;
pub mod config;
pub mod controller;
pub mod edit;
pub mod error;
pub mod identity;
pub mod models;
pub mod moves;
pub mod remote;
pub mod scheduler;
pub mod store;
pub mod tree;

pub use collision::{CollisionResolver, DragFrame, GroupBounds, Restriction};
pub use config::SidebarConfig;
pub use controller::{ControllerHandles, DragPhase, Notice, ReorderController, RenderedTree};
pub use error::{DomainError, DomainResult};
pub use models::{
    BuiltinKey, ChildEntry, ComputedTree, ContentType, Entry, Group, MinimalChild, MinimalEntry,
    MinimalTree, Reference, ReferenceInfo,
};
pub use remote::{MemoryTreeStore, TreeStore};
pub use store::{Revision, TreeState, Versioned, WriteOutcome};
pub use tree::Snapshot;

pub use navtree_dnd;
