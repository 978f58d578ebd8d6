//! Sidebar Tree State
//!
//! Three named references instead of one mutable cell:
//! - canonical: last tree the remote store confirmed
//! - optimistic: what the user currently sees (plus its computed form)
//! - pending write: newest payload handed to the store
//!
//! Every local change gets a new [`Revision`]. Write outcomes are judged
//! against revisions, so a late failure for an older payload can never roll
//! back past a newer confirmed state.

use std::sync::Arc;

use log::{debug, warn};

use crate::models::{ComputedTree, MinimalTree};
use crate::tree::{to_computed, to_minimal, Snapshot};

/// Monotonic version of the local tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Revision(u64);

impl Revision {
    pub fn get(&self) -> u64 {
        self.0
    }
}

/// A tree tagged with the revision it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub revision: Revision,
    pub tree: T,
}

/// What a finished write did to the state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Canonical advanced; display already showed this tree
    Confirmed,
    /// Canonical advanced past a rolled-back display; display rebuilt
    Resynced,
    /// Canonical was already newer; nothing changed
    Stale,
    /// Failed, but a newer local revision will be written; nothing changed
    Superseded,
    /// Failed; display restored to canonical
    RolledBack,
}

#[derive(Debug)]
pub struct TreeState {
    counter: u64,
    canonical: Versioned<MinimalTree>,
    optimistic: Versioned<MinimalTree>,
    displayed: Arc<ComputedTree>,
    pending_write: Option<Versioned<MinimalTree>>,
    snapshot: Snapshot,
}

impl Default for TreeState {
    fn default() -> Self {
        Self::new(Snapshot::default())
    }
}

impl TreeState {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            counter: 0,
            canonical: Versioned {
                revision: Revision(0),
                tree: Vec::new(),
            },
            optimistic: Versioned {
                revision: Revision(0),
                tree: Vec::new(),
            },
            displayed: Arc::new(Vec::new()),
            pending_write: None,
            snapshot,
        }
    }

    fn next_revision(&mut self) -> Revision {
        self.counter += 1;
        Revision(self.counter)
    }

    /// Currently displayed tree
    pub fn displayed(&self) -> Arc<ComputedTree> {
        Arc::clone(&self.displayed)
    }

    pub fn revision(&self) -> Revision {
        self.optimistic.revision
    }

    pub fn canonical(&self) -> &Versioned<MinimalTree> {
        &self.canonical
    }

    pub fn optimistic(&self) -> &Versioned<MinimalTree> {
        &self.optimistic
    }

    pub fn pending_write(&self) -> Option<&Versioned<MinimalTree>> {
        self.pending_write.as_ref()
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Local changes not yet confirmed
    pub fn is_dirty(&self) -> bool {
        self.optimistic.revision > self.canonical.revision
    }

    /// Replace everything with a freshly loaded tree
    pub fn reset(&mut self, tree: MinimalTree) {
        let revision = self.next_revision();
        self.canonical = Versioned {
            revision,
            tree: tree.clone(),
        };
        self.optimistic = Versioned { revision, tree };
        self.pending_write = None;
        self.rebuild();
    }

    /// Show `tree` immediately; returns the payload to persist
    pub fn apply(&mut self, tree: ComputedTree) -> Versioned<MinimalTree> {
        let revision = self.next_revision();
        let minimal = to_minimal(&tree);
        self.optimistic = Versioned {
            revision,
            tree: minimal.clone(),
        };
        self.displayed = Arc::new(tree);
        Versioned {
            revision,
            tree: minimal,
        }
    }

    pub fn mark_in_flight(&mut self, write: &Versioned<MinimalTree>) {
        let newer = self
            .pending_write
            .as_ref()
            .map_or(true, |pending| write.revision > pending.revision);
        if newer {
            self.pending_write = Some(write.clone());
        }
    }

    fn clear_pending(&mut self, revision: Revision) {
        if self.pending_write.as_ref().is_some_and(|p| p.revision == revision) {
            self.pending_write = None;
        }
    }

    pub fn confirm(&mut self, write: Versioned<MinimalTree>) -> WriteOutcome {
        self.clear_pending(write.revision);
        if write.revision <= self.canonical.revision {
            debug!(
                "[STATE] Confirmation for r{} older than canonical r{}",
                write.revision.get(),
                self.canonical.revision.get()
            );
            return WriteOutcome::Stale;
        }

        let revision = write.revision;
        self.canonical = write;
        if self.optimistic.revision < revision {
            // Display was rolled back below what the store now holds
            self.optimistic = self.canonical.clone();
            self.rebuild();
            return WriteOutcome::Resynced;
        }
        WriteOutcome::Confirmed
    }

    pub fn reject(&mut self, revision: Revision) -> WriteOutcome {
        self.clear_pending(revision);
        if revision < self.optimistic.revision {
            return WriteOutcome::Superseded;
        }
        warn!(
            "[STATE] Write r{} failed, rolling back to r{}",
            revision.get(),
            self.canonical.revision.get()
        );
        self.optimistic = self.canonical.clone();
        self.rebuild();
        WriteOutcome::RolledBack
    }

    /// Rejoin the optimistic tree against fresh collaborator data
    pub fn set_snapshot(&mut self, snapshot: Snapshot) {
        self.snapshot = snapshot;
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.displayed = Arc::new(to_computed(&self.optimistic.tree, &self.snapshot));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BuiltinKey, MinimalEntry, ReferenceInfo};
    use crate::moves::apply_move;

    fn loaded() -> TreeState {
        let snapshot = Snapshot::new()
            .with("3", ReferenceInfo::new("Reading"))
            .with("7", ReferenceInfo::new("Inbox"));
        let mut state = TreeState::new(snapshot);
        state.reset(vec![
            MinimalEntry::Builtin { key: BuiltinKey::All },
            MinimalEntry::Reference { id: "7".to_string() },
            MinimalEntry::Reference { id: "3".to_string() },
        ]);
        state
    }

    fn move_and_apply(state: &mut TreeState, active: &str, over: &str) -> Versioned<MinimalTree> {
        let next = apply_move(&state.displayed(), active, Some(over)).unwrap();
        state.apply(next)
    }

    #[test]
    fn test_apply_is_immediately_displayed() {
        let mut state = loaded();
        let write = move_and_apply(&mut state, "ref:3", "builtin:all");

        assert!(state.is_dirty());
        assert_eq!(write.tree, state.optimistic().tree);
        assert_eq!(state.displayed().len(), 3);
        assert_eq!(write.tree[0], MinimalEntry::Reference { id: "3".to_string() });
    }

    #[test]
    fn test_confirm_advances_canonical() {
        let mut state = loaded();
        let write = move_and_apply(&mut state, "ref:3", "builtin:all");
        state.mark_in_flight(&write);
        assert!(state.pending_write().is_some());

        let shown = state.displayed();
        assert_eq!(state.confirm(write.clone()), WriteOutcome::Confirmed);
        assert_eq!(state.canonical(), &write);
        assert!(!state.is_dirty());
        assert!(state.pending_write().is_none());
        assert!(Arc::ptr_eq(&shown, &state.displayed()));
    }

    #[test]
    fn test_rollback_goes_to_last_confirmed() {
        let mut state = loaded();
        let a = move_and_apply(&mut state, "ref:3", "builtin:all");
        assert_eq!(state.confirm(a.clone()), WriteOutcome::Confirmed);
        let after_a = state.displayed();

        let b = move_and_apply(&mut state, "ref:7", "ref:3");
        assert_eq!(state.reject(b.revision), WriteOutcome::RolledBack);
        assert_eq!(*state.displayed(), *after_a);
        assert_eq!(state.optimistic().tree, a.tree);
    }

    #[test]
    fn test_superseded_failure_is_ignored() {
        let mut state = loaded();
        let first = move_and_apply(&mut state, "ref:3", "builtin:all");
        let second = move_and_apply(&mut state, "ref:7", "ref:3");

        assert_eq!(state.reject(first.revision), WriteOutcome::Superseded);
        assert_eq!(state.optimistic().tree, second.tree);

        assert_eq!(state.confirm(second), WriteOutcome::Confirmed);
        assert!(!state.is_dirty());
    }

    #[test]
    fn test_late_confirmation_is_stale() {
        let mut state = loaded();
        let first = move_and_apply(&mut state, "ref:3", "builtin:all");
        let second = move_and_apply(&mut state, "ref:7", "ref:3");

        assert_eq!(state.confirm(second.clone()), WriteOutcome::Confirmed);
        assert_eq!(state.confirm(first), WriteOutcome::Stale);
        assert_eq!(state.canonical(), &second);
    }

    #[test]
    fn test_confirmation_after_rollback_resyncs() {
        let mut state = loaded();
        let first = move_and_apply(&mut state, "ref:3", "builtin:all");
        let second = move_and_apply(&mut state, "ref:7", "ref:3");

        // Newest write fails first, then the older one lands
        assert_eq!(state.reject(second.revision), WriteOutcome::RolledBack);
        assert_eq!(state.confirm(first.clone()), WriteOutcome::Resynced);
        assert_eq!(state.optimistic().tree, first.tree);
        assert_eq!(crate::tree::to_minimal(&state.displayed()), first.tree);
    }

    #[test]
    fn test_snapshot_refresh_restores_dropped_reference() {
        let mut state = TreeState::new(Snapshot::new());
        state.reset(vec![MinimalEntry::Reference { id: "7".to_string() }]);
        assert!(state.displayed().is_empty());

        state.set_snapshot(Snapshot::new().with("7", ReferenceInfo::new("Inbox")));
        assert_eq!(state.displayed().len(), 1);
    }
}
