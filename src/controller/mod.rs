//! Reorder Controller
//!
//! Owns the drag state machine (`Idle -> Dragging -> Idle`) and the tree
//! state. Every successful mutation is shown immediately, converted to
//! minimal form and handed to the [`PersistScheduler`]. Failed writes roll
//! the display back to the last confirmed tree and raise a [`Notice`].
//!
//! The presentation layer observes a [`RenderedTree`] through a watch
//! channel; notices arrive on an unbounded channel.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, error, info, warn};
use navtree_dnd::{Collision, Point, PointerSensor, Proximity, SensorEvent};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};

use crate::collision::{CollisionResolver, DragFrame};
use crate::config::SidebarConfig;
use crate::edit;
use crate::error::DomainResult;
use crate::models::{ComputedTree, MinimalTree, Reference};
use crate::moves;
use crate::remote::TreeStore;
use crate::scheduler::{PersistScheduler, WriteObserver};
use crate::store::{TreeState, Versioned, WriteOutcome};
use crate::tree::Snapshot;

// ========================
// Public view types
// ========================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DragPhase {
    #[default]
    Idle,
    Dragging {
        active_id: String,
        /// Best collision of the last frame
        over_id: Option<String>,
    },
}

/// Read-only projection for the presentation layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedTree {
    pub tree: Arc<ComputedTree>,
    /// Dragged id, for the floating preview
    pub active_id: Option<String>,
    pub over_id: Option<String>,
    pub collapsed: BTreeSet<String>,
    /// Local changes not yet confirmed by the store
    pub dirty: bool,
}

/// User-visible messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    PersistFailed { message: String },
    LoadFailed { message: String },
}

/// Receiving ends handed to the presentation layer
pub struct ControllerHandles {
    pub view: watch::Receiver<RenderedTree>,
    pub notices: mpsc::UnboundedReceiver<Notice>,
}

// ========================
// Shared state
// ========================

#[derive(Default)]
struct Inner {
    state: TreeState,
    phase: DragPhase,
    collapsed: BTreeSet<String>,
    sensor: PointerSensor,
}

/// State reachable from both the controller and finished writes
struct Shared {
    inner: Mutex<Inner>,
    view: watch::Sender<RenderedTree>,
    notices: mpsc::UnboundedSender<Notice>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, inner: &Inner) {
        let (active_id, over_id) = match &inner.phase {
            DragPhase::Idle => (None, None),
            DragPhase::Dragging { active_id, over_id } => (Some(active_id.clone()), over_id.clone()),
        };
        self.view.send_replace(RenderedTree {
            tree: inner.state.displayed(),
            active_id,
            over_id,
            collapsed: inner.collapsed.clone(),
            dirty: inner.state.is_dirty(),
        });
    }

    fn notify(&self, notice: Notice) {
        // Receiver gone means nobody is left to show it
        let _ = self.notices.send(notice);
    }
}

impl WriteObserver for Shared {
    fn write_started(&self, write: &Versioned<MinimalTree>) {
        self.lock().state.mark_in_flight(write);
    }

    fn write_finished(&self, write: Versioned<MinimalTree>, result: DomainResult<()>) {
        let revision = write.revision;
        let mut inner = self.lock();
        match result {
            Ok(()) => match inner.state.confirm(write) {
                WriteOutcome::Confirmed => {
                    info!("[CONTROLLER] r{} persisted", revision.get());
                    self.publish(&inner);
                }
                WriteOutcome::Resynced => {
                    info!("[CONTROLLER] r{} persisted after rollback, display resynced", revision.get());
                    self.publish(&inner);
                }
                outcome => debug!("[CONTROLLER] r{} persisted: {:?}", revision.get(), outcome),
            },
            Err(e) => match inner.state.reject(revision) {
                WriteOutcome::RolledBack => {
                    self.publish(&inner);
                    drop(inner);
                    self.notify(Notice::PersistFailed {
                        message: e.to_string(),
                    });
                }
                outcome => debug!(
                    "[CONTROLLER] r{} failed ({}), {:?}",
                    revision.get(),
                    e,
                    outcome
                ),
            },
        }
    }
}

// ========================
// Controller
// ========================

pub struct ReorderController {
    shared: Arc<Shared>,
    store: Arc<dyn TreeStore>,
    scheduler: PersistScheduler,
    resolver: CollisionResolver,
}

impl ReorderController {
    /// Build a controller bound to the current tokio runtime.
    ///
    /// # Panics
    /// Outside a runtime context; use [`ReorderController::new_in`] there.
    pub fn new(store: Arc<dyn TreeStore>, config: &SidebarConfig) -> (Self, ControllerHandles) {
        Self::new_in(store, config, Handle::current())
    }

    /// Build a controller whose persistence runs on `runtime`. The sync
    /// methods may then be called from any thread.
    pub fn new_in(
        store: Arc<dyn TreeStore>,
        config: &SidebarConfig,
        runtime: Handle,
    ) -> (Self, ControllerHandles) {
        let (view_tx, view_rx) = watch::channel(RenderedTree::default());
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();

        let inner = Inner {
            sensor: PointerSensor::new(config.drag_activation_px),
            ..Inner::default()
        };
        let shared = Arc::new(Shared {
            inner: Mutex::new(inner),
            view: view_tx,
            notices: notice_tx,
        });
        let scheduler = PersistScheduler::new(
            Arc::clone(&store),
            shared.clone() as Arc<dyn WriteObserver>,
            config.persist_debounce(),
            runtime,
        );

        let controller = Self {
            shared,
            store,
            scheduler,
            resolver: CollisionResolver::default(),
        };
        let handles = ControllerHandles {
            view: view_rx,
            notices: notice_rx,
        };
        (controller, handles)
    }

    /// Swap the hit-test primitive (closest center by default)
    pub fn with_proximity(mut self, proximity: impl Proximity + 'static) -> Self {
        self.resolver = CollisionResolver::new(proximity);
        self
    }

    /// Fetch the tree from the store, replacing all local state.
    /// A pending debounced write is dropped.
    pub async fn load(&self) -> DomainResult<()> {
        self.scheduler.cancel();
        match self.store.load_tree().await {
            Ok(tree) => {
                let mut inner = self.shared.lock();
                inner.state.reset(tree);
                inner.phase = DragPhase::Idle;
                info!("[CONTROLLER] Loaded {} entries", inner.state.displayed().len());
                self.shared.publish(&inner);
                Ok(())
            }
            Err(e) => {
                error!("[CONTROLLER] Load failed: {}", e);
                self.shared.notify(Notice::LoadFailed {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Rejoin against fresh collaborator data
    pub fn set_snapshot(&self, snapshot: Snapshot) {
        let mut inner = self.shared.lock();
        inner.state.set_snapshot(snapshot);
        self.shared.publish(&inner);
    }

    pub fn tree(&self) -> Arc<ComputedTree> {
        self.shared.lock().state.displayed()
    }

    pub fn phase(&self) -> DragPhase {
        self.shared.lock().phase.clone()
    }

    pub fn is_dirty(&self) -> bool {
        self.shared.lock().state.is_dirty()
    }

    pub fn is_persist_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    // ========================
    // Drag lifecycle
    // ========================

    pub fn drag_start(&self, active_id: &str) {
        let mut inner = self.shared.lock();
        debug!("[CONTROLLER] Drag start {}", active_id);
        inner.phase = DragPhase::Dragging {
            active_id: active_id.to_string(),
            over_id: None,
        };
        self.shared.publish(&inner);
    }

    /// Resolve one pointer frame. Empty while idle.
    pub fn drag_over(&self, frame: &DragFrame<'_>) -> Vec<Collision> {
        let mut inner = self.shared.lock();
        let DragPhase::Dragging { active_id, over_id } = &mut inner.phase else {
            return Vec::new();
        };
        let hits = self.resolver.resolve(active_id, frame);
        let best = hits.first().map(|c| c.id.clone());
        if *over_id != best {
            *over_id = best;
            self.shared.publish(&inner);
        }
        hits
    }

    /// Finish the gesture. Returns whether the tree changed.
    pub fn drag_end(&self, active_id: &str, over_id: Option<&str>) -> bool {
        let write = {
            let mut inner = self.shared.lock();
            inner.phase = DragPhase::Idle;
            let next = moves::apply_move(&inner.state.displayed(), active_id, over_id);
            match next {
                Some(next) => Some(self.apply_locked(&mut inner, next)),
                None => {
                    self.shared.publish(&inner);
                    None
                }
            }
        };
        match write {
            Some(write) => {
                self.scheduler.schedule(write);
                true
            }
            None => false,
        }
    }

    pub fn drag_cancel(&self) {
        let mut inner = self.shared.lock();
        if inner.phase != DragPhase::Idle {
            debug!("[CONTROLLER] Drag cancelled");
            inner.phase = DragPhase::Idle;
            self.shared.publish(&inner);
        }
    }

    // ========================
    // Raw pointer input
    // ========================

    /// Press on a sortable row; dragging starts once the pointer travels
    /// past the activation distance
    pub fn pointer_down(&self, id: &str, at: Point) {
        self.shared.lock().sensor.pointer_down(id, at);
    }

    pub fn pointer_move(&self, at: Point, frame: &DragFrame<'_>) -> Vec<Collision> {
        let event = self.shared.lock().sensor.pointer_move(at);
        let frame = DragFrame {
            pointer: Some(at),
            ..*frame
        };
        match event {
            Some(SensorEvent::Started { id, .. }) => {
                self.drag_start(&id);
                self.drag_over(&frame)
            }
            Some(SensorEvent::Moved { .. }) => self.drag_over(&frame),
            _ => Vec::new(),
        }
    }

    /// Release. Drops on the last resolved target; returns whether the
    /// tree changed.
    pub fn pointer_up(&self, at: Point) -> bool {
        let (event, over_id) = {
            let mut inner = self.shared.lock();
            let over_id = match &inner.phase {
                DragPhase::Dragging { over_id, .. } => over_id.clone(),
                DragPhase::Idle => None,
            };
            (inner.sensor.pointer_up(at), over_id)
        };
        match event {
            Some(SensorEvent::Dropped { id, .. }) => self.drag_end(&id, over_id.as_deref()),
            _ => false,
        }
    }

    pub fn pointer_cancel(&self) {
        let event = self.shared.lock().sensor.cancel();
        if event.is_some() {
            self.drag_cancel();
        }
    }

    // ========================
    // Sidebar edits
    // ========================

    /// Collapse or expand a group. Display only, never persisted.
    pub fn toggle_collapsed(&self, group_id: &str) -> bool {
        let mut inner = self.shared.lock();
        let collapsed = if inner.collapsed.remove(group_id) {
            false
        } else {
            inner.collapsed.insert(group_id.to_string());
            true
        };
        self.shared.publish(&inner);
        collapsed
    }

    pub fn add_reference(&self, reference: Reference) -> DomainResult<()> {
        self.edit(|tree| edit::add_reference(tree, reference))
    }

    pub fn add_group(&self, id: &str, name: &str) -> DomainResult<()> {
        self.edit(|tree| edit::add_group(tree, id, name))
    }

    pub fn rename_group(&self, id: &str, name: &str) -> DomainResult<()> {
        self.edit(|tree| edit::rename_group(tree, id, name))
    }

    pub fn remove_group(&self, id: &str) -> DomainResult<()> {
        self.edit(|tree| edit::remove_group(tree, id))?;
        let mut inner = self.shared.lock();
        if inner.collapsed.remove(id) {
            self.shared.publish(&inner);
        }
        Ok(())
    }

    pub fn remove_reference(&self, id: &str) -> DomainResult<()> {
        self.edit(|tree| edit::remove_reference(tree, id))
    }

    /// The lock is held from reading the displayed tree until the result is
    /// applied, so a rollback cannot slip in between.
    fn edit<F>(&self, f: F) -> DomainResult<()>
    where
        F: FnOnce(&ComputedTree) -> DomainResult<ComputedTree>,
    {
        let write = {
            let mut inner = self.shared.lock();
            let next = f(&inner.state.displayed()).map_err(|e| {
                warn!("[CONTROLLER] Edit rejected: {}", e);
                e
            })?;
            self.apply_locked(&mut inner, next)
        };
        self.scheduler.schedule(write);
        Ok(())
    }

    /// Show `next` immediately and schedule it for persistence
    pub fn commit(&self, next: ComputedTree) {
        let write = self.apply_locked(&mut self.shared.lock(), next);
        self.scheduler.schedule(write);
    }

    fn apply_locked(&self, inner: &mut Inner, next: ComputedTree) -> Versioned<MinimalTree> {
        let write = inner.state.apply(next);
        self.shared.publish(inner);
        write
    }

    /// Teardown: no write may fire after this. Writes already issued still
    /// complete.
    pub fn shutdown(&self) {
        self.scheduler.cancel();
        let mut inner = self.shared.lock();
        inner.phase = DragPhase::Idle;
        let _ = inner.sensor.cancel();
        if inner.state.is_dirty() {
            warn!("[CONTROLLER] Shutting down with unsaved changes");
        }
    }
}

impl std::fmt::Debug for ReorderController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReorderController")
            .field("phase", &self.phase())
            .field("pending", &self.is_persist_pending())
            .finish()
    }
}
