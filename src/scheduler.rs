//! Persistence Scheduler
//!
//! Trailing-edge debounce in front of the tree store. Each `schedule`
//! restarts the timer with the newest payload; when the timer fires the
//! write is handed to its own task, so once issued it always runs to
//! completion and reports back through [`WriteObserver`].
//!
//! Timers and writes run on the runtime handle given at construction, so
//! `schedule` may be called from threads outside that runtime.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, info};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::error::DomainResult;
use crate::models::MinimalTree;
use crate::remote::TreeStore;
use crate::store::Versioned;

/// Receives the lifecycle of every write the scheduler issues
pub trait WriteObserver: Send + Sync {
    fn write_started(&self, write: &Versioned<MinimalTree>);
    fn write_finished(&self, write: Versioned<MinimalTree>, result: DomainResult<()>);
}

pub struct PersistScheduler {
    store: Arc<dyn TreeStore>,
    observer: Arc<dyn WriteObserver>,
    delay: Duration,
    runtime: Handle,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl PersistScheduler {
    pub fn new(
        store: Arc<dyn TreeStore>,
        observer: Arc<dyn WriteObserver>,
        delay: Duration,
        runtime: Handle,
    ) -> Self {
        Self {
            store,
            observer,
            delay,
            runtime,
            timer: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    fn timer(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Restart the debounce window with `write` as the payload
    pub fn schedule(&self, write: Versioned<MinimalTree>) {
        let store = Arc::clone(&self.store);
        let observer = Arc::clone(&self.observer);
        let delay = self.delay;
        let runtime = self.runtime.clone();
        debug!("[PERSIST] Scheduling r{} in {:?}", write.revision.get(), delay);

        let timer = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            observer.write_started(&write);
            info!("[PERSIST] Writing r{} ({} entries)", write.revision.get(), write.tree.len());
            // Detached: aborting the timer from here on cannot touch the write
            runtime.spawn(async move {
                let result = store.persist_tree(&write.tree).await;
                observer.write_finished(write, result);
            });
        });

        if let Some(previous) = self.timer().replace(timer) {
            previous.abort();
        }
    }

    /// Drop the pending write, if any. Writes already issued are unaffected.
    pub fn cancel(&self) {
        if let Some(timer) = self.timer().take() {
            if !timer.is_finished() {
                debug!("[PERSIST] Pending write cancelled");
            }
            timer.abort();
        }
    }

    /// A write is waiting for the debounce window to close
    pub fn is_pending(&self) -> bool {
        self.timer().as_ref().is_some_and(|timer| !timer.is_finished())
    }
}

impl Drop for PersistScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
