//! Remote Tree Store
//!
//! The persistence seam. The controller only ever sees minimal trees; how
//! a backend stores them is its own business.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::DomainResult;
use crate::models::MinimalTree;

/// Backend holding the user's sidebar tree
#[async_trait]
pub trait TreeStore: Send + Sync {
    /// Last persisted tree. An empty list means nothing was saved yet.
    async fn load_tree(&self) -> DomainResult<MinimalTree>;

    /// Replace the persisted tree
    async fn persist_tree(&self, tree: &MinimalTree) -> DomainResult<()>;
}

/// In-process store, for tests and headless use
#[derive(Debug, Default)]
pub struct MemoryTreeStore {
    tree: Mutex<MinimalTree>,
    writes: AtomicUsize,
}

impl MemoryTreeStore {
    pub fn new(tree: MinimalTree) -> Self {
        Self {
            tree: Mutex::new(tree),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of successful `persist_tree` calls
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn current(&self) -> MinimalTree {
        self.tree.lock().await.clone()
    }
}

#[async_trait]
impl TreeStore for MemoryTreeStore {
    async fn load_tree(&self) -> DomainResult<MinimalTree> {
        Ok(self.tree.lock().await.clone())
    }

    async fn persist_tree(&self, tree: &MinimalTree) -> DomainResult<()> {
        *self.tree.lock().await = tree.clone();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
