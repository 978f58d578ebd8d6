//! Navtree Host
//!
//! Wires the sidebar core to SQLite:
//! - repository: tree store and saved filters
//! - Host: opens the database, loads and seeds the tree, joins filters

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::info;

use navtree::remote::TreeStore;
use navtree::tree::default_tree;
use navtree::{ControllerHandles, DomainError, DomainResult, ReorderController, SidebarConfig};
use rolling_logger::LoggerConfig;

pub mod repository;

use repository::{init_db, DbState, FilterRepository, SqliteTreeStore};

pub const APP_NAME: &str = "navtree";
pub const DB_FILE: &str = "navtree.db";

/// Install the rolling file logger under `log_dir`
pub fn init_logging(log_dir: &Path, config: &SidebarConfig) -> Result<(), String> {
    rolling_logger::init_logger_with(
        log_dir,
        APP_NAME,
        LoggerConfig {
            max_bytes: config.log_max_bytes,
            keep_files: config.log_keep_files,
            ..LoggerConfig::default()
        },
    )
}

pub struct Host {
    db: DbState,
    db_path: PathBuf,
    filters: FilterRepository,
    controller: ReorderController,
}

impl Host {
    /// Open the database in `data_dir` and bring the sidebar up to date.
    /// An empty tree is seeded with the configured builtins and saved
    /// right away.
    pub async fn open(data_dir: &Path, config: &SidebarConfig) -> DomainResult<(Self, ControllerHandles)> {
        std::fs::create_dir_all(data_dir).map_err(|e| {
            DomainError::Internal(format!("Cannot create {}: {}", data_dir.display(), e))
        })?;
        let db_path = data_dir.join(DB_FILE);
        let db = init_db(&db_path).await.map_err(DomainError::Internal)?;

        let store = Arc::new(SqliteTreeStore::new(db.conn.clone()));
        if store.load_tree().await?.is_empty() && !config.default_builtins.is_empty() {
            info!("[HOST] First run, seeding {} builtins", config.default_builtins.len());
            store.persist_tree(&default_tree(&config.default_builtins)).await?;
        }

        let filters = FilterRepository::new(db.conn.clone());
        let (controller, handles) = ReorderController::new(store, config);
        controller.set_snapshot(filters.snapshot().await?);
        controller.load().await?;

        info!("[HOST] Opened {}", db_path.display());
        let host = Self {
            db,
            db_path,
            filters,
            controller,
        };
        Ok((host, handles))
    }

    pub fn controller(&self) -> &ReorderController {
        &self.controller
    }

    pub fn filters(&self) -> &FilterRepository {
        &self.filters
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Rejoin the tree after filters changed
    pub async fn refresh_snapshot(&self) -> DomainResult<()> {
        let snapshot = self.filters.snapshot().await?;
        self.controller.set_snapshot(snapshot);
        Ok(())
    }

    /// Stop the sidebar and close the database. Unsaved changes inside the
    /// debounce window are dropped.
    pub async fn shutdown(self) {
        self.controller.shutdown();
        self.db.close().await;
        info!("[HOST] Closed {}", self.db_path.display());
    }
}
