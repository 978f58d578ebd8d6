//! Sidebar Configuration
//!
//! Tunables for the reorder pipeline and the host's log files, read from
//! an optional JSON file. Every field has a default.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::models::BuiltinKey;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SidebarConfig {
    /// Quiet period before a change is written
    pub persist_debounce_ms: u64,
    /// Pointer travel that turns a press into a drag
    pub drag_activation_px: f64,
    /// Seeded into an empty tree on first run
    pub default_builtins: Vec<BuiltinKey>,
    pub log_max_bytes: u64,
    pub log_keep_files: usize,
}

impl Default for SidebarConfig {
    fn default() -> Self {
        Self {
            persist_debounce_ms: 300,
            drag_activation_px: navtree_dnd::DRAG_THRESHOLD_PX,
            default_builtins: BuiltinKey::DEFAULTS.to_vec(),
            log_max_bytes: 1024 * 1024,
            log_keep_files: 3,
        }
    }
}

impl SidebarConfig {
    /// Missing file means defaults
    pub fn load(path: &Path) -> DomainResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DomainError::InvalidInput(format!("Cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&raw)
            .map_err(|e| DomainError::InvalidInput(format!("Bad config {}: {}", path.display(), e)))
    }

    pub fn persist_debounce(&self) -> Duration {
        Duration::from_millis(self.persist_debounce_ms)
    }
}
