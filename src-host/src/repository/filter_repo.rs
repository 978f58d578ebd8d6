//! Saved Filter Repository
//!
//! The external objects sidebar references point at. The sidebar only
//! reads them, through [`FilterRepository::snapshot`].

use std::collections::BTreeSet;

use rusqlite::params;
use serde::{Deserialize, Serialize};

use navtree::models::{ContentType, ReferenceInfo};
use navtree::tree::Snapshot;
use navtree::{DomainError, DomainResult};

use super::db::DbConn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedFilter {
    pub id: String,
    pub name: String,
    pub content_types: BTreeSet<ContentType>,
}

impl SavedFilter {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        content_types: impl IntoIterator<Item = ContentType>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            content_types: content_types.into_iter().collect(),
        }
    }

    pub fn info(&self) -> ReferenceInfo {
        ReferenceInfo::with_types(self.name.clone(), self.content_types.iter().copied())
    }
}

pub struct FilterRepository {
    conn: DbConn,
}

impl FilterRepository {
    pub fn new(conn: DbConn) -> Self {
        Self { conn }
    }

    pub async fn create(&self, filter: &SavedFilter) -> DomainResult<SavedFilter> {
        if filter.name.trim().is_empty() {
            return Err(DomainError::InvalidInput("Filter name cannot be empty".into()));
        }
        let guard = self.conn.lock().await;
        let conn = guard
            .as_ref()
            .ok_or_else(DomainError::not_initialized)?;

        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM filters WHERE id = ? AND deleted_at IS NULL)",
                params![filter.id],
                |row| row.get(0),
            )
            .map_err(DomainError::internal)?;
        if exists {
            return Err(DomainError::Conflict(format!("Filter {} already exists", filter.id)));
        }

        let types = serde_json::to_string(&filter.content_types).map_err(DomainError::internal)?;
        conn.execute(
            "INSERT OR REPLACE INTO filters (id, name, content_types, created_at, deleted_at) VALUES (?, ?, ?, ?, NULL)",
            params![filter.id, filter.name, types, chrono::Utc::now().timestamp_millis()],
        )
        .map_err(DomainError::internal)?;

        Ok(filter.clone())
    }

    pub async fn list(&self) -> DomainResult<Vec<SavedFilter>> {
        let guard = self.conn.lock().await;
        let conn = guard
            .as_ref()
            .ok_or_else(DomainError::not_initialized)?;

        let mut stmt = conn
            .prepare("SELECT id, name, content_types FROM filters WHERE deleted_at IS NULL ORDER BY created_at, rowid")
            .map_err(DomainError::internal)?;
        let mut rows = stmt.query([]).map_err(DomainError::internal)?;

        let mut filters = Vec::new();
        while let Some(row) = rows.next().map_err(DomainError::internal)? {
            let id: String = row.get(0).map_err(DomainError::internal)?;
            let types: String = row.get(2).map_err(DomainError::internal)?;
            let content_types = serde_json::from_str(&types).map_err(|e| {
                DomainError::Internal(format!("Filter {} has corrupt content types: {}", id, e))
            })?;
            filters.push(SavedFilter {
                id,
                name: row.get(1).map_err(DomainError::internal)?,
                content_types,
            });
        }
        Ok(filters)
    }

    /// Soft delete. Sidebar references to it drop out on the next join.
    pub async fn delete(&self, id: &str) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard
            .as_ref()
            .ok_or_else(DomainError::not_initialized)?;

        let changed = conn
            .execute(
                "UPDATE filters SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL",
                params![chrono::Utc::now().timestamp_millis(), id],
            )
            .map_err(DomainError::internal)?;
        if changed == 0 {
            return Err(DomainError::NotFound(format!("Filter {} not found", id)));
        }
        Ok(())
    }

    /// Read-only view for the sidebar's join step
    pub async fn snapshot(&self) -> DomainResult<Snapshot> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .map(|filter| {
                let info = filter.info();
                (filter.id, info)
            })
            .collect())
    }
}
