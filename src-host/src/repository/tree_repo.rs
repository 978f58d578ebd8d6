//! Sidebar Tree Repository
//!
//! SQLite implementation of the sidebar's remote tree store. Every persist
//! rewrites both tables in one transaction with sequential positions.

use async_trait::async_trait;
use log::{debug, warn};
use rusqlite::{params, Connection};

use navtree::models::{BuiltinKey, MinimalChild, MinimalEntry, MinimalTree};
use navtree::remote::TreeStore;
use navtree::{DomainError, DomainResult};

use super::db::DbConn;

const KIND_BUILTIN: &str = "builtin";
const KIND_REFERENCE: &str = "reference";
const KIND_GROUP: &str = "group";

pub struct SqliteTreeStore {
    conn: DbConn,
}

impl SqliteTreeStore {
    pub fn new(conn: DbConn) -> Self {
        Self { conn }
    }
}

/// Decode a builtin or reference row. Unknown kinds and keys, and empty
/// reference ids, yield `None`.
fn decode_node(kind: &str, key: String) -> Option<MinimalChild> {
    match kind {
        KIND_BUILTIN => BuiltinKey::from_key(&key).map(|key| MinimalChild::Builtin { key }),
        KIND_REFERENCE if !key.is_empty() => Some(MinimalChild::Reference { id: key }),
        _ => None,
    }
}

/// Group ids end up inside `inchild:` and `dropzone:` ids
fn valid_group_id(id: &str) -> bool {
    !id.is_empty() && !id.contains(':')
}

fn read_children(conn: &Connection, group_id: &str) -> DomainResult<Vec<MinimalChild>> {
    let mut stmt = conn
        .prepare("SELECT kind, key FROM sidebar_group_children WHERE group_id = ? ORDER BY position ASC")
        .map_err(DomainError::internal)?;
    let mut rows = stmt.query(params![group_id]).map_err(DomainError::internal)?;

    let mut children = Vec::new();
    while let Some(row) = rows.next().map_err(DomainError::internal)? {
        let kind: String = row.get(0).map_err(DomainError::internal)?;
        let key: String = row.get(1).map_err(DomainError::internal)?;
        let key_for_log = key.clone();
        match decode_node(&kind, key) {
            Some(child) => children.push(child),
            None => warn!("[DB] Skipping invalid child row {} {:?} in group {}", kind, key_for_log, group_id),
        }
    }
    Ok(children)
}

#[async_trait]
impl TreeStore for SqliteTreeStore {
    async fn load_tree(&self) -> DomainResult<MinimalTree> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        let mut stmt = conn
            .prepare("SELECT kind, key, name FROM sidebar_entries ORDER BY position ASC")
            .map_err(DomainError::internal)?;
        let mut rows = stmt.query([]).map_err(DomainError::internal)?;

        let mut tree = Vec::new();
        while let Some(row) = rows.next().map_err(DomainError::internal)? {
            let kind: String = row.get(0).map_err(DomainError::internal)?;
            let key: String = row.get(1).map_err(DomainError::internal)?;
            let name: Option<String> = row.get(2).map_err(DomainError::internal)?;

            if kind == KIND_GROUP {
                if !valid_group_id(&key) {
                    warn!("[DB] Skipping group with invalid id {:?}", key);
                    continue;
                }
                let children = read_children(conn, &key)?;
                tree.push(MinimalEntry::Group {
                    id: key,
                    name: name.unwrap_or_default(),
                    children,
                });
                continue;
            }
            match decode_node(&kind, key) {
                Some(MinimalChild::Builtin { key }) => tree.push(MinimalEntry::Builtin { key }),
                Some(MinimalChild::Reference { id }) => tree.push(MinimalEntry::Reference { id }),
                None => warn!("[DB] Skipping invalid sidebar row {}", kind),
            }
        }
        debug!("[DB] Loaded sidebar tree with {} entries", tree.len());
        Ok(tree)
    }

    async fn persist_tree(&self, tree: &MinimalTree) -> DomainResult<()> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(DomainError::not_initialized)?;
        let now = chrono::Utc::now().timestamp_millis();

        let tx = conn.transaction().map_err(DomainError::internal)?;
        tx.execute("DELETE FROM sidebar_group_children", []).map_err(DomainError::internal)?;
        tx.execute("DELETE FROM sidebar_entries", []).map_err(DomainError::internal)?;

        for (position, entry) in tree.iter().enumerate() {
            let (kind, key, name) = match entry {
                MinimalEntry::Builtin { key } => (KIND_BUILTIN, key.as_str(), None),
                MinimalEntry::Reference { id } => (KIND_REFERENCE, id.as_str(), None),
                MinimalEntry::Group { id, name, .. } => (KIND_GROUP, id.as_str(), Some(name.as_str())),
            };
            tx.execute(
                "INSERT INTO sidebar_entries (position, kind, key, name, updated_at) VALUES (?, ?, ?, ?, ?)",
                params![position as i64, kind, key, name, now],
            )
            .map_err(DomainError::internal)?;

            if let MinimalEntry::Group { id, children, .. } = entry {
                for (child_pos, child) in children.iter().enumerate() {
                    let (kind, key) = match child {
                        MinimalChild::Builtin { key } => (KIND_BUILTIN, key.as_str()),
                        MinimalChild::Reference { id } => (KIND_REFERENCE, id.as_str()),
                    };
                    tx.execute(
                        "INSERT INTO sidebar_group_children (group_id, position, kind, key) VALUES (?, ?, ?, ?)",
                        params![id, child_pos as i64, kind, key],
                    )
                    .map_err(DomainError::internal)?;
                }
            }
        }

        tx.commit().map_err(DomainError::internal)?;
        debug!("[DB] Persisted sidebar tree with {} entries", tree.len());
        Ok(())
    }
}
