//! Database Connection and Setup
//!
//! Manages the SQLite connection and migrations.

use std::path::Path;
use std::sync::Arc;

use rusqlite::Connection;
use tokio::sync::Mutex;

/// Shared connection slot. `None` until initialized.
pub type DbConn = Arc<Mutex<Option<Connection>>>;

/// Database state wrapper
#[derive(Clone, Default)]
pub struct DbState {
    pub conn: DbConn,
}

impl DbState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_ready(&self) -> bool {
        self.conn.lock().await.is_some()
    }

    /// Close the connection; repositories report "not initialized" after
    pub async fn close(&self) {
        self.conn.lock().await.take();
    }
}

/// Open (or create) the database at `db_path` and migrate it.
/// `:memory:` gives a private in-memory database.
pub async fn init_db(db_path: &Path) -> Result<DbState, String> {
    let conn = Connection::open(db_path)
        .map_err(|e| format!("Failed to open {}: {}", db_path.display(), e))?;

    run_migrations(&conn)?;

    let state = DbState::new();
    *state.conn.lock().await = Some(conn);
    Ok(state)
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> bool {
    let query = format!("PRAGMA table_info({})", table);
    let Ok(mut stmt) = conn.prepare(&query) else {
        return false;
    };
    let Ok(mut rows) = stmt.query([]) else {
        return false;
    };
    while let Ok(Some(row)) = rows.next() {
        if let Ok(name) = row.get::<_, String>(1) {
            if name == column {
                return true;
            }
        }
    }
    false
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> Result<(), String> {
    // Root list: one row per entry, `key` is the builtin key, reference id or group id
    conn.execute(
        "CREATE TABLE IF NOT EXISTS sidebar_entries (
            position INTEGER PRIMARY KEY,
            kind TEXT NOT NULL,
            key TEXT NOT NULL,
            name TEXT
        )",
        [],
    )
    .map_err(|e| e.to_string())?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS sidebar_group_children (
            group_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            kind TEXT NOT NULL,
            key TEXT NOT NULL,
            PRIMARY KEY (group_id, position)
        )",
        [],
    )
    .map_err(|e| e.to_string())?;

    if !column_exists(conn, "sidebar_entries", "updated_at") {
        conn.execute(
            "ALTER TABLE sidebar_entries ADD COLUMN updated_at INTEGER NOT NULL DEFAULT 0",
            [],
        )
        .map_err(|e| format!("Failed to add updated_at: {}", e))?;
    }

    // Saved filters: the objects sidebar references point at
    conn.execute(
        "CREATE TABLE IF NOT EXISTS filters (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            content_types TEXT NOT NULL DEFAULT '[]',
            created_at INTEGER NOT NULL
        )",
        [],
    )
    .map_err(|e| e.to_string())?;

    if !column_exists(conn, "filters", "deleted_at") {
        conn.execute("ALTER TABLE filters ADD COLUMN deleted_at INTEGER", [])
            .map_err(|e| format!("Failed to add deleted_at: {}", e))?;
    }

    Ok(())
}

#[cfg(test)]
pub(crate) fn migrate_for_test(conn: &Connection) -> Result<(), String> {
    run_migrations(conn)
}
