//! Repository Layer
//!
//! SQLite-backed stores for the sidebar tree and the saved filters it
//! references.

mod db;
mod filter_repo;
mod tree_repo;

#[cfg(test)]
mod tests;

pub use db::{init_db, DbConn, DbState};
pub use filter_repo::{FilterRepository, SavedFilter};
pub use tree_repo::SqliteTreeStore;
