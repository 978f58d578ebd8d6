//! Repository Integration Tests
//!
//! Tree store and filter repository against in-memory SQLite.

use std::path::PathBuf;

use navtree::models::{BuiltinKey, ContentType, MinimalChild, MinimalEntry};
use navtree::remote::TreeStore;
use navtree::DomainError;
use rusqlite::Connection;

use super::db::migrate_for_test;
use super::{init_db, DbState, FilterRepository, SavedFilter, SqliteTreeStore};

async fn setup_test_db() -> DbState {
    let db_path = PathBuf::from(":memory:");
    init_db(&db_path).await.expect("Failed to init test DB")
}

fn sample_tree() -> Vec<MinimalEntry> {
    vec![
        MinimalEntry::Builtin { key: BuiltinKey::All },
        MinimalEntry::Group {
            id: "g1".to_string(),
            name: "Work".to_string(),
            children: vec![
                MinimalChild::Reference { id: "3".to_string() },
                MinimalChild::Builtin { key: BuiltinKey::Trash },
            ],
        },
        MinimalEntry::Reference { id: "7".to_string() },
        MinimalEntry::Group {
            id: "g2".to_string(),
            name: "Empty".to_string(),
            children: vec![],
        },
    ]
}

#[tokio::test]
async fn test_empty_database_loads_empty_tree() {
    let db = setup_test_db().await;
    let store = SqliteTreeStore::new(db.conn.clone());
    assert!(store.load_tree().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_persist_then_load_keeps_order() {
    let db = setup_test_db().await;
    let store = SqliteTreeStore::new(db.conn.clone());

    store.persist_tree(&sample_tree()).await.unwrap();
    assert_eq!(store.load_tree().await.unwrap(), sample_tree());
}

#[tokio::test]
async fn test_persist_replaces_previous_tree() {
    let db = setup_test_db().await;
    let store = SqliteTreeStore::new(db.conn.clone());
    store.persist_tree(&sample_tree()).await.unwrap();

    let smaller = vec![
        MinimalEntry::Reference { id: "7".to_string() },
        MinimalEntry::Builtin { key: BuiltinKey::All },
    ];
    store.persist_tree(&smaller).await.unwrap();

    assert_eq!(store.load_tree().await.unwrap(), smaller);
    let guard = db.conn.lock().await;
    let orphans: i64 = guard
        .as_ref()
        .unwrap()
        .query_row("SELECT COUNT(*) FROM sidebar_group_children", [], |row| row.get(0))
        .unwrap();
    assert_eq!(orphans, 0);
}

#[tokio::test]
async fn test_unknown_rows_are_skipped() {
    let db = setup_test_db().await;
    {
        let guard = db.conn.lock().await;
        let conn = guard.as_ref().unwrap();
        conn.execute(
            "INSERT INTO sidebar_entries (position, kind, key) VALUES (0, 'builtin', 'inbox'), (1, 'builtin', 'all'), (2, 'widget', 'x')",
            [],
        )
        .unwrap();
    }
    let store = SqliteTreeStore::new(db.conn.clone());
    assert_eq!(
        store.load_tree().await.unwrap(),
        vec![MinimalEntry::Builtin { key: BuiltinKey::All }]
    );
}

#[tokio::test]
async fn test_rows_breaking_sortable_ids_are_skipped() {
    let db = setup_test_db().await;
    {
        let guard = db.conn.lock().await;
        let conn = guard.as_ref().unwrap();
        conn.execute(
            "INSERT INTO sidebar_entries (position, kind, key, name) VALUES \
             (0, 'group', 'a:b', 'Colon'), (1, 'group', '', 'Blank'), (2, 'reference', '', NULL), \
             (3, 'group', 'g1', 'Work'), (4, 'reference', '7', NULL)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO sidebar_group_children (group_id, position, kind, key) VALUES \
             ('g1', 0, 'reference', ''), ('g1', 1, 'reference', '3')",
            [],
        )
        .unwrap();
    }
    let store = SqliteTreeStore::new(db.conn.clone());
    assert_eq!(
        store.load_tree().await.unwrap(),
        vec![
            MinimalEntry::Group {
                id: "g1".to_string(),
                name: "Work".to_string(),
                children: vec![MinimalChild::Reference { id: "3".to_string() }],
            },
            MinimalEntry::Reference { id: "7".to_string() },
        ]
    );
}

#[tokio::test]
async fn test_closed_database_reports_internal_error() {
    let db = setup_test_db().await;
    let store = SqliteTreeStore::new(db.conn.clone());
    db.close().await;

    assert!(!db.is_ready().await);
    assert!(matches!(store.load_tree().await, Err(DomainError::Internal(_))));
    assert!(matches!(store.persist_tree(&sample_tree()).await, Err(DomainError::Internal(_))));
}

#[test]
fn test_migrations_are_idempotent() {
    let conn = Connection::open_in_memory().unwrap();
    migrate_for_test(&conn).unwrap();
    migrate_for_test(&conn).unwrap();
}

// ========================
// Filters
// ========================

#[tokio::test]
async fn test_filter_crud() {
    let db = setup_test_db().await;
    let repo = FilterRepository::new(db.conn.clone());

    let reading = SavedFilter::new("3", "Reading", [ContentType::Bookmark, ContentType::Note]);
    repo.create(&reading).await.unwrap();
    repo.create(&SavedFilter::new("7", "Inbox", [])).await.unwrap();

    let filters = repo.list().await.unwrap();
    assert_eq!(filters.len(), 2);
    assert_eq!(filters[0], reading);

    assert!(matches!(repo.create(&reading).await, Err(DomainError::Conflict(_))));
    assert!(matches!(
        repo.create(&SavedFilter::new("8", "  ", [])).await,
        Err(DomainError::InvalidInput(_))
    ));

    repo.delete("3").await.unwrap();
    assert_eq!(repo.list().await.unwrap().len(), 1);
    assert!(matches!(repo.delete("3").await, Err(DomainError::NotFound(_))));

    // A deleted id can be reused
    repo.create(&reading).await.unwrap();
    assert_eq!(repo.list().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_corrupt_filter_types_are_reported() {
    let db = setup_test_db().await;
    let repo = FilterRepository::new(db.conn.clone());
    repo.create(&SavedFilter::new("3", "Reading", [ContentType::Image])).await.unwrap();
    {
        let guard = db.conn.lock().await;
        guard
            .as_ref()
            .unwrap()
            .execute("UPDATE filters SET content_types = 'not json' WHERE id = '3'", [])
            .unwrap();
    }

    assert!(matches!(repo.list().await, Err(DomainError::Internal(msg)) if msg.contains("Filter 3")));
    assert!(repo.snapshot().await.is_err());
}

#[tokio::test]
async fn test_filter_snapshot() {
    let db = setup_test_db().await;
    let repo = FilterRepository::new(db.conn.clone());
    repo.create(&SavedFilter::new("3", "Reading", [ContentType::Image])).await.unwrap();

    let snapshot = repo.snapshot().await.unwrap();
    assert_eq!(snapshot.len(), 1);
    let info = snapshot.get("3").unwrap();
    assert_eq!(info.name, "Reading");
    assert!(info.content_types.contains(&ContentType::Image));
}
