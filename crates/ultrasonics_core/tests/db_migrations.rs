use rusqlite::Connection;
use ultrasonics_core::db::migrations::latest_version;
use ultrasonics_core::db::{open_db, open_db_in_memory, table_exists, DbError};
use ultrasonics_core::StoreConfig;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert!(table_exists(&conn, "plugins").unwrap());
    assert!(table_exists(&conn, "applets").unwrap());
}

#[test]
fn migrations_leave_settings_table_to_install_seeding() {
    let conn = open_db_in_memory().unwrap();
    assert!(!table_exists(&conn, "settings").unwrap());
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::with_path(dir.path().join("ultrasonics.db"));

    let conn_first = open_db(&config).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&config).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert!(table_exists(&conn_second, "applets").unwrap());
}

#[test]
fn open_db_creates_missing_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config").join("nested").join("ultrasonics.db");

    open_db(&StoreConfig::with_path(&path)).unwrap();
    assert!(path.exists());
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&StoreConfig::with_path(&path)).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}
