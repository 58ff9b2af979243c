use contestdesk_core::db::migrations::latest_version;
use contestdesk_core::db::{open_db, open_db_in_memory, DbError};
use contestdesk_core::{SqliteProblemRepository, StorageError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "problems");
    assert_table_exists(&conn, "miscellaneous");
}

#[test]
fn fresh_database_seeds_empty_problems_order() {
    let conn = open_db_in_memory().unwrap();

    let value: String = conn
        .query_row(
            "SELECT value FROM miscellaneous WHERE name = 'problemsOrder';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(value, "[]");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("contestdesk.sqlite3");

    let conn_first = open_db(&path).unwrap();
    conn_first
        .execute(
            "UPDATE miscellaneous SET value = '[\"p1\"]' WHERE name = 'problemsOrder';",
            [],
        )
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let value: String = conn_second
        .query_row(
            "SELECT value FROM miscellaneous WHERE name = 'problemsOrder';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(value, "[\"p1\"]");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
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

#[test]
fn repository_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let err = SqliteProblemRepository::try_new(&conn).err().unwrap();
    assert!(matches!(
        err,
        StorageError::UninitializedConnection {
            actual_version: 0,
            ..
        }
    ));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
