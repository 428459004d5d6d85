use meeple_db::open_memory;
use meeple_db::schema::{CURRENT_VERSION, SchemaError, create_schema, get_schema_version};

#[test]
fn create_schema_in_memory() {
    let conn = open_memory().unwrap();
    assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_VERSION);
}

#[test]
fn schema_is_idempotent() {
    let conn = open_memory().unwrap();
    create_schema(&conn).unwrap();
    let rows: i32 = conn
        .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn foreign_keys_enabled() {
    let conn = open_memory().unwrap();
    let fk: i32 = conn
        .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
        .unwrap();
    assert_eq!(fk, 1);
}

#[test]
fn games_table_exists() {
    let conn = open_memory().unwrap();
    let exists: bool = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='games')",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert!(exists);
}

#[test]
fn reopen_file_database_keeps_rows() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("catalog.db");

    {
        let conn = meeple_db::open_database(&path).unwrap();
        conn.execute(
            "INSERT INTO games (id, name, name_key) VALUES ('gam-1', 'Azul', 'azul')",
            [],
        )
        .unwrap();
    }

    let conn = meeple_db::open_database(&path).unwrap();
    let count: i32 = conn
        .query_row("SELECT COUNT(*) FROM games", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_VERSION);
}

#[test]
fn newer_schema_is_rejected() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("future.db");
    {
        let conn = meeple_db::open_database(&path).unwrap();
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [CURRENT_VERSION + 1],
        )
        .unwrap();
    }

    let err = meeple_db::open_database(&path).unwrap_err();
    assert!(matches!(err, SchemaError::VersionMismatch { .. }));
}

#[test]
fn self_referencing_base_violates_check() {
    let conn = open_memory().unwrap();
    let result = conn.execute(
        "INSERT INTO games (id, name, name_key, base_game_id) VALUES ('gam-1', 'Loop', 'loop', 'gam-1')",
        [],
    );
    assert!(result.is_err());
}
