use entity_core::db::migrations::latest_version;
use entity_core::db::{open_db, open_db_in_memory};
use entity_core::{
    Entity, EntityRepository, EntityService, ErrorKind, RepoError, SqliteEntityRepository,
};
use rusqlite::Connection;

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteEntityRepository::try_new(conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_entities_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteEntityRepository::try_new(conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("entities"))
    ));
}

#[test]
fn repository_rejects_connection_missing_required_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE entities (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteEntityRepository::try_new(conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "entities",
            column: "updated_at"
        })
    ));
}

#[test]
fn entities_survive_reopening_the_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("entities.db");

    let id = {
        let repo = SqliteEntityRepository::try_new(open_db(&path).unwrap()).unwrap();
        let service = EntityService::new(repo);
        service.create(&Entity::new("durable")).unwrap()
    };

    let repo = SqliteEntityRepository::try_new(open_db(&path).unwrap()).unwrap();
    let loaded = repo.find_by_id(&id).unwrap();
    assert_eq!(loaded.name, "durable");
    assert_eq!(loaded.created_at, loaded.updated_at);
}

#[test]
fn corrupt_rows_are_reported_not_masked() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "PRAGMA ignore_check_constraints = ON;
         INSERT INTO entities (id, name, created_at, updated_at) VALUES ('bad', '', 1, 1);
         PRAGMA ignore_check_constraints = OFF;",
    )
    .unwrap();
    let service = EntityService::new(SqliteEntityRepository::try_new(conn).unwrap());

    let err = service.get_by_id("bad").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert!(matches!(err.repo_error(), Some(RepoError::InvalidData(_))));

    let list_err = service.list().unwrap_err();
    assert_eq!(list_err.kind(), ErrorKind::Internal);
}

#[test]
fn direct_store_write_with_empty_name_is_internal_failure() {
    let repo = SqliteEntityRepository::try_new(open_db_in_memory().unwrap()).unwrap();

    let err = repo.create(&Entity::with_id("x", "")).unwrap_err();

    assert!(matches!(err, RepoError::Db(_)), "unexpected error: {err}");
    assert_eq!(err.kind(), ErrorKind::Internal);
}
