use super::*;

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn set_get_and_delete_round_trip() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    assert_eq!(storage.get_value("authToken").await.expect("get"), None);

    storage.set_value("authToken", "t-1").await.expect("set");
    storage.set_value("authToken", "t-2").await.expect("overwrite");
    assert_eq!(
        storage.get_value("authToken").await.expect("get").as_deref(),
        Some("t-2")
    );

    assert!(storage.delete_value("authToken").await.expect("delete"));
    assert!(!storage.delete_value("authToken").await.expect("delete again"));
    assert_eq!(storage.get_value("authToken").await.expect("get"), None);
}

#[tokio::test]
async fn values_survive_reopening_a_file_database() {
    let temp = tempfile::tempdir().expect("tempdir");
    let db_path = temp.path().join("nested").join("session.db");
    let database_url = db_path.to_string_lossy().to_string();

    {
        let storage = Storage::new(&database_url).await.expect("db");
        storage.set_value("authToken", "persisted").await.expect("set");
        storage.pool().close().await;
    }

    assert!(db_path.exists(), "database file should exist");
    let reopened = Storage::new(&database_url).await.expect("reopen");
    assert_eq!(
        reopened.get_value("authToken").await.expect("get").as_deref(),
        Some("persisted")
    );
}

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
    assert_eq!(
        normalize_database_url("sqlite:data\\session.db"),
        "sqlite://data/session.db"
    );
    assert_eq!(normalize_database_url("  "), "sqlite::memory:");
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
}

#[test]
fn creates_parent_dir_for_file_url() {
    let temp = tempfile::tempdir().expect("tempdir");
    let db_path = temp.path().join("data").join("test.db");

    prepare_database_url(db_path.to_string_lossy().as_ref()).expect("prepare db url");
    assert!(temp.path().join("data").exists());
}

#[tokio::test]
async fn empty_url_opens_an_in_memory_database() {
    assert_eq!(prepare_database_url("").expect("prepare"), "sqlite::memory:");

    let storage = Storage::new("   ").await.expect("db");
    storage.set_value("authToken", "ephemeral").await.expect("set");
    assert_eq!(
        storage.get_value("authToken").await.expect("get").as_deref(),
        Some("ephemeral")
    );
}
