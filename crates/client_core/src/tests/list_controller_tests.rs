use std::{sync::Arc, time::Duration};

use shared::domain::{CategoryDraft, CategoryId, CategoryRecord};

use super::*;
use crate::test_support::{
    category, server_down, FakeCategoryBackend, GatedCategoryBackend, HangingBackend,
};

const TIMEOUT: Duration = Duration::from_secs(5);

async fn loaded(records: Vec<CategoryRecord>) -> (Arc<FakeCategoryBackend>, ListController) {
    let backend = Arc::new(FakeCategoryBackend::with_records(records));
    let list = ListController::new(backend.clone(), TIMEOUT);
    list.load().await.expect("initial load");
    (backend, list)
}

#[tokio::test]
async fn load_replaces_cache_and_drops_duplicate_ids() {
    let (_, list) = loaded(vec![
        category(1, "Books"),
        category(2, "Music"),
        category(1, "Books again"),
    ])
    .await;

    let names: Vec<_> = list.snapshot().await.into_iter().map(|r| r.name).collect();
    assert_eq!(names, ["Books", "Music"]);
}

#[tokio::test]
async fn failed_load_keeps_previous_cache() {
    let (backend, list) = loaded(vec![category(1, "Books")]).await;
    backend.fail_with(server_down());

    let err = list.load().await.expect_err("load should fail");
    assert!(err.to_string().starts_with("Failed to fetch categories"));
    assert_eq!(list.snapshot().await, vec![category(1, "Books")]);
}

#[tokio::test]
async fn add_appends_exactly_one_confirmed_record() {
    let (_, list) = loaded(vec![category(1, "Books"), category(2, "Music")]).await;

    let created = list
        .request_add(CategoryDraft::new("Games", "Board and video"))
        .await
        .expect("add");

    let snapshot = list.snapshot().await;
    assert_eq!(snapshot.len(), 3);
    assert_eq!(snapshot.last(), Some(&created));
    assert_eq!(created.id, CategoryId(3));
    assert_eq!(created.name, "Games");
}

#[tokio::test]
async fn failed_add_leaves_cache_untouched() {
    let (backend, list) = loaded(vec![category(1, "Books")]).await;
    let before = list.snapshot().await;
    backend.fail_with(server_down());

    let err = list
        .request_add(CategoryDraft::new("Games", ""))
        .await
        .expect_err("add should fail");
    assert!(matches!(err, MutationError::Add(BackendError::Status { status: 500, .. })));
    assert_eq!(list.snapshot().await, before);
}

#[tokio::test]
async fn edit_replaces_in_place_and_keeps_order() {
    let (backend, list) =
        loaded(vec![category(1, "Books"), category(2, "Music"), category(3, "Games")]).await;

    let updated = list
        .request_edit(CategoryId(2), CategoryDraft::new("Records", "Vinyl only"))
        .await
        .expect("edit");

    assert_eq!(updated.id, CategoryId(2));
    let snapshot = list.snapshot().await;
    let ids: Vec<_> = snapshot.iter().map(|r| r.id.0).collect();
    assert_eq!(ids, [1, 2, 3]);
    assert_eq!(snapshot[1].name, "Records");
    assert_eq!(snapshot[1].description, "Vinyl only");
    assert_eq!(backend.server_records()[1].name, "Records");
}

#[tokio::test]
async fn failed_edit_keeps_old_values() {
    let (backend, list) = loaded(vec![category(1, "Books")]).await;
    backend.fail_with(server_down());

    let err = list
        .request_edit(CategoryId(1), CategoryDraft::new("Comics", ""))
        .await
        .expect_err("edit should fail");
    assert!(matches!(err, MutationError::Update { id: CategoryId(1), .. }));
    assert_eq!(list.get(CategoryId(1)).await, Some(category(1, "Books")));
}

#[tokio::test]
async fn delete_removes_only_the_target() {
    let (_, list) = loaded(vec![
        category(4, "Books"),
        category(5, "Music"),
        category(6, "Games"),
    ])
    .await;

    list.request_delete(CategoryId(5)).await.expect("delete");

    let ids: Vec<_> = list.snapshot().await.iter().map(|r| r.id.0).collect();
    assert_eq!(ids, [4, 6]);
}

#[tokio::test]
async fn failed_delete_keeps_the_entry() {
    let (backend, list) = loaded(vec![category(5, "Music")]).await;
    backend.fail_with(server_down());

    let err = list
        .request_delete(CategoryId(5))
        .await
        .expect_err("delete should fail");
    assert!(matches!(err.backend(), BackendError::Status { status: 500, .. }));
    assert_eq!(list.len().await, 1);

    backend.recover();
    list.request_delete(CategoryId(5)).await.expect("retry");
    assert!(list.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn unanswered_call_times_out_without_touching_cache() {
    let list = ListController::new(Arc::new(HangingBackend), Duration::from_millis(250));

    let err = list.load().await.expect_err("load should time out");
    assert!(matches!(err.0, BackendError::TimedOut(d) if d == Duration::from_millis(250)));

    let err = list
        .request_add(CategoryDraft::new("Games", ""))
        .await
        .expect_err("add should time out");
    assert!(matches!(err.backend(), BackendError::TimedOut(_)));
    assert!(list.is_empty().await);
}

#[tokio::test]
async fn delete_confirmed_before_edit_keeps_entry_removed() {
    let backend = Arc::new(GatedCategoryBackend::with_records(vec![
        category(1, "Books"),
        category(2, "Music"),
    ]));
    let list = Arc::new(ListController::new(backend.clone(), TIMEOUT));
    list.load().await.expect("load");

    let edit = tokio::spawn({
        let list = list.clone();
        async move {
            list.request_edit(CategoryId(2), CategoryDraft::new("Records", ""))
                .await
        }
    });
    let delete = tokio::spawn({
        let list = list.clone();
        async move { list.request_delete(CategoryId(2)).await }
    });

    backend.release_delete();
    delete.await.expect("join").expect("delete");
    backend.release_update();
    edit.await.expect("join").expect("edit is confirmed by the server");

    assert_eq!(list.snapshot().await, vec![category(1, "Books")]);
}

#[tokio::test]
async fn edit_confirmed_before_delete_ends_with_removal() {
    let backend = Arc::new(GatedCategoryBackend::with_records(vec![category(2, "Music")]));
    let list = Arc::new(ListController::new(backend.clone(), TIMEOUT));
    list.load().await.expect("load");

    let edit = tokio::spawn({
        let list = list.clone();
        async move {
            list.request_edit(CategoryId(2), CategoryDraft::new("Records", ""))
                .await
        }
    });
    let delete = tokio::spawn({
        let list = list.clone();
        async move { list.request_delete(CategoryId(2)).await }
    });

    backend.release_update();
    edit.await.expect("join").expect("edit");
    backend.release_delete();
    delete.await.expect("join").expect("delete");

    assert!(list.is_empty().await);
}

#[tokio::test]
async fn concurrent_adds_all_land_in_the_cache() {
    let (backend, list) = loaded(vec![category(1, "Books")]).await;

    let results = futures::future::join_all(
        ["Music", "Games", "Maps"]
            .into_iter()
            .map(|name| list.request_add(CategoryDraft::new(name, ""))),
    )
    .await;

    assert!(results.iter().all(Result::is_ok));
    let mut cached: Vec<_> = list.snapshot().await.into_iter().map(|r| r.id.0).collect();
    cached.sort_unstable();
    assert_eq!(cached, [1, 2, 3, 4]);
    assert_eq!(backend.server_records().len(), 4);
}
