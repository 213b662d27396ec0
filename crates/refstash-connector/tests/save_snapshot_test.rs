mod helpers;

use helpers::{fixtures, setup_test_app, wait_until};
use refstash_core::models::ItemSummary;
use refstash_store::{AttachmentKind, ItemChange, ItemStore, LibraryProvider};
use serde_json::json;

const PAGE_HTML: &str = "<html><head><title>Title</title></head><body>Body</body></html>";

#[tokio::test]
async fn saves_webpage_parent_and_snapshot_child() {
    let app = setup_test_app().await;
    let personal = app.libraries.default_library();
    let collection = app.libraries.add_collection(personal, "Current");
    app.libraries.select_collection(collection);

    let mut events = app.store.subscribe();

    let response = app
        .server
        .post("/connector/saveSnapshot")
        .json(&json!({
            "url": "http://example.com",
            "html": PAGE_HTML
        }))
        .await;
    assert_eq!(response.status_code(), 201);

    // Parent and child are both persisted before the response returns
    let ItemChange::Added { id: parent_id, .. } = events.recv().await.unwrap();
    let parent = app.store.get(parent_id).await.unwrap().unwrap();
    assert_eq!(parent.item_type, "webpage");
    assert_eq!(parent.title(), "Title");
    assert!(parent.collections.contains(&collection));

    let ItemChange::Added { id: child_id, parent_id: child_parent } =
        events.recv().await.unwrap();
    assert_eq!(child_parent, Some(parent_id));
    let child = app.store.get(child_id).await.unwrap().unwrap();
    assert!(child.is_imported_attachment());
    assert_eq!(child.title(), "Title");
    assert_eq!(
        child.attachment.as_ref().unwrap().kind,
        AttachmentKind::ImportedSnapshot
    );
}

#[tokio::test]
async fn pdf_save_imports_file_and_recognition_fills_in_metadata() {
    let app = setup_test_app().await;
    let personal = app.libraries.default_library();
    let collection = app.libraries.add_collection(personal, "Current");
    app.libraries.select_collection(collection);

    let fixture = fixtures::attachment_server().await;

    let response = app
        .server
        .post("/connector/saveSnapshot")
        .json(&json!({
            "url": fixture.url("/test.pdf"),
            "pdf": true
        }))
        .await;
    assert_eq!(response.status_code(), 201);

    let summaries: Vec<ItemSummary> = response.json();
    let parent_id = summaries[0].id;
    let parent = app.store.get(parent_id).await.unwrap().unwrap();
    assert_eq!(parent.item_type, "webpage");
    assert!(parent.collections.contains(&collection));

    // The imported PDF hangs off the synthesized parent
    assert_eq!(app.store.len(), 2);

    // Recognition runs after the response and retitles the parent
    let recognized = wait_until(|| async {
        app.store
            .get(parent_id)
            .await
            .unwrap()
            .map(|item| item.title() == "Test")
            .unwrap_or(false)
    })
    .await;
    assert!(recognized, "recognizer never enriched the parent item");
}

#[tokio::test]
async fn switches_to_personal_library_when_read_only_library_is_selected() {
    let app = setup_test_app().await;
    let group = app.libraries.add_library("Read-only Group", false);
    app.libraries.select_library(group);

    let response = app
        .server
        .post("/connector/saveSnapshot")
        .json(&json!({
            "url": "http://example.com",
            "html": PAGE_HTML
        }))
        .await;
    assert_eq!(response.status_code(), 201);

    let summaries: Vec<ItemSummary> = response.json();
    let item = app.store.get(summaries[0].id).await.unwrap().unwrap();
    assert_eq!(item.library_id, app.libraries.default_library());
}

#[tokio::test]
async fn missing_html_is_a_validation_error() {
    let app = setup_test_app().await;

    let response = app
        .server
        .post("/connector/saveSnapshot")
        .json(&json!({ "url": "http://example.com" }))
        .await;
    assert_eq!(response.status_code(), 400);
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn unreachable_pdf_fetch_fails_the_request() {
    let app = setup_test_app().await;

    let response = app
        .server
        .post("/connector/saveSnapshot")
        .json(&json!({
            "url": "http://127.0.0.1:9/test.pdf",
            "pdf": true
        }))
        .await;
    assert_eq!(response.status_code(), 500);
    assert!(app.store.is_empty());
}
