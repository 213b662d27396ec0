mod helpers;

use helpers::{fixtures, setup_test_app};
use refstash_core::models::ItemSummary;
use refstash_store::{ItemStore, LibraryProvider};
use serde_json::json;

#[tokio::test]
async fn updates_collections_and_tags_of_items_saved_via_save_items() {
    let app = setup_test_app().await;
    let personal = app.libraries.default_library();
    let collection1 = app.libraries.add_collection(personal, "Target");
    let collection2 = app.libraries.add_collection(personal, "Current");
    app.libraries.select_collection(collection2);

    let fixture = fixtures::attachment_server().await;

    let response = app
        .server
        .post("/connector/saveItems")
        .json(&json!({
            "sessionID": "session-1",
            "items": [{
                "itemType": "newspaperArticle",
                "title": "Title",
                "creators": [
                    {"firstName": "First", "lastName": "Last", "creatorType": "author"}
                ],
                "attachments": [{
                    "title": "Attachment",
                    "url": fixture.url("/attachment"),
                    "mimeType": "text/html"
                }]
            }],
            "uri": "http://example.com"
        }))
        .await;
    assert_eq!(response.status_code(), 201);

    let summaries: Vec<ItemSummary> = response.json();
    let parent_id = summaries[0].id;
    let saved = app.store.get(parent_id).await.unwrap().unwrap();
    assert!(saved.collections.contains(&collection2));

    let response = app
        .server
        .post("/connector/updateSession")
        .json(&json!({
            "sessionID": "session-1",
            "target": format!("C{}", collection1),
            "tags": "A, B"
        }))
        .await;
    assert_eq!(response.status_code(), 200);

    let item = app.store.get(parent_id).await.unwrap().unwrap();
    assert!(item.collections.contains(&collection1));
    // Original collection membership is kept
    assert!(item.collections.contains(&collection2));
    assert!(item.tags.contains("A"));
    assert!(item.tags.contains("B"));
}

#[tokio::test]
async fn updates_collections_and_tags_of_pdf_saved_via_save_snapshot() {
    let app = setup_test_app().await;
    let personal = app.libraries.default_library();
    let collection1 = app.libraries.add_collection(personal, "Target");
    let collection2 = app.libraries.add_collection(personal, "Current");
    app.libraries.select_collection(collection2);

    let fixture = fixtures::attachment_server().await;

    let response = app
        .server
        .post("/connector/saveSnapshot")
        .json(&json!({
            "sessionID": "session-pdf",
            "url": fixture.url("/test.pdf"),
            "pdf": true
        }))
        .await;
    assert_eq!(response.status_code(), 201);

    let summaries: Vec<ItemSummary> = response.json();
    let parent_id = summaries[0].id;
    let saved = app.store.get(parent_id).await.unwrap().unwrap();
    assert!(saved.collections.contains(&collection2));

    let response = app
        .server
        .post("/connector/updateSession")
        .json(&json!({
            "sessionID": "session-pdf",
            "target": format!("C{}", collection1),
            "tags": "A, B"
        }))
        .await;
    assert_eq!(response.status_code(), 200);

    let item = app.store.get(parent_id).await.unwrap().unwrap();
    assert!(item.collections.contains(&collection1));
    assert!(item.tags.contains("A"));
    assert!(item.tags.contains("B"));
}

#[tokio::test]
async fn updates_webpage_snapshot_session() {
    let app = setup_test_app().await;
    let personal = app.libraries.default_library();
    let collection1 = app.libraries.add_collection(personal, "Target");

    let response = app
        .server
        .post("/connector/saveSnapshot")
        .json(&json!({
            "sessionID": "session-web",
            "url": "http://example.com",
            "html": "<html><head><title>Title</title></head><body>Body</body></html>"
        }))
        .await;
    assert_eq!(response.status_code(), 201);

    let summaries: Vec<ItemSummary> = response.json();
    let parent_id = summaries[0].id;

    let response = app
        .server
        .post("/connector/updateSession")
        .json(&json!({
            "sessionID": "session-web",
            "target": format!("C{}", collection1),
            "tags": "A, B"
        }))
        .await;
    assert_eq!(response.status_code(), 200);

    let item = app.store.get(parent_id).await.unwrap().unwrap();
    assert!(item.collections.contains(&collection1));
    assert!(item.tags.contains("A"));
    assert!(item.tags.contains("B"));

    // The snapshot child was recorded under the session too
    let session = app.state.sessions.lookup("session-web").await.unwrap();
    assert_eq!(session.item_ids.len(), 2);
    assert_eq!(session.item_ids[0], parent_id);
}

#[tokio::test]
async fn unknown_session_returns_404_and_mutates_nothing() {
    let app = setup_test_app().await;

    let response = app
        .server
        .post("/connector/updateSession")
        .json(&json!({
            "sessionID": "missing",
            "target": format!("C{}", uuid::Uuid::new_v4()),
            "tags": "A"
        }))
        .await;
    assert_eq!(response.status_code(), 404);
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn malformed_target_is_a_validation_error() {
    let app = setup_test_app().await;

    app.server
        .post("/connector/saveSnapshot")
        .json(&json!({
            "sessionID": "session-x",
            "url": "http://example.com",
            "html": "<html><head><title>T</title></head></html>"
        }))
        .await;

    let response = app
        .server
        .post("/connector/updateSession")
        .json(&json!({
            "sessionID": "session-x",
            "target": "X-not-a-target",
            "tags": "A"
        }))
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn duplicate_tags_are_not_duplicated() {
    let app = setup_test_app().await;

    let response = app
        .server
        .post("/connector/saveSnapshot")
        .json(&json!({
            "sessionID": "session-tags",
            "url": "http://example.com",
            "html": "<html><head><title>T</title></head></html>"
        }))
        .await;
    let summaries: Vec<ItemSummary> = response.json();
    let parent_id = summaries[0].id;

    for _ in 0..2 {
        let response = app
            .server
            .post("/connector/updateSession")
            .json(&json!({
                "sessionID": "session-tags",
                "tags": "A, A, B"
            }))
            .await;
        assert_eq!(response.status_code(), 200);
    }

    let item = app.store.get(parent_id).await.unwrap().unwrap();
    assert_eq!(item.tags.len(), 2);
}
