mod helpers;

use helpers::setup_test_app;
use refstash_core::models::ItemSummary;
use refstash_store::ItemStore;
use refstash_store::LibraryProvider;

const BIBTEX: &str = r#"@book{test1,
  title={Test1},
  author={Owl},
  year={1000},
  publisher={Curly Braces Publishing}
}"#;

#[tokio::test]
async fn imports_bibtex_into_selected_collection() {
    let app = setup_test_app().await;
    let personal = app.libraries.default_library();
    let collection = app.libraries.add_collection(personal, "Current");
    app.libraries.select_collection(collection);

    let response = app
        .server
        .post("/connector/import")
        .bytes(BIBTEX.as_bytes().to_vec().into())
        .content_type("application/x-bibtex")
        .await;
    assert_eq!(response.status_code(), 201);

    let summaries: Vec<ItemSummary> = response.json();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].title, "Test1");

    let item = app.store.get(summaries[0].id).await.unwrap().unwrap();
    assert_eq!(item.item_type, "book");
    assert!(item.collections.contains(&collection));
    assert_eq!(item.fields.get("date").map(String::as_str), Some("1000"));
}

#[tokio::test]
async fn rejects_bodies_without_import_data() {
    let app = setup_test_app().await;

    let response = app
        .server
        .post("/connector/import")
        .bytes(b"Owl".to_vec().into())
        .content_type("text/plain")
        .await;
    assert_eq!(response.status_code(), 400);
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn rejects_bibtex_bodies_with_no_entries() {
    let app = setup_test_app().await;

    let response = app
        .server
        .post("/connector/import")
        .bytes(b"Owl".to_vec().into())
        .content_type("application/x-bibtex")
        .await;
    assert_eq!(response.status_code(), 400);
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn switches_to_personal_library_when_read_only_library_is_selected() {
    let app = setup_test_app().await;
    let group = app.libraries.add_library("Read-only Group", false);
    app.libraries.select_library(group);

    let response = app
        .server
        .post("/connector/import")
        .bytes(BIBTEX.as_bytes().to_vec().into())
        .content_type("application/x-bibtex")
        .await;
    assert_eq!(response.status_code(), 201);

    let summaries: Vec<ItemSummary> = response.json();
    let item = app.store.get(summaries[0].id).await.unwrap().unwrap();
    assert_eq!(item.library_id, app.libraries.default_library());
}

#[tokio::test]
async fn registers_imported_items_under_a_session() {
    let app = setup_test_app().await;

    let response = app
        .server
        .post("/connector/import?session=import-session")
        .bytes(BIBTEX.as_bytes().to_vec().into())
        .content_type("application/x-bibtex")
        .await;
    assert_eq!(response.status_code(), 201);

    let session = app.state.sessions.lookup("import-session").await.unwrap();
    assert_eq!(session.item_ids.len(), 1);
}
