//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p refstash-connector`. Each test gets
//! a fresh store, library catalog, session registry, and blob directory.

#![allow(dead_code)]

pub mod fixtures;

use std::sync::Arc;

use async_trait::async_trait;
use axum_test::TestServer;
use tempfile::TempDir;

use refstash_connector::fetch::PageFetcher;
use refstash_connector::sessions::{SaveSessionRegistry, SessionConfig};
use refstash_connector::setup::routes;
use refstash_connector::state::AppState;
use refstash_core::models::{CreatorDraft, RecognizedMetadata};
use refstash_core::Config;
use refstash_store::{
    BlobStore, ItemStore, LibraryProvider, LocalBlobStore, MemoryStore, SingleUserLibraries,
};
use refstash_translate::{
    BibliographicImporter, EmbeddedTranslationEngine, FormatImporter, TranslationEngine,
    TranslatorRegistry,
};
use refstash_worker::{RecognitionQueue, RecognitionQueueConfig, Recognizer};

/// Recognizer double: always succeeds with a fixed title.
pub struct MockRecognizer;

#[async_trait]
impl Recognizer for MockRecognizer {
    async fn recognize(&self, _pdf: &[u8]) -> anyhow::Result<RecognizedMetadata> {
        Ok(RecognizedMetadata {
            title: Some("Test".to_string()),
            authors: vec![CreatorDraft::author("Jane", "Doe")],
            year: None,
            doi: None,
        })
    }
}

/// Test application: server plus direct handles on the collaborators.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub store: Arc<MemoryStore>,
    pub libraries: Arc<SingleUserLibraries>,
    pub _temp_dir: TempDir,
}

/// Setup a test app with the built-in translator registry.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with_registry(TranslatorRegistry::with_builtin()).await
}

/// Setup a test app with a caller-supplied translator registry.
pub async fn setup_test_app_with_registry(registry: TranslatorRegistry) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let config = Config {
        blob_dir: temp_dir.path().to_path_buf(),
        ..Config::default()
    };

    let store = Arc::new(MemoryStore::new());
    let store_dyn: Arc<dyn ItemStore> = store.clone();
    let libraries = Arc::new(SingleUserLibraries::new());
    let libraries_dyn: Arc<dyn LibraryProvider> = libraries.clone();
    let blobs: Arc<dyn BlobStore> = Arc::new(
        LocalBlobStore::new(config.blob_dir.clone())
            .await
            .expect("Failed to create blob store"),
    );

    let registry = Arc::new(registry);
    let engine: Arc<dyn TranslationEngine> =
        Arc::new(EmbeddedTranslationEngine::new(registry.clone()));
    let importer: Arc<dyn BibliographicImporter> = Arc::new(FormatImporter::new());

    let recognition = RecognitionQueue::new(
        Arc::new(MockRecognizer),
        store_dyn.clone(),
        RecognitionQueueConfig::default(),
    );

    let fetcher =
        PageFetcher::new(5, config.max_attachment_bytes).expect("Failed to create fetcher");
    let sessions = Arc::new(SaveSessionRegistry::new(SessionConfig::default()));

    let state = Arc::new(AppState {
        config: config.clone(),
        store: store_dyn,
        blobs,
        libraries: libraries_dyn,
        registry,
        engine,
        importer,
        sessions,
        recognition,
        fetcher,
    });

    let router = routes::setup_routes(&config, state.clone())
        .await
        .expect("Failed to setup routes");
    let server =
        TestServer::new(router.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        state,
        store,
        libraries,
        _temp_dir: temp_dir,
    }
}

/// Poll until the predicate holds or ~2 seconds elapse.
pub async fn wait_until<F, Fut>(mut predicate: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if predicate().await {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    false
}
