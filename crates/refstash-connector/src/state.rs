//! Application state
//!
//! Aggregates the collaborators the handlers need: item/blob stores, the
//! library catalog, translation and import, the save-session registry, the
//! recognition queue, and the shared page fetcher. Injected as `Arc<AppState>`
//! so tests can construct a fresh state per test.

use std::sync::Arc;

use refstash_core::Config;
use refstash_store::{BlobStore, ItemStore, LibraryProvider};
use refstash_translate::{BibliographicImporter, TranslationEngine, TranslatorRegistry};
use refstash_worker::RecognitionQueue;

use crate::fetch::PageFetcher;
use crate::sessions::SaveSessionRegistry;

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ItemStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub libraries: Arc<dyn LibraryProvider>,
    pub registry: Arc<TranslatorRegistry>,
    pub engine: Arc<dyn TranslationEngine>,
    pub importer: Arc<dyn BibliographicImporter>,
    pub sessions: Arc<SaveSessionRegistry>,
    pub recognition: RecognitionQueue,
    pub fetcher: PageFetcher,
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
