//! Application initialization: collaborators, state, routes, server.

pub mod routes;
pub mod server;

use std::sync::Arc;

use refstash_core::Config;
use refstash_store::{
    BlobStore, ItemStore, LibraryProvider, LocalBlobStore, MemoryStore, SingleUserLibraries,
};
use refstash_translate::{
    BibliographicImporter, EmbeddedTranslationEngine, FormatImporter, TranslationEngine,
    TranslatorRegistry,
};
use refstash_worker::{RecognitionQueue, RecognitionQueueConfig, RemoteRecognizer};

use crate::fetch::PageFetcher;
use crate::sessions::{SaveSessionRegistry, SessionConfig};
use crate::state::AppState;

/// Build the collaborators, state, and router for a running service.
pub async fn initialize_app(
    config: Config,
) -> Result<(Arc<AppState>, axum::Router), anyhow::Error> {
    let blobs: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(config.blob_dir.clone()).await?);
    let store: Arc<dyn ItemStore> = Arc::new(MemoryStore::new());
    let libraries: Arc<dyn LibraryProvider> = Arc::new(SingleUserLibraries::new());

    let registry = Arc::new(TranslatorRegistry::with_builtin());
    let engine: Arc<dyn TranslationEngine> =
        Arc::new(EmbeddedTranslationEngine::new(registry.clone()));
    let importer: Arc<dyn BibliographicImporter> = Arc::new(FormatImporter::new());

    let recognition = match config.recognizer_url {
        Some(ref url) => {
            let recognizer =
                RemoteRecognizer::new(url.clone(), config.recognizer_timeout_secs)?;
            RecognitionQueue::new(
                Arc::new(recognizer),
                store.clone(),
                RecognitionQueueConfig {
                    max_workers: config.recognition_workers,
                    job_timeout_secs: config.recognizer_timeout_secs,
                },
            )
        }
        None => {
            tracing::info!("No recognizer configured, PDF metadata recognition disabled");
            RecognitionQueue::disabled()
        }
    };

    let fetcher = PageFetcher::new(config.fetch_timeout_secs, config.max_attachment_bytes)?;

    let sessions = Arc::new(SaveSessionRegistry::new(SessionConfig::from(&config)));
    sessions.start_sweeper();

    let state = Arc::new(AppState {
        config: config.clone(),
        store,
        blobs,
        libraries,
        registry,
        engine,
        importer,
        sessions,
        recognition,
        fetcher,
    });

    let router = routes::setup_routes(&config, state.clone()).await?;
    Ok((state, router))
}
