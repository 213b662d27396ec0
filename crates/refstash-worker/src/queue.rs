//! Recognition queue: submission channel, bounded worker pool, shutdown.
//!
//! Jobs are fire-and-forget relative to the HTTP response. There are no
//! retries; a failed or timed-out recognition leaves the item without
//! enriched metadata, and the caller may re-trigger recognition manually.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::{mpsc, Semaphore};
use uuid::Uuid;

use refstash_store::ItemStore;

use crate::recognizer::Recognizer;

const SUBMIT_CHANNEL_CAPACITY: usize = 64;

#[derive(Clone)]
pub struct RecognitionQueueConfig {
    pub max_workers: usize,
    pub job_timeout_secs: u64,
}

impl Default for RecognitionQueueConfig {
    fn default() -> Self {
        Self {
            max_workers: 2,
            job_timeout_secs: 120,
        }
    }
}

/// One queued recognition: the imported PDF and the parent item to enrich.
pub struct RecognitionJob {
    pub item_id: Uuid,
    pub attachment_id: Uuid,
    pub data: Bytes,
}

#[derive(Clone)]
pub struct RecognitionQueue {
    tx: Option<mpsc::Sender<RecognitionJob>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
}

impl RecognitionQueue {
    /// Create a queue and spawn its worker loop.
    pub fn new(
        recognizer: Arc<dyn Recognizer>,
        store: Arc<dyn ItemStore>,
        config: RecognitionQueueConfig,
    ) -> Self {
        let (tx, rx) = mpsc::channel(SUBMIT_CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        tokio::spawn(Self::worker_pool(recognizer, store, config, rx, shutdown_rx));

        Self {
            tx: Some(tx),
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Queue that drops every job. Used when no recognizer is configured.
    pub fn disabled() -> Self {
        Self {
            tx: None,
            shutdown_tx: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Submit a job. Never blocks the caller: a full or closed queue drops
    /// the job with a warning.
    pub fn submit(&self, job: RecognitionJob) {
        let Some(ref tx) = self.tx else {
            tracing::debug!(item_id = %job.item_id, "Recognition disabled, dropping job");
            return;
        };
        let item_id = job.item_id;
        if let Err(e) = tx.try_send(job) {
            tracing::warn!(item_id = %item_id, error = %e, "Recognition queue full, dropping job");
        }
    }

    /// Signal the worker pool to stop claiming new jobs. In-flight jobs run
    /// to completion or time out.
    pub async fn shutdown(&self) {
        if let Some(ref shutdown_tx) = self.shutdown_tx {
            tracing::info!("Initiating recognition queue shutdown");
            let _ = shutdown_tx.send(()).await;
        }
    }

    async fn worker_pool(
        recognizer: Arc<dyn Recognizer>,
        store: Arc<dyn ItemStore>,
        config: RecognitionQueueConfig,
        mut rx: mpsc::Receiver<RecognitionJob>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!(
            max_workers = config.max_workers,
            job_timeout_secs = config.job_timeout_secs,
            "Recognition worker pool started"
        );
        let semaphore = Arc::new(Semaphore::new(config.max_workers.max(1)));
        let timeout = Duration::from_secs(config.job_timeout_secs);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("Recognition worker pool shutting down");
                    break;
                }
                job = rx.recv() => {
                    let Some(job) = job else { break };
                    let permit = match semaphore.clone().acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => break,
                    };
                    let recognizer = recognizer.clone();
                    let store = store.clone();
                    tokio::spawn(async move {
                        let _permit = permit;
                        Self::process_job(recognizer, store, job, timeout).await;
                    });
                }
            }
        }

        tracing::info!("Recognition worker pool stopped");
    }

    #[tracing::instrument(skip(recognizer, store, job, timeout), fields(item_id = %job.item_id, attachment_id = %job.attachment_id))]
    async fn process_job(
        recognizer: Arc<dyn Recognizer>,
        store: Arc<dyn ItemStore>,
        job: RecognitionJob,
        timeout: Duration,
    ) {
        let result = tokio::time::timeout(timeout, recognizer.recognize(&job.data)).await;
        let metadata = match result {
            Ok(Ok(metadata)) => metadata,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Recognition failed, item left unenriched");
                return;
            }
            Err(_) => {
                tracing::warn!("Recognition timed out, item left unenriched");
                return;
            }
        };

        // The item may have been deleted or moved since the save returned;
        // enrichment is best-effort.
        match store.apply_recognized_metadata(job.item_id, &metadata).await {
            Ok(true) => {
                tracing::info!(title = ?metadata.title, "Applied recognized metadata");
            }
            Ok(false) => {
                tracing::debug!("Item no longer exists, skipping recognized metadata");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to apply recognized metadata");
            }
        }
    }
}
