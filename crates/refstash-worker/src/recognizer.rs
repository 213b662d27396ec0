//! Recognizer seam and remote implementation
//!
//! Recognition itself is an external web service: it receives the PDF body
//! and answers with extracted bibliographic metadata. Accuracy and the
//! algorithm are the service's concern; this side only transports.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use refstash_core::models::RecognizedMetadata;

#[async_trait]
pub trait Recognizer: Send + Sync {
    async fn recognize(&self, pdf: &[u8]) -> Result<RecognizedMetadata>;
}

/// Recognizer backed by a metadata web service.
pub struct RemoteRecognizer {
    client: reqwest::Client,
    endpoint: String,
}

impl RemoteRecognizer {
    pub fn new(endpoint: String, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to create recognizer HTTP client")?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl Recognizer for RemoteRecognizer {
    async fn recognize(&self, pdf: &[u8]) -> Result<RecognizedMetadata> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/pdf")
            .body(pdf.to_vec())
            .send()
            .await
            .context("Recognizer request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("Recognizer returned status {}", response.status());
        }

        let metadata: RecognizedMetadata = response
            .json()
            .await
            .context("Recognizer returned unparsable metadata")?;
        tracing::debug!(title = ?metadata.title, "Recognizer responded");
        Ok(metadata)
    }
}
