//! Remote resource fetching
//!
//! Shared HTTP client for attachment and snapshot fetches. Classifies the
//! response by its content-type header, falling back to payload sniffing
//! (`%PDF-` magic, HTML markers) because proxies and misconfigured servers
//! routinely mislabel both.

use std::time::Duration;

use bytes::Bytes;
use refstash_core::AppError;

#[derive(Debug, Clone)]
pub struct FetchedResource {
    pub data: Bytes,
    pub content_type: String,
    pub final_url: String,
}

impl FetchedResource {
    pub fn is_pdf(&self) -> bool {
        self.content_type == "application/pdf" || self.data.starts_with(b"%PDF-")
    }

    pub fn is_html(&self) -> bool {
        if self.content_type.contains("html") {
            return true;
        }
        let head = &self.data[..self.data.len().min(1024)];
        let head = String::from_utf8_lossy(head).to_lowercase();
        head.contains("<html") || head.contains("<!doctype html")
    }
}

#[derive(Clone)]
pub struct PageFetcher {
    client: reqwest::Client,
    max_bytes: usize,
}

impl PageFetcher {
    pub fn new(timeout_secs: u64, max_bytes: usize) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, max_bytes })
    }

    pub async fn fetch(&self, url: &str) -> Result<FetchedResource, AppError> {
        let parsed_url = reqwest::Url::parse(url)
            .map_err(|_| AppError::Validation(format!("Invalid URL format: {}", url)))?;

        if parsed_url.scheme() != "http" && parsed_url.scheme() != "https" {
            return Err(AppError::Validation(
                "Only HTTP and HTTPS URLs are allowed".to_string(),
            ));
        }

        let response = self.client.get(parsed_url).send().await.map_err(|e| {
            tracing::warn!(error = %e, url = %url, "Failed to fetch resource");
            AppError::UpstreamFetch(format!("Failed to fetch {}: {}", url, e))
        })?;

        if !response.status().is_success() {
            return Err(AppError::UpstreamFetch(format!(
                "{} returned status {}",
                url,
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|h| h.to_str().ok())
            .unwrap_or("application/octet-stream")
            .split(';')
            .next()
            .unwrap_or("application/octet-stream")
            .trim()
            .to_lowercase();

        let final_url = response.url().to_string();

        let data = response
            .bytes()
            .await
            .map_err(|e| AppError::UpstreamFetch(format!("Failed to read {}: {}", url, e)))?;

        if data.len() > self.max_bytes {
            return Err(AppError::UpstreamFetch(format!(
                "{} exceeds the {} byte attachment limit",
                url, self.max_bytes
            )));
        }

        tracing::debug!(
            url = %url,
            content_type = %content_type,
            bytes = data.len(),
            "Fetched resource"
        );

        Ok(FetchedResource {
            data,
            content_type,
            final_url,
        })
    }
}
