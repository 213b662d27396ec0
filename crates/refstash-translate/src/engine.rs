//! Translation engine seam
//!
//! The connector drives translation through [`TranslationEngine`];
//! [`EmbeddedTranslationEngine`] is the in-process implementation backed by
//! the registry and embedded-metadata extraction. Detection also tries the
//! deproxified form of the URL so proxied captures still find their
//! translators, reporting the proxy used.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use refstash_core::models::ItemDraft;
use refstash_core::proxy::ProxyScheme;

use crate::embedded;
use crate::registry::{TranslatorKind, TranslatorRef, TranslatorRegistry};

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("No translator available for this page")]
    NoTranslator,

    #[error("Unknown translator: {0}")]
    UnknownTranslator(String),

    #[error("Translator cannot run here: {0}")]
    Unsupported(String),

    #[error("Translation failed: {0}")]
    Failed(String),
}

/// A candidate translator for a page, with the proxy scheme that had to be
/// applied for its target to match (if any).
#[derive(Debug, Clone)]
pub struct Detected {
    pub translator: TranslatorRef,
    pub proxy: Option<ProxyScheme>,
}

#[async_trait]
pub trait TranslationEngine: Send + Sync {
    /// Candidate translators for `(uri, html)`, best first.
    async fn detect(&self, uri: &str, html: &str) -> Vec<Detected>;

    /// Run one translator against `(uri, html)`.
    async fn run(
        &self,
        translator_id: &str,
        uri: &str,
        html: &str,
    ) -> Result<Vec<ItemDraft>, TranslateError>;
}

pub struct EmbeddedTranslationEngine {
    registry: Arc<TranslatorRegistry>,
}

impl EmbeddedTranslationEngine {
    pub fn new(registry: Arc<TranslatorRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &TranslatorRegistry {
        &self.registry
    }

    /// Whether a translator applies to this page: target match got it this
    /// far; embedded translators additionally need citation tags present.
    fn applies(kind: TranslatorKind, html: &str) -> bool {
        match kind {
            TranslatorKind::Embedded => embedded::has_citation_metadata(html),
            TranslatorKind::SourceOnly => true,
        }
    }
}

#[async_trait]
impl TranslationEngine for EmbeddedTranslationEngine {
    async fn detect(&self, uri: &str, html: &str) -> Vec<Detected> {
        let mut detected: Vec<Detected> = self
            .registry
            .matching(uri)
            .into_iter()
            .filter(|t| Self::applies(t.kind, html))
            .map(|t| Detected {
                translator: t.meta,
                proxy: None,
            })
            .collect();

        // Proxied capture: targets are written against canonical URLs, so
        // retry against the deproxified form and report the inferred proxy.
        if detected.is_empty() {
            if let Some(proxy) = ProxyScheme::infer(uri) {
                let resolved = proxy.resolve(uri);
                if resolved != uri {
                    detected = self
                        .registry
                        .matching(&resolved)
                        .into_iter()
                        .filter(|t| Self::applies(t.kind, html))
                        .map(|t| Detected {
                            translator: t.meta,
                            proxy: Some(proxy.clone()),
                        })
                        .collect();
                }
            }
        }

        tracing::debug!(uri = %uri, candidates = detected.len(), "Detected translators");
        detected
    }

    async fn run(
        &self,
        translator_id: &str,
        uri: &str,
        html: &str,
    ) -> Result<Vec<ItemDraft>, TranslateError> {
        let translator = self
            .registry
            .get(translator_id)
            .ok_or_else(|| TranslateError::UnknownTranslator(translator_id.to_string()))?;
        match translator.kind {
            TranslatorKind::Embedded => {
                let drafts = embedded::extract(uri, html);
                if drafts.is_empty() {
                    return Err(TranslateError::NoTranslator);
                }
                Ok(drafts)
            }
            TranslatorKind::SourceOnly => Err(TranslateError::Unsupported(format!(
                "translator '{}' runs in the extension, not the connector",
                translator.meta.label
            ))),
        }
    }
}
