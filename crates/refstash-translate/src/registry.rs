//! Translator registry
//!
//! Holds translator metadata and source, and answers "which translators could
//! apply to this URL" by target-pattern match in priority order.

use std::sync::RwLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Translator metadata as exposed to callers.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TranslatorRef {
    #[serde(rename = "translatorID")]
    pub id: String,
    pub label: String,
    /// Regex the translator's target URLs match.
    pub target: String,
    /// Lower runs first.
    pub priority: u32,
}

/// How a registered translator produces items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslatorKind {
    /// Extracts embedded citation metadata from the page HTML.
    Embedded,
    /// Source on file for distribution to the extension; not runnable here.
    SourceOnly,
}

#[derive(Debug, Clone)]
pub struct Translator {
    pub meta: TranslatorRef,
    pub kind: TranslatorKind,
    pub code: String,
}

const EMBEDDED_METADATA_ID: &str = "951c027d-74ac-47d4-a107-9c3069ab7b48";

impl Translator {
    /// The built-in embedded-metadata translator, applicable to any URL.
    pub fn embedded_metadata() -> Self {
        Self {
            meta: TranslatorRef {
                id: EMBEDDED_METADATA_ID.to_string(),
                label: "Embedded Metadata".to_string(),
                target: String::new(),
                priority: 400,
            },
            kind: TranslatorKind::Embedded,
            code: String::new(),
        }
    }

    /// Whether this translator's target matches the URL. An empty target
    /// matches everything.
    pub fn matches(&self, url: &str) -> bool {
        if self.meta.target.is_empty() {
            return true;
        }
        match Regex::new(&self.meta.target) {
            Ok(re) => re.is_match(url),
            Err(e) => {
                tracing::warn!(
                    translator = %self.meta.id,
                    error = %e,
                    "Unparsable translator target, skipping"
                );
                false
            }
        }
    }
}

pub struct TranslatorRegistry {
    translators: RwLock<Vec<Translator>>,
}

impl TranslatorRegistry {
    pub fn new() -> Self {
        Self {
            translators: RwLock::new(Vec::new()),
        }
    }

    /// Registry with the built-in embedded-metadata translator.
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        registry.register(Translator::embedded_metadata());
        registry
    }

    pub fn register(&self, translator: Translator) {
        self.translators
            .write()
            .expect("translators lock poisoned")
            .push(translator);
    }

    pub fn get(&self, id: &str) -> Option<Translator> {
        self.translators
            .read()
            .expect("translators lock poisoned")
            .iter()
            .find(|t| t.meta.id == id)
            .cloned()
    }

    pub fn all(&self) -> Vec<TranslatorRef> {
        self.translators
            .read()
            .expect("translators lock poisoned")
            .iter()
            .map(|t| t.meta.clone())
            .collect()
    }

    /// Translators whose target matches the URL, best priority first.
    pub fn matching(&self, url: &str) -> Vec<Translator> {
        let mut matched: Vec<Translator> = self
            .translators
            .read()
            .expect("translators lock poisoned")
            .iter()
            .filter(|t| t.matches(url))
            .cloned()
            .collect();
        matched.sort_by_key(|t| t.meta.priority);
        matched
    }
}

impl Default for TranslatorRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}
