//! Translation and import for Refstash
//!
//! Turns captured page content and bibliographic-format text into item
//! drafts: a translator registry with target-pattern matching, a translation
//! engine seam with an embedded-metadata implementation, and importers for
//! BibTeX and RIS.

pub mod embedded;
pub mod engine;
pub mod import;
pub mod registry;

pub use engine::{Detected, EmbeddedTranslationEngine, TranslateError, TranslationEngine};
pub use import::{BibliographicImporter, FormatImporter, ImportError};
pub use registry::{Translator, TranslatorKind, TranslatorRef, TranslatorRegistry};
