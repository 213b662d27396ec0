//! Refstash Core Library
//!
//! This crate provides the domain models, error types, configuration, proxy
//! resolution, and draft validation shared across all Refstash components.

pub mod config;
pub mod error;
pub mod models;
pub mod proxy;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use proxy::ProxyScheme;
