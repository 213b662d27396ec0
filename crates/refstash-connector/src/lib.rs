//! Refstash connector service
//!
//! Local HTTP service that receives save requests from the browser
//! extension, materializes them into items and attachments, and tracks save
//! sessions for follow-up retargeting.

pub mod api_doc;
pub mod capture;
pub mod constants;
pub mod destination;
pub mod error;
pub mod fetch;
pub mod handlers;
pub mod services;
pub mod sessions;
pub mod setup;
pub mod state;
pub mod telemetry;

pub use state::AppState;
