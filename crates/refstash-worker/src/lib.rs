//! Background recognition worker
//!
//! PDF imports are enriched out-of-band: the save pipeline enqueues a job and
//! responds immediately; a bounded worker pool runs the recognizer and merges
//! the result into the parent item, skipping silently when the item has been
//! deleted in the meantime.

pub mod queue;
pub mod recognizer;

pub use queue::{RecognitionJob, RecognitionQueue, RecognitionQueueConfig};
pub use recognizer::{Recognizer, RemoteRecognizer};
