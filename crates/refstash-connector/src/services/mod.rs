pub mod save;

pub use save::{ItemSaver, SaveOutcome};
