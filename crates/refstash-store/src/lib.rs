//! Item, blob, and library storage for Refstash
//!
//! The desktop application's item store and collection tree are external
//! collaborators; this crate defines the traits the save pipeline consumes
//! ([`ItemStore`], [`BlobStore`], [`LibraryProvider`]) and in-process
//! reference implementations used by the service and its tests.

pub mod blob;
pub mod libraries;
pub mod memory;
pub mod traits;

pub use blob::{BlobError, BlobStore, LocalBlobStore};
pub use libraries::{Collection, Library, LibraryProvider, SingleUserLibraries};
pub use memory::MemoryStore;
pub use traits::{
    AttachmentKind, ItemChange, ItemStore, NewAttachment, NewItem, StoreError, StoreResult,
    StoredItem,
};
