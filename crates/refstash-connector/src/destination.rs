//! Destination selection
//!
//! Resolves where a save lands. A requested target wins when its library is
//! writable; otherwise the save falls back to the default personal library
//! and the requested collection is dropped (a collection from another library
//! is meaningless there). The fallback is policy, not an error: the response
//! stays 201 and the substitution is observable only through the created
//! item's library.

use refstash_core::models::{Destination, TargetRef};
use refstash_store::LibraryProvider;

pub fn select(requested: Option<TargetRef>, libraries: &dyn LibraryProvider) -> Destination {
    let requested_destination = match requested {
        None => libraries.active_destination(),
        Some(TargetRef::Library(library_id)) => Destination::library_root(library_id),
        Some(TargetRef::Collection(collection_id)) => {
            match libraries.library_of_collection(collection_id) {
                Some(library_id) => Destination::collection(library_id, collection_id),
                None => libraries.active_destination(),
            }
        }
    };

    if libraries
        .writable_libraries()
        .contains(&requested_destination.library_id)
    {
        return requested_destination;
    }

    let default_library = libraries.default_library();
    tracing::info!(
        requested_library = %requested_destination.library_id,
        default_library = %default_library,
        "Requested library is read-only, saving to the personal library"
    );
    Destination::library_root(default_library)
}
