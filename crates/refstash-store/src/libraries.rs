//! Library and collection catalog
//!
//! The desktop UI owns which library and collection are currently selected;
//! the pipeline consumes that state through [`LibraryProvider`].
//! [`SingleUserLibraries`] is the in-process implementation: one personal
//! library plus any number of group libraries, with a selectable active row.

use std::collections::HashSet;
use std::sync::RwLock;

use uuid::Uuid;

use refstash_core::models::Destination;

#[derive(Debug, Clone)]
pub struct Library {
    pub id: Uuid,
    pub name: String,
    pub editable: bool,
}

#[derive(Debug, Clone)]
pub struct Collection {
    pub id: Uuid,
    pub library_id: Uuid,
    pub name: String,
}

/// Current library/collection selection and write permissions.
pub trait LibraryProvider: Send + Sync {
    /// Destination the UI currently has selected.
    fn active_destination(&self) -> Destination;

    /// Libraries the caller may write to.
    fn writable_libraries(&self) -> HashSet<Uuid>;

    /// Personal library used as the fallback destination.
    fn default_library(&self) -> Uuid;

    /// Owning library of a collection, if the collection exists.
    fn library_of_collection(&self, collection_id: Uuid) -> Option<Uuid>;
}

struct Inner {
    libraries: Vec<Library>,
    collections: Vec<Collection>,
    active: Destination,
    default_library: Uuid,
}

pub struct SingleUserLibraries {
    inner: RwLock<Inner>,
}

impl SingleUserLibraries {
    /// Create a catalog with one editable personal library, selected.
    pub fn new() -> Self {
        let personal = Library {
            id: Uuid::new_v4(),
            name: "My Library".to_string(),
            editable: true,
        };
        let active = Destination::library_root(personal.id);
        let default_library = personal.id;
        Self {
            inner: RwLock::new(Inner {
                libraries: vec![personal],
                collections: Vec::new(),
                active,
                default_library,
            }),
        }
    }

    pub fn add_library(&self, name: &str, editable: bool) -> Uuid {
        let id = Uuid::new_v4();
        self.inner
            .write()
            .expect("libraries lock poisoned")
            .libraries
            .push(Library {
                id,
                name: name.to_string(),
                editable,
            });
        id
    }

    pub fn add_collection(&self, library_id: Uuid, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.inner
            .write()
            .expect("libraries lock poisoned")
            .collections
            .push(Collection {
                id,
                library_id,
                name: name.to_string(),
            });
        id
    }

    /// Select a library root as the active destination.
    pub fn select_library(&self, library_id: Uuid) {
        self.inner.write().expect("libraries lock poisoned").active =
            Destination::library_root(library_id);
    }

    /// Select a collection as the active destination.
    pub fn select_collection(&self, collection_id: Uuid) {
        let mut inner = self.inner.write().expect("libraries lock poisoned");
        if let Some(library_id) = inner
            .collections
            .iter()
            .find(|c| c.id == collection_id)
            .map(|c| c.library_id)
        {
            inner.active = Destination::collection(library_id, collection_id);
        }
    }
}

impl Default for SingleUserLibraries {
    fn default() -> Self {
        Self::new()
    }
}

impl LibraryProvider for SingleUserLibraries {
    fn active_destination(&self) -> Destination {
        self.inner.read().expect("libraries lock poisoned").active
    }

    fn writable_libraries(&self) -> HashSet<Uuid> {
        self.inner
            .read()
            .expect("libraries lock poisoned")
            .libraries
            .iter()
            .filter(|l| l.editable)
            .map(|l| l.id)
            .collect()
    }

    fn default_library(&self) -> Uuid {
        self.inner
            .read()
            .expect("libraries lock poisoned")
            .default_library
    }

    fn library_of_collection(&self, collection_id: Uuid) -> Option<Uuid> {
        self.inner
            .read()
            .expect("libraries lock poisoned")
            .collections
            .iter()
            .find(|c| c.id == collection_id)
            .map(|c| c.library_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_editable_personal_library() {
        let libraries = SingleUserLibraries::new();
        let personal = libraries.default_library();
        assert!(libraries.writable_libraries().contains(&personal));
        assert_eq!(libraries.active_destination().library_id, personal);
    }

    #[test]
    fn read_only_group_is_not_writable() {
        let libraries = SingleUserLibraries::new();
        let group = libraries.add_library("Read-only Group", false);
        assert!(!libraries.writable_libraries().contains(&group));
    }

    #[test]
    fn selecting_collection_sets_active_destination() {
        let libraries = SingleUserLibraries::new();
        let personal = libraries.default_library();
        let collection = libraries.add_collection(personal, "Inbox");
        libraries.select_collection(collection);
        let active = libraries.active_destination();
        assert_eq!(active.library_id, personal);
        assert_eq!(active.collection_id, Some(collection));
        assert_eq!(libraries.library_of_collection(collection), Some(personal));
    }
}
