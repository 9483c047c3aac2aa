/* 📖 # Why create a NoteStore trait?

The NoteStore trait abstracts the document collection the API service talks to.
The service consumes exactly five operations (find all, insert one, delete one by id,
delete many, update one by id), so that is the whole trait. Two backends implement it:

1. **InMemoryStore**: the default, and the store every service test runs against
2. **JsonFileStore**: keeps the collection in a JSON file so notes survive a restart

The service receives a `StoreHandle` at construction and never learns which backend
it is using.
*/

use std::sync::Arc;

use parking_lot::RwLock;

use quirknotes_base::QuirkResult;

use crate::note::{Note, NoteDraft, NoteId, NotePatch};

/// Trait for note storage implementations.
///
/// Every operation returns `QuirkResult`. An `Err` means the store itself failed;
/// "no document matched" is reported through the `bool` results instead.
pub trait NoteStore: Send + Sync + 'static {
    /// List all notes in store order (insertion order).
    fn find_all(&self) -> QuirkResult<Vec<Note>>;

    /// Persist a new note, assigning it a fresh id.
    ///
    /// # Returns
    /// The id of the inserted note
    fn insert_one(&mut self, draft: NoteDraft) -> QuirkResult<NoteId>;

    /// Remove the note with the given id.
    ///
    /// # Returns
    /// * `Ok(true)` - If a note matched and was removed
    /// * `Ok(false)` - If no note has that id
    fn delete_one(&mut self, id: &NoteId) -> QuirkResult<bool>;

    /// Remove every note, returning how many were removed.
    fn delete_many(&mut self) -> QuirkResult<usize>;

    /// Apply a patch to the note with the given id.
    ///
    /// # Returns
    /// * `Ok(true)` - If a note matched (even if the patch left it unchanged)
    /// * `Ok(false)` - If no note has that id
    fn update_one(&mut self, id: &NoteId, patch: NotePatch) -> QuirkResult<bool>;
}

/// A thread-safe handle to a note store.
///
/// StoreHandle provides cheap cloning (via Arc) and interior mutability (via RwLock).
/// Each method holds the lock for exactly one store operation.
///
/// This follows the same pattern as `PalHandle` in quirknotes_base.
#[derive(Clone)]
pub struct StoreHandle(Arc<RwLock<dyn NoteStore>>);

impl StoreHandle {
    /// Create a new StoreHandle wrapping the given store implementation.
    pub fn new<S: NoteStore>(store: S) -> Self {
        Self(Arc::new(RwLock::new(store)))
    }

    /// See [`NoteStore::find_all`].
    pub fn find_all(&self) -> QuirkResult<Vec<Note>> {
        self.0.read().find_all()
    }

    /// See [`NoteStore::insert_one`].
    pub fn insert_one(&self, draft: NoteDraft) -> QuirkResult<NoteId> {
        self.0.write().insert_one(draft)
    }

    /// See [`NoteStore::delete_one`].
    pub fn delete_one(&self, id: &NoteId) -> QuirkResult<bool> {
        self.0.write().delete_one(id)
    }

    /// See [`NoteStore::delete_many`].
    pub fn delete_many(&self) -> QuirkResult<usize> {
        self.0.write().delete_many()
    }

    /// See [`NoteStore::update_one`].
    pub fn update_one(&self, id: &NoteId, patch: NotePatch) -> QuirkResult<bool> {
        self.0.write().update_one(id, patch)
    }
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreHandle").finish_non_exhaustive()
    }
}
