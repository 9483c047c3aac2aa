/* 📖 # Why keep the in-memory store in a Vec?

"Store order" is insertion order, and the list endpoint returns notes in store order.
A Vec keeps that order for free and survives updates in place. Lookups by id are a
linear scan, which is fine for a single user's notes. The JSON file store reuses this
type as its in-memory image, so both backends agree on ordering and on what "matched"
means.
*/

use quirknotes_base::QuirkResult;

use crate::note::{Note, NoteDraft, NoteId, NotePatch};
use crate::store::traits::NoteStore;

/// An in-memory, insertion-ordered note store.
///
/// # Example
///
/// ```
/// use quirknotes_engine::{NoteDraft, NoteStore};
/// use quirknotes_engine::store::InMemoryStore;
///
/// let mut store = InMemoryStore::new();
/// let id = store.insert_one(NoteDraft::new("Groceries", "Milk, eggs").unwrap()).unwrap();
///
/// let notes = store.find_all().unwrap();
/// assert_eq!(notes.len(), 1);
/// assert_eq!(notes[0].id(), &id);
/// ```
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    notes: Vec<Note>,
}

impl InMemoryStore {
    /// Create a new, empty in-memory store.
    pub fn new() -> Self {
        Self { notes: Vec::new() }
    }

    /// Create a store holding the given notes, in the given order.
    pub fn from_notes(notes: Vec<Note>) -> Self {
        Self { notes }
    }

    /// Borrow the notes in store order.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }
}

impl NoteStore for InMemoryStore {
    fn find_all(&self) -> QuirkResult<Vec<Note>> {
        Ok(self.notes.clone())
    }

    fn insert_one(&mut self, draft: NoteDraft) -> QuirkResult<NoteId> {
        let id = NoteId::generate();
        self.notes.push(Note::new(id.clone(), draft));
        Ok(id)
    }

    fn delete_one(&mut self, id: &NoteId) -> QuirkResult<bool> {
        let Some(index) = self.notes.iter().position(|note| note.id() == id) else {
            return Ok(false);
        };
        self.notes.remove(index);
        Ok(true)
    }

    fn delete_many(&mut self) -> QuirkResult<usize> {
        let count = self.notes.len();
        self.notes.clear();
        Ok(count)
    }

    fn update_one(&mut self, id: &NoteId, patch: NotePatch) -> QuirkResult<bool> {
        let Some(note) = self.notes.iter_mut().find(|note| note.id() == id) else {
            return Ok(false);
        };
        note.apply(&patch);
        Ok(true)
    }
}
