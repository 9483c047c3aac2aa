/* 📖 # Why rewrite the whole file after every mutation?

The JSON file store is the "keep my notes across restarts" backend, not a database.
Rewriting the full array after each insert, update or delete keeps the on-disk file
a faithful image of the in-memory collection at every point where a request has been
answered. The array is written to a sibling `.tmp` file which is then renamed over the
data file, so a failed write leaves the previous file intact. If the write fails the
in-memory image is rolled back as well, so the response (500), the store and the file
all agree.

All file access goes through the PAL, so the store is tested against MockPal without
touching the disk.
*/

use tracing::{debug, error, info};

use quirknotes_base::{FilePath, PalHandle, QuirkResult, ResultExt};

use crate::note::{Note, NoteDraft, NoteId, NotePatch};
use crate::store::memory::InMemoryStore;
use crate::store::traits::NoteStore;

/// A note store persisted as a JSON array in a single file.
#[derive(Debug)]
pub struct JsonFileStore {
    pal: PalHandle,
    path: FilePath,
    image: InMemoryStore,
}

impl JsonFileStore {
    /// Open the store, loading the file if it exists.
    ///
    /// A missing file is an empty collection; it is created on the first mutation.
    pub fn open(pal: PalHandle, path: FilePath) -> QuirkResult<Self> {
        let notes = if pal.file_exists(&path)? {
            let text = pal.read_file_to_string(&path)?;
            let parsed: QuirkResult<Vec<Note>> = serde_json::from_str(&text).map_err(Into::into);
            let notes = parsed.with_context(|| format!("Failed to load notes from {}", path))?;
            info!(path = %path, count = notes.len(), "loaded notes");
            notes
        } else {
            info!(path = %path, "no notes file yet, starting empty");
            Vec::new()
        };
        Ok(Self {
            pal,
            path,
            image: InMemoryStore::from_notes(notes),
        })
    }

    /// The file this store persists to.
    pub fn path(&self) -> &FilePath {
        &self.path
    }

    /// Write the current collection to the file.
    pub fn flush(&self) -> QuirkResult<()> {
        if let Some(parent) = self.path.parent() {
            self.pal.create_directory_all(&parent)?;
        }
        let bytes = serde_json::to_vec_pretty(self.image.notes())?;
        let staging = FilePath::from(format!("{}.tmp", self.path));
        self.pal
            .write_file(&staging, &bytes)
            .and_then(|()| self.pal.rename_file(&staging, &self.path))
            .with_context(|| format!("Failed to save notes to {}", self.path))?;
        debug!(path = %self.path, count = self.image.notes().len(), "saved notes");
        Ok(())
    }

    /// Run a mutation against the in-memory image and persist it, undoing it if
    /// persisting fails.
    fn mutate<T>(
        &mut self,
        operation: impl FnOnce(&mut InMemoryStore) -> QuirkResult<T>,
    ) -> QuirkResult<T> {
        let snapshot = self.image.clone();
        let result = operation(&mut self.image)?;
        if let Err(e) = self.flush() {
            error!(path = %self.path, error = %e, "rolling back unsaved mutation");
            self.image = snapshot;
            return Err(e);
        }
        Ok(result)
    }
}

impl NoteStore for JsonFileStore {
    fn find_all(&self) -> QuirkResult<Vec<Note>> {
        self.image.find_all()
    }

    fn insert_one(&mut self, draft: NoteDraft) -> QuirkResult<NoteId> {
        self.mutate(|image| image.insert_one(draft))
    }

    fn delete_one(&mut self, id: &NoteId) -> QuirkResult<bool> {
        if !self.image.notes().iter().any(|note| note.id() == id) {
            return Ok(false);
        }
        self.mutate(|image| image.delete_one(id))
    }

    fn delete_many(&mut self) -> QuirkResult<usize> {
        self.mutate(|image| image.delete_many())
    }

    fn update_one(&mut self, id: &NoteId, patch: NotePatch) -> QuirkResult<bool> {
        if !self.image.notes().iter().any(|note| note.id() == id) {
            return Ok(false);
        }
        self.mutate(|image| image.update_one(id, patch))
    }
}
