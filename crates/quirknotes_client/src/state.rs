/* 📖 # Why model the client view as a reducer?

The client changes its local view of the notes before the server has answered
(optimistic update) and has to undo that change if the request fails. Doing this with
ad-hoc mutations makes it easy to forget what the note looked like before. The
`NoteBoard` instead only changes through `apply(BoardAction)`, and every note carries
an explicit `SyncState`:

- `Synced`: the server has confirmed what the board shows
- `Pending`: a request for this note is in flight and the board shows its expected outcome
- `RolledBack`: the last request failed and the board shows the pre-request value again

A note keeps the value it had before its first in-flight change, so a failure restores
exactly that, however many changes were stacked on top.
*/

use tracing::debug;

use quirknotes_engine::{Note, NoteId};

/// Synchronisation state of a note on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Synced,
    Pending,
    RolledBack,
}

/// How the board identifies a note.
///
/// A note created on the board has no server id until the create is confirmed, so it
/// is known by a board-local number until then.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NoteKey {
    Local(u64),
    Remote(NoteId),
}

impl From<NoteId> for NoteKey {
    fn from(id: NoteId) -> Self {
        Self::Remote(id)
    }
}

impl From<&NoteId> for NoteKey {
    fn from(id: &NoteId) -> Self {
        Self::Remote(id.clone())
    }
}

/// A note as the board shows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardNote {
    key: NoteKey,
    title: String,
    content: String,
    state: SyncState,
    hidden: bool,
    confirmed: Option<(String, String)>,
}

impl BoardNote {
    fn synced(note: Note) -> Self {
        Self {
            key: NoteKey::Remote(note.id().clone()),
            title: note.title().to_string(),
            content: note.content().to_string(),
            state: SyncState::Synced,
            hidden: false,
            confirmed: None,
        }
    }

    pub fn key(&self) -> &NoteKey {
        &self.key
    }

    /// The server id, once the note exists on the server.
    pub fn id(&self) -> Option<&NoteId> {
        match &self.key {
            NoteKey::Remote(id) => Some(id),
            NoteKey::Local(_) => None,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    fn remember_confirmed(&mut self) {
        if self.confirmed.is_none() {
            self.confirmed = Some((self.title.clone(), self.content.clone()));
        }
    }
}

/// A change to the board, either requested locally or reported back by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardAction {
    /// The note list was fetched; replaces the whole board.
    Loaded(Vec<Note>),
    CreateRequested {
        local: u64,
        title: String,
        content: String,
    },
    CreateConfirmed {
        local: u64,
        id: NoteId,
    },
    CreateFailed {
        local: u64,
    },
    PatchRequested {
        id: NoteId,
        title: Option<String>,
        content: Option<String>,
    },
    PatchConfirmed {
        id: NoteId,
    },
    PatchFailed {
        id: NoteId,
    },
    DeleteRequested {
        id: NoteId,
    },
    DeleteConfirmed {
        id: NoteId,
    },
    DeleteFailed {
        id: NoteId,
    },
    /// The server confirmed that every note was deleted.
    Cleared,
}

/// The client's local, optimistically updated view of the notes.
#[derive(Debug, Default, Clone)]
pub struct NoteBoard {
    notes: Vec<BoardNote>,
    next_local: u64,
}

impl NoteBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a board-local key for a note about to be created.
    pub fn allocate_local(&mut self) -> u64 {
        self.next_local += 1;
        self.next_local
    }

    /// Notes currently shown, in board order. Notes pending deletion are hidden.
    pub fn visible(&self) -> impl Iterator<Item = &BoardNote> {
        self.notes.iter().filter(|note| !note.hidden)
    }

    /// Look up a shown note.
    pub fn get(&self, key: impl Into<NoteKey>) -> Option<&BoardNote> {
        let key = key.into();
        self.visible().find(|note| note.key == key)
    }

    /// Number of notes currently shown.
    pub fn len(&self) -> usize {
        self.visible().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn find_mut(&mut self, key: &NoteKey) -> Option<&mut BoardNote> {
        self.notes.iter_mut().find(|note| &note.key == key)
    }

    fn remove(&mut self, key: &NoteKey) {
        self.notes.retain(|note| &note.key != key);
    }

    /// Apply an action. Actions naming a note the board does not know are ignored.
    pub fn apply(&mut self, action: BoardAction) {
        match action {
            BoardAction::Loaded(notes) => {
                self.notes = notes.into_iter().map(BoardNote::synced).collect();
            }
            BoardAction::CreateRequested {
                local,
                title,
                content,
            } => {
                self.notes.push(BoardNote {
                    key: NoteKey::Local(local),
                    title,
                    content,
                    state: SyncState::Pending,
                    hidden: false,
                    confirmed: None,
                });
            }
            BoardAction::CreateConfirmed { local, id } => {
                if let Some(note) = self.find_mut(&NoteKey::Local(local)) {
                    note.key = NoteKey::Remote(id);
                    note.state = SyncState::Synced;
                } else {
                    debug!(local, "create confirmed for unknown note");
                }
            }
            BoardAction::CreateFailed { local } => {
                // Nothing existed before the create, so rolling back removes it.
                self.remove(&NoteKey::Local(local));
            }
            BoardAction::PatchRequested { id, title, content } => {
                if let Some(note) = self.find_mut(&NoteKey::Remote(id)) {
                    note.remember_confirmed();
                    if let Some(title) = title {
                        note.title = title;
                    }
                    if let Some(content) = content {
                        note.content = content;
                    }
                    note.state = SyncState::Pending;
                }
            }
            BoardAction::PatchConfirmed { id } => {
                if let Some(note) = self.find_mut(&NoteKey::Remote(id)) {
                    note.confirmed = None;
                    note.state = SyncState::Synced;
                }
            }
            BoardAction::PatchFailed { id } => {
                if let Some(note) = self.find_mut(&NoteKey::Remote(id)) {
                    if let Some((title, content)) = note.confirmed.take() {
                        note.title = title;
                        note.content = content;
                    }
                    note.state = SyncState::RolledBack;
                }
            }
            BoardAction::DeleteRequested { id } => {
                if let Some(note) = self.find_mut(&NoteKey::Remote(id)) {
                    note.hidden = true;
                    note.state = SyncState::Pending;
                }
            }
            BoardAction::DeleteConfirmed { id } => {
                self.remove(&NoteKey::Remote(id));
            }
            BoardAction::DeleteFailed { id } => {
                if let Some(note) = self.find_mut(&NoteKey::Remote(id)) {
                    note.hidden = false;
                    note.state = SyncState::RolledBack;
                }
            }
            BoardAction::Cleared => {
                self.notes.clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::expect;
    use quirknotes_engine::NoteDraft;

    fn note(title: &str, content: &str) -> Note {
        Note::new(NoteId::generate(), NoteDraft::new(title, content).unwrap())
    }

    /// One line per shown note; server ids are random, so only the key kind is shown.
    fn render(board: &NoteBoard) -> String {
        board
            .visible()
            .map(|note| {
                let key = match note.key() {
                    NoteKey::Local(n) => format!("local-{}", n),
                    NoteKey::Remote(_) => "remote".to_string(),
                };
                format!("{} {:?} {:?} {:?}\n", key, note.title(), note.content(), note.state())
            })
            .collect()
    }

    fn loaded_board(notes: &[Note]) -> NoteBoard {
        let mut board = NoteBoard::new();
        board.apply(BoardAction::Loaded(notes.to_vec()));
        board
    }

    #[test]
    fn test_loaded_notes_are_synced() {
        let notes = [note("a", "1"), note("b", "2")];
        let board = loaded_board(&notes);
        assert_eq!(board.len(), 2);
        assert!(board.visible().all(|n| n.state() == SyncState::Synced));
        assert_eq!(board.get(notes[1].id()).unwrap().title(), "b");
    }

    #[test]
    fn test_create_confirmed() {
        let mut board = NoteBoard::new();
        let local = board.allocate_local();
        board.apply(BoardAction::CreateRequested {
            local,
            title: "Groceries".to_string(),
            content: "Milk, eggs".to_string(),
        });
        let pending = board.get(NoteKey::Local(local)).unwrap();
        assert_eq!(pending.state(), SyncState::Pending);
        assert_eq!(pending.id(), None);

        let id = NoteId::generate();
        board.apply(BoardAction::CreateConfirmed {
            local,
            id: id.clone(),
        });
        assert!(board.get(NoteKey::Local(local)).is_none());
        let synced = board.get(&id).unwrap();
        assert_eq!(synced.state(), SyncState::Synced);
        assert_eq!(synced.title(), "Groceries");
    }

    #[test]
    fn test_create_failed_removes_note() {
        let mut board = loaded_board(&[note("a", "1")]);
        let local = board.allocate_local();
        board.apply(BoardAction::CreateRequested {
            local,
            title: "b".to_string(),
            content: "2".to_string(),
        });
        assert_eq!(board.len(), 2);

        board.apply(BoardAction::CreateFailed { local });
        assert_eq!(board.len(), 1);
        assert!(board.get(NoteKey::Local(local)).is_none());
    }

    #[test]
    fn test_local_keys_are_distinct() {
        let mut board = NoteBoard::new();
        assert_ne!(board.allocate_local(), board.allocate_local());
    }

    #[test]
    fn test_patch_confirmed() {
        let original = note("Groceries", "Milk, eggs");
        let id = original.id().clone();
        let mut board = loaded_board(&[original]);

        board.apply(BoardAction::PatchRequested {
            id: id.clone(),
            title: Some("Shopping".to_string()),
            content: None,
        });
        let pending = board.get(&id).unwrap();
        assert_eq!(pending.state(), SyncState::Pending);
        assert_eq!(pending.title(), "Shopping");
        assert_eq!(pending.content(), "Milk, eggs");

        board.apply(BoardAction::PatchConfirmed { id: id.clone() });
        assert_eq!(board.get(&id).unwrap().state(), SyncState::Synced);
        assert_eq!(board.get(&id).unwrap().title(), "Shopping");
    }

    #[test]
    fn test_patch_failed_restores_previous_value() {
        let original = note("Groceries", "Milk, eggs");
        let id = original.id().clone();
        let mut board = loaded_board(&[original]);

        board.apply(BoardAction::PatchRequested {
            id: id.clone(),
            title: Some("Shopping".to_string()),
            content: Some("Bread".to_string()),
        });
        board.apply(BoardAction::PatchRequested {
            id: id.clone(),
            title: Some("Errands".to_string()),
            content: None,
        });
        board.apply(BoardAction::PatchFailed { id: id.clone() });

        let restored = board.get(&id).unwrap();
        assert_eq!(restored.state(), SyncState::RolledBack);
        assert_eq!(restored.title(), "Groceries");
        assert_eq!(restored.content(), "Milk, eggs");
    }

    #[test]
    fn test_delete_confirmed() {
        let doomed = note("a", "1");
        let id = doomed.id().clone();
        let mut board = loaded_board(&[doomed, note("b", "2")]);

        board.apply(BoardAction::DeleteRequested { id: id.clone() });
        assert!(board.get(&id).is_none());
        assert_eq!(board.len(), 1);

        board.apply(BoardAction::DeleteConfirmed { id: id.clone() });
        assert!(board.get(&id).is_none());
        board.apply(BoardAction::DeleteFailed { id: id.clone() });
        assert!(board.get(&id).is_none());
    }

    #[test]
    fn test_delete_failed_restores_note_in_place() {
        let first = note("a", "1");
        let id = first.id().clone();
        let mut board = loaded_board(&[first, note("b", "2")]);

        board.apply(BoardAction::DeleteRequested { id: id.clone() });
        board.apply(BoardAction::DeleteFailed { id: id.clone() });

        let titles: Vec<&str> = board.visible().map(|n| n.title()).collect();
        assert_eq!(titles, vec!["a", "b"]);
        assert_eq!(board.get(&id).unwrap().state(), SyncState::RolledBack);
    }

    #[test]
    fn test_cleared() {
        let mut board = loaded_board(&[note("a", "1"), note("b", "2")]);
        board.apply(BoardAction::Cleared);
        assert!(board.is_empty());
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let mut board = loaded_board(&[note("a", "1")]);
        let stranger = NoteId::generate();
        board.apply(BoardAction::PatchFailed { id: stranger.clone() });
        board.apply(BoardAction::DeleteRequested { id: stranger });
        assert_eq!(board.len(), 1);
        assert!(board.visible().all(|n| n.state() == SyncState::Synced));
    }

    #[test]
    fn test_failed_requests_snapshot() {
        let groceries = note("Groceries", "Milk, eggs");
        let todo = note("Todo", "Call mom");
        let (groceries_id, todo_id) = (groceries.id().clone(), todo.id().clone());
        let mut board = loaded_board(&[groceries, todo]);

        let local = board.allocate_local();
        board.apply(BoardAction::CreateRequested {
            local,
            title: "Errands".to_string(),
            content: "Bank".to_string(),
        });
        board.apply(BoardAction::PatchRequested {
            id: groceries_id.clone(),
            title: Some("Shopping".to_string()),
            content: None,
        });
        board.apply(BoardAction::DeleteRequested {
            id: todo_id.clone(),
        });
        expect![[r#"
            remote "Shopping" "Milk, eggs" Pending
            local-1 "Errands" "Bank" Pending
        "#]]
        .assert_eq(&render(&board));

        board.apply(BoardAction::PatchFailed { id: groceries_id });
        board.apply(BoardAction::DeleteFailed { id: todo_id });
        expect![[r#"
            remote "Groceries" "Milk, eggs" RolledBack
            remote "Todo" "Call mom" RolledBack
            local-1 "Errands" "Bank" Pending
        "#]]
        .assert_eq(&render(&board));
    }
}
