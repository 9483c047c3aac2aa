/* 📖 # Why a separate client crate?

quirknotes_client is the consumer side of the notes API: a `NotesClient` that speaks the
envelope protocol through a `Transport`, and a `NoteBoard` reducer holding the client's
optimistically updated view. It depends on quirknotes_engine only for the note types,
never on a store, so everything it knows about notes comes from API responses.
*/

pub mod client;
pub mod state;
pub mod transport;

pub use client::{MAX_TITLE_CHARS, NotesClient, validate_title};
pub use state::{BoardAction, BoardNote, NoteBoard, NoteKey, SyncState};
pub use transport::{HttpTransport, ServiceTransport, Transport};
