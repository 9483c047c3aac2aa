pub mod api;
pub mod config;
pub mod note;
pub mod store;

pub use api::NoteService;
pub use config::{Config, ServerConfig, StoreConfig, StoreKind, load_config};
pub use note::{Note, NoteDraft, NoteId, NotePatch};
pub use store::{NoteStore, StoreHandle, open_store};
