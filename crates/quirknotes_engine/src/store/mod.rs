pub mod file;
pub mod memory;
pub mod traits;

pub use file::JsonFileStore;
pub use memory::InMemoryStore;
pub use traits::{NoteStore, StoreHandle};

use tracing::info;

use quirknotes_base::{FilePath, PalHandle, QuirkResult};

use crate::config::{StoreConfig, StoreKind};

/// Open the store the configuration selects.
pub fn open_store(pal: &PalHandle, config: &StoreConfig) -> QuirkResult<StoreHandle> {
    match config.kind {
        StoreKind::Memory => {
            info!("using in-memory note store");
            Ok(StoreHandle::new(InMemoryStore::new()))
        }
        StoreKind::File => {
            info!(path = %config.path, "using JSON file note store");
            let store = JsonFileStore::open(pal.clone(), FilePath::from(config.path.as_str()))?;
            Ok(StoreHandle::new(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::NoteDraft;
    use quirknotes_base::MockPal;

    #[test]
    fn test_open_memory_store() {
        let mock = MockPal::new();
        let store = open_store(&PalHandle::new(mock.clone()), &StoreConfig::default()).unwrap();
        store.insert_one(NoteDraft::new("a", "b").unwrap()).unwrap();
        assert_eq!(store.find_all().unwrap().len(), 1);
        assert!(mock.file_content(&FilePath::from("notes.json")).is_none());
    }

    #[test]
    fn test_open_file_store() {
        let mock = MockPal::new();
        let config = StoreConfig {
            kind: StoreKind::File,
            path: "saved.json".to_string(),
        };
        let store = open_store(&PalHandle::new(mock.clone()), &config).unwrap();
        store.insert_one(NoteDraft::new("a", "b").unwrap()).unwrap();
        assert!(mock.file_content(&FilePath::from("saved.json")).is_some());
    }
}
