/* 📖 # Why have quirknotes_base as a core library?
quirknotes_base provides the error type, tracing bootstrap and the platform abstraction
layer shared by every other crate. Keeping them here prevents the engine, client and CLI
crates from depending on each other just to agree on an error type or an HTTP request.
*/

pub mod error;
pub mod pal;
mod pal_tests;
pub mod tracing;

// Re-export commonly used types for convenience
pub use error::{ErrorClass, ErrorKind, QuirkError, QuirkResult, ResultExt};
pub use pal::{FilePath, MockPal, Pal, PalHandle, RealPal};
