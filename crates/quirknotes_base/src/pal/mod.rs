/* 📖 # What is the Platform Abstraction Layer?

The PAL provides a trait-based abstraction over the two side effects quirknotes has:
serving HTTP and reading/writing files. Key benefits:
- Testability: MockPal serves requests in-process and keeps files in memory
- Flexibility: The note store and the API service never touch std::fs or sockets directly
- Consistency: All platform operations use the same error handling

Code depends on the abstraction (Pal trait), not on RealPal or MockPal.
*/

mod file_path;
pub mod http;
pub mod mock;
pub mod real_pal;
mod traits;

pub use file_path::FilePath;
pub use mock::MockPal;
pub use real_pal::RealPal;
pub use traits::{Pal, PalHandle, ReadSeek};
