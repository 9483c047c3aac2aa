/* 📖 # Why an API module in quirknotes_engine?

The api module turns the note store into the REST surface clients talk to. NoteService
implements the HttpService trait from quirknotes_base, so the same service runs on
RealPal's tiny_http server in production and on MockPal in tests.

- request: typed body shapes and JSON body parsing
- envelope: the `{"response": ...}` / `{"error": ...}` reply format
- cors: cross-origin headers and the preflight reply
- service: routing and the five endpoint handlers
*/

pub mod cors;
pub mod envelope;
pub mod request;
mod service;

pub use request::{CreateNoteBody, PatchNoteBody};
pub use service::NoteService;
