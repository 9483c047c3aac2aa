/* 📖 # Why a single NoteService for every endpoint?

The NoteService is the one HttpService registered with the PAL. It owns the routing
table, and every reply leaves through the same exit: handler errors become JSON
envelopes via `error_response`, and CORS headers are added last. A handler can
therefore use `?` freely; whatever it returns, the client still gets an envelope with
the right status.

Each handler performs at most one store call. Input is validated (id shape first,
then body) before the store is touched.
*/

use tracing::info;

use quirknotes_base::pal::http::{HttpMethod, HttpRequest, HttpResponse, HttpService, HttpStatusCode};
use quirknotes_base::{QuirkError, QuirkResult, ResultExt};

use crate::api::cors;
use crate::api::envelope::{created, error_response, failure, success};
use crate::api::request::{CreateNoteBody, PatchNoteBody, parse_body};
use crate::note::NoteId;
use crate::store::StoreHandle;

pub const NOTE_ADDED_MESSAGE: &str = "Note added successfully.";
pub const NOTE_NOT_FOUND_MESSAGE: &str = "Unable to find note with given ID.";

/// The endpoints the API serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route<'a> {
    GetAllNotes,
    PostNote,
    DeleteAllNotes,
    DeleteNote(&'a str),
    PatchNote(&'a str),
}

impl<'a> Route<'a> {
    /// Match a path (without query string) against the routing table.
    /// A single trailing slash is ignored.
    fn parse(path: &'a str) -> Option<Self> {
        let path = match path.strip_suffix('/') {
            Some(trimmed) if !trimmed.is_empty() => trimmed,
            _ => path,
        };
        match path {
            "/getAllNotes" => Some(Self::GetAllNotes),
            "/postNote" => Some(Self::PostNote),
            "/deleteAllNotes" => Some(Self::DeleteAllNotes),
            _ => {
                if let Some(id) = path.strip_prefix("/deleteNote/") {
                    Self::segment(id).map(Route::DeleteNote)
                } else if let Some(id) = path.strip_prefix("/patchNote/") {
                    Self::segment(id).map(Route::PatchNote)
                } else {
                    None
                }
            }
        }
    }

    fn segment(raw: &str) -> Option<&str> {
        (!raw.is_empty() && !raw.contains('/')).then_some(raw)
    }

    fn method(&self) -> HttpMethod {
        match self {
            Self::GetAllNotes => HttpMethod::Get,
            Self::PostNote => HttpMethod::Post,
            Self::DeleteAllNotes | Self::DeleteNote(_) => HttpMethod::Delete,
            Self::PatchNote(_) => HttpMethod::Patch,
        }
    }
}

/// HTTP service exposing the notes API.
///
/// - `GET /getAllNotes` lists all notes
/// - `POST /postNote` creates a note from `{title, content}`
/// - `DELETE /deleteNote/:noteId` deletes one note
/// - `PATCH /patchNote/:noteId` updates `title` and/or `content`
/// - `DELETE /deleteAllNotes` deletes every note
///
/// # Example
///
/// ```
/// use quirknotes_base::pal::http::{HttpMethod, HttpRequest, HttpService};
/// use quirknotes_engine::api::NoteService;
/// use quirknotes_engine::store::{InMemoryStore, StoreHandle};
///
/// let service = NoteService::new(StoreHandle::new(InMemoryStore::new()));
/// let response = service
///     .handle_request(HttpRequest::new(HttpMethod::Get, "/getAllNotes"))
///     .unwrap();
/// assert_eq!(response.body().as_string().unwrap(), r#"{"response":[]}"#);
/// ```
#[derive(Debug, Clone)]
pub struct NoteService {
    store: StoreHandle,
}

impl NoteService {
    /// Create a service backed by the given store.
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    fn dispatch(&self, request: &HttpRequest) -> QuirkResult<HttpResponse> {
        let method = request.method();
        let path = request.route_path();
        if method == HttpMethod::Options {
            return Ok(cors::preflight());
        }

        let Some(route) = Route::parse(path) else {
            return Ok(failure(
                HttpStatusCode::NotFound,
                &format!("No route for {} {}", method, path),
            ));
        };
        if method != route.method() {
            return Ok(failure(
                HttpStatusCode::MethodNotAllowed,
                &format!("Method {} not allowed for {}", method, path),
            )
            .with_header("Allow", format!("{}, OPTIONS", route.method())));
        }

        match route {
            Route::GetAllNotes => self.get_all_notes(),
            Route::PostNote => self.post_note(request),
            Route::DeleteAllNotes => self.delete_all_notes(),
            Route::DeleteNote(raw_id) => self.delete_note(raw_id),
            Route::PatchNote(raw_id) => self.patch_note(raw_id, request),
        }
    }

    fn get_all_notes(&self) -> QuirkResult<HttpResponse> {
        let notes = self.store.find_all().context("Failed to list notes")?;
        success(notes)
    }

    fn post_note(&self, request: &HttpRequest) -> QuirkResult<HttpResponse> {
        let draft = parse_body::<CreateNoteBody>(request.body())?.into_draft()?;
        let id = self
            .store
            .insert_one(draft)
            .context("Failed to insert note")?;
        info!(id = %id, "note created");
        created(NOTE_ADDED_MESSAGE, &id)
    }

    fn delete_note(&self, raw_id: &str) -> QuirkResult<HttpResponse> {
        let id = NoteId::parse(raw_id)?;
        let deleted = self
            .store
            .delete_one(&id)
            .with_context(|| format!("Failed to delete note {}", id))?;
        if !deleted {
            return Err(Box::new(QuirkError::not_found(NOTE_NOT_FOUND_MESSAGE)));
        }
        success(format!("Document with ID {} deleted.", raw_id))
    }

    fn patch_note(&self, raw_id: &str, request: &HttpRequest) -> QuirkResult<HttpResponse> {
        let id = NoteId::parse(raw_id)?;
        let patch = parse_body::<PatchNoteBody>(request.body())?.into_patch()?;
        let matched = self
            .store
            .update_one(&id, patch)
            .with_context(|| format!("Failed to patch note {}", id))?;
        if !matched {
            return Err(Box::new(QuirkError::not_found(NOTE_NOT_FOUND_MESSAGE)));
        }
        success(format!("Document with ID {} patched.", raw_id))
    }

    fn delete_all_notes(&self) -> QuirkResult<HttpResponse> {
        let count = self
            .store
            .delete_many()
            .context("Failed to delete notes")?;
        success(format!("{} notes deleted.", count))
    }
}

impl HttpService for NoteService {
    fn handle_request(&self, request: HttpRequest) -> QuirkResult<HttpResponse> {
        let response = self
            .dispatch(&request)
            .unwrap_or_else(|err| error_response(&err));
        info!(
            method = %request.method(),
            path = request.route_path(),
            status = response.status().as_u16(),
            "handled request"
        );
        Ok(cors::with_cors(response))
    }
}
