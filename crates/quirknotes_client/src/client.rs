use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use quirknotes_base::error::ErrorKind;
use quirknotes_base::pal::http::{HttpMethod, HttpRequest, HttpResponse, HttpStatusCode};
use quirknotes_base::{QuirkError, QuirkResult, ResultExt};
use quirknotes_engine::{Note, NoteDraft, NoteId, NotePatch};

use crate::state::{BoardAction, NoteBoard};
use crate::transport::Transport;

/// Longest title the client accepts, in characters.
pub const MAX_TITLE_CHARS: usize = 30;

/// Check the client-side title limit. Counts Unicode scalar values, not bytes.
pub fn validate_title(title: &str) -> QuirkResult<()> {
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(Box::new(QuirkError::invalid_input(format!(
            "Title must be at most {} characters.",
            MAX_TITLE_CHARS
        ))));
    }
    Ok(())
}

/// Reply envelope as the API sends it.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    response: Option<T>,
    error: Option<String>,
    #[serde(rename = "insertedId")]
    inserted_id: Option<NoteId>,
}

/// Decoded successful reply.
struct Reply<T> {
    response: T,
    inserted_id: Option<NoteId>,
}

/// Turn a response into its payload, or into an error of the matching class.
fn decode<T: DeserializeOwned>(response: HttpResponse) -> QuirkResult<Reply<T>> {
    let status = response.status();
    let parsed: QuirkResult<Envelope<T>> =
        serde_json::from_slice(response.body().as_bytes()).map_err(Into::into);
    let envelope = parsed.with_context(|| format!("Unreadable {} response", status.as_u16()))?;

    if !status.is_success() {
        let message = envelope
            .error
            .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));
        let kind = match status {
            HttpStatusCode::BadRequest => ErrorKind::InvalidInput { message },
            HttpStatusCode::NotFound => ErrorKind::NotFound { message },
            _ => ErrorKind::Http { message },
        };
        return Err(Box::new(QuirkError::new(kind)));
    }

    let response = envelope
        .response
        .ok_or_else(|| quirknotes_base::err!("Response envelope has no payload"))?;
    Ok(Reply {
        response,
        inserted_id: envelope.inserted_id,
    })
}

/// Client for the notes API.
///
/// The plain methods (`get_all_notes`, `post_note`, ...) issue one request each. The
/// `*_optimistic` methods additionally drive a `NoteBoard`: they apply the expected
/// outcome first, then confirm it or roll it back once the request resolves.
#[derive(Clone)]
pub struct NotesClient {
    transport: Arc<dyn Transport>,
}

impl NotesClient {
    pub fn new(transport: impl Transport) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    fn send<T: DeserializeOwned>(&self, request: HttpRequest) -> QuirkResult<Reply<T>> {
        let response = self.transport.send(request)?;
        decode(response)
    }

    fn json_request(method: HttpMethod, path: String, body: &serde_json::Value) -> HttpRequest {
        HttpRequest::new(method, path)
            .with_header("Content-Type", "application/json")
            .with_body(body.to_string())
    }

    pub fn get_all_notes(&self) -> QuirkResult<Vec<Note>> {
        let reply = self.send(HttpRequest::new(HttpMethod::Get, "/getAllNotes"))?;
        Ok(reply.response)
    }

    /// Create a note, returning its server-assigned id.
    ///
    /// Rejects an empty field or an over-long title without contacting the server.
    pub fn post_note(&self, title: &str, content: &str) -> QuirkResult<NoteId> {
        validate_title(title)?;
        let draft = NoteDraft::new(title, content)?;
        let body = serde_json::json!({ "title": draft.title(), "content": draft.content() });
        let reply: Reply<String> =
            self.send(Self::json_request(HttpMethod::Post, "/postNote".to_string(), &body))?;
        reply
            .inserted_id
            .ok_or_else(|| quirknotes_base::err!("Create response has no insertedId"))
    }

    /// Patch a note. Empty fields are left unchanged.
    pub fn patch_note(
        &self,
        id: &NoteId,
        title: Option<&str>,
        content: Option<&str>,
    ) -> QuirkResult<String> {
        if let Some(title) = title {
            validate_title(title)?;
        }
        let patch = NotePatch::new(title.map(str::to_string), content.map(str::to_string))?;
        let body = serde_json::json!({ "title": patch.title(), "content": patch.content() });
        let reply = self.send(Self::json_request(
            HttpMethod::Patch,
            format!("/patchNote/{}", id),
            &body,
        ))?;
        Ok(reply.response)
    }

    pub fn delete_note(&self, id: &NoteId) -> QuirkResult<String> {
        let reply = self.send(HttpRequest::new(
            HttpMethod::Delete,
            format!("/deleteNote/{}", id),
        ))?;
        Ok(reply.response)
    }

    pub fn delete_all_notes(&self) -> QuirkResult<String> {
        let reply = self.send(HttpRequest::new(HttpMethod::Delete, "/deleteAllNotes"))?;
        Ok(reply.response)
    }

    /// Fetch the note list into the board.
    pub fn load(&self, board: &mut NoteBoard) -> QuirkResult<()> {
        let notes = self.get_all_notes()?;
        info!(count = notes.len(), "loaded notes");
        board.apply(BoardAction::Loaded(notes));
        Ok(())
    }

    /// Show the new note immediately, then swap in its server id or remove it again.
    pub fn post_note_optimistic(
        &self,
        board: &mut NoteBoard,
        title: &str,
        content: &str,
    ) -> QuirkResult<NoteId> {
        validate_title(title)?;
        NoteDraft::new(title, content)?;

        let local = board.allocate_local();
        board.apply(BoardAction::CreateRequested {
            local,
            title: title.to_string(),
            content: content.to_string(),
        });
        match self.post_note(title, content) {
            Ok(id) => {
                board.apply(BoardAction::CreateConfirmed {
                    local,
                    id: id.clone(),
                });
                Ok(id)
            }
            Err(e) => {
                warn!(error = %e, "create failed, rolling back");
                board.apply(BoardAction::CreateFailed { local });
                Err(e)
            }
        }
    }

    /// Show the patched note immediately, restoring the previous value on failure.
    pub fn patch_note_optimistic(
        &self,
        board: &mut NoteBoard,
        id: &NoteId,
        title: Option<&str>,
        content: Option<&str>,
    ) -> QuirkResult<()> {
        if let Some(title) = title {
            validate_title(title)?;
        }
        let patch = NotePatch::new(title.map(str::to_string), content.map(str::to_string))?;

        board.apply(BoardAction::PatchRequested {
            id: id.clone(),
            title: patch.title().map(str::to_string),
            content: patch.content().map(str::to_string),
        });
        match self.patch_note(id, patch.title(), patch.content()) {
            Ok(_) => {
                board.apply(BoardAction::PatchConfirmed { id: id.clone() });
                Ok(())
            }
            Err(e) => {
                warn!(id = %id, error = %e, "patch failed, rolling back");
                board.apply(BoardAction::PatchFailed { id: id.clone() });
                Err(e)
            }
        }
    }

    /// Hide the note immediately, showing it again if the delete fails.
    pub fn delete_note_optimistic(&self, board: &mut NoteBoard, id: &NoteId) -> QuirkResult<()> {
        board.apply(BoardAction::DeleteRequested { id: id.clone() });
        match self.delete_note(id) {
            Ok(_) => {
                board.apply(BoardAction::DeleteConfirmed { id: id.clone() });
                Ok(())
            }
            Err(e) => {
                warn!(id = %id, error = %e, "delete failed, rolling back");
                board.apply(BoardAction::DeleteFailed { id: id.clone() });
                Err(e)
            }
        }
    }

    /// Delete every note, clearing the board once the server confirms.
    pub fn delete_all_notes_confirmed(&self, board: &mut NoteBoard) -> QuirkResult<String> {
        let message = self.delete_all_notes()?;
        board.apply(BoardAction::Cleared);
        Ok(message)
    }
}

impl std::fmt::Debug for NotesClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotesClient").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SyncState;
    use crate::transport::{HttpTransport, ServiceTransport};
    use quirknotes_base::pal::http::{HttpServerConfig, HttpService};
    use quirknotes_base::{ErrorClass, Pal, RealPal};
    use quirknotes_engine::NoteService;
    use quirknotes_engine::store::{InMemoryStore, StoreHandle};
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Forwards to a NoteService until switched off, then fails like a dropped connection.
    #[derive(Debug)]
    struct FlakyTransport {
        service: NoteService,
        offline: Arc<AtomicBool>,
    }

    impl Transport for FlakyTransport {
        fn send(&self, request: HttpRequest) -> QuirkResult<HttpResponse> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(Box::new(QuirkError::new(ErrorKind::Http {
                    message: "connection reset".to_string(),
                })));
            }
            self.service.handle_request(request)
        }
    }

    fn in_process_client() -> (NotesClient, StoreHandle) {
        let store = StoreHandle::new(InMemoryStore::new());
        let client = NotesClient::new(ServiceTransport::new(NoteService::new(store.clone())));
        (client, store)
    }

    fn flaky_client() -> (NotesClient, Arc<AtomicBool>) {
        let offline = Arc::new(AtomicBool::new(false));
        let transport = FlakyTransport {
            service: NoteService::new(StoreHandle::new(InMemoryStore::new())),
            offline: Arc::clone(&offline),
        };
        (NotesClient::new(transport), offline)
    }

    #[test]
    fn test_validate_title() {
        assert!(validate_title("").is_ok());
        assert!(validate_title(&"a".repeat(30)).is_ok());
        assert!(validate_title(&"é".repeat(30)).is_ok());
        let err = validate_title(&"a".repeat(31)).unwrap_err();
        assert_eq!(err.class(), ErrorClass::Input);
        assert_eq!(err.to_string(), "Title must be at most 30 characters.");
    }

    #[test]
    fn test_crud_round_trip() {
        let (client, _store) = in_process_client();
        let id = client.post_note("Groceries", "Milk, eggs").unwrap();

        let notes = client.get_all_notes().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id(), &id);

        let message = client.patch_note(&id, Some("Shopping"), None).unwrap();
        assert_eq!(message, format!("Document with ID {} patched.", id));
        assert_eq!(client.get_all_notes().unwrap()[0].title(), "Shopping");

        let message = client.delete_note(&id).unwrap();
        assert_eq!(message, format!("Document with ID {} deleted.", id));
        let err = client.delete_note(&id).unwrap_err();
        assert_eq!(err.class(), ErrorClass::NotFound);
        assert_eq!(err.to_string(), "Unable to find note with given ID.");

        client.post_note("a", "b").unwrap();
        assert_eq!(client.delete_all_notes().unwrap(), "1 notes deleted.");
    }

    #[test]
    fn test_long_title_is_rejected_before_sending() {
        let (client, store) = in_process_client();
        let err = client.post_note(&"x".repeat(31), "content").unwrap_err();
        assert_eq!(err.class(), ErrorClass::Input);
        assert!(store.find_all().unwrap().is_empty());

        let id = client.post_note("ok", "content").unwrap();
        assert!(client.patch_note(&id, Some(&"x".repeat(31)), None).is_err());
        assert_eq!(store.find_all().unwrap()[0].title(), "ok");
    }

    #[test]
    fn test_optimistic_create_confirmed() {
        let (client, _offline) = flaky_client();
        let mut board = NoteBoard::new();
        let id = client
            .post_note_optimistic(&mut board, "Groceries", "Milk, eggs")
            .unwrap();
        let note = board.get(&id).unwrap();
        assert_eq!(note.state(), SyncState::Synced);
        assert_eq!(note.title(), "Groceries");
    }

    #[test]
    fn test_optimistic_create_rolled_back() {
        let (client, offline) = flaky_client();
        let mut board = NoteBoard::new();
        offline.store(true, Ordering::SeqCst);
        assert!(
            client
                .post_note_optimistic(&mut board, "Groceries", "Milk, eggs")
                .is_err()
        );
        assert!(board.is_empty());
    }

    #[test]
    fn test_optimistic_patch_rolled_back() {
        let (client, offline) = flaky_client();
        let mut board = NoteBoard::new();
        let id = client.post_note("Groceries", "Milk, eggs").unwrap();
        client.load(&mut board).unwrap();

        offline.store(true, Ordering::SeqCst);
        assert!(
            client
                .patch_note_optimistic(&mut board, &id, Some("Shopping"), Some("Bread"))
                .is_err()
        );
        let note = board.get(&id).unwrap();
        assert_eq!(note.state(), SyncState::RolledBack);
        assert_eq!(note.title(), "Groceries");
        assert_eq!(note.content(), "Milk, eggs");

        offline.store(false, Ordering::SeqCst);
        client
            .patch_note_optimistic(&mut board, &id, Some("Shopping"), None)
            .unwrap();
        let note = board.get(&id).unwrap();
        assert_eq!(note.state(), SyncState::Synced);
        assert_eq!(note.title(), "Shopping");
    }

    #[test]
    fn test_optimistic_delete() {
        let (client, offline) = flaky_client();
        let mut board = NoteBoard::new();
        let kept = client.post_note("kept", "1").unwrap();
        let doomed = client.post_note("doomed", "2").unwrap();
        client.load(&mut board).unwrap();

        offline.store(true, Ordering::SeqCst);
        assert!(client.delete_note_optimistic(&mut board, &doomed).is_err());
        assert_eq!(board.get(&doomed).unwrap().state(), SyncState::RolledBack);

        offline.store(false, Ordering::SeqCst);
        client.delete_note_optimistic(&mut board, &doomed).unwrap();
        assert!(board.get(&doomed).is_none());
        assert_eq!(board.len(), 1);
        assert!(board.get(&kept).is_some());
    }

    #[test]
    fn test_server_side_not_found_rolls_back() {
        let (client, _store) = in_process_client();
        let mut board = NoteBoard::new();
        let id = client.post_note("a", "b").unwrap();
        client.load(&mut board).unwrap();
        client.delete_note(&id).unwrap();

        let err = client
            .delete_note_optimistic(&mut board, &id)
            .unwrap_err();
        assert_eq!(err.class(), ErrorClass::NotFound);
        assert_eq!(board.get(&id).unwrap().state(), SyncState::RolledBack);
    }

    #[test]
    fn test_delete_all_clears_board() {
        let (client, _store) = in_process_client();
        let mut board = NoteBoard::new();
        client.post_note("a", "1").unwrap();
        client.post_note("b", "2").unwrap();
        client.load(&mut board).unwrap();
        assert_eq!(board.len(), 2);

        assert_eq!(
            client.delete_all_notes_confirmed(&mut board).unwrap(),
            "2 notes deleted."
        );
        assert!(board.is_empty());
    }

    #[test]
    fn test_over_real_socket() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let pal = RealPal::new(temp_dir.path().to_path_buf());
        let service = NoteService::new(StoreHandle::new(InMemoryStore::new()));
        let handle = pal
            .start_http_server(Box::new(service), HttpServerConfig::default())
            .unwrap();

        let transport = HttpTransport::new(format!("http://{}", handle.address("127.0.0.1"))).unwrap();
        let client = NotesClient::new(transport);
        let id = client.post_note("Groceries", "Milk, eggs").unwrap();
        let notes = client.get_all_notes().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id(), &id);

        let err = client
            .delete_note(&NoteId::parse("64b7f0c2a1b2c3d4e5f60718").unwrap())
            .unwrap_err();
        assert_eq!(err.class(), ErrorClass::NotFound);

        handle.shutdown_and_join();
    }
}
