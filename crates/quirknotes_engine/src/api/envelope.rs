/* 📖 # Why wrap every reply in an envelope?

Clients read exactly one of two keys: `response` on success (plus `insertedId` after a
create) and `error` on failure. Building both shapes here keeps every handler's reply
format identical, and `error_response` is the single place where an error's class
becomes an HTTP status.
*/

use serde::Serialize;
use tracing::{debug, error};

use quirknotes_base::pal::http::{HttpResponse, HttpStatusCode};
use quirknotes_base::{ErrorClass, QuirkError, QuirkResult};

use crate::note::NoteId;

#[derive(Serialize)]
struct SuccessEnvelope<'a, T: Serialize> {
    response: T,
    #[serde(rename = "insertedId", skip_serializing_if = "Option::is_none")]
    inserted_id: Option<&'a NoteId>,
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    error: &'a str,
}

fn to_json<T: Serialize>(value: &T) -> QuirkResult<String> {
    Ok(serde_json::to_string(value)?)
}

/// A 200 reply carrying `{"response": payload}`.
pub fn success<T: Serialize>(payload: T) -> QuirkResult<HttpResponse> {
    let body = to_json(&SuccessEnvelope {
        response: payload,
        inserted_id: None,
    })?;
    Ok(HttpResponse::json(HttpStatusCode::Ok, body))
}

/// A 200 reply carrying `{"response": message, "insertedId": id}`.
pub fn created(message: &str, id: &NoteId) -> QuirkResult<HttpResponse> {
    let body = to_json(&SuccessEnvelope {
        response: message,
        inserted_id: Some(id),
    })?;
    Ok(HttpResponse::json(HttpStatusCode::Ok, body))
}

/// A reply with the given status carrying `{"error": message}`.
pub fn failure(status: HttpStatusCode, message: &str) -> HttpResponse {
    let body = to_json(&ErrorEnvelope { error: message })
        .unwrap_or_else(|_| String::from(r#"{"error":"Internal error"}"#));
    HttpResponse::json(status, body)
}

/// Convert an error that escaped a handler into its envelope.
///
/// Input and not-found errors carry a message meant for the client, so only that
/// message is sent. Anything else is sent with its full context chain.
pub fn error_response(err: &QuirkError) -> HttpResponse {
    match err.class() {
        ErrorClass::Input => {
            debug!(error = %err, "rejected request input");
            failure(HttpStatusCode::BadRequest, &err.kind().to_string())
        }
        ErrorClass::NotFound => {
            debug!(error = %err, "no matching note");
            failure(HttpStatusCode::NotFound, &err.kind().to_string())
        }
        ErrorClass::Infrastructure => {
            error!(error = ?err, "request failed");
            failure(HttpStatusCode::InternalServerError, &err.to_string())
        }
    }
}
