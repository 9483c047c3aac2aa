/* 📖 # Why a Transport trait?

NotesClient builds requests from the PAL's HttpRequest type and hands them to a
Transport. Two implementations exist:

1. **HttpTransport**: sends them over the network with reqwest
2. **ServiceTransport**: passes them straight to an HttpService in the same process

The client's optimistic-update logic is tested against ServiceTransport (a real
NoteService over an in-memory store) without opening sockets.
*/

use std::sync::Arc;

use tracing::debug;

use quirknotes_base::error::ErrorKind;
use quirknotes_base::pal::http::{HttpRequest, HttpResponse, HttpService, HttpStatusCode};
use quirknotes_base::{QuirkError, QuirkResult};

/// Delivers a request to the notes API and returns its response.
///
/// An `Err` means the request could not be delivered at all; HTTP error statuses are
/// returned as ordinary responses.
pub trait Transport: Send + Sync + 'static {
    fn send(&self, request: HttpRequest) -> QuirkResult<HttpResponse>;
}

/// Transport calling an HttpService directly.
#[derive(Debug, Clone)]
pub struct ServiceTransport {
    service: Arc<dyn HttpService>,
}

impl ServiceTransport {
    pub fn new(service: impl HttpService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

impl Transport for ServiceTransport {
    fn send(&self, request: HttpRequest) -> QuirkResult<HttpResponse> {
        self.service.handle_request(request)
    }
}

/// Transport sending requests over HTTP with a blocking reqwest client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    base_url: String,
}

fn transport_error(message: String) -> Box<QuirkError> {
    Box::new(QuirkError::new(ErrorKind::Http { message }))
}

impl HttpTransport {
    /// Create a transport for the API at `base_url`, e.g. `http://127.0.0.1:4000`.
    pub fn new(base_url: impl Into<String>) -> QuirkResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| transport_error(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: HttpRequest) -> QuirkResult<HttpResponse> {
        let url = format!("{}{}", self.base_url, request.path());
        let method = reqwest::Method::from_bytes(request.method().as_str().as_bytes())
            .map_err(|e| transport_error(format!("Invalid method {}: {}", request.method(), e)))?;
        debug!(method = %method, url = %url, "sending request");

        let mut builder = self.client.request(method, &url);
        for (name, value) in request.headers().iter() {
            builder = builder.header(name, value);
        }
        if !request.body().is_empty() {
            builder = builder.body(request.body().as_bytes().to_vec());
        }

        let reply = builder
            .send()
            .map_err(|e| transport_error(format!("Request to {} failed: {}", url, e)))?;
        let mut response = HttpResponse::new(HttpStatusCode::from(reply.status().as_u16()));
        for (name, value) in reply.headers() {
            if let Ok(value) = value.to_str() {
                response = response.with_header(name.as_str(), value);
            }
        }
        let body = reply
            .bytes()
            .map_err(|e| transport_error(format!("Failed to read response from {}: {}", url, e)))?;
        Ok(response.with_body(body.to_vec()))
    }
}
