//! Cross-origin headers. The browser client is served from a different origin than
//! the API, so every route allows any origin.

use quirknotes_base::pal::http::HttpResponse;

pub const ALLOW_ORIGIN_HEADER: &str = "Access-Control-Allow-Origin";
pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET, POST, PATCH, DELETE, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type";

/// Add the origin header every response carries.
pub fn with_cors(response: HttpResponse) -> HttpResponse {
    response.with_header(ALLOW_ORIGIN_HEADER, ALLOW_ORIGIN)
}

/// The 204 reply to an `OPTIONS` preflight request.
pub fn preflight() -> HttpResponse {
    with_cors(HttpResponse::no_content())
        .with_header("Access-Control-Allow-Methods", ALLOW_METHODS)
        .with_header("Access-Control-Allow-Headers", ALLOW_HEADERS)
}
