use std::fs;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};

use crate::{QuirkError, QuirkResult, error::ErrorKind};

use super::FilePath;
use super::http::{
    HttpBody, HttpMethod, HttpRequest, HttpResponse, HttpServerConfig, HttpServerHandle,
    HttpService, HttpStatusCode,
};
use super::traits::{Pal, ReadSeek};

/// How long the listener waits for a connection before re-checking the shutdown flag.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/* 📖 # Why std::fs and tiny_http instead of an async stack?

Each request performs exactly one store operation and nothing else. A blocking
server with a fixed pool of worker threads serves that workload without an async
runtime, and std::fs is enough for the single JSON data file.
*/

/// Concrete PAL implementation using the real filesystem and a tiny_http server.
///
/// All file paths are resolved relative to a configured base directory.
#[derive(Debug)]
pub struct RealPal {
    base_dir: PathBuf,
}

impl RealPal {
    /// Create a new RealPal with the given base directory.
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Resolve a FilePath to a filesystem path.
    fn resolve_path(&self, path: &FilePath) -> PathBuf {
        self.base_dir.join(path.as_path())
    }

    fn file_error(path: PathBuf, source: std::io::Error) -> Box<QuirkError> {
        Box::new(QuirkError::new(ErrorKind::FileError { path, source }))
    }
}

impl Pal for RealPal {
    #[instrument(skip(self), fields(path = %path))]
    fn file_exists(&self, path: &FilePath) -> QuirkResult<bool> {
        let resolved = self.resolve_path(path);
        let exists = resolved.is_file();
        debug!(exists, resolved = %resolved.display(), "checked file existence");
        Ok(exists)
    }

    #[instrument(skip(self), fields(path = %path))]
    fn read_file(&self, path: &FilePath) -> QuirkResult<Box<dyn ReadSeek + 'static>> {
        let resolved = self.resolve_path(path);
        debug!(resolved = %resolved.display(), "opening file for reading");
        let file = fs::File::open(&resolved).map_err(|e| {
            debug!(error = %e, "failed to open file");
            Self::file_error(resolved, e)
        })?;
        Ok(Box::new(file))
    }

    #[instrument(skip(self), fields(path = %path))]
    fn create_file(&self, path: &FilePath) -> QuirkResult<Box<dyn Write>> {
        let resolved = self.resolve_path(path);
        debug!(resolved = %resolved.display(), "creating file");
        let file = fs::File::create(&resolved).map_err(|e| {
            debug!(error = %e, "failed to create file");
            Self::file_error(resolved, e)
        })?;
        Ok(Box::new(file))
    }

    #[instrument(skip(self), fields(from = %from, to = %to))]
    fn rename_file(&self, from: &FilePath, to: &FilePath) -> QuirkResult<()> {
        let source = self.resolve_path(from);
        let target = self.resolve_path(to);
        debug!(source = %source.display(), target = %target.display(), "renaming file");
        fs::rename(&source, &target).map_err(|e| {
            debug!(error = %e, "failed to rename file");
            Self::file_error(target, e)
        })
    }

    #[instrument(skip(self), fields(path = %path))]
    fn create_directory_all(&self, path: &FilePath) -> QuirkResult<()> {
        let resolved = self.resolve_path(path);
        debug!(resolved = %resolved.display(), "creating directory and parents");
        fs::create_dir_all(&resolved).map_err(|e| {
            debug!(error = %e, "failed to create directory");
            Self::file_error(resolved, e)
        })
    }

    #[instrument(skip(self, service), fields(address = %config.address()))]
    fn start_http_server(
        &self,
        service: Box<dyn HttpService>,
        config: HttpServerConfig,
    ) -> QuirkResult<HttpServerHandle> {
        let address = config.address();
        let server = tiny_http::Server::http(&address).map_err(|e| {
            Box::new(QuirkError::new(ErrorKind::Http {
                message: format!("Failed to bind HTTP server to {}: {}", address, e),
            }))
        })?;
        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .ok_or_else(|| crate::err!("HTTP server at {} is not bound to an IP socket", address))?;

        let server = Arc::new(server);
        let service: Arc<dyn HttpService> = Arc::from(service);
        let shutdown = Arc::new(AtomicBool::new(false));
        let settings = Arc::new(config);
        let mut workers = Vec::with_capacity(settings.workers);
        for index in 0..settings.workers.max(1) {
            let worker_server = Arc::clone(&server);
            let worker_service = Arc::clone(&service);
            let worker_flag = Arc::clone(&shutdown);
            let worker_settings = Arc::clone(&settings);
            let spawned = thread::Builder::new()
                .name(format!("{}-worker-{}", settings.server_name, index))
                .spawn(move || {
                    worker_loop(
                        &worker_server,
                        worker_service.as_ref(),
                        &worker_flag,
                        &worker_settings,
                    )
                });
            match spawned {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    shutdown.store(true, Ordering::SeqCst);
                    return Err(crate::err!("Failed to spawn HTTP worker thread: {}", e));
                }
            }
        }

        info!(port, workers = workers.len(), "HTTP server listening");
        Ok(HttpServerHandle::with_flag(port, shutdown, workers))
    }
}

/// Receive and answer requests until shutdown is signalled.
///
/// Every worker polls the same listener, so at most `workers` requests are handled at
/// once and further connections wait in the accept queue.
fn worker_loop(
    server: &tiny_http::Server,
    service: &dyn HttpService,
    shutdown: &AtomicBool,
    settings: &HttpServerConfig,
) {
    while !shutdown.load(Ordering::SeqCst) {
        match server.recv_timeout(ACCEPT_POLL_INTERVAL) {
            Ok(Some(request)) => respond(service, request, settings),
            Ok(None) => {}
            Err(e) => {
                error!(error = %e, "HTTP listener failed, stopping worker");
                break;
            }
        }
    }
    debug!("HTTP worker stopped");
}

/// Translate one tiny_http request through the service and write the reply.
fn respond(service: &dyn HttpService, mut request: tiny_http::Request, settings: &HttpServerConfig) {
    let mut response = match read_request(&mut request) {
        Ok(http_request) => match service.handle_request(http_request) {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "service failed to handle request");
                fault_response(&e.to_string())
            }
        },
        Err(response) => response,
    };
    for (name, value) in &settings.default_headers {
        if !response.headers().contains(name) {
            response = response.with_header(name.as_str(), value.as_str());
        }
    }

    let status = response.status().as_u16();
    let mut reply = tiny_http::Response::from_data(response.body().as_bytes().to_vec())
        .with_status_code(status);
    let headers = response
        .headers()
        .iter()
        .chain(std::iter::once(("Server", settings.server_name.as_str())));
    for (name, value) in headers {
        match tiny_http::Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            Ok(header) => reply.add_header(header),
            Err(()) => warn!(header = name, "dropping invalid response header"),
        }
    }

    if let Err(e) = request.respond(reply) {
        warn!(error = %e, "failed to write HTTP response");
    }
}

/// Convert a tiny_http request, or produce the error reply when that is impossible.
fn read_request(request: &mut tiny_http::Request) -> Result<HttpRequest, HttpResponse> {
    let Some(method) = HttpMethod::parse(request.method().as_str()) else {
        debug!(method = %request.method(), "unsupported HTTP method");
        return Err(HttpResponse::json(
            HttpStatusCode::MethodNotAllowed,
            serde_json::json!({ "error": format!("Unsupported method {}", request.method()) })
                .to_string(),
        ));
    };

    let mut body = Vec::new();
    if let Err(e) = request.as_reader().read_to_end(&mut body) {
        warn!(error = %e, "failed to read request body");
        return Err(HttpResponse::json(
            HttpStatusCode::BadRequest,
            serde_json::json!({ "error": "Unable to read request body." }).to_string(),
        ));
    }

    let mut http_request = HttpRequest::new(method, request.url()).with_body(HttpBody::from(body));
    for header in request.headers() {
        http_request = http_request.with_header(header.field.as_str().as_str(), header.value.as_str());
    }
    Ok(http_request)
}

fn fault_response(message: &str) -> HttpResponse {
    HttpResponse::json(
        HttpStatusCode::InternalServerError,
        serde_json::json!({ "error": message }).to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader};
    use std::net::TcpStream;
    use tempfile::TempDir;

    fn setup_test_dir() -> (TempDir, RealPal) {
        let temp_dir = TempDir::new().unwrap();
        let pal = RealPal::new(temp_dir.path().to_path_buf());
        (temp_dir, pal)
    }

    #[test]
    fn test_write_and_read_file() {
        let (_dir, pal) = setup_test_dir();
        let path = FilePath::from("notes.json");

        assert!(!pal.file_exists(&path).unwrap());
        pal.write_file(&path, b"[]").unwrap();
        assert!(pal.file_exists(&path).unwrap());
        assert_eq!(pal.read_file_to_string(&path).unwrap(), "[]");
    }

    #[test]
    fn test_read_file_not_found() {
        let (_dir, pal) = setup_test_dir();
        let err = pal
            .read_file(&FilePath::from("missing.json"))
            .err()
            .unwrap();
        assert!(matches!(err.kind(), ErrorKind::FileError { .. }));
    }

    #[test]
    fn test_rename_file_replaces_target() {
        let (_dir, pal) = setup_test_dir();
        let staging = FilePath::from("notes.json.tmp");
        let target = FilePath::from("notes.json");
        pal.write_file(&target, b"old").unwrap();
        pal.write_file(&staging, b"new").unwrap();

        pal.rename_file(&staging, &target).unwrap();
        assert!(!pal.file_exists(&staging).unwrap());
        assert_eq!(pal.read_file_to_string(&target).unwrap(), "new");
    }

    #[test]
    fn test_create_directory_all() {
        let (dir, pal) = setup_test_dir();
        pal.create_directory_all(&FilePath::from("data/nested"))
            .unwrap();
        assert!(dir.path().join("data/nested").is_dir());
    }

    #[derive(Debug)]
    struct EchoService;

    impl HttpService for EchoService {
        fn handle_request(&self, request: HttpRequest) -> QuirkResult<HttpResponse> {
            if request.route_path() == "/fail" {
                return Err(crate::err!("deliberate failure"));
            }
            let body = format!(
                "{{\"method\":\"{}\",\"path\":\"{}\",\"length\":{}}}",
                request.method(),
                request.route_path(),
                request.body().len()
            );
            Ok(HttpResponse::json(HttpStatusCode::Ok, body))
        }
    }

    fn send_raw(port: u16, raw: &str) -> (String, String) {
        let mut stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
        stream.write_all(raw.as_bytes()).unwrap();
        let mut reader = BufReader::new(stream);
        let mut status_line = String::new();
        reader.read_line(&mut status_line).unwrap();
        let mut rest = String::new();
        reader.read_to_string(&mut rest).unwrap();
        (status_line, rest)
    }

    #[test]
    fn test_http_server_serves_requests() {
        let (_dir, pal) = setup_test_dir();
        let handle = pal
            .start_http_server(Box::new(EchoService), HttpServerConfig::default())
            .unwrap();

        let (status, rest) = send_raw(
            handle.port(),
            "POST /postNote HTTP/1.1\r\nHost: localhost\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{}",
        );
        assert!(status.starts_with("HTTP/1.1 200"));
        assert!(rest.contains(r#"{"method":"POST","path":"/postNote","length":2}"#));
        assert!(rest.contains("Server: quirknotes"));

        handle.shutdown_and_join();
        assert!(handle.is_shutdown());
    }

    #[test]
    fn test_http_server_turns_service_errors_into_500() {
        let (_dir, pal) = setup_test_dir();
        let handle = pal
            .start_http_server(Box::new(EchoService), HttpServerConfig::default())
            .unwrap();

        let (status, rest) = send_raw(
            handle.port(),
            "GET /fail HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        );
        assert!(status.starts_with("HTTP/1.1 500"));
        assert!(rest.contains(r#"{"error":"deliberate failure"}"#));

        handle.shutdown_and_join();
    }

    #[test]
    fn test_default_headers_reach_server_replies() {
        let (_dir, pal) = setup_test_dir();
        let config =
            HttpServerConfig::default().with_default_header("Access-Control-Allow-Origin", "*");
        let handle = pal.start_http_server(Box::new(EchoService), config).unwrap();

        let (status, rest) = send_raw(
            handle.port(),
            "GET /fail HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        );
        assert!(status.starts_with("HTTP/1.1 500"));
        assert!(rest.contains("Access-Control-Allow-Origin: *"));

        let (status, rest) = send_raw(
            handle.port(),
            "BREW /postNote HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        );
        assert!(status.starts_with("HTTP/1.1 405"));
        assert!(rest.contains("Access-Control-Allow-Origin: *"));

        handle.shutdown_and_join();
    }

    #[test]
    fn test_worker_pool_serves_concurrent_requests() {
        let (_dir, pal) = setup_test_dir();
        let config = HttpServerConfig::default().with_workers(2);
        let handle = pal.start_http_server(Box::new(EchoService), config).unwrap();
        let port = handle.port();

        let clients: Vec<_> = (0..6)
            .map(|_| {
                thread::spawn(move || {
                    send_raw(
                        port,
                        "GET /getAllNotes HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
                    )
                })
            })
            .collect();
        for client in clients {
            let (status, _) = client.join().unwrap();
            assert!(status.starts_with("HTTP/1.1 200"));
        }

        handle.shutdown_and_join();
    }
}
