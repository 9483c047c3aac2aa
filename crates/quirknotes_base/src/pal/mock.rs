use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::{Arc, Mutex};

use crate::QuirkError;
use crate::QuirkResult;
use crate::error::ErrorKind;

use super::FilePath;
use super::http::{HttpRequest, HttpResponse, HttpServerConfig, HttpServerHandle, HttpService};
use super::traits::{Pal, ReadSeek};

/* 📖 # Why use HashMap for MockPal storage?

MockPal keeps files and registered HTTP services in memory behind Arc<Mutex<T>>:
1. **Speed**: No filesystem or socket I/O, deterministic and fast for unit tests
2. **Isolation**: No side effects on the real machine
3. **Control**: Tests can make writes fail to exercise store error paths
4. **Thread-safe**: Clones share state, so a test keeps a clone to inspect what the code wrote
*/

/// In-memory PAL implementation for testing.
///
/// # Examples
///
/// ```
/// use quirknotes_base::{MockPal, Pal, FilePath};
///
/// let mock = MockPal::new();
/// mock.add_file(FilePath::from("quirknotes.toml"), b"[server]".to_vec());
/// let content = mock.read_file_to_string(&FilePath::from("quirknotes.toml")).unwrap();
/// assert_eq!(content, "[server]");
/// ```
#[derive(Debug, Clone)]
pub struct MockPal {
    files: Arc<Mutex<HashMap<FilePath, Vec<u8>>>>,
    directories: Arc<Mutex<HashSet<FilePath>>>,
    http_servers: Arc<Mutex<HashMap<u16, Arc<dyn HttpService>>>>,
    next_port: Arc<AtomicU16>,
    fail_writes: Arc<AtomicBool>,
}

impl MockPal {
    /// Create a new empty MockPal.
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            directories: Arc::new(Mutex::new(HashSet::new())),
            http_servers: Arc::new(Mutex::new(HashMap::new())),
            next_port: Arc::new(AtomicU16::new(10000)),
            fail_writes: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Add a file to the mock storage.
    pub fn add_file(&self, path: FilePath, content: Vec<u8>) {
        self.files.lock().unwrap().insert(path, content);
    }

    /// Read back a file's raw content, if present.
    pub fn file_content(&self, path: &FilePath) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }

    /// Check whether a directory was created.
    pub fn has_directory(&self, path: &FilePath) -> bool {
        self.directories.lock().unwrap().contains(path)
    }

    /// Make writes through subsequently created files fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Simulate an HTTP request to a running server.
    ///
    /// Looks up the service registered for the given port and invokes it directly,
    /// without any network traffic.
    pub fn simulate_request(&self, port: u16, request: HttpRequest) -> QuirkResult<HttpResponse> {
        let service = {
            let servers = self.http_servers.lock().unwrap();
            servers
                .get(&port)
                .cloned()
                .ok_or_else(|| crate::err!("No HTTP server registered on port {}", port))?
        };
        service.handle_request(request)
    }

    /// Get the number of registered HTTP servers.
    pub fn http_server_count(&self) -> usize {
        self.http_servers.lock().unwrap().len()
    }
}

impl Default for MockPal {
    fn default() -> Self {
        Self::new()
    }
}

impl Pal for MockPal {
    fn file_exists(&self, path: &FilePath) -> QuirkResult<bool> {
        Ok(self.files.lock().unwrap().contains_key(path))
    }

    fn read_file(&self, path: &FilePath) -> QuirkResult<Box<dyn ReadSeek + 'static>> {
        let files = self.files.lock().unwrap();
        let content = files.get(path).ok_or_else(|| missing_file(path))?.clone();
        Ok(Box::new(Cursor::new(content)))
    }

    fn create_file(&self, path: &FilePath) -> QuirkResult<Box<dyn Write>> {
        // Like fs::File::create, the file is truncated before anything is written
        self.files.lock().unwrap().insert(path.clone(), Vec::new());
        Ok(Box::new(MockFileWriter {
            path: path.clone(),
            files: Arc::clone(&self.files),
            buffer: Vec::new(),
            failing: self.fail_writes.load(Ordering::SeqCst),
        }))
    }

    fn rename_file(&self, from: &FilePath, to: &FilePath) -> QuirkResult<()> {
        let mut files = self.files.lock().unwrap();
        let content = files.remove(from).ok_or_else(|| missing_file(from))?;
        files.insert(to.clone(), content);
        Ok(())
    }

    fn create_directory_all(&self, path: &FilePath) -> QuirkResult<()> {
        self.directories.lock().unwrap().insert(path.clone());
        Ok(())
    }

    fn start_http_server(
        &self,
        service: Box<dyn HttpService>,
        config: HttpServerConfig,
    ) -> QuirkResult<HttpServerHandle> {
        // Assign a port - use config port if provided, otherwise auto-assign
        let port = match config.port {
            Some(p) => p,
            None => self.next_port.fetch_add(1, Ordering::SeqCst),
        };

        self.http_servers
            .lock()
            .unwrap()
            .insert(port, Arc::from(service));

        Ok(HttpServerHandle::new(port))
    }
}

fn missing_file(path: &FilePath) -> Box<QuirkError> {
    Box::new(QuirkError::new(ErrorKind::FileError {
        path: path.as_path().to_path_buf(),
        source: std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("File not found: {}", path),
        ),
    }))
}

/// Helper struct for writing files to MockPal.
///
/// A failing writer rejects every write, leaving the file as truncated by `create_file`.
struct MockFileWriter {
    path: FilePath,
    files: Arc<Mutex<HashMap<FilePath, Vec<u8>>>>,
    buffer: Vec<u8>,
    failing: bool,
}

impl Write for MockFileWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.failing {
            return Err(std::io::Error::other("simulated write failure"));
        }
        self.buffer.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Drop for MockFileWriter {
    fn drop(&mut self) {
        if self.failing {
            return;
        }
        self.files
            .lock()
            .unwrap()
            .insert(self.path.clone(), std::mem::take(&mut self.buffer));
    }
}
