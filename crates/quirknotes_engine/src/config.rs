use serde::Deserialize;
use tracing::{debug, info};

use quirknotes_base::pal::http::{DEFAULT_WORKERS, HttpServerConfig};
use quirknotes_base::{FilePath, PalHandle, QuirkResult, ResultExt};

use crate::api::cors;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "quirknotes.toml";

/// Configuration for a quirknotes server, read from `quirknotes.toml`.
///
/// Every field has a default, so an empty (or missing) file is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Where the HTTP server listens.
    #[serde(default)]
    pub server: ServerConfig,
    /// Which note store backs the API.
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Worker threads handling requests; more requests wait for a free worker.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: default_workers(),
        }
    }
}

/// The store backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Notes live only as long as the process.
    #[default]
    Memory,
    /// Notes are kept in a JSON file at `StoreConfig::path`.
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub kind: StoreKind,
    /// Data file, relative to the working directory. Only used by the file store.
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::default(),
            path: default_store_path(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_store_path() -> String {
    "notes.json".to_string()
}

impl Config {
    /// Build the HTTP server configuration for this config.
    pub fn http_server_config(&self) -> HttpServerConfig {
        HttpServerConfig::new(self.server.host.clone())
            .with_port(self.server.port)
            .with_workers(self.server.workers)
            .with_default_header(cors::ALLOW_ORIGIN_HEADER, cors::ALLOW_ORIGIN)
    }
}

/// Parse a configuration from TOML text.
pub fn parse_config(text: &str) -> QuirkResult<Config> {
    let config: Config =
        toml::from_str(text).map_err(|e| quirknotes_base::err!("Invalid configuration: {}", e))?;
    if config.server.workers == 0 {
        quirknotes_base::bail!("Invalid configuration: server.workers must be at least 1");
    }
    if config.store.kind == StoreKind::File && config.store.path.trim().is_empty() {
        quirknotes_base::bail!("Invalid configuration: store.path is required for the file store");
    }
    Ok(config)
}

/// Load the configuration file, falling back to defaults when it does not exist.
pub fn load_config(pal: &PalHandle, path: &FilePath) -> QuirkResult<Config> {
    if !pal.file_exists(path)? {
        debug!(path = %path, "no config file, using defaults");
        return Ok(Config::default());
    }
    let text = pal.read_file_to_string(path)?;
    let config = parse_config(&text).with_context(|| format!("Failed to load config from {}", path))?;
    info!(path = %path, "loaded configuration");
    Ok(config)
}
