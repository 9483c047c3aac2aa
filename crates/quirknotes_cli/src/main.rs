/* 📖 # Why does the CLI only wire things together?

The binary owns the lifecycle the API service leaves out: it reads the
configuration, opens the store, hands the store to a NoteService and starts the server.
Once the server runs, the CLI just waits for stdin to close.

The workflow:
1. Optionally put a `quirknotes.toml` in the working directory
2. Run `quirknotes` (flags override the config file)
3. Press Ctrl-D to stop the server

Exit codes:
- 0: The server ran and was shut down
- 1: Error (invalid config, unreadable data file, port already in use)
*/

use std::env;
use std::io::{self, Read};
use std::process;

use clap::Parser;
use tracing::{error, info};

use quirknotes_base::tracing::init_tracing;
use quirknotes_base::{FilePath, PalHandle, QuirkResult, RealPal};
use quirknotes_engine::config::DEFAULT_CONFIG_FILE;
use quirknotes_engine::{Config, NoteService, StoreKind, load_config, open_store};

/// quirknotes - a small notes REST API
#[derive(Debug, Parser)]
#[command(name = "quirknotes")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    config: String,

    /// Host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Keep notes in this JSON file
    #[arg(long, value_name = "FILE", conflicts_with = "in_memory")]
    data_file: Option<String>,

    /// Keep notes in memory only
    #[arg(long)]
    in_memory: bool,
}

impl Args {
    /// Overlay the command line flags on the loaded configuration.
    fn apply(&self, mut config: Config) -> Config {
        if let Some(host) = &self.host {
            config.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(path) = &self.data_file {
            config.store.kind = StoreKind::File;
            config.store.path.clone_from(path);
        }
        if self.in_memory {
            config.store.kind = StoreKind::Memory;
        }
        config
    }
}

fn run(args: Args) -> QuirkResult<()> {
    let current_dir = env::current_dir()
        .map_err(|e| quirknotes_base::err!("Failed to get current directory: {}", e))?;
    let pal = PalHandle::new(RealPal::new(current_dir));

    let config = args.apply(load_config(&pal, &FilePath::from(args.config.as_str()))?);
    let store = open_store(&pal, &config.store)?;
    let handle = pal.start_http_server(
        Box::new(NoteService::new(store)),
        config.http_server_config(),
    )?;

    println!(
        "Server is running on http://{}",
        handle.address(&config.server.host)
    );
    println!("Press Ctrl-D to stop.");

    wait_for_stdin_eof();
    info!("stdin closed, shutting down");
    handle.shutdown_and_join();
    Ok(())
}

/// Block until stdin reaches end of file.
fn wait_for_stdin_eof() {
    let mut sink = [0u8; 256];
    let mut stdin = io::stdin().lock();
    loop {
        match stdin.read(&mut sink) {
            Ok(0) => break,
            Ok(_) => continue,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                error!(error = %e, "failed to read stdin");
                break;
            }
        }
    }
}

fn main() {
    if let Err(e) = init_tracing() {
        eprintln!("Error: Failed to initialize logging: {}", e);
        process::exit(1);
    }

    let args = Args::parse();
    if let Err(e) = run(args) {
        error!(error = ?e, "quirknotes failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
