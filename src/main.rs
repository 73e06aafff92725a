// tunedeck - console audio player
// Restores the saved library, then reads commands from stdin until quit or EOF

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tunedeck::config::{Config, LoggingConfig};
use tunedeck::media::{HeadlessElement, MediaElement, MediaEventSender};
use tunedeck::ui::App;
use tunedeck::{FsBridge, SnapshotStore};

#[derive(Parser)]
#[command(name = "tunedeck")]
#[command(about = "A small desktop audio player driven from the console")]
struct Args {
    /// Enable developer logging (stderr + debug output)
    #[arg(long)]
    dev: bool,

    /// Run without an audio device
    #[arg(long)]
    headless: bool,

    /// Extra directory to scan on startup (repeatable)
    #[arg(long = "dir")]
    dirs: Vec<PathBuf>,

    /// Files to add to the library
    files: Vec<PathBuf>,
}

fn init_logging(config: &LoggingConfig, dev: bool) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&config.directory)?;

    // Daily rotating file appender
    let file_appender = tracing_appender::rolling::daily(&config.directory, "tunedeck.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    // RUST_LOG wins over the configured filter
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info,tunedeck=debug"));

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_target(true)
        .with_level(true)
        .with_ansi(false);
    let stderr_layer = dev.then(|| fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()?;

    if dev {
        eprintln!("Dev mode: debug output goes to stderr and {}", config.directory.display());
    }

    Ok(guard)
}

#[cfg(feature = "audio")]
fn build_element(events: MediaEventSender, headless: bool) -> Box<dyn MediaElement> {
    if !headless {
        match tunedeck::media::RodioElement::new(events.clone()) {
            Ok(element) => return Box::new(element),
            Err(e) => warn!("No audio output, falling back to headless: {}", e),
        }
    }
    Box::new(HeadlessElement::new(events))
}

#[cfg(not(feature = "audio"))]
fn build_element(events: MediaEventSender, headless: bool) -> Box<dyn MediaElement> {
    if !headless {
        warn!("Built without the `audio` feature, running headless");
    }
    Box::new(HeadlessElement::new(events))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load config - falls back to defaults if missing
    let config = Config::load()?;
    let _guard = init_logging(&config.logging, args.dev)?;
    info!("tunedeck starting up");

    let (media_tx, media_rx) = mpsc::unbounded_channel();
    let element = build_element(media_tx, args.headless);
    let storage = SnapshotStore::new(config.storage.snapshot_path.clone());

    let mut app = App::new(config.playback.clone(), element, media_rx, FsBridge::new(), storage);

    let mut directories = config.library.scan_directories.clone();
    directories.extend(args.dirs);
    app.scan_directories(&directories);
    app.add_paths(args.files);

    println!("tunedeck - type `help` for commands");
    for line in app.render_library() {
        println!("{line}");
    }

    // the element is not Send, so the loop runs here instead of on a spawned task
    app.event_handler().spawn_console_reader();
    app.run().await;

    info!("tunedeck stopped");
    Ok(())
}
