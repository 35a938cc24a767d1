use clap::Parser;
use log::{error, info, warn};
use logwarden::alerts::AlertEvaluator;
use logwarden::config::Config;
use logwarden::error::ConfigError;
use logwarden::monitor::{self, MonitorStore, SharedStore};
use logwarden::scheduler::AnalysisScheduler;
use logwarden::{producer, TransportError};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Command-line arguments for the log analysis pipeline
#[derive(Parser)]
#[command(
    name = "logwarden",
    about = "Per-device log analysis and alerting pipeline",
    long_about = "Ingests a stream of per-device log events, maintains a bounded recent-history \
                  window per device, publishes periodic error/warn rollups, raises alerts on \
                  short-window error spikes, and exposes the accumulated history over HTTP."
)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Configuration file path (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(
        short,
        long,
        help = "Enable verbose logging output (sets RUST_LOG=debug)"
    )]
    verbose: bool,

    /// Disable the built-in synthetic log generator
    #[arg(
        long,
        help = "Do not start the synthetic device generators; events must arrive from an external bridge"
    )]
    no_producer: bool,
}

/// Reasons the main thread stops waiting
enum ShutdownReason {
    /// Operator interrupt (Ctrl-C)
    Interrupt,
    /// The scheduler lost its transport; fail fast
    TransportFailure(TransportError),
}

/// Load configuration from file or fall back to defaults
fn load_config(config_path: Option<&Path>) -> Config {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            match Config::from_file(path) {
                Ok(config) => config,
                Err(ConfigError::ReadError(_)) => {
                    warn!(
                        "Configuration file '{}' not found or unreadable, using defaults",
                        path.display()
                    );
                    Config::default()
                }
                Err(e) => {
                    error!("Configuration error in '{}': {}", path.display(), e);
                    warn!("Using default configuration due to invalid config file");
                    Config::default()
                }
            }
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    }
}

/// Wire the pipeline and block until shutdown
fn run(config: Config, cli: &Cli) -> Result<(), anyhow::Error> {
    // Validated up front; parse is propagated rather than unwrapped anyway.
    let listen_addr: SocketAddr = config.monitor.listen_addr.parse()?;

    let (event_tx, event_rx) = mpsc::channel::<String>();
    let (analysis_tx, analysis_rx) = mpsc::channel();
    let (alert_tx, alert_rx) = mpsc::channel();

    if !cli.no_producer {
        producer::spawn_fleet(&config.producer, event_tx.clone());
    }
    // The original sender stays alive in this scope so that a --no-producer
    // run idles on ticks instead of seeing a disconnected channel.
    let _event_source_guard: Sender<String> = event_tx;

    let scheduler = AnalysisScheduler::new(
        config.window.capacity,
        Duration::from_secs(config.schedule.aggregate_interval_secs),
        AlertEvaluator::new(config.alert.lookback_secs, config.alert.threshold_percent),
    );
    let scheduler_handle = thread::spawn(move || scheduler.run(event_rx, analysis_tx, alert_tx));

    let store: SharedStore = Arc::new(Mutex::new(MonitorStore::default()));
    monitor::spawn_consumers(store.clone(), analysis_rx, alert_rx);

    let http_store = store.clone();
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                error!("Failed to build HTTP runtime: {e}");
                return;
            }
        };
        if let Err(e) = runtime.block_on(monitor::http::serve(listen_addr, http_store)) {
            error!("Monitor HTTP server failed: {e}");
        }
    });

    let (shutdown_tx, shutdown_rx) = mpsc::channel::<ShutdownReason>();

    let interrupt_tx = shutdown_tx.clone();
    ctrlc::set_handler(move || {
        let _ = interrupt_tx.send(ShutdownReason::Interrupt);
    })?;

    // Watch the scheduler so a transport failure terminates the process
    // instead of degrading silently.
    thread::spawn(move || {
        let reason = match scheduler_handle.join() {
            Ok(Err(e)) => ShutdownReason::TransportFailure(e),
            Ok(Ok(())) => ShutdownReason::Interrupt,
            Err(_) => ShutdownReason::TransportFailure(TransportError::Disconnected(
                "scheduler thread panicked",
            )),
        };
        let _ = shutdown_tx.send(reason);
    });

    info!("logwarden pipeline running; press Ctrl-C to stop");
    match shutdown_rx.recv() {
        Ok(ShutdownReason::Interrupt) => {
            info!("Shutdown signal received, stopping");
            Ok(())
        }
        Ok(ShutdownReason::TransportFailure(e)) => Err(e.into()),
        Err(e) => Err(e.into()),
    }
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        std::env::set_var("RUST_LOG", "debug");
    }
    env_logger::init();

    info!("Starting logwarden");

    let config = load_config(cli.config.as_deref());
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {e}");
        std::process::exit(1);
    }

    if let Err(e) = run(config, &cli) {
        error!("Fatal: {e:#}");
        std::process::exit(1);
    }
}
