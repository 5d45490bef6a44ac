//! ADC Scope Client CLI
//!
//! Streaming viewer for a real-time ADC measurement backend.

use adc_scope_client::{
    backend::{BackendConfig, BlockingBackendClient},
    config::{Config, ControlState},
    core::{FilterConfig, SampleBatch, SessionContext, SnapshotManager, StreamIngestor},
    stream,
    telemetry::{create_shared_telemetry_with_persistence, SharedTelemetry},
    VERSION,
};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(feature = "server")]
use adc_scope_client::server::{self, ServerConfig};

#[derive(Parser)]
#[command(name = "adc-scope")]
#[command(version = VERSION)]
#[command(about = "Streaming client for a real-time ADC measurement backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a streaming session
    Run {
        /// Backend host (overrides the config file)
        #[arg(long)]
        backend_host: Option<String>,

        /// Backend port (overrides the config file)
        #[arg(long)]
        backend_port: Option<u16>,

        /// Serial port to connect before streaming (e.g. /dev/ttyUSB0)
        #[arg(long)]
        serial_port: Option<String>,

        /// Maximum samples kept in the live window
        #[arg(long)]
        sample_count: Option<usize>,

        /// ADC sampling rate in Hz
        #[arg(long)]
        sampling_rate: Option<f64>,

        /// Accept pushed batches on a local HTTP endpoint (requires server feature)
        #[arg(long)]
        listen: bool,

        /// Port for the push-ingest endpoint (0 for random)
        #[arg(long, default_value = "0")]
        listen_port: u16,
    },

    /// List serial ports visible to the backend
    Ports,

    /// Select the serial port the backend reads from
    Connect {
        /// Port identifier, as printed by `ports`
        port: String,
    },

    /// Update the backend filter chain (cutoffs in Hz)
    SetFilters {
        /// Low-pass cutoff in Hz
        #[arg(long)]
        lp_hz: f64,

        /// High-pass cutoff in Hz
        #[arg(long)]
        hp_hz: f64,

        /// Enable the low-pass stage
        #[arg(long)]
        lp_active: bool,

        /// Enable the high-pass stage
        #[arg(long)]
        hp_active: bool,

        /// Backend emit interval in seconds
        #[arg(long)]
        interval: Option<f64>,

        /// New live-window bound, applied by a running session on its next poll
        #[arg(long)]
        sample_count: Option<usize>,
    },

    /// Ask a running session to capture a snapshot
    Capture,

    /// Ask a running session to save its window via the backend
    Save,

    /// Show configuration and cumulative session statistics
    Status,

    /// Show configuration
    Config,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            backend_host,
            backend_port,
            serial_port,
            sample_count,
            sampling_rate,
            listen,
            listen_port,
        } => {
            cmd_run(
                backend_host,
                backend_port,
                serial_port,
                sample_count,
                sampling_rate,
                listen,
                listen_port,
            );
        }
        Commands::Ports => {
            cmd_ports();
        }
        Commands::Connect { port } => {
            cmd_connect(&port);
        }
        Commands::SetFilters {
            lp_hz,
            hp_hz,
            lp_active,
            hp_active,
            interval,
            sample_count,
        } => {
            cmd_set_filters(lp_hz, hp_hz, lp_active, hp_active, interval, sample_count);
        }
        Commands::Capture => {
            cmd_capture();
        }
        Commands::Save => {
            cmd_save();
        }
        Commands::Status => {
            cmd_status();
        }
        Commands::Config => {
            cmd_config();
        }
    }
}

#[allow(unused_variables)]
fn cmd_run(
    backend_host: Option<String>,
    backend_port: Option<u16>,
    serial_port: Option<String>,
    sample_count: Option<usize>,
    sampling_rate: Option<f64>,
    listen: bool,
    listen_port: u16,
) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    println!("ADC Scope Client v{VERSION}");
    println!();

    let mut config = Config::load().unwrap_or_default();
    if let Some(host) = backend_host {
        config.backend_host = host;
    }
    if let Some(port) = backend_port {
        config.backend_port = port;
    }
    if let Some(count) = sample_count {
        config.sample_count = count;
    }
    if let Some(rate) = sampling_rate {
        config.sampling_rate_hz = rate;
    }
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    let mut session = match SessionContext::new(config.sample_count, config.sampling_rate_hz) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let backend_config = BackendConfig::new(config.backend_host.clone(), config.backend_port);

    println!("Starting session...");
    println!("  Backend: {}", backend_config.url());
    println!(
        "  Sampling rate: {} Hz (Nyquist {} Hz)",
        session.sampling_rate_hz(),
        session.nyquist_hz()
    );
    println!("  Window: {} samples", session.max_samples());

    // Set up telemetry
    let telemetry = create_shared_telemetry_with_persistence(config.telemetry_path());
    println!("  Session ID: {}", telemetry.session_id());

    // Connect the serial port if requested; failure is not fatal, the
    // operator can retry with `connect` while the session runs.
    if let Some(ref port) = serial_port {
        match BlockingBackendClient::new(backend_config.clone()) {
            Ok(client) => match client.select_port(port) {
                Ok(response) => println!("  Serial port: {}", response.status),
                Err(e) => {
                    telemetry.record_backend_error();
                    eprintln!("Warning: Could not select port {port}: {e}");
                }
            },
            Err(e) => eprintln!("Warning: Backend client unavailable: {e}"),
        }
    }

    // Core state, owned exclusively by this loop
    let mut ingestor = StreamIngestor::new();
    let mut snapshots = SnapshotManager::new();

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone());

    // Batch channel: producers are the stream reader and, when enabled, the
    // push-ingest server. This loop is the only consumer.
    let (sender, receiver) = crossbeam_channel::unbounded::<SampleBatch>();
    let _reader = stream::spawn_reader(backend_config.clone(), sender.clone(), running.clone());

    #[cfg(feature = "server")]
    let mut server_runtime: Option<tokio::runtime::Runtime> = None;
    #[cfg(feature = "server")]
    let mut server_shutdown: Option<tokio::sync::oneshot::Sender<()>> = None;
    #[cfg(feature = "server")]
    if listen {
        match tokio::runtime::Runtime::new() {
            Ok(runtime) => {
                match runtime.block_on(server::run(ServerConfig::new(listen_port), sender.clone()))
                {
                    Ok((addr, shutdown_tx)) => {
                        println!("  Push ingest: http://{addr}/new_data");
                        server_runtime = Some(runtime);
                        server_shutdown = Some(shutdown_tx);
                    }
                    Err(e) => eprintln!("Warning: Could not start push-ingest server: {e}"),
                }
            }
            Err(e) => eprintln!("Warning: Could not create server runtime: {e}"),
        }
    }

    #[cfg(not(feature = "server"))]
    if listen {
        eprintln!("Warning: --listen ignored (server feature not enabled at compile time)");
    }

    drop(sender);

    println!();
    println!("Press Ctrl+C to stop");
    println!();

    // Requests issued before startup count as handled.
    let control_path = config.control_path();
    let mut last_control = ControlState::load(&control_path).unwrap_or_default();
    let mut last_config_check = Instant::now();

    while running.load(Ordering::SeqCst) {
        // Poll config and control files so `set-filters`, `capture` and
        // `save` from another process reach this session.
        if last_config_check.elapsed() >= Duration::from_secs(1) {
            if let Ok(cfg) = Config::load() {
                let bound = cfg.sample_count.max(1);
                if bound != session.max_samples() {
                    println!(
                        "Window bound changed: {} -> {} samples",
                        session.max_samples(),
                        bound
                    );
                    // The buffer shrinks lazily, on the next ingest.
                    session.set_max_samples(bound);
                }
            }

            if let Ok(control) = ControlState::load(&control_path) {
                if control.capture_seq > last_control.capture_seq {
                    handle_capture(&mut snapshots, &ingestor, &config, &telemetry);
                }
                if control.save_seq > last_control.save_seq {
                    handle_save(&ingestor, &backend_config, &telemetry);
                }
                last_control = control;
            }

            last_config_check = Instant::now();
        }

        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(batch) => match ingestor.ingest(&session, &batch) {
                Ok(outcome) => {
                    telemetry.record_ingest(outcome.appended as u64, outcome.trimmed as u64);
                    tracing::debug!(
                        appended = outcome.appended,
                        trimmed = outcome.trimmed,
                        len = outcome.len,
                        "Batch applied"
                    );
                }
                Err(e) => {
                    telemetry.record_rejected_batch();
                    tracing::warn!("Rejected batch: {e}");
                }
            },
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                eprintln!("Sample stream disconnected unexpectedly");
                break;
            }
        }
    }

    println!();
    println!("Stopping session...");

    #[cfg(feature = "server")]
    {
        if let Some(shutdown_tx) = server_shutdown.take() {
            let _ = shutdown_tx.send(());
        }
        if let Some(runtime) = server_runtime.take() {
            runtime.shutdown_timeout(Duration::from_millis(200));
        }
    }

    if let Err(e) = telemetry.save() {
        eprintln!("Warning: Could not save telemetry: {e}");
    }

    println!();
    println!("{}", telemetry.summary());
}

/// Capture the live window and export it for the presentation layer.
fn handle_capture(
    snapshots: &mut SnapshotManager,
    ingestor: &StreamIngestor,
    config: &Config,
    telemetry: &SharedTelemetry,
) {
    let snapshot = snapshots.capture(ingestor.live());
    telemetry.record_snapshot_captured();

    let export_path = config
        .export_path
        .join(format!("snapshot_{}.json", Utc::now().format("%Y%m%d_%H%M%S")));

    match serde_json::to_string_pretty(snapshot) {
        Ok(json) => {
            if let Err(e) = std::fs::write(&export_path, json) {
                eprintln!("Error writing snapshot: {e}");
            } else {
                println!(
                    "Captured snapshot of {} samples to {:?}",
                    snapshot.len(),
                    export_path
                );
            }
        }
        Err(e) => eprintln!("Error serializing snapshot: {e}"),
    }
}

/// Relay the current window to the backend on a worker thread.
///
/// The request runs over a value copy, so streaming continues while it is in
/// flight; the eventual response is logged, never fed back into the buffer.
fn handle_save(ingestor: &StreamIngestor, backend_config: &BackendConfig, telemetry: &SharedTelemetry) {
    let raw = ingestor.live().raw().to_vec();
    let filtered = ingestor.live().filtered().to_vec();
    let backend_config = backend_config.clone();
    let telemetry = telemetry.clone();

    telemetry.record_save_requested();
    println!("Save requested ({} samples)", raw.len());

    std::thread::spawn(move || {
        let client = match BlockingBackendClient::new(backend_config) {
            Ok(client) => client,
            Err(e) => {
                telemetry.record_backend_error();
                tracing::warn!("Save failed: {e}");
                return;
            }
        };
        match client.save_data(&raw, &filtered) {
            Ok(response) => {
                tracing::info!("Backend saved {} samples: {}", raw.len(), response.message);
            }
            Err(e) => {
                telemetry.record_backend_error();
                tracing::warn!("Save failed: {e}");
            }
        }
    });
}

fn cmd_ports() {
    let config = Config::load().unwrap_or_default();
    let backend_config = BackendConfig::new(config.backend_host, config.backend_port);

    let client = match BlockingBackendClient::new(backend_config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    match client.list_ports() {
        Ok(ports) if ports.is_empty() => {
            println!("No serial ports available.");
        }
        Ok(ports) => {
            println!("Available serial ports:");
            for port in ports {
                println!("  {port}");
            }
        }
        Err(e) => {
            eprintln!("Error listing ports: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_connect(port: &str) {
    let config = Config::load().unwrap_or_default();
    let backend_config = BackendConfig::new(config.backend_host, config.backend_port);

    let client = match BlockingBackendClient::new(backend_config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    match client.select_port(port) {
        Ok(response) => println!("{}", response.status),
        Err(e) => {
            eprintln!("Error selecting port: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_set_filters(
    lp_hz: f64,
    hp_hz: f64,
    lp_active: bool,
    hp_active: bool,
    interval: Option<f64>,
    sample_count: Option<usize>,
) {
    let mut config = Config::load().unwrap_or_default();
    let interval = interval.unwrap_or(config.update_interval_secs);
    let nyquist_hz = config.sampling_rate_hz / 2.0;

    let filters = match FilterConfig::from_hz(lp_hz, hp_hz, lp_active, hp_active, interval, nyquist_hz)
    {
        Ok(filters) => filters,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    println!("Low-pass:  {lp_hz} Hz -> {:.4}", filters.low_pass_cutoff);
    println!("High-pass: {hp_hz} Hz -> {:.4}", filters.high_pass_cutoff);

    // The local effect is not gated on backend acknowledgement: persist the
    // new window bound and interval first, then push the filter change.
    config.update_interval_secs = interval;
    if let Some(count) = sample_count {
        if count == 0 {
            eprintln!("Note: sample count 0 clamped to 1");
        }
        config.sample_count = count.max(1);
    }
    if let Err(e) = config.save() {
        eprintln!("Error saving config: {e}");
        std::process::exit(1);
    }
    if sample_count.is_some() {
        println!(
            "Window bound set to {} samples; a running session applies it on its next poll.",
            config.sample_count
        );
    }

    let backend_config = BackendConfig::new(config.backend_host, config.backend_port);
    match BlockingBackendClient::new(backend_config) {
        Ok(client) => match client.update_filters(&filters) {
            Ok(response) => println!("Backend acknowledged: {response}"),
            Err(e) => eprintln!("Warning: Filter update not acknowledged by backend: {e}"),
        },
        Err(e) => eprintln!("Warning: Backend client unavailable: {e}"),
    }
}

fn cmd_capture() {
    request(|control| control.request_capture());
    println!("Capture requested; a running session will export the snapshot shortly.");
}

fn cmd_save() {
    request(|control| control.request_save());
    println!("Save requested; a running session will relay its window to the backend.");
}

/// Bump a control sequence number for a running session to pick up.
fn request(bump: impl FnOnce(&mut ControlState)) {
    let config = Config::load().unwrap_or_default();
    if let Err(e) = config.ensure_directories() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    let control_path = config.control_path();
    let mut control = match ControlState::load(&control_path) {
        Ok(control) => control,
        Err(e) => {
            eprintln!("Error reading control file: {e}");
            std::process::exit(1);
        }
    };

    bump(&mut control);

    if let Err(e) = control.save(&control_path) {
        eprintln!("Error writing control file: {e}");
        std::process::exit(1);
    }
}

fn cmd_status() {
    let config = Config::load().unwrap_or_default();

    println!("ADC Scope Client Status");
    println!("=======================");
    println!();
    println!("Configuration:");
    println!("  Backend: http://{}:{}", config.backend_host, config.backend_port);
    println!(
        "  Sampling rate: {} Hz (Nyquist {} Hz)",
        config.sampling_rate_hz,
        config.sampling_rate_hz / 2.0
    );
    println!("  Window: {} samples", config.sample_count);
    println!("  Update interval: {} s", config.update_interval_secs);
    println!();

    let stats_path = config.telemetry_path();
    if stats_path.exists() {
        if let Ok(content) = std::fs::read_to_string(&stats_path) {
            if let Ok(stats) = serde_json::from_str::<serde_json::Value>(&content) {
                println!("Cumulative Statistics:");
                if let Some(batches) = stats.get("batches_ingested") {
                    println!("  Batches ingested: {batches}");
                }
                if let Some(rejected) = stats.get("batches_rejected") {
                    println!("  Batches rejected: {rejected}");
                }
                if let Some(samples) = stats.get("samples_appended") {
                    println!("  Samples appended: {samples}");
                }
                if let Some(trimmed) = stats.get("samples_trimmed") {
                    println!("  Samples trimmed: {trimmed}");
                }
                if let Some(captures) = stats.get("snapshots_captured") {
                    println!("  Snapshots captured: {captures}");
                }
                if let Some(saves) = stats.get("saves_requested") {
                    println!("  Saves requested: {saves}");
                }
            }
        }
    } else {
        println!("No previous session data found.");
    }
}

fn cmd_config() {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");
}
