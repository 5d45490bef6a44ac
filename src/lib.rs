//! ADC Scope Client - streaming viewer for a real-time measurement backend.
//!
//! This library maintains a bounded rolling window over an incoming sample
//! stream, captures immutable snapshots of it on demand, and relays filter
//! configuration and persistence commands to the backend.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       ADC Scope Client                       │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌────────────┐    ┌────────────┐    ┌──────────────┐        │
//! │  │   Stream   │──▶ │  Ingestor  │──▶ │  LiveBuffer  │        │
//! │  │  (NDJSON)  │    │ (validate) │    │ (trim to N)  │        │
//! │  └────────────┘    └────────────┘    └──────┬───────┘        │
//! │        │                                    │ capture        │
//! │        ▼                                    ▼                │
//! │  ┌────────────┐    ┌────────────┐    ┌──────────────┐        │
//! │  │ Telemetry  │    │  Backend   │◀── │   Snapshot   │        │
//! │  │ (counters) │    │  (HTTP)    │    │  (isolated)  │        │
//! │  └────────────┘    └────────────┘    └──────────────┘        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use adc_scope_client::core::{SampleBatch, SessionContext, SnapshotManager, StreamIngestor};
//!
//! let session = SessionContext::new(500, 6000.0).expect("valid sampling rate");
//! let mut ingestor = StreamIngestor::new();
//! let mut snapshots = SnapshotManager::new();
//!
//! let batch = SampleBatch::new(vec![1.0, 2.0], vec![0.9, 1.8]);
//! ingestor.ingest(&session, &batch).expect("well-formed batch");
//!
//! // Freeze the current view; later batches won't touch it.
//! snapshots.capture(ingestor.live());
//! ```

pub mod backend;
pub mod config;
pub mod core;
pub mod stream;
pub mod telemetry;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use backend::{BackendClient, BackendConfig, BackendError, BlockingBackendClient};
pub use config::{Config, ConfigError, ControlState};
pub use core::{
    hz_to_normalized, BatchError, FilterConfig, FilterError, IngestOutcome, LiveBuffer,
    SampleBatch, SessionContext, SessionError, SnapshotBuffer, SnapshotManager, StreamIngestor,
};
pub use telemetry::{
    create_shared_telemetry, create_shared_telemetry_with_persistence, SessionTelemetry,
    SharedTelemetry, TelemetryStats,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
