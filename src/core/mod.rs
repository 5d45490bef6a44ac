//! Core state of the streaming client.
//!
//! This module contains:
//! - The bounded live buffer and its trim policy
//! - Batch ingestion with atomic validation
//! - Snapshot capture with value isolation
//! - Filter parameter normalization (Hz → fraction of Nyquist)
//! - The session context owning the retention bound and sampling rate

pub mod buffer;
pub mod filters;
pub mod ingest;
pub mod session;
pub mod snapshot;
pub mod types;

// Re-export commonly used types
pub use buffer::LiveBuffer;
pub use filters::{hz_to_normalized, FilterConfig, FilterError};
pub use ingest::{BatchError, IngestOutcome, StreamIngestor};
pub use session::{SessionContext, SessionError};
pub use snapshot::{SnapshotBuffer, SnapshotManager};
pub use types::SampleBatch;
