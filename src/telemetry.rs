//! Session observability sink.
//!
//! Counts what the session did (batches applied and rejected, samples
//! trimmed, snapshots captured, saves issued) without retaining any sample
//! data. Counters are atomics so producer threads and the run loop can share
//! one instance behind an `Arc`. Stats persist to JSON so `status` can report
//! cumulative totals across sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared handle to the session telemetry.
pub type SharedTelemetry = Arc<SessionTelemetry>;

/// Telemetry counters for the current session.
#[derive(Debug)]
pub struct SessionTelemetry {
    /// Batches applied to the live buffer
    batches_ingested: AtomicU64,
    /// Batches rejected as malformed
    batches_rejected: AtomicU64,
    /// Sample pairs appended
    samples_appended: AtomicU64,
    /// Sample pairs discarded by trimming
    samples_trimmed: AtomicU64,
    /// Snapshots captured
    snapshots_captured: AtomicU64,
    /// Save requests issued to the backend
    saves_requested: AtomicU64,
    /// Failed outbound backend requests
    backend_errors: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Session identifier
    session_id: String,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

/// A point-in-time copy of the counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryStats {
    pub batches_ingested: u64,
    pub batches_rejected: u64,
    pub samples_appended: u64,
    pub samples_trimmed: u64,
    pub snapshots_captured: u64,
    pub saves_requested: u64,
    pub backend_errors: u64,
    pub session_start: DateTime<Utc>,
    pub session_id: String,
    pub session_duration_secs: u64,
}

impl SessionTelemetry {
    /// Create a new telemetry instance.
    pub fn new() -> Self {
        Self {
            batches_ingested: AtomicU64::new(0),
            batches_rejected: AtomicU64::new(0),
            samples_appended: AtomicU64::new(0),
            samples_trimmed: AtomicU64::new(0),
            snapshots_captured: AtomicU64::new(0),
            saves_requested: AtomicU64::new(0),
            backend_errors: AtomicU64::new(0),
            session_start: Utc::now(),
            session_id: format!("scope-{}", &uuid::Uuid::new_v4().to_string()[..8]),
            persist_path: None,
        }
    }

    /// Create a telemetry instance that accumulates into `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut telemetry = Self::new();
        telemetry.persist_path = Some(path);

        if let Err(e) = telemetry.load() {
            tracing::debug!("No previous telemetry loaded: {e}");
        }

        telemetry
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Record a successfully applied batch.
    pub fn record_ingest(&self, appended: u64, trimmed: u64) {
        self.batches_ingested.fetch_add(1, Ordering::Relaxed);
        self.samples_appended.fetch_add(appended, Ordering::Relaxed);
        self.samples_trimmed.fetch_add(trimmed, Ordering::Relaxed);
    }

    /// Record a rejected batch.
    pub fn record_rejected_batch(&self) {
        self.batches_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a snapshot capture.
    pub fn record_snapshot_captured(&self) {
        self.snapshots_captured.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a save request handed to the backend.
    pub fn record_save_requested(&self) {
        self.saves_requested.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed outbound request.
    pub fn record_backend_error(&self) {
        self.backend_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> TelemetryStats {
        TelemetryStats {
            batches_ingested: self.batches_ingested.load(Ordering::Relaxed),
            batches_rejected: self.batches_rejected.load(Ordering::Relaxed),
            samples_appended: self.samples_appended.load(Ordering::Relaxed),
            samples_trimmed: self.samples_trimmed.load(Ordering::Relaxed),
            snapshots_captured: self.snapshots_captured.load(Ordering::Relaxed),
            saves_requested: self.saves_requested.load(Ordering::Relaxed),
            backend_errors: self.backend_errors.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_id: self.session_id.clone(),
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics ({}):\n\
             - Batches ingested: {}\n\
             - Batches rejected: {}\n\
             - Samples appended: {}\n\
             - Samples trimmed: {}\n\
             - Snapshots captured: {}\n\
             - Saves requested: {}\n\
             - Backend errors: {}\n\
             - Session duration: {} seconds",
            stats.session_id,
            stats.batches_ingested,
            stats.batches_rejected,
            stats.samples_appended,
            stats.samples_trimmed,
            stats.snapshots_captured,
            stats.saves_requested,
            stats.backend_errors,
            stats.session_duration_secs
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), String> {
        let Some(ref path) = self.persist_path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(&self.stats()).map_err(|e| e.to_string())?;
        std::fs::write(path, json).map_err(|e| e.to_string())
    }

    /// Load previously persisted counters, adding them to the current ones.
    fn load(&self) -> Result<(), String> {
        let Some(ref path) = self.persist_path else {
            return Ok(());
        };

        let content = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        let stats: TelemetryStats = serde_json::from_str(&content).map_err(|e| e.to_string())?;

        self.batches_ingested
            .fetch_add(stats.batches_ingested, Ordering::Relaxed);
        self.batches_rejected
            .fetch_add(stats.batches_rejected, Ordering::Relaxed);
        self.samples_appended
            .fetch_add(stats.samples_appended, Ordering::Relaxed);
        self.samples_trimmed
            .fetch_add(stats.samples_trimmed, Ordering::Relaxed);
        self.snapshots_captured
            .fetch_add(stats.snapshots_captured, Ordering::Relaxed);
        self.saves_requested
            .fetch_add(stats.saves_requested, Ordering::Relaxed);
        self.backend_errors
            .fetch_add(stats.backend_errors, Ordering::Relaxed);

        Ok(())
    }
}

impl Default for SessionTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a shared telemetry instance.
pub fn create_shared_telemetry() -> SharedTelemetry {
    Arc::new(SessionTelemetry::new())
}

/// Create a shared telemetry instance that persists to `path`.
pub fn create_shared_telemetry_with_persistence(path: PathBuf) -> SharedTelemetry {
    Arc::new(SessionTelemetry::with_persistence(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let telemetry = SessionTelemetry::new();
        telemetry.record_ingest(5, 2);
        telemetry.record_ingest(3, 0);
        telemetry.record_rejected_batch();
        telemetry.record_snapshot_captured();
        telemetry.record_save_requested();
        telemetry.record_backend_error();

        let stats = telemetry.stats();
        assert_eq!(stats.batches_ingested, 2);
        assert_eq!(stats.samples_appended, 8);
        assert_eq!(stats.samples_trimmed, 2);
        assert_eq!(stats.batches_rejected, 1);
        assert_eq!(stats.snapshots_captured, 1);
        assert_eq!(stats.saves_requested, 1);
        assert_eq!(stats.backend_errors, 1);
    }

    #[test]
    fn test_summary_mentions_counters() {
        let telemetry = SessionTelemetry::new();
        telemetry.record_ingest(10, 0);
        let summary = telemetry.summary();
        assert!(summary.contains("Batches ingested: 1"));
        assert!(summary.contains("Samples appended: 10"));
    }

    #[test]
    fn test_persistence_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("telemetry.json");

        let telemetry = SessionTelemetry::with_persistence(path.clone());
        telemetry.record_ingest(7, 3);
        telemetry.save().unwrap();

        let restored = SessionTelemetry::with_persistence(path);
        let stats = restored.stats();
        assert_eq!(stats.batches_ingested, 1);
        assert_eq!(stats.samples_appended, 7);
        assert_eq!(stats.samples_trimmed, 3);
    }
}
