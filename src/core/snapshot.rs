//! Point-in-time capture of the live window.
//!
//! A snapshot is a value copy: once taken, later streaming never changes it.
//! Each capture replaces the previous snapshot wholesale.

use crate::core::buffer::LiveBuffer;
use serde::Serialize;

/// An immutable copy of the live buffer at capture time.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SnapshotBuffer {
    raw: Vec<f64>,
    filtered: Vec<f64>,
    labels: Vec<usize>,
}

impl SnapshotBuffer {
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn raw(&self) -> &[f64] {
        &self.raw
    }

    pub fn filtered(&self) -> &[f64] {
        &self.filtered
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }
}

/// Produces snapshots on operator demand.
#[derive(Debug, Default)]
pub struct SnapshotManager {
    snapshot: SnapshotBuffer,
}

impl SnapshotManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the live window into a fresh snapshot, replacing any previous
    /// one. An empty live buffer yields an empty snapshot.
    pub fn capture(&mut self, live: &LiveBuffer) -> &SnapshotBuffer {
        self.snapshot = SnapshotBuffer {
            raw: live.raw().to_vec(),
            filtered: live.filtered().to_vec(),
            labels: (0..live.len()).collect(),
        };
        &self.snapshot
    }

    /// The most recent capture; empty before the first one.
    pub fn snapshot(&self) -> &SnapshotBuffer {
        &self.snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ingest::StreamIngestor;
    use crate::core::session::SessionContext;
    use crate::core::types::SampleBatch;

    fn pair(values: &[f64]) -> SampleBatch {
        SampleBatch::new(values.to_vec(), values.to_vec())
    }

    #[test]
    fn test_snapshot_isolated_from_later_ingest() {
        let session = SessionContext::new(10, 6000.0).unwrap();
        let mut ingestor = StreamIngestor::new();
        let mut snapshots = SnapshotManager::new();

        ingestor.ingest(&session, &pair(&[1.0, 2.0, 3.0])).unwrap();
        snapshots.capture(ingestor.live());

        ingestor.ingest(&session, &pair(&[4.0])).unwrap();

        assert_eq!(snapshots.snapshot().raw(), &[1.0, 2.0, 3.0]);
        assert_eq!(snapshots.snapshot().labels(), &[0, 1, 2]);
        assert_eq!(ingestor.live().raw(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_recapture_replaces_wholesale() {
        let session = SessionContext::new(10, 6000.0).unwrap();
        let mut ingestor = StreamIngestor::new();
        let mut snapshots = SnapshotManager::new();

        ingestor.ingest(&session, &pair(&[1.0, 2.0])).unwrap();
        snapshots.capture(ingestor.live());
        assert_eq!(snapshots.snapshot().len(), 2);

        ingestor.ingest(&session, &pair(&[3.0])).unwrap();
        snapshots.capture(ingestor.live());

        // No merge, no accumulation: exactly the live contents.
        assert_eq!(snapshots.snapshot().raw(), &[1.0, 2.0, 3.0]);
        assert_eq!(snapshots.snapshot().labels(), &[0, 1, 2]);
    }

    #[test]
    fn test_capture_of_empty_live_buffer() {
        let mut snapshots = SnapshotManager::new();
        let snapshot = snapshots.capture(&LiveBuffer::new());
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.labels(), &[] as &[usize]);
    }

    #[test]
    fn test_snapshot_serializes_for_export() {
        let session = SessionContext::new(4, 6000.0).unwrap();
        let mut ingestor = StreamIngestor::new();
        let mut snapshots = SnapshotManager::new();
        ingestor.ingest(&session, &pair(&[1.5])).unwrap();

        let json = serde_json::to_value(snapshots.capture(ingestor.live())).unwrap();
        assert_eq!(json["raw"][0], 1.5);
        assert_eq!(json["labels"][0], 0);
    }
}
