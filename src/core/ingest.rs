//! Batch ingestion into the live buffer.
//!
//! The ingestor is the only mutation path for the live window. Each incoming
//! batch is validated as a whole before anything is appended: a length
//! mismatch between the raw and filtered runs, or a non-finite sample in
//! either, rejects the batch and leaves the buffer exactly as it was.

use crate::core::buffer::LiveBuffer;
use crate::core::session::SessionContext;
use crate::core::types::SampleBatch;
use serde::Serialize;

/// Why a batch was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchError {
    /// `raw` and `filtered` runs differ in length
    LengthMismatch { raw: usize, filtered: usize },
    /// A sample was NaN or infinite
    NonFiniteSample { sequence: &'static str, index: usize },
}

impl std::fmt::Display for BatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchError::LengthMismatch { raw, filtered } => {
                write!(
                    f,
                    "malformed batch: raw has {raw} samples, filtered has {filtered}"
                )
            }
            BatchError::NonFiniteSample { sequence, index } => {
                write!(f, "malformed batch: non-finite {sequence} sample at index {index}")
            }
        }
    }
}

impl std::error::Error for BatchError {}

/// What a successful ingest did to the buffer.
///
/// This is the "buffer changed" notification consumers observe; the loop
/// feeds it to telemetry and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestOutcome {
    /// Sample pairs appended from the batch
    pub appended: usize,
    /// Oldest pairs discarded by the trim that followed
    pub trimmed: usize,
    /// Buffer length after the operation
    pub len: usize,
}

/// Applies incoming batches to the live buffer, in arrival order.
#[derive(Debug, Default)]
pub struct StreamIngestor {
    live: LiveBuffer,
}

impl StreamIngestor {
    pub fn new() -> Self {
        Self::default()
    }

    /// The live window in its current state.
    pub fn live(&self) -> &LiveBuffer {
        &self.live
    }

    /// Apply one batch: validate, append, trim to the session bound, relabel.
    ///
    /// Rejection is atomic. The buffer after an `Err` is byte-for-byte the
    /// buffer before the call.
    pub fn ingest(
        &mut self,
        session: &SessionContext,
        batch: &SampleBatch,
    ) -> Result<IngestOutcome, BatchError> {
        if batch.raw.len() != batch.filtered.len() {
            return Err(BatchError::LengthMismatch {
                raw: batch.raw.len(),
                filtered: batch.filtered.len(),
            });
        }
        if let Some(index) = batch.raw.iter().position(|v| !v.is_finite()) {
            return Err(BatchError::NonFiniteSample { sequence: "raw", index });
        }
        if let Some(index) = batch.filtered.iter().position(|v| !v.is_finite()) {
            return Err(BatchError::NonFiniteSample {
                sequence: "filtered",
                index,
            });
        }

        self.live.extend(&batch.raw, &batch.filtered);
        let trimmed = self.live.trim_to(session.max_samples());
        self.live.relabel();

        Ok(IngestOutcome {
            appended: batch.raw.len(),
            trimmed,
            len: self.live.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(max_samples: usize) -> SessionContext {
        SessionContext::new(max_samples, 6000.0).unwrap()
    }

    fn batch(values: &[f64]) -> SampleBatch {
        SampleBatch::new(values.to_vec(), values.to_vec())
    }

    #[test]
    fn test_sequences_stay_parallel_and_bounded() {
        let session = session(8);
        let mut ingestor = StreamIngestor::new();

        for chunk in [&[1.0, 2.0][..], &[3.0][..], &[4.0, 5.0, 6.0][..]] {
            ingestor.ingest(&session, &batch(chunk)).unwrap();
            let live = ingestor.live();
            assert_eq!(live.raw().len(), live.filtered().len());
            assert_eq!(live.raw().len(), live.labels().len());
            assert!(live.len() <= session.max_samples());
        }
    }

    #[test]
    fn test_trim_keeps_newest_three() {
        let session = session(3);
        let mut ingestor = StreamIngestor::new();

        for value in [1.0, 2.0, 3.0, 4.0, 5.0] {
            ingestor.ingest(&session, &batch(&[value])).unwrap();
        }

        assert_eq!(ingestor.live().raw(), &[3.0, 4.0, 5.0]);
        assert_eq!(ingestor.live().filtered(), &[3.0, 4.0, 5.0]);
        assert_eq!(ingestor.live().labels(), &[0, 1, 2]);
    }

    #[test]
    fn test_oversized_batch_trims_in_one_pass() {
        let session = session(3);
        let mut ingestor = StreamIngestor::new();

        let outcome = ingestor
            .ingest(&session, &batch(&[1.0, 2.0, 3.0, 4.0, 5.0]))
            .unwrap();

        assert_eq!(outcome.appended, 5);
        assert_eq!(outcome.trimmed, 2);
        assert_eq!(outcome.len, 3);
        assert_eq!(ingestor.live().raw(), &[3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_length_mismatch_rejected_atomically() {
        let session = session(10);
        let mut ingestor = StreamIngestor::new();
        ingestor.ingest(&session, &batch(&[1.0, 2.0])).unwrap();

        let before_raw = ingestor.live().raw().to_vec();
        let before_filtered = ingestor.live().filtered().to_vec();
        let before_labels = ingestor.live().labels().to_vec();

        let malformed = SampleBatch::new(vec![3.0, 4.0], vec![3.0]);
        let err = ingestor.ingest(&session, &malformed).unwrap_err();
        assert_eq!(err, BatchError::LengthMismatch { raw: 2, filtered: 1 });

        assert_eq!(ingestor.live().raw(), before_raw.as_slice());
        assert_eq!(ingestor.live().filtered(), before_filtered.as_slice());
        assert_eq!(ingestor.live().labels(), before_labels.as_slice());
    }

    #[test]
    fn test_non_finite_sample_rejected_atomically() {
        let session = session(10);
        let mut ingestor = StreamIngestor::new();
        ingestor.ingest(&session, &batch(&[1.0])).unwrap();

        let nan_batch = SampleBatch::new(vec![2.0, f64::NAN], vec![2.0, 3.0]);
        let err = ingestor.ingest(&session, &nan_batch).unwrap_err();
        assert_eq!(
            err,
            BatchError::NonFiniteSample {
                sequence: "raw",
                index: 1
            }
        );
        assert_eq!(ingestor.live().raw(), &[1.0]);

        let inf_batch = SampleBatch::new(vec![2.0], vec![f64::INFINITY]);
        let err = ingestor.ingest(&session, &inf_batch).unwrap_err();
        assert_eq!(
            err,
            BatchError::NonFiniteSample {
                sequence: "filtered",
                index: 0
            }
        );
        assert_eq!(ingestor.live().len(), 1);
    }

    #[test]
    fn test_bound_shrink_applies_on_next_ingest() {
        let mut session = session(500);
        let mut ingestor = StreamIngestor::new();

        let values: Vec<f64> = (0..500).map(|i| i as f64).collect();
        ingestor.ingest(&session, &batch(&values)).unwrap();
        assert_eq!(ingestor.live().len(), 500);

        // Lowering the bound does not touch the buffer by itself.
        session.set_max_samples(100);
        assert_eq!(ingestor.live().len(), 500);

        let outcome = ingestor.ingest(&session, &batch(&[500.0])).unwrap();
        assert_eq!(outcome.len, 100);
        assert_eq!(ingestor.live().len(), 100);

        // The 100 most recent values survive.
        let expected: Vec<f64> = (401..=500).map(|i| i as f64).collect();
        assert_eq!(ingestor.live().raw(), expected.as_slice());
    }

    #[test]
    fn test_empty_batch_is_valid() {
        let session = session(3);
        let mut ingestor = StreamIngestor::new();
        let outcome = ingestor
            .ingest(&session, &SampleBatch::new(vec![], vec![]))
            .unwrap();
        assert_eq!(outcome.appended, 0);
        assert_eq!(outcome.len, 0);
    }
}
