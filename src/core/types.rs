//! Wire types shared between the streaming transports and the core.

use serde::{Deserialize, Serialize};

/// A batch of newly arrived samples, as delivered by the backend's
/// `new_data` stream.
///
/// `raw` and `filtered` are parallel: element `i` of each describes the same
/// instant. A batch whose sequences differ in length is malformed and is
/// rejected as a whole by the ingestor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleBatch {
    /// Unfiltered ADC samples
    pub raw: Vec<f64>,
    /// Samples after the backend's filter chain
    pub filtered: Vec<f64>,
}

impl SampleBatch {
    pub fn new(raw: Vec<f64>, filtered: Vec<f64>) -> Self {
        Self { raw, filtered }
    }

    /// Number of sample pairs the batch claims to carry (length of `raw`).
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty() && self.filtered.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_wire_shape() {
        let batch: SampleBatch =
            serde_json::from_str(r#"{"raw": [1.0, 2.0], "filtered": [0.5, 1.5]}"#).unwrap();
        assert_eq!(batch.raw, vec![1.0, 2.0]);
        assert_eq!(batch.filtered, vec![0.5, 1.5]);
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn test_empty_batch() {
        let batch = SampleBatch::new(vec![], vec![]);
        assert!(batch.is_empty());
        assert_eq!(batch.len(), 0);
    }
}
