//! The rolling window of most-recently received samples.
//!
//! The buffer keeps three parallel sequences (raw, filtered, label) that are
//! equal in length at all times. Retention is bounded: after every append the
//! buffer is trimmed back to the session's sample bound, discarding the
//! oldest elements. Labels are the sample indices `0..len` and are recomputed
//! whenever the contents change.

/// The live sample window consumed by the presentation layer.
#[derive(Debug, Clone, Default)]
pub struct LiveBuffer {
    raw: Vec<f64>,
    filtered: Vec<f64>,
    labels: Vec<usize>,
}

impl LiveBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sample pairs currently held.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Unfiltered samples, oldest first.
    pub fn raw(&self) -> &[f64] {
        &self.raw
    }

    /// Filtered samples, oldest first.
    pub fn filtered(&self) -> &[f64] {
        &self.filtered
    }

    /// Sample labels; `labels()[i] == i` whenever the buffer is consistent.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Append parallel sample runs. Callers must pass equal-length slices;
    /// the ingestor validates this before mutation so the invariant cannot
    /// break mid-append.
    pub(crate) fn extend(&mut self, raw: &[f64], filtered: &[f64]) {
        debug_assert_eq!(raw.len(), filtered.len());
        self.raw.extend_from_slice(raw);
        self.filtered.extend_from_slice(filtered);
    }

    /// Retain only the newest `bound` sample pairs, dropping the oldest.
    ///
    /// Returns the number of pairs discarded. A `bound` of at least the
    /// current length leaves the buffer untouched; trimming happens only
    /// here, as a consequence of an append, never proactively.
    pub(crate) fn trim_to(&mut self, bound: usize) -> usize {
        let len = self.raw.len();
        if len <= bound {
            return 0;
        }
        let excess = len - bound;
        self.raw.drain(..excess);
        self.filtered.drain(..excess);
        excess
    }

    /// Recompute labels as `0..len`.
    pub(crate) fn relabel(&mut self) {
        self.labels.clear();
        self.labels.extend(0..self.raw.len());
    }
}
