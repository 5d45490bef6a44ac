//! Ambient session configuration.
//!
//! One context exists per streaming session. It owns the retention bound and
//! the sampling rate; the ingestor reads the bound on every batch and the
//! filter translator reads the derived Nyquist frequency. The bound is
//! mutable only through [`SessionContext::set_max_samples`].

/// Invalid session parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// Sampling rate was zero, negative, or non-finite
    InvalidSamplingRate(f64),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::InvalidSamplingRate(hz) => {
                write!(f, "invalid sampling rate: {hz} Hz (must be finite and positive)")
            }
        }
    }
}

impl std::error::Error for SessionError {}

/// Per-session configuration read by the core components.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionContext {
    max_samples: usize,
    sampling_rate_hz: f64,
}

impl SessionContext {
    /// Create a context. The sampling rate must be finite and positive; a
    /// retention bound of 0 would disable trimming and is clamped to 1.
    pub fn new(max_samples: usize, sampling_rate_hz: f64) -> Result<Self, SessionError> {
        if !(sampling_rate_hz.is_finite() && sampling_rate_hz > 0.0) {
            return Err(SessionError::InvalidSamplingRate(sampling_rate_hz));
        }
        Ok(Self {
            max_samples: max_samples.max(1),
            sampling_rate_hz,
        })
    }

    /// Upper bound on live-buffer length.
    pub fn max_samples(&self) -> usize {
        self.max_samples
    }

    /// Change the retention bound; 0 is clamped to 1. Takes effect lazily,
    /// on the next ingest.
    pub fn set_max_samples(&mut self, max_samples: usize) {
        self.max_samples = max_samples.max(1);
    }

    pub fn sampling_rate_hz(&self) -> f64 {
        self.sampling_rate_hz
    }

    /// Half the sampling rate: the highest representable frequency.
    pub fn nyquist_hz(&self) -> f64 {
        self.sampling_rate_hz / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nyquist_is_half_the_rate() {
        let session = SessionContext::new(500, 6000.0).unwrap();
        assert_eq!(session.nyquist_hz(), 3000.0);
        assert_eq!(session.sampling_rate_hz(), 6000.0);
    }

    #[test]
    fn test_zero_bound_clamped_to_one() {
        let session = SessionContext::new(0, 6000.0).unwrap();
        assert_eq!(session.max_samples(), 1);

        let mut session = SessionContext::new(100, 6000.0).unwrap();
        session.set_max_samples(0);
        assert_eq!(session.max_samples(), 1);
    }

    #[test]
    fn test_invalid_sampling_rate_rejected() {
        for rate in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                SessionContext::new(500, rate),
                Err(SessionError::InvalidSamplingRate(_))
            ));
        }
    }
}
