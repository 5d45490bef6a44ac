//! Filter parameter translation.
//!
//! Operators enter cutoff frequencies in Hz; the backend's filter design
//! works in the normalized domain, where a cutoff is a fraction of the
//! Nyquist frequency confined to [0, 1]. This module is the sole producer of
//! the configuration payload sent to `/update_filters`.

use serde::{Deserialize, Serialize};

/// Invalid filter parameters, caught before a config is assembled.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterError {
    /// Nyquist frequency was zero, negative, or non-finite
    InvalidNyquist(f64),
    /// A cutoff was NaN
    NonFiniteCutoff { name: &'static str },
    /// Update interval was zero, negative, or non-finite
    InvalidInterval(f64),
}

impl std::fmt::Display for FilterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterError::InvalidNyquist(hz) => {
                write!(f, "invalid Nyquist frequency: {hz} Hz (must be finite and positive)")
            }
            FilterError::NonFiniteCutoff { name } => {
                write!(f, "invalid {name} cutoff: not a number")
            }
            FilterError::InvalidInterval(secs) => {
                write!(f, "invalid update interval: {secs} s (must be finite and positive)")
            }
        }
    }
}

impl std::error::Error for FilterError {}

/// Convert a cutoff in Hz to the normalized domain.
///
/// The result is `cutoff_hz / nyquist_hz` clamped to [0, 1]: negative
/// cutoffs (and −∞) map to 0, cutoffs above Nyquist (and +∞) map to 1.
/// A NaN cutoff or a non-positive/non-finite Nyquist is an error rather
/// than a non-finite ratio leaking out.
pub fn hz_to_normalized(cutoff_hz: f64, nyquist_hz: f64) -> Result<f64, FilterError> {
    if !(nyquist_hz.is_finite() && nyquist_hz > 0.0) {
        return Err(FilterError::InvalidNyquist(nyquist_hz));
    }
    if cutoff_hz.is_nan() {
        return Err(FilterError::NonFiniteCutoff { name: "requested" });
    }

    let ratio = cutoff_hz / nyquist_hz;
    Ok(ratio.clamp(0.0, 1.0))
}

/// The assembled filter configuration, in the backend's wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Low-pass cutoff as a fraction of Nyquist, in [0, 1]
    #[serde(rename = "lp_cutoff")]
    pub low_pass_cutoff: f64,
    /// High-pass cutoff as a fraction of Nyquist, in [0, 1]
    #[serde(rename = "hp_cutoff")]
    pub high_pass_cutoff: f64,
    /// Whether the low-pass stage is applied
    #[serde(rename = "lp_active")]
    pub low_pass_active: bool,
    /// Whether the high-pass stage is applied
    #[serde(rename = "hp_active")]
    pub high_pass_active: bool,
    /// Backend emit interval in seconds, passed through unconverted
    #[serde(rename = "update_interval")]
    pub update_interval_secs: f64,
}

impl FilterConfig {
    /// Build a configuration from operator-entered Hz values.
    ///
    /// Both cutoffs go through [`hz_to_normalized`]; activation flags and
    /// the interval are copied unchanged.
    pub fn from_hz(
        low_pass_hz: f64,
        high_pass_hz: f64,
        low_pass_active: bool,
        high_pass_active: bool,
        update_interval_secs: f64,
        nyquist_hz: f64,
    ) -> Result<Self, FilterError> {
        if !(update_interval_secs.is_finite() && update_interval_secs > 0.0) {
            return Err(FilterError::InvalidInterval(update_interval_secs));
        }

        Ok(Self {
            low_pass_cutoff: hz_to_normalized(low_pass_hz, nyquist_hz)
                .map_err(|e| match e {
                    FilterError::NonFiniteCutoff { .. } => {
                        FilterError::NonFiniteCutoff { name: "low-pass" }
                    }
                    other => other,
                })?,
            high_pass_cutoff: hz_to_normalized(high_pass_hz, nyquist_hz)
                .map_err(|e| match e {
                    FilterError::NonFiniteCutoff { .. } => {
                        FilterError::NonFiniteCutoff { name: "high-pass" }
                    }
                    other => other,
                })?,
            low_pass_active,
            high_pass_active,
            update_interval_secs,
        })
    }
}
