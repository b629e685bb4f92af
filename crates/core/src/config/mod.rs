use serde::{Deserialize, Serialize};

use crate::{Result, SpectrumError};

/// Configuration for the analyser pipeline.
///
/// The values are supplied at construction and on any later reconfiguration;
/// every change triggers a bar table rebuild. Validation is explicit so that
/// a bad sample rate or window size is rejected with a readable message
/// instead of leaking into the bin arithmetic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyserConfig {
    /// Sample rate of the incoming stream in Hz.
    pub sample_rate: f32,
    /// Number of time-domain samples analysed per cycle. Must be a power of
    /// two; determines bin resolution (`sample_rate / window_size` Hz).
    pub window_size: usize,
    /// Lower edge of the displayed frequency band in Hz.
    pub min_freq: f32,
    /// Upper edge of the displayed frequency band in Hz.
    pub max_freq: f32,
    /// Note-grouping stride over the quarter-tone scale. 1 keeps every
    /// quarter-tone entry; larger strides thin the scale for coarser bars.
    pub group_stride: usize,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            window_size: 2048,
            min_freq: 20.0,
            max_freq: 22_000.0,
            group_stride: 2,
        }
    }
}

impl AnalyserConfig {
    /// Checks the configuration for values that would make the frequency
    /// to bin mapping undefined.
    ///
    /// An inverted frequency range (`min_freq >= max_freq`) is deliberately
    /// *not* rejected here: it produces an empty scale and renders as zero
    /// bars, which is valid output.
    pub fn validate(&self) -> Result<()> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(SpectrumError::config(format!(
                "sample rate must be positive, got {}",
                self.sample_rate
            )));
        }
        if self.window_size == 0 || !self.window_size.is_power_of_two() {
            return Err(SpectrumError::config(format!(
                "window size must be a nonzero power of two, got {}",
                self.window_size
            )));
        }
        if !self.min_freq.is_finite() || self.min_freq < 0.0 {
            return Err(SpectrumError::config(format!(
                "minimum frequency must be finite and non-negative, got {}",
                self.min_freq
            )));
        }
        if !self.max_freq.is_finite() || self.max_freq < 0.0 {
            return Err(SpectrumError::config(format!(
                "maximum frequency must be finite and non-negative, got {}",
                self.max_freq
            )));
        }
        if self.group_stride == 0 {
            return Err(SpectrumError::config(
                "note grouping stride must be at least 1",
            ));
        }
        Ok(())
    }

    /// Loads a configuration from its JSON preset representation.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialises the configuration as a JSON preset.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
