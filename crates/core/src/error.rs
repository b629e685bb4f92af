/// Result alias that carries the custom [`SpectrumError`] type.
pub type Result<T> = std::result::Result<T, SpectrumError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum SpectrumError {
    /// A configuration value that would make the bin math undefined. The
    /// rejection happens up front so downstream code never has to guard
    /// against nonsense sample rates or window sizes.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// Wrapper around FFT processing failures.
    #[error("fft processing failed: {0}")]
    Fft(#[from] realfft::FftError),
    /// Wrapper around preset (de)serialisation failures.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    /// Catch-all for conditions without a dedicated variant, such as a
    /// poisoned lock on the shared frame slot.
    #[error("{0}")]
    Message(String),
}

impl SpectrumError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    /// Creates a configuration rejection with a descriptive message.
    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::Config(msg.into())
    }
}

impl From<&str> for SpectrumError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for SpectrumError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
