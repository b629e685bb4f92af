//! Core library for the real-time audio spectrum visualiser.
//!
//! The crate ingests a continuous stream of audio samples, periodically
//! computes a frequency-magnitude spectrum, maps it onto a perceptually
//! log-scaled set of bars following the equal-tempered musical scale, and
//! exposes per-bar pixel heights for an external drawing collaborator.
//!
//! Each module owns a distinct stage of the pipeline: `capture` accumulates
//! samples and hands completed windows across the thread boundary, `analysis`
//! runs the windowed FFT, `scale` precomputes the frequency-to-bar mapping,
//! `render` turns magnitudes into clamped pixel heights, and `visualiser`
//! wires the stages together behind a small facade.

pub mod analysis;
pub mod capture;
pub mod config;
pub mod error;
pub mod render;
pub mod scale;
pub mod visualiser;

pub use analysis::SpectrumEngine;
pub use capture::{FrameSlot, SampleIngestor};
pub use config::AnalyserConfig;
pub use error::{Result, SpectrumError};
pub use render::{BarHeight, LevelRenderer, MAX_DB, MIN_DB};
pub use scale::{build_bar_table, tempered_scale, Bar, BarTable};
pub use visualiser::{FrameContext, SpectrumVisualiser};
