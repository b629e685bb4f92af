//! Equal-tempered scale generation and the frequency-to-bin bar mapper.
//!
//! The FFT spaces its bins linearly while pitch perception is logarithmic,
//! so the two ends of the band need opposite treatment: at low frequencies
//! several bars land on one coarse bin and must interpolate across it, while
//! at high frequencies one bar spans many bins and must aggregate them. The
//! [`BarTable`] precomputes all of that once per configuration so the render
//! path is a plain table walk.

use crate::{AnalyserConfig, Result};

/// One visual column of the analyser.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    /// Screen position index; matches the bar's index in the tempered scale.
    pub position: usize,
    /// FFT bin most representative of the bar's target frequency.
    pub bin: usize,
    /// Upper bound of the bin range aggregated into this bar, inclusive.
    /// Zero means the bar maps to exactly one bin.
    pub end_bin: usize,
    /// Position of this bar within a run of bars sharing one bin, as a
    /// fraction in (0, 1]. Zero when the bar owns its bin exclusively.
    pub factor: f32,
}

/// Ordered sequence of bars plus the tempered scale they were built from.
///
/// Rebuilt only when the configuration changes; the render path reads it
/// without synchronisation because rebuilds are serialized with rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct BarTable {
    bars: Vec<Bar>,
    frequencies: Vec<f32>,
}

impl BarTable {
    /// The bars in screen order.
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Target frequency in Hz for each bar, strictly increasing.
    pub fn frequencies(&self) -> &[f32] {
        &self.frequencies
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// An empty table is valid output and renders as zero bars.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// Generates the equal-tempered target frequencies for a configuration.
///
/// Steps ascend by the quarter-tone ratio 2^(1/24) from a base pitch 114
/// quarter-tones below 440 Hz (roughly 16.35 Hz, the C0 of the scale).
/// Entries outside `[min_freq, max_freq]` or whose step index is not a
/// multiple of the grouping stride are skipped.
pub fn tempered_scale(config: &AnalyserConfig) -> Vec<f32> {
    let ratio = 2.0_f32.powf(1.0 / 24.0);
    let base = 440.0 * ratio.powi(-114);

    let mut frequencies = Vec::new();
    let mut step = 0;
    loop {
        let freq = base * ratio.powi(step);
        if freq > config.max_freq {
            break;
        }
        if freq >= config.min_freq && step as usize % config.group_stride == 0 {
            frequencies.push(freq);
        }
        step += 1;
    }

    frequencies
}

/// Builds the bar table for a configuration.
///
/// Walks the tempered scale in order, assigning each bar a starting bin,
/// detecting runs of bars that share one bin (assigned evenly spaced
/// interpolation factors once the run's length is known), and extending
/// high-frequency bars halfway toward the next bar's bin so skipped bins are
/// aggregated instead of ignored.
pub fn build_bar_table(config: &AnalyserConfig) -> Result<BarTable> {
    config.validate()?;

    let frequencies = tempered_scale(config);
    let bins: Vec<usize> = frequencies
        .iter()
        .map(|&freq| freq_to_bin(freq, config.window_size, config.sample_rate))
        .collect();

    let mut bars: Vec<Bar> = Vec::with_capacity(bins.len());
    // Bars sharing the current bin are buffered here and only emitted once
    // the run's length is known.
    let mut run: Vec<Bar> = Vec::new();
    let mut prev_idx = 0;
    let mut prev_bin = 0;

    for (position, &bin) in bins.iter().enumerate() {
        // Continue from the last claimed bin rather than regressing into a
        // range an earlier bar already covers.
        let idx = if prev_bin > 0 && prev_bin + 1 <= bin {
            prev_bin + 1
        } else {
            bin
        };

        if !run.is_empty() && idx != prev_idx {
            finalize_run(&mut bars, &mut run);
        }
        prev_idx = idx;

        // Look ahead: when the next bar's bin is more than one bin away,
        // claim half the gap so the in-between bins still contribute.
        prev_bin = bin;
        if let Some(&next_bin) = bins.get(position + 1) {
            if next_bin - bin > 1 {
                prev_bin += ((next_bin - bin) as f32 / 2.0).round() as usize;
            }
        }

        let end_bin = if prev_bin > idx { prev_bin } else { 0 };

        run.push(Bar {
            position,
            bin: idx,
            end_bin,
            factor: 0.0,
        });
    }
    finalize_run(&mut bars, &mut run);

    tracing::debug!(
        bars = bars.len(),
        min_freq = config.min_freq,
        max_freq = config.max_freq,
        stride = config.group_stride,
        "built bar table"
    );

    Ok(BarTable { bars, frequencies })
}

/// Maps a frequency to its nearest FFT bin, clamped to the last usable bin.
fn freq_to_bin(freq: f32, window_size: usize, sample_rate: f32) -> usize {
    let bin = (freq * window_size as f32 / sample_rate).round() as usize;
    bin.min(window_size / 2 - 1)
}

/// Emits a finished run of same-bin bars, assigning interpolation factors
/// `{1/k, …, k/k}` for runs of length `k > 1`. A run of one keeps factor 0.
fn finalize_run(bars: &mut Vec<Bar>, run: &mut Vec<Bar>) {
    let len = run.len();
    if len > 1 {
        for (offset, bar) in run.iter_mut().enumerate() {
            bar.factor = (offset + 1) as f32 / len as f32;
        }
    }
    bars.append(run);
}
