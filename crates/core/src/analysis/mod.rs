//! Windowed forward FFT of captured frames.

use std::{f32::consts::PI, fmt, sync::Arc};

use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};

use crate::{capture::FrameSlot, Result, SpectrumError};

/// Turns a captured time-domain window into a magnitude spectrum.
///
/// The engine owns every buffer it needs (frame copy, FFT input, spectrum,
/// scratch, magnitudes) and rewrites them in place each cycle, so steady
/// state analysis is allocation-free. Magnitudes cover the first
/// `window_size / 2` bins: index 0 is 0 Hz, index `window_size / 2 - 1` the
/// Nyquist-adjacent bin, spaced `sample_rate / window_size` Hz apart.
pub struct SpectrumEngine {
    window_size: usize,
    taper: Vec<f32>,
    frame: Vec<f32>,
    magnitudes: Vec<f32>,
    fft: FftResources,
}

struct FftResources {
    plan: Arc<dyn RealToComplex<f32>>,
    input: Vec<f32>,
    spectrum: Vec<Complex32>,
    scratch: Vec<Complex32>,
}

impl SpectrumEngine {
    /// Creates an engine for the given window size (a power of two).
    pub fn new(window_size: usize) -> Result<Self> {
        if window_size == 0 || !window_size.is_power_of_two() {
            return Err(SpectrumError::config(format!(
                "window size must be a nonzero power of two, got {window_size}"
            )));
        }

        let mut planner = RealFftPlanner::new();
        let plan = planner.plan_fft_forward(window_size);
        let input = plan.make_input_vec();
        let spectrum = plan.make_output_vec();
        let scratch = plan.make_scratch_vec();

        let taper = (0..window_size)
            .map(|i| hann_value(i, window_size))
            .collect();

        Ok(Self {
            window_size,
            taper,
            frame: vec![0.0; window_size],
            magnitudes: vec![0.0; window_size / 2],
            fft: FftResources {
                plan,
                input,
                spectrum,
                scratch,
            },
        })
    }

    /// Number of time-domain samples analysed per cycle.
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Consumes the pending frame from `slot`, if any, and returns the fresh
    /// magnitude spectrum. Returns `Ok(None)` when no frame is ready, which
    /// makes a spurious render tick a harmless no-op.
    pub fn poll(&mut self, slot: &FrameSlot) -> Result<Option<&[f32]>> {
        if !slot.take_into(&mut self.frame)? {
            return Ok(None);
        }

        self.transform_frame()?;
        Ok(Some(&self.magnitudes))
    }

    /// Analyses an already-captured window directly. `poll` is the normal
    /// entry point; this exists for deterministic offline use and tests.
    pub fn analyze_window(&mut self, samples: &[f32]) -> Result<&[f32]> {
        if samples.len() != self.window_size {
            return Err(SpectrumError::msg(format!(
                "expected {} samples, got {}",
                self.window_size,
                samples.len()
            )));
        }
        self.frame.copy_from_slice(samples);

        self.transform_frame()?;
        Ok(&self.magnitudes)
    }

    /// Tapers the current frame copy, runs the forward transform, and
    /// refreshes the magnitude buffer.
    fn transform_frame(&mut self) -> Result<()> {
        for ((input, &sample), &taper) in self
            .fft
            .input
            .iter_mut()
            .zip(self.frame.iter())
            .zip(self.taper.iter())
        {
            *input = sample * taper;
        }

        self.fft.plan.process_with_scratch(
            &mut self.fft.input,
            &mut self.fft.spectrum,
            &mut self.fft.scratch,
        )?;

        for (magnitude, bin) in self.magnitudes.iter_mut().zip(self.fft.spectrum.iter()) {
            *magnitude = bin.norm();
        }

        Ok(())
    }

    /// The most recently computed spectrum.
    pub fn magnitudes(&self) -> &[f32] {
        &self.magnitudes
    }
}

impl fmt::Debug for SpectrumEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectrumEngine")
            .field("window_size", &self.window_size)
            .finish()
    }
}

fn hann_value(index: usize, len: usize) -> f32 {
    if len <= 1 {
        return 1.0;
    }

    0.5 - 0.5 * ((2.0 * PI * index as f32) / (len as f32 - 1.0)).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::SampleIngestor;

    const WINDOW: usize = 1024;

    fn sine_window(bin: usize) -> Vec<f32> {
        (0..WINDOW)
            .map(|i| (2.0 * PI * bin as f32 * i as f32 / WINDOW as f32).sin())
            .collect()
    }

    #[test]
    fn rejects_invalid_window_sizes() {
        assert!(SpectrumEngine::new(0).is_err());
        assert!(SpectrumEngine::new(1000).is_err());
    }

    #[test]
    fn sine_peaks_at_its_own_bin() {
        let mut engine = SpectrumEngine::new(WINDOW).unwrap();
        let magnitudes = engine.analyze_window(&sine_window(100)).unwrap();

        assert_eq!(magnitudes.len(), WINDOW / 2);
        let peak = magnitudes
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 100);
        assert!(magnitudes.iter().all(|&m| m >= 0.0));
    }

    #[test]
    fn poll_without_ready_frame_is_a_no_op() {
        let slot = FrameSlot::new(WINDOW);
        let mut engine = SpectrumEngine::new(WINDOW).unwrap();
        assert!(engine.poll(&slot).unwrap().is_none());
    }

    #[test]
    fn poll_consumes_the_pending_frame() {
        let slot = FrameSlot::new(WINDOW);
        let mut ingestor = SampleIngestor::new(slot.clone());
        ingestor.push_block(&sine_window(64));

        let mut engine = SpectrumEngine::new(WINDOW).unwrap();
        {
            let magnitudes = engine.poll(&slot).unwrap().expect("frame was ready");
            let peak = magnitudes
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
                .map(|(i, _)| i)
                .unwrap();
            assert_eq!(peak, 64);
        }

        // Consumption cleared the ready state.
        assert!(engine.poll(&slot).unwrap().is_none());
    }
}
