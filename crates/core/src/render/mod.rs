//! Decibel conversion and bar height computation.

use crate::scale::Bar;

/// Decibel floor of the display; a level at or below this renders no bar.
pub const MIN_DB: f32 = -100.0;
/// Decibel ceiling of the display; a level here renders a full-height bar.
pub const MAX_DB: f32 = 0.0;

/// One entry of the outbound draw sequence.
///
/// `height` is the distance in pixels from the top of the canvas to the top
/// of the bar: 0 is a full-height (0 dB) bar, `canvas_height` no visible bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarHeight {
    pub position: usize,
    pub height: f32,
}

/// Converts raw bin magnitudes into clamped decibel levels and pixel-space
/// bar heights using a precomputed [`BarTable`](crate::BarTable).
///
/// The reference offset normalises for transform scaling: a full-scale
/// sinusoid filling the whole window lands near the 0 dB ceiling regardless
/// of the window size.
#[derive(Debug, Clone)]
pub struct LevelRenderer {
    reference_db: f32,
}

impl LevelRenderer {
    /// Creates a renderer normalised for the given analysis window size.
    pub fn new(window_size: usize) -> Self {
        Self {
            reference_db: gain_to_db(window_size as f32),
        }
    }

    /// Computes the `(position, height)` sequence for one frame.
    ///
    /// Bars with a bin range take the loudest level in the range, so a quiet
    /// sub-bin never washes out a loud neighbour. Bars inside a shared-bin
    /// run blend between the previous bin's level and their own by the
    /// interpolation factor.
    pub fn heights(
        &self,
        magnitudes: &[f32],
        bars: &[Bar],
        canvas_height: f32,
    ) -> Vec<BarHeight> {
        let mut heights = Vec::with_capacity(bars.len());

        for bar in bars {
            let height = if bar.end_bin == 0 {
                let mut level = self.level(magnitude_at(magnitudes, bar.bin), canvas_height);

                if bar.factor > 0.0 {
                    let prev = if bar.bin > 0 {
                        self.level(magnitude_at(magnitudes, bar.bin - 1), canvas_height)
                    } else {
                        level
                    };
                    level = prev + (level - prev) * bar.factor;
                }

                level
            } else {
                // Peak hold across the claimed range; a smaller top offset
                // means a louder level.
                let mut loudest = canvas_height;
                for bin in bar.bin..=bar.end_bin {
                    let level = self.level(magnitude_at(magnitudes, bin), canvas_height);
                    if level < loudest {
                        loudest = level;
                    }
                }
                loudest
            };

            heights.push(BarHeight {
                position: bar.position,
                height,
            });
        }

        heights
    }

    /// Maps one bin magnitude onto the canvas: clamp to the decibel window
    /// after subtracting the reference offset, then place linearly so that
    /// [`MAX_DB`] lands at 0 and [`MIN_DB`] at `canvas_height`.
    fn level(&self, magnitude: f32, canvas_height: f32) -> f32 {
        let db = (gain_to_db(magnitude) - self.reference_db).clamp(MIN_DB, MAX_DB);
        (db - MAX_DB) / (MIN_DB - MAX_DB) * canvas_height
    }
}

/// Converts a linear gain to decibels with a -100 dB silence floor.
fn gain_to_db(gain: f32) -> f32 {
    if gain > 0.0 {
        (20.0 * gain.log10()).max(MIN_DB)
    } else {
        MIN_DB
    }
}

/// Out-of-range bins read as silence.
fn magnitude_at(magnitudes: &[f32], bin: usize) -> f32 {
    magnitudes.get(bin).copied().unwrap_or(0.0)
}
