//! Facade wiring capture, analysis, mapping, and rendering together.

use std::sync::Arc;

use crate::{
    analysis::SpectrumEngine,
    capture::{FrameSlot, SampleIngestor},
    render::{BarHeight, LevelRenderer},
    scale::{build_bar_table, BarTable},
    AnalyserConfig, Result,
};

/// Context handed to the draw callback once per rendered frame.
///
/// Bar width and spacing are a drawing concern, derived by the callback from
/// the canvas width and the number of bars.
#[derive(Debug)]
pub struct FrameContext<'a> {
    pub canvas_width: f32,
    pub canvas_height: f32,
    /// One `(position, height)` entry per bar, in screen order.
    pub heights: &'a [BarHeight],
}

/// High level spectrum visualiser facade.
///
/// Owns the render-context half of the pipeline (engine, renderer, bar
/// table) plus the shared frame slot; the capture context gets its own
/// [`SampleIngestor`] via [`ingestor`](Self::ingestor) and the two halves
/// only ever meet at the slot.
#[derive(Debug)]
pub struct SpectrumVisualiser {
    config: AnalyserConfig,
    slot: Arc<FrameSlot>,
    engine: SpectrumEngine,
    renderer: LevelRenderer,
    table: BarTable,
}

impl SpectrumVisualiser {
    /// Creates a visualiser for the given configuration.
    pub fn new(config: AnalyserConfig) -> Result<Self> {
        let table = build_bar_table(&config)?;
        let engine = SpectrumEngine::new(config.window_size)?;
        let renderer = LevelRenderer::new(config.window_size);
        let slot = FrameSlot::new(config.window_size);

        tracing::info!(
            sample_rate = config.sample_rate,
            window_size = config.window_size,
            bars = table.len(),
            "spectrum visualiser ready"
        );

        Ok(Self {
            config,
            slot,
            engine,
            renderer,
            table,
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &AnalyserConfig {
        &self.config
    }

    /// The precomputed bar table for the active configuration.
    pub fn bar_table(&self) -> &BarTable {
        &self.table
    }

    /// Returns a capture-side handle feeding this visualiser. Intended to be
    /// moved into the audio callback; several handles may coexist, but the
    /// slot protocol assumes a single producer at a time.
    pub fn ingestor(&self) -> SampleIngestor {
        SampleIngestor::new(self.slot.clone())
    }

    /// Applies a new configuration with rebuild-and-swap semantics: the new
    /// bar table and engine are constructed first, and on any error the
    /// previous valid state stays in effect.
    ///
    /// A window-size change replaces the frame slot, so capture handles must
    /// be re-obtained afterwards; handles still feeding the old slot are
    /// harmless but ignored.
    pub fn reconfigure(&mut self, config: AnalyserConfig) -> Result<()> {
        let table = build_bar_table(&config)?;
        let engine = SpectrumEngine::new(config.window_size)?;
        let renderer = LevelRenderer::new(config.window_size);

        if config.window_size != self.config.window_size {
            self.slot = FrameSlot::new(config.window_size);
        }

        tracing::info!(
            sample_rate = config.sample_rate,
            window_size = config.window_size,
            bars = table.len(),
            "visualiser reconfigured"
        );

        self.table = table;
        self.engine = engine;
        self.renderer = renderer;
        self.config = config;
        Ok(())
    }

    /// Runs one render-context tick: if a fresh capture frame is pending it
    /// is analysed, mapped to bar heights, and handed to `draw`. Returns
    /// whether a frame was drawn; a tick with nothing pending is a no-op.
    pub fn render_frame<F>(&mut self, canvas_width: f32, canvas_height: f32, draw: F) -> Result<bool>
    where
        F: FnOnce(&FrameContext<'_>),
    {
        let Some(magnitudes) = self.engine.poll(&self.slot)? else {
            return Ok(false);
        };

        let heights = self
            .renderer
            .heights(magnitudes, self.table.bars(), canvas_height);

        draw(&FrameContext {
            canvas_width,
            canvas_height,
            heights: &heights,
        });
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::PI;

    use super::*;

    const CANVAS_WIDTH: f32 = 700.0;
    const CANVAS_HEIGHT: f32 = 500.0;

    fn wide_config() -> AnalyserConfig {
        AnalyserConfig {
            sample_rate: 48_000.0,
            window_size: 2048,
            min_freq: 20.0,
            max_freq: 22_000.0,
            group_stride: 2,
        }
    }

    fn push_sine(ingestor: &mut SampleIngestor, freq: f32, rate: f32, count: usize) {
        for i in 0..count {
            ingestor.push((2.0 * PI * freq * i as f32 / rate).sin());
        }
    }

    #[test]
    fn tick_without_captured_frame_draws_nothing() {
        let mut visualiser = SpectrumVisualiser::new(wide_config()).unwrap();
        let drawn = visualiser
            .render_frame(CANVAS_WIDTH, CANVAS_HEIGHT, |_| {
                panic!("draw callback must not run without a frame");
            })
            .unwrap();
        assert!(!drawn);
    }

    #[test]
    fn sinusoid_yields_one_dominant_bar() {
        let config = wide_config();
        let mut visualiser = SpectrumVisualiser::new(config.clone()).unwrap();
        let mut ingestor = visualiser.ingestor();

        push_sine(&mut ingestor, 1_000.0, config.sample_rate, config.window_size);

        let mut captured = Vec::new();
        let drawn = visualiser
            .render_frame(CANVAS_WIDTH, CANVAS_HEIGHT, |ctx| {
                assert_eq!(ctx.canvas_width, CANVAS_WIDTH);
                assert_eq!(ctx.canvas_height, CANVAS_HEIGHT);
                captured = ctx.heights.to_vec();
            })
            .unwrap();
        assert!(drawn);
        assert_eq!(captured.len(), visualiser.bar_table().len());

        let frequencies = visualiser.bar_table().frequencies();
        let dominant = captured
            .iter()
            .min_by(|a, b| a.height.partial_cmp(&b.height).unwrap())
            .unwrap();

        // The loud bar sits at the sinusoid's pitch and reaches near the top
        // of the canvas.
        let dominant_freq = frequencies[dominant.position];
        assert!(
            (900.0..1_100.0).contains(&dominant_freq),
            "dominant bar at {dominant_freq} Hz"
        );
        assert!(dominant.height < CANVAS_HEIGHT * 0.35);

        // Everything away from the pitch stays quiet, near the floor.
        for bar in &captured {
            let freq = frequencies[bar.position];
            if !(700.0..1_400.0).contains(&freq) {
                assert!(
                    bar.height > CANVAS_HEIGHT * 0.75,
                    "bar at {freq} Hz unexpectedly loud: {}",
                    bar.height
                );
            }
        }

        // The frame was consumed; the next tick has nothing to draw.
        let drawn = visualiser
            .render_frame(CANVAS_WIDTH, CANVAS_HEIGHT, |_| {})
            .unwrap();
        assert!(!drawn);
    }

    #[test]
    fn failed_reconfigure_keeps_the_previous_table() {
        let mut visualiser = SpectrumVisualiser::new(wide_config()).unwrap();
        let before = visualiser.bar_table().clone();

        let bad = AnalyserConfig {
            window_size: 1000,
            ..wide_config()
        };
        assert!(visualiser.reconfigure(bad).is_err());
        assert_eq!(visualiser.bar_table(), &before);
        assert_eq!(visualiser.config(), &wide_config());
    }

    #[test]
    fn reconfigure_rebuilds_the_table() {
        let mut visualiser = SpectrumVisualiser::new(wide_config()).unwrap();
        let before = visualiser.bar_table().len();

        let narrow = AnalyserConfig {
            min_freq: 200.0,
            max_freq: 2_000.0,
            ..wide_config()
        };
        visualiser.reconfigure(narrow.clone()).unwrap();
        assert_eq!(visualiser.config(), &narrow);
        assert!(visualiser.bar_table().len() < before);
    }

    #[test]
    fn window_size_change_replaces_the_slot() {
        let config = wide_config();
        let mut visualiser = SpectrumVisualiser::new(config.clone()).unwrap();
        let mut stale = visualiser.ingestor();

        visualiser
            .reconfigure(AnalyserConfig {
                window_size: 1024,
                ..config.clone()
            })
            .unwrap();

        // The stale handle still fills its old slot without effect.
        push_sine(&mut stale, 440.0, config.sample_rate, config.window_size);
        let drawn = visualiser
            .render_frame(CANVAS_WIDTH, CANVAS_HEIGHT, |_| {})
            .unwrap();
        assert!(!drawn);

        // A fresh handle feeds the new slot.
        let mut ingestor = visualiser.ingestor();
        push_sine(&mut ingestor, 440.0, config.sample_rate, 1024);
        let drawn = visualiser
            .render_frame(CANVAS_WIDTH, CANVAS_HEIGHT, |_| {})
            .unwrap();
        assert!(drawn);
    }
}
