use std::f32::consts::PI;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use spectrum_visualiser_core::{AnalyserConfig, SpectrumVisualiser};
use tracing_subscriber::EnvFilter;

fn main() -> spectrum_visualiser_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Demo {
            frequency,
            width,
            height,
            preset,
        } => run_demo(frequency, width, height, preset.as_deref()),
        Commands::Layout { preset } => run_layout(preset.as_deref()),
    }
}

/// Feeds one window of a synthesized sinusoid through the visualiser and
/// reports which bar it lights up.
fn run_demo(
    frequency: f32,
    width: f32,
    height: f32,
    preset: Option<&Path>,
) -> spectrum_visualiser_core::Result<()> {
    let config = load_config(preset)?;
    tracing::info!(frequency, "running demo analysis");

    let mut visualiser = SpectrumVisualiser::new(config.clone())?;
    let mut ingestor = visualiser.ingestor();

    for i in 0..config.window_size {
        ingestor.push((2.0 * PI * frequency * i as f32 / config.sample_rate).sin());
    }

    let drawn = visualiser.render_frame(width, height, |ctx| {
        let dominant = ctx
            .heights
            .iter()
            .min_by(|a, b| a.height.partial_cmp(&b.height).unwrap());

        match dominant {
            Some(bar) => {
                println!(
                    "{} bars on a {}x{} canvas; dominant bar #{} at height {:.1}px",
                    ctx.heights.len(),
                    ctx.canvas_width,
                    ctx.canvas_height,
                    bar.position,
                    bar.height
                );
            }
            None => println!("configuration produced zero bars"),
        }
    })?;

    if !drawn {
        tracing::warn!("no frame was captured; nothing to draw");
    }
    Ok(())
}

/// Prints the precomputed bar table so a frequency range can be inspected
/// before wiring the visualiser to a real audio device.
fn run_layout(preset: Option<&Path>) -> spectrum_visualiser_core::Result<()> {
    let config = load_config(preset)?;
    let visualiser = SpectrumVisualiser::new(config)?;
    let table = visualiser.bar_table();

    println!("{:>4}  {:>10}  {:>5}  {:>7}  {:>6}", "bar", "freq (Hz)", "bin", "end bin", "factor");
    for (bar, freq) in table.bars().iter().zip(table.frequencies()) {
        println!(
            "{:>4}  {:>10.2}  {:>5}  {:>7}  {:>6.3}",
            bar.position, freq, bar.bin, bar.end_bin, bar.factor
        );
    }
    Ok(())
}

fn load_config(preset: Option<&Path>) -> spectrum_visualiser_core::Result<AnalyserConfig> {
    match preset {
        Some(path) => {
            tracing::info!(?path, "loading preset");
            let json = std::fs::read_to_string(path)
                .map_err(|e| format!("failed to read preset {}: {e}", path.display()))?;
            AnalyserConfig::from_json_str(&json)
        }
        None => Ok(AnalyserConfig::default()),
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Real-time audio spectrum visualiser", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyse a synthesized sinusoid and report the dominant bar.
    Demo {
        /// Frequency of the test tone in Hz.
        #[arg(short, long, default_value_t = 440.0)]
        frequency: f32,
        /// Virtual canvas width in pixels.
        #[arg(long, default_value_t = 700.0)]
        width: f32,
        /// Virtual canvas height in pixels.
        #[arg(long, default_value_t = 500.0)]
        height: f32,
        /// Optional JSON preset with analyser configuration.
        #[arg(short, long)]
        preset: Option<PathBuf>,
    },
    /// Print the precomputed bar table for a configuration.
    Layout {
        /// Optional JSON preset with analyser configuration.
        #[arg(short, long)]
        preset: Option<PathBuf>,
    },
}
