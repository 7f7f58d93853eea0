// ============================================================================
// main.rs — accelwave
// Entry point. Initializes logging, parses flags, runs the headless batch.
// ============================================================================

use std::path::PathBuf;
use std::process::ExitCode;

use accelwave::headless::{run_headless, HeadlessConfig};
use accelwave::WaveConfig;
use clap::Parser;

/// Runs the GPU wave simulation without a window.
#[derive(Parser)]
#[command(name = "accelwave", version, about)]
struct Cli {
    /// JSON file with a full headless configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON file with only the wave grid configuration
    #[arg(long)]
    wave: Option<PathBuf>,

    /// Number of frames to simulate
    #[arg(short, long)]
    frames: Option<u32>,

    /// Seed for ripple placement
    #[arg(long)]
    seed: Option<u64>,

    /// Write final heights as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the effective configuration as JSON and exit
    #[arg(long)]
    dump_config: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> accelwave::Result<()> {
    let mut config = match &cli.config {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => HeadlessConfig::default(),
    };
    if let Some(path) = &cli.wave {
        config.wave = WaveConfig::load_json(path)?;
    }
    if let Some(frames) = cli.frames {
        config.frames = frames;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    if cli.output.is_some() {
        config.save_heights_path = cli.output;
    }

    if let Some(path) = &cli.dump_config {
        std::fs::write(path, serde_json::to_string_pretty(&config)?)?;
        log::info!("Wrote configuration to {}", path.display());
        return Ok(());
    }

    config.wave.validate()?;
    run_headless(&config)?;
    Ok(())
}
