// ============================================================================
// headless.rs — accelwave
// Windowless batch runner: fixed frame deltas, periodic ripples, progress
// logging, and a final height summary.
// ============================================================================

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::config::WaveConfig;
use crate::engine::WaveSimulation;
use crate::error::Result;
use crate::field::Cell;
use crate::gpu::GpuContext;
use crate::ripples::{RipplePattern, RippleSchedule};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadlessConfig {
    pub wave: WaveConfig,
    pub frames: u32,
    /// Simulated wall-clock seconds per frame.
    pub frame_delta: f32,
    pub ripple: RipplePattern,
    /// Seconds between ripples; 0 disables them.
    pub ripple_period: f32,
    pub seed: Option<u64>,
    pub progress_interval: u32,
    pub save_heights_path: Option<PathBuf>,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            wave: WaveConfig::default(),
            frames: 2_000,
            frame_delta: 1.0 / 60.0,
            ripple: RipplePattern::default(),
            ripple_period: 5.25,
            seed: None,
            progress_interval: 500,
            save_heights_path: None,
        }
    }
}

/// Height statistics over one solution snapshot.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HeightStats {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
}

impl HeightStats {
    pub fn from_cells(cells: &[Cell]) -> Self {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut sum = 0.0f64;
        for c in cells {
            let h = c.height();
            min = min.min(h);
            max = max.max(h);
            sum += h as f64;
        }
        let mean = if cells.is_empty() {
            0.0
        } else {
            (sum / cells.len() as f64) as f32
        };
        Self { min, max, mean }
    }
}

#[derive(Serialize)]
struct HeightDump<'a> {
    rows: u32,
    columns: u32,
    steps: u64,
    stats: &'a HeightStats,
    heights: Vec<f32>,
}

pub fn run_headless(config: &HeadlessConfig) -> Result<HeightStats> {
    let gpu = GpuContext::new_headless()?;
    let mut sim = WaveSimulation::new(&gpu, config.wave.clone())?;
    let mut schedule = RippleSchedule::new(config.ripple.clone(), config.ripple_period, config.seed);

    log::info!(
        "Headless run started: {} frames at dt={:.4}s on {}x{}",
        config.frames,
        config.frame_delta,
        sim.rows(),
        sim.columns()
    );

    let started = Instant::now();
    let mut ripples = 0usize;

    for frame in 0..config.frames {
        if schedule.tick(config.frame_delta) {
            let mut session = sim.begin_edit()?;
            ripples += schedule.fire(&mut session);
            session.finish();
        }
        sim.update(config.frame_delta);

        if config.progress_interval > 0 && (frame + 1) % config.progress_interval == 0 {
            let elapsed = started.elapsed().as_secs_f64().max(1e-6);
            log::info!(
                "Headless progress: {}/{} frames | {} steps | {} disturbances | {:.0} frames/s",
                frame + 1,
                config.frames,
                sim.step_count(),
                ripples,
                (frame + 1) as f64 / elapsed
            );
        }
    }

    let cells = sim.solution_set()?;
    let stats = HeightStats::from_cells(&cells);
    log::info!(
        "Headless run finished: {} steps, heights min={:.4} max={:.4} mean={:.5}",
        sim.step_count(),
        stats.min,
        stats.max,
        stats.mean
    );

    if let Some(path) = &config.save_heights_path {
        let dump = HeightDump {
            rows: sim.rows(),
            columns: sim.columns(),
            steps: sim.step_count(),
            stats: &stats,
            heights: cells.iter().map(Cell::height).collect(),
        };
        fs::write(path, serde_json::to_string(&dump)?)?;
        log::info!("Saved final heights to {}", path.display());
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::flat_lattice;

    #[test]
    fn stats_of_flat_field_are_zero() {
        let stats = HeightStats::from_cells(&flat_lattice(4, 4, 1.0));
        assert_eq!(stats, HeightStats { min: 0.0, max: 0.0, mean: 0.0 });
    }

    #[test]
    fn stats_track_extremes() {
        let mut cells = flat_lattice(2, 2, 1.0);
        cells[0].position[1] = 2.0;
        cells[3].position[1] = -1.0;
        let stats = HeightStats::from_cells(&cells);
        assert_eq!(stats.min, -1.0);
        assert_eq!(stats.max, 2.0);
        assert!((stats.mean - 0.25).abs() < 1e-6);
    }

    #[test]
    fn config_json_defaults() {
        let config: HeadlessConfig = serde_json::from_str(r#"{ "frames": 10 }"#).unwrap();
        assert_eq!(config.frames, 10);
        assert_eq!(config.wave, WaveConfig::default());
        assert_eq!(config.ripple, RipplePattern::default());
    }
}
