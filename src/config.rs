// ============================================================================
// config.rs — accelwave
// Physical grid configuration, validation, and JSON presets.
// ============================================================================

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WaveError};

/// Smallest legal grid edge.
pub const MIN_GRID_EDGE: u32 = 3;

/// Grid dimensions and physical constants for one simulation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    pub rows: u32,
    pub columns: u32,
    /// Distance between adjacent cells.
    pub spatial_step: f32,
    /// Fixed physics tick in seconds.
    pub time_step: f32,
    pub wave_speed: f32,
    pub damping: f32,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            rows: 200,
            columns: 200,
            spatial_step: 0.8,
            time_step: 0.03,
            wave_speed: 6.25,
            damping: 0.1,
        }
    }
}

impl WaveConfig {
    pub fn new(
        rows: u32,
        columns: u32,
        spatial_step: f32,
        time_step: f32,
        wave_speed: f32,
        damping: f32,
    ) -> Self {
        Self {
            rows,
            columns,
            spatial_step,
            time_step,
            wave_speed,
            damping,
        }
    }

    /// Checks the grid shape. Coefficient finiteness is checked when the
    /// parameter block is derived.
    pub fn validate(&self) -> Result<()> {
        if self.rows < MIN_GRID_EDGE || self.columns < MIN_GRID_EDGE {
            return Err(WaveError::Configuration(format!(
                "grid must be at least {MIN_GRID_EDGE}x{MIN_GRID_EDGE}, got {}x{}",
                self.rows, self.columns
            )));
        }
        if !(self.time_step > 0.0) {
            return Err(WaveError::Configuration(format!(
                "time step must be positive, got {}",
                self.time_step
            )));
        }
        Ok(())
    }

    pub fn vertex_count(&self) -> u32 {
        self.rows * self.columns
    }

    pub fn triangle_count(&self) -> u32 {
        (self.rows - 1) * (self.columns - 1) * 2
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let config: WaveConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_demo_grid() {
        let config = WaveConfig::default();
        assert_eq!(config.vertex_count(), 40_000);
        assert_eq!(config.triangle_count(), 199 * 199 * 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn counts_for_small_grids() {
        for rows in 5..12 {
            for columns in 5..12 {
                let config = WaveConfig::new(rows, columns, 1.0, 0.03, 6.25, 0.25);
                assert_eq!(config.vertex_count(), rows * columns);
                assert_eq!(config.triangle_count(), (rows - 1) * (columns - 1) * 2);
            }
        }
    }

    #[test]
    fn rejects_tiny_grid() {
        let config = WaveConfig::new(2, 10, 1.0, 0.03, 6.25, 0.25);
        assert!(matches!(config.validate(), Err(WaveError::Configuration(_))));
    }

    #[test]
    fn rejects_zero_time_step() {
        let config = WaveConfig::new(10, 10, 1.0, 0.0, 6.25, 0.25);
        assert!(config.validate().is_err());
    }

    #[test]
    fn json_round_trip_through_file() {
        let path = std::env::temp_dir().join(format!("accelwave_cfg_{}.json", std::process::id()));
        let config = WaveConfig::new(64, 48, 0.5, 0.02, 4.0, 0.2);
        config.save_json(&path).unwrap();
        let loaded = WaveConfig::load_json(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: WaveConfig = serde_json::from_str(r#"{ "rows": 50, "columns": 60 }"#).unwrap();
        assert_eq!(config.rows, 50);
        assert_eq!(config.columns, 60);
        assert_eq!(config.time_step, WaveConfig::default().time_step);
    }
}
