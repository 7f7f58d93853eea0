// ============================================================================
// params.rs — accelwave
// Finite-difference coefficients and the uniform parameter block read by
// the wave kernel.
// ============================================================================

use bytemuck::{Pod, Zeroable};

use crate::config::WaveConfig;
use crate::error::{Result, WaveError};

// ======================== Coefficients ========================

/// Weights of the explicit wave-equation update:
/// `next = k1*prev + k2*cur + k3*(sum of four neighbours of cur)`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WaveCoefficients {
    pub k1: f32,
    pub k2: f32,
    pub k3: f32,
}

impl WaveCoefficients {
    /// `damping = 0` together with `time_step = 0` divides by zero; the result
    /// is then non-finite and rejected by [`WaveParams::from_config`].
    pub fn derive(spatial_step: f32, time_step: f32, wave_speed: f32, damping: f32) -> Self {
        let d = damping * time_step + 2.0;
        let e = (wave_speed * wave_speed) * (time_step * time_step) / (spatial_step * spatial_step);
        Self {
            k1: (damping * time_step - 2.0) / d,
            k2: (4.0 - 8.0 * e) / d,
            k3: (2.0 * e) / d,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.k1.is_finite() && self.k2.is_finite() && self.k3.is_finite()
    }
}

// ======================== Uniform Block ========================

/// Uniform layout shared with the kernel: two u32 dims, spatial step, pad,
/// then a vec4 of coefficients (w unused, kept at 1).
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WaveParams {
    pub rows: u32,
    pub columns: u32,
    pub spatial_step: f32,
    pub _pad: f32,
    pub k: [f32; 4],
}

impl WaveParams {
    pub fn from_config(config: &WaveConfig) -> Result<Self> {
        config.validate()?;
        let c = WaveCoefficients::derive(
            config.spatial_step,
            config.time_step,
            config.wave_speed,
            config.damping,
        );
        if !c.is_finite() {
            return Err(WaveError::Configuration(format!(
                "degenerate coefficients k=({}, {}, {}) for dx={} dt={} speed={} damping={}",
                c.k1,
                c.k2,
                c.k3,
                config.spatial_step,
                config.time_step,
                config.wave_speed,
                config.damping
            )));
        }
        Ok(Self {
            rows: config.rows,
            columns: config.columns,
            spatial_step: config.spatial_step,
            _pad: 0.0,
            k: [c.k1, c.k2, c.k3, 1.0],
        })
    }

    pub fn coefficients(&self) -> WaveCoefficients {
        WaveCoefficients {
            k1: self.k[0],
            k2: self.k[1],
            k3: self.k[2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn reference_scenario_coefficients() {
        // d = 2.0075, e = 0.03515625
        let c = WaveCoefficients::derive(1.0, 0.03, 6.25, 0.25);
        assert!(close(c.k1, -0.99253), "k1 = {}", c.k1);
        assert!(close(c.k2, 1.85243), "k2 = {}", c.k2);
        assert!(close(c.k3, 0.03502), "k3 = {}", c.k3);
        // published rounding of the same scenario
        assert!((c.k1 - -0.99315).abs() < 1e-3);
        assert!((c.k2 - 1.85289).abs() < 1e-3);
    }

    #[test]
    fn undamped_coefficients() {
        let c = WaveCoefficients::derive(1.0, 0.1, 1.0, 0.0);
        // d = 2, e = 0.01
        assert!(close(c.k1, -1.0));
        assert!(close(c.k2, (4.0 - 0.08) / 2.0));
        assert!(close(c.k3, 0.01));
    }

    #[test]
    fn block_is_uniform_sized() {
        assert_eq!(std::mem::size_of::<WaveParams>(), 32);
    }

    #[test]
    fn block_carries_grid_and_weights() {
        let config = WaveConfig::new(50, 40, 1.0, 0.03, 6.25, 0.25);
        let params = WaveParams::from_config(&config).unwrap();
        assert_eq!(params.rows, 50);
        assert_eq!(params.columns, 40);
        assert_eq!(params.k[3], 1.0);
        assert!(close(params.coefficients().k2, 1.85243));
    }

    #[test]
    fn zero_spatial_step_is_rejected() {
        let config = WaveConfig::new(10, 10, 0.0, 0.03, 6.25, 0.25);
        assert!(matches!(
            WaveParams::from_config(&config),
            Err(WaveError::Configuration(_))
        ));
    }
}
