// ============================================================================
// ripples.rs — accelwave
// Disturbance patterns (random drop, circular wavefront) and a periodic
// trigger for injecting them.
// ============================================================================

use std::f32::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::engine::{is_interior, EditSession};

// ======================== Patterns ========================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RipplePattern {
    /// One five-point ripple at a random cell at least `margin` cells from
    /// every edge, magnitude drawn from `[min_magnitude, max_magnitude)`.
    Random {
        margin: u32,
        min_magnitude: f32,
        max_magnitude: f32,
    },
    /// `samples` sharp disturbances on a circle of `radius` cells around
    /// `(center_row, center_column)`. Sample `s` sits at angle
    /// `s * angle_step` radians; `angle_step: null` spaces the samples evenly
    /// over one turn instead.
    Circle {
        center_row: f32,
        center_column: f32,
        radius: f32,
        samples: u32,
        #[serde(default = "unit_angle_step")]
        angle_step: Option<f32>,
        magnitude: f32,
    },
}

impl Default for RipplePattern {
    fn default() -> Self {
        RipplePattern::Circle {
            center_row: 105.0,
            center_column: 105.0,
            radius: 90.0,
            samples: 360,
            angle_step: unit_angle_step(),
            magnitude: 1.5,
        }
    }
}

fn unit_angle_step() -> Option<f32> {
    Some(1.0)
}

impl RipplePattern {
    /// Applies the pattern inside an open edit session and returns the number
    /// of disturbances written.
    pub fn apply(&self, session: &mut EditSession<'_>, rng: &mut impl Rng) -> usize {
        let (rows, columns) = (session.rows(), session.columns());
        match *self {
            RipplePattern::Random {
                margin,
                min_magnitude,
                max_magnitude,
            } => match random_site(rows, columns, margin, rng) {
                Some((i, j)) => {
                    let magnitude = if max_magnitude > min_magnitude {
                        rng.gen_range(min_magnitude..max_magnitude)
                    } else {
                        min_magnitude
                    };
                    session.disturb(i, j, magnitude);
                    1
                }
                None => {
                    log::warn!(
                        "Random ripple margin {} leaves no interior on a {}x{} grid",
                        margin,
                        rows,
                        columns
                    );
                    0
                }
            },
            RipplePattern::Circle {
                center_row,
                center_column,
                radius,
                samples,
                angle_step,
                magnitude,
            } => {
                let points = circle_points(center_row, center_column, radius, samples, angle_step);
                let mut applied = 0;
                for &(i, j) in &points {
                    if i >= 0 && j >= 0 && is_interior(rows, columns, i as u32, j as u32) {
                        session.disturb_sharp(i as u32, j as u32, magnitude);
                        applied += 1;
                    }
                }
                if applied < points.len() {
                    log::warn!(
                        "Circle ripple: skipped {} of {} samples outside the interior",
                        points.len() - applied,
                        points.len()
                    );
                }
                applied
            }
        }
    }
}

/// Uniform cell in `[m, rows - m) x [m, columns - m)` with `m = max(margin, 2)`.
pub fn random_site(rows: u32, columns: u32, margin: u32, rng: &mut impl Rng) -> Option<(u32, u32)> {
    let m = margin.max(2);
    if rows <= 2 * m || columns <= 2 * m {
        return None;
    }
    Some((rng.gen_range(m..rows - m), rng.gen_range(m..columns - m)))
}

/// Nearest cells (ties to even) to `samples` angles on the circle, stepping
/// by `angle_step` radians, or evenly over a full turn when it is `None`.
pub fn circle_points(
    center_row: f32,
    center_column: f32,
    radius: f32,
    samples: u32,
    angle_step: Option<f32>,
) -> Vec<(i64, i64)> {
    let step = angle_step.unwrap_or(TAU / samples.max(1) as f32);
    (0..samples)
        .map(|s| {
            let angle = step * s as f32;
            let i = center_row + radius * angle.cos();
            let j = center_column + radius * angle.sin();
            (i.round_ties_even() as i64, j.round_ties_even() as i64)
        })
        .collect()
}

// ======================== Schedule ========================

/// Fires a pattern once every `period` seconds of accumulated frame time.
#[derive(Clone, Debug)]
pub struct RippleSchedule {
    pub pattern: RipplePattern,
    period: f32,
    elapsed: f32,
    rng: StdRng,
}

impl RippleSchedule {
    pub fn new(pattern: RipplePattern, period: f32, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self {
            pattern,
            period,
            elapsed: 0.0,
            rng,
        }
    }

    /// Adds `delta_time`; true when the period boundary was crossed.
    pub fn tick(&mut self, delta_time: f32) -> bool {
        if self.period <= 0.0 {
            return false;
        }
        self.elapsed += delta_time.max(0.0);
        if self.elapsed >= self.period {
            self.elapsed -= self.period;
            true
        } else {
            false
        }
    }

    pub fn fire(&mut self, session: &mut EditSession<'_>) -> usize {
        self.pattern.apply(session, &mut self.rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_site_respects_margin() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let (i, j) = random_site(200, 120, 5, &mut rng).unwrap();
            assert!((5..195).contains(&i));
            assert!((5..115).contains(&j));
            assert!(is_interior(200, 120, i, j));
        }
    }

    #[test]
    fn random_site_small_margin_stays_interior() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let (i, j) = random_site(6, 6, 0, &mut rng).unwrap();
            assert!(is_interior(6, 6, i, j));
        }
    }

    #[test]
    fn random_site_none_when_grid_too_small() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(random_site(10, 10, 5, &mut rng).is_none());
        assert!(random_site(4, 50, 0, &mut rng).is_none());
    }

    #[test]
    fn circle_points_lie_on_radius() {
        let points = circle_points(50.0, 60.0, 20.0, 36, None);
        assert_eq!(points.len(), 36);
        assert_eq!(points[0], (70, 60));
        for &(i, j) in &points {
            let di = i as f32 - 50.0;
            let dj = j as f32 - 60.0;
            let r = (di * di + dj * dj).sqrt();
            assert!((r - 20.0).abs() <= 1.0, "r = {r}");
        }
        assert_eq!(points[9], (50, 80));
    }

    #[test]
    fn default_circle_steps_one_radian() {
        let RipplePattern::Circle {
            center_row,
            center_column,
            radius,
            samples,
            angle_step,
            ..
        } = RipplePattern::default()
        else {
            panic!("default pattern is a circle");
        };
        assert_eq!(angle_step, Some(1.0));
        let points = circle_points(center_row, center_column, radius, samples, angle_step);
        assert_eq!(points.len(), 360);
        assert_eq!(points[0], (195, 105));
        // cos(1) * 90 + 105 = 153.6, sin(1) * 90 + 105 = 180.7
        assert_eq!(points[1], (154, 181));
        assert!(points.iter().all(|&(i, j)| is_interior(200, 200, i as u32, j as u32)));
    }

    #[test]
    fn circle_json_without_step_uses_one_radian() {
        let json = r#"{ "kind": "circle", "center_row": 10.0, "center_column": 10.0,
                        "radius": 5.0, "samples": 8, "magnitude": 1.5 }"#;
        let pattern: RipplePattern = serde_json::from_str(json).unwrap();
        assert!(matches!(pattern, RipplePattern::Circle { angle_step: Some(s), .. } if s == 1.0));

        let even = r#"{ "kind": "circle", "center_row": 10.0, "center_column": 10.0,
                        "radius": 5.0, "samples": 8, "angle_step": null, "magnitude": 1.5 }"#;
        let pattern: RipplePattern = serde_json::from_str(even).unwrap();
        assert!(matches!(pattern, RipplePattern::Circle { angle_step: None, .. }));
    }

    #[test]
    fn schedule_fires_on_period() {
        let mut schedule = RippleSchedule::new(RipplePattern::default(), 1.0, Some(3));
        let fired: Vec<bool> = (0..10).map(|_| schedule.tick(0.25)).collect();
        assert_eq!(fired.iter().filter(|&&f| f).count(), 2);
        assert!(fired[3] && fired[7]);
    }

    #[test]
    fn schedule_with_zero_period_never_fires() {
        let mut schedule = RippleSchedule::new(RipplePattern::default(), 0.0, Some(3));
        assert!(!schedule.tick(100.0));
    }

    #[test]
    fn pattern_json_is_tagged() {
        let json = r#"{ "kind": "random", "margin": 5, "min_magnitude": 1.0, "max_magnitude": 2.0 }"#;
        let pattern: RipplePattern = serde_json::from_str(json).unwrap();
        assert!(matches!(pattern, RipplePattern::Random { margin: 5, .. }));
    }
}
