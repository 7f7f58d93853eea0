// ============================================================================
// clock.rs — accelwave
// Fixed-step accumulator turning frame deltas into physics ticks.
// ============================================================================

/// Accumulates wall-clock time; after every [`StepClock::advance`] the
/// remainder lies in `[0, time_step)`.
#[derive(Clone, Debug)]
pub struct StepClock {
    time_step: f32,
    accumulated: f32,
}

impl StepClock {
    pub fn new(time_step: f32) -> Self {
        Self {
            time_step,
            accumulated: 0.0,
        }
    }

    /// Adds `delta_time` and reports whether a step is due. All whole steps
    /// that elapsed are consumed at once; only one tick is reported for them.
    /// Negative and non-finite deltas count as zero.
    pub fn advance(&mut self, delta_time: f32) -> bool {
        if delta_time.is_finite() {
            self.accumulated += delta_time.max(0.0);
        }
        if self.accumulated < self.time_step {
            return false;
        }
        self.accumulated %= self.time_step;
        true
    }

    pub fn accumulated(&self) -> f32 {
        self.accumulated
    }

    pub fn time_step(&self) -> f32 {
        self.time_step
    }
}
