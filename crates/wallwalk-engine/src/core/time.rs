/// Default cap on time steps run in a single frame.
pub const DEFAULT_MAX_STEPS_PER_FRAME: u32 = 10;

/// Fixed timestep accumulator.
/// Grid moves resolve once per step; frames in between only interpolate.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    /// Duration of one time step.
    dt: f32,
    /// Accumulated time from variable frame deltas.
    accumulator: f32,
    /// Cap to prevent a spiral of death after a long stall.
    max_steps: u32,
    /// Steps handed out since creation.
    steps: u64,
}

impl FixedTimestep {
    pub fn new(dt: f32) -> Self {
        Self {
            dt,
            accumulator: 0.0,
            max_steps: DEFAULT_MAX_STEPS_PER_FRAME,
            steps: 0,
        }
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    /// Add frame time to the accumulator. Returns the number of fixed steps to run.
    pub fn accumulate(&mut self, frame_dt: f32) -> u32 {
        self.accumulator += frame_dt.max(0.0);
        self.accumulator = self.accumulator.min(self.dt * self.max_steps as f32);
        let steps = ((self.accumulator / self.dt) as u32).min(self.max_steps);
        self.accumulator -= steps as f32 * self.dt;
        self.steps += steps as u64;
        steps
    }

    /// Progress through the current step (0.0 to 1.0).
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.dt).clamp(0.0, 1.0)
    }

    /// The fixed delta time.
    pub fn dt(&self) -> f32 {
        self.dt
    }

    pub fn max_steps(&self) -> u32 {
        self.max_steps
    }

    /// Total steps run so far.
    pub fn step_count(&self) -> u64 {
        self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_step_exact() {
        let mut ts = FixedTimestep::new(0.25);
        let steps = ts.accumulate(0.25);
        assert_eq!(steps, 1);
        assert_eq!(ts.step_count(), 1);
    }

    #[test]
    fn accumulates_partial() {
        let mut ts = FixedTimestep::new(0.5);
        assert_eq!(ts.accumulate(0.2), 0);
        assert!((ts.alpha() - 0.4).abs() < 1e-5);
        assert_eq!(ts.accumulate(0.4), 1);
        assert!((ts.alpha() - 0.2).abs() < 1e-5);
    }

    #[test]
    fn caps_steps_per_frame() {
        let mut ts = FixedTimestep::new(0.5);
        assert_eq!(ts.accumulate(60.0), 10);
        let mut ts = FixedTimestep::new(0.5).with_max_steps(3);
        assert_eq!(ts.accumulate(60.0), 3);
        assert_eq!(ts.step_count(), 3);
    }

    #[test]
    fn negative_frames_are_ignored() {
        let mut ts = FixedTimestep::new(0.5);
        assert_eq!(ts.accumulate(-4.0), 0);
        assert_eq!(ts.alpha(), 0.0);
    }
}
