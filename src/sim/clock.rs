//! Real-time frame pacing
//!
//! Converts variable frame times into a whole number of fixed ticks.

use crate::consts::{MAX_SUBSTEPS, SIM_DT};

/// Longest frame time accepted before clamping (seconds)
const MAX_FRAME_TIME: f32 = 0.1;

/// Fixed-timestep accumulator
#[derive(Debug, Clone)]
pub struct FrameClock {
    accumulator: f32,
    step: f32,
    max_substeps: u32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(SIM_DT, MAX_SUBSTEPS)
    }
}

impl FrameClock {
    pub fn new(step: f32, max_substeps: u32) -> Self {
        Self {
            accumulator: 0.0,
            step,
            max_substeps,
        }
    }

    /// Feed one frame's elapsed time; returns how many ticks to run now
    pub fn advance(&mut self, frame_secs: f32) -> u32 {
        self.accumulator += frame_secs.clamp(0.0, MAX_FRAME_TIME);

        let mut substeps = 0;
        while self.accumulator >= self.step && substeps < self.max_substeps {
            self.accumulator -= self.step;
            substeps += 1;
        }
        // Drop the backlog rather than carry it into the next frame
        if substeps == self.max_substeps {
            self.accumulator = self.accumulator.min(self.step);
        }
        substeps
    }

    /// Fraction of a tick left in the accumulator (for interpolation)
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.step
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_accumulate() {
        let mut clock = FrameClock::new(0.25, 8);
        assert_eq!(clock.advance(0.1), 0);
        assert_eq!(clock.advance(0.1), 0);
        assert_eq!(clock.advance(0.1), 1);
        assert!((clock.alpha() - 0.2).abs() < 1e-4);
    }

    #[test]
    fn test_long_frames_clamped() {
        let mut clock = FrameClock::new(0.05, 8);
        // 5 seconds of stall counts as 0.1 s
        assert_eq!(clock.advance(5.0), 2);
    }

    #[test]
    fn test_substeps_capped() {
        let mut clock = FrameClock::new(0.01, 3);
        assert_eq!(clock.advance(0.1), 3);
        assert!(clock.alpha() <= 1.0);
        clock.reset();
        assert_eq!(clock.alpha(), 0.0);
    }

    #[test]
    fn test_negative_frame_time_ignored() {
        let mut clock = FrameClock::default();
        assert_eq!(clock.advance(-1.0), 0);
    }
}
