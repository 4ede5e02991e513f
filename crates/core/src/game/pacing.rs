use std::time::{Duration, Instant};

use crate::GameConfig;

/// Fixed-rate frame pacing: sleep whatever is left of the frame budget.
///
/// Overruns are only counted. Once their number reaches the configured
/// threshold a single warning is logged.
#[derive(Debug)]
pub struct FramePacer {
    origin: Instant,
    frame_duration: f64,
    missed: u32,
    warn_after: u32,
}

impl FramePacer {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            origin: Instant::now(),
            frame_duration: config.frame_duration(),
            missed: 0,
            warn_after: config.overrun_warning_frames,
        }
    }

    /// Monotonic wall time, in seconds since the pacer was created.
    pub fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }

    /// Sleeps until the frame that started at `frame_start` used up its
    /// budget.
    pub fn wait(&mut self, frame_start: f64) {
        let advance = self.remaining(frame_start, self.now());
        if advance > 0.0 {
            std::thread::sleep(Duration::from_secs_f64(advance));
        }
    }

    /// Time left in the frame budget, negative on overrun. Counts overruns.
    pub fn remaining(&mut self, frame_start: f64, now: f64) -> f64 {
        let advance = self.frame_duration - (now - frame_start);
        if advance <= 0.0 {
            self.missed += 1;
            if self.missed == self.warn_after {
                tracing::warn!(
                    missed = self.missed,
                    "the game loop is having a hard time keeping up"
                );
            }
        }
        advance
    }

    pub fn missed_frames(&self) -> u32 {
        self.missed
    }
}
