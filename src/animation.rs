// Count-up animation for dashboard figures
//
// Purely cosmetic. The displayed value is a function of elapsed time only and
// never feeds back into stored data. Callers that don't animate can just show
// `target`.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CountUp {
    pub target: f64,
    pub duration: Duration,
    pub steps: u32,
}

impl CountUp {
    /// Logbook page: 60 frames over one second
    pub fn new(target: f64) -> Self {
        CountUp {
            target,
            duration: Duration::from_millis(1000),
            steps: 60,
        }
    }

    /// Wallet cards: 75 frames over 1.5 seconds
    pub fn slow(target: f64) -> Self {
        CountUp {
            target,
            duration: Duration::from_millis(1500),
            steps: 75,
        }
    }

    pub fn with_timing(target: f64, duration: Duration, steps: u32) -> Self {
        CountUp {
            target,
            duration,
            steps: steps.max(1),
        }
    }

    /// Time between two frames
    pub fn frame_interval(&self) -> Duration {
        self.duration / self.steps.max(1)
    }

    /// Value to display `elapsed` after the animation started
    ///
    /// Intermediate frames are floored to whole units; the last frame is the
    /// exact target. Non-positive targets are shown immediately.
    pub fn value_at(&self, elapsed: Duration) -> f64 {
        if self.is_finished(elapsed) || self.target <= 0.0 {
            return self.target;
        }

        let interval = self.frame_interval().as_secs_f64();
        if interval <= 0.0 {
            return self.target;
        }
        let frame = (elapsed.as_secs_f64() / interval).floor();
        let value = self.target * frame / self.steps as f64;

        if value >= self.target {
            self.target
        } else {
            value.floor()
        }
    }

    pub fn is_finished(&self, elapsed: Duration) -> bool {
        elapsed >= self.duration
    }
}
