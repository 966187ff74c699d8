// precland_sim/src/simulation/core/pacing.rs

use crate::simulation::error::ConfigError;
use std::thread;
use std::time::{Duration, Instant};

/// Holds frame delivery to a fixed rate.
///
/// Each call to [`FramePacer::wait`] sleeps until one period after the previous
/// deadline. A late frame resets the schedule instead of bursting to catch up,
/// so frames are never closer together than one period.
#[derive(Debug, Clone)]
pub struct FramePacer {
    period: Duration,
    deadline: Option<Instant>,
}

impl FramePacer {
    /// Fails unless `frame_rate` gives a positive, representable period.
    pub fn new(frame_rate: f64) -> Result<Self, ConfigError> {
        if !(frame_rate.is_finite() && frame_rate > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "frame rate must be positive and finite, got {frame_rate}"
            )));
        }
        let period = Duration::try_from_secs_f64(1.0 / frame_rate)
            .map_err(|e| ConfigError::Invalid(format!("frame rate {frame_rate}: {e}")))?;
        Ok(Self {
            period,
            deadline: None,
        })
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Blocks until the next frame may be delivered. Returns the time slept.
    pub fn wait(&mut self) -> Duration {
        let now = Instant::now();
        let Some(deadline) = self.deadline else {
            self.deadline = Some(now + self.period);
            return Duration::ZERO;
        };

        if deadline > now {
            let slept = deadline - now;
            thread::sleep(slept);
            self.deadline = Some(deadline + self.period);
            slept
        } else {
            self.deadline = Some(now + self.period);
            Duration::ZERO
        }
    }
}
