//! Global speed setting for the discrete mixer and wheel tests.

use embassy_time::{Duration, Instant};

/// Speed at power-on.
pub const DEFAULT_SPEED: u8 = 200;
/// Change applied by one step.
pub const SPEED_STEP: u8 = 25;
/// Floor for stepped changes.
pub const STEP_MIN_SPEED: u8 = 50;
/// Ceiling for stepped changes.
pub const STEP_MAX_SPEED: u8 = 255;
/// Minimum time between two accepted steps.
pub const STEP_INTERVAL: Duration = Duration::from_millis(200);

/// Holds the speed setting and rate-limits stepped changes.
#[derive(Debug)]
pub struct SpeedGovernor {
    speed: u8,
    last_step: Option<Instant>,
}

impl Default for SpeedGovernor {
    fn default() -> Self {
        Self::new(DEFAULT_SPEED)
    }
}

impl SpeedGovernor {
    pub fn new(speed: u8) -> Self {
        SpeedGovernor {
            speed,
            last_step: None,
        }
    }

    pub fn speed(&self) -> u8 {
        self.speed
    }

    /// Step up by [`SPEED_STEP`]. Returns the new speed, or `None` if the call
    /// came within [`STEP_INTERVAL`] of the last accepted step and was dropped.
    pub fn increment(
        &mut self,
        now: Instant,
    ) -> Option<u8> {
        self.step(now, SPEED_STEP as i16)
    }

    /// Step down by [`SPEED_STEP`], with the same rate limit as [`Self::increment`].
    pub fn decrement(
        &mut self,
        now: Instant,
    ) -> Option<u8> {
        self.step(now, -(SPEED_STEP as i16))
    }

    /// Direct set from a remote speed command. Not rate-limited.
    pub fn set_absolute(
        &mut self,
        value: u8,
    ) {
        self.speed = value;
    }

    fn step(
        &mut self,
        now: Instant,
        delta: i16,
    ) -> Option<u8> {
        if let Some(last) = self.last_step {
            if now.saturating_duration_since(last) < STEP_INTERVAL {
                return None;
            }
        }
        let next = (self.speed as i16 + delta).clamp(STEP_MIN_SPEED as i16, STEP_MAX_SPEED as i16);
        self.speed = next as u8;
        self.last_step = Some(now);
        Some(self.speed)
    }
}
