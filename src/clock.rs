//! Round timers.
//!
//! Three logical counters advance on a cooperative schedule: the countdown
//! while the player may click, the count-up that sequences the reveal, and
//! the animation position of the search sweep. The clock knows nothing about
//! game rules; the round machine decides which counter a tick belongs to.

use std::time::Duration;

use crate::config::Timings;

/// Length of one logical tick
pub const TICK_MS: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundClock {
    round_time: u32,
    end_time: u32,
    animation_position: u32,
}

impl RoundClock {
    pub fn new(round_duration_ms: u32) -> Self {
        Self {
            round_time: round_duration_ms,
            end_time: 0,
            animation_position: 0,
        }
    }

    pub fn reset(&mut self, round_duration_ms: u32) {
        *self = Self::new(round_duration_ms);
    }

    /// Remaining round time in ms
    pub fn round_time(&self) -> u32 {
        self.round_time
    }

    /// Elapsed settle time in ms
    pub fn end_time(&self) -> u32 {
        self.end_time
    }

    pub fn animation_position(&self) -> u32 {
        self.animation_position
    }

    /// One countdown tick; saturates at zero
    pub fn tick_countdown(&mut self) -> u32 {
        self.round_time = self.round_time.saturating_sub(TICK_MS);
        self.round_time
    }

    /// One count-up tick
    pub fn tick_count_up(&mut self) -> u32 {
        self.end_time += TICK_MS;
        self.end_time
    }

    pub fn tick_animation(&mut self) -> u32 {
        self.animation_position += 1;
        self.animation_position
    }

    pub fn countdown_interval() -> Duration {
        Duration::from_millis(u64::from(TICK_MS))
    }

    pub fn animation_interval(timings: &Timings) -> Duration {
        Duration::from_millis(timings.animation_interval_ms())
    }
}
