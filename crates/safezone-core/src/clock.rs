//! Authoritative tick clock for deterministic zone timing.
//!
//! The clock is the single source of "now" usable for scheduling
//! decisions. It counts discrete simulation ticks; every temporal
//! quantity in the controller is either a tick number or derived from
//! one by pure arithmetic, so any observer (host or client) computes
//! identical results without extra round trips.
//!
//! # Design Principles
//!
//! - The tick counter only ever advances, and advancing uses checked
//!   arithmetic (no silent overflow).
//! - Seconds-to-ticks conversion rounds up, so a timer scheduled for
//!   "45 seconds from now" can never fire early.
//! - "Remaining time" on a timer is `scheduled_tick - current_tick`
//!   converted to seconds -- there is no live runner object to query.

use serde::{Deserialize, Serialize};

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// Invalid clock configuration (zero ticks per second).
    #[error("invalid clock configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// A scheduled point on the tick timeline.
///
/// A handle is nothing but the tick it fires at; comparing it against
/// the clock is the whole of the timer mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerHandle {
    /// The tick at which this timer fires.
    pub fire_tick: u64,
}

impl TimerHandle {
    /// Whether the timer has fired as of `current_tick`.
    pub const fn is_due(self, current_tick: u64) -> bool {
        current_tick >= self.fire_tick
    }
}

/// The authoritative tick clock.
///
/// Only the host's fixed simulation step advances the clock; observers
/// replicate the tick number and use the same pure conversions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickClock {
    /// Current tick number (0-indexed).
    tick: u64,

    /// Fixed number of simulation ticks per real-time second.
    ticks_per_second: u32,
}

impl TickClock {
    /// Create a new clock at tick 0.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `ticks_per_second` is 0.
    pub fn new(ticks_per_second: u32) -> Result<Self, ClockError> {
        if ticks_per_second == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "ticks_per_second must be at least 1".to_owned(),
            });
        }
        Ok(Self {
            tick: 0,
            ticks_per_second,
        })
    }

    /// Create a clock from explicit parts (useful for testing and for
    /// observers replicating a mid-match tick value).
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `ticks_per_second` is 0.
    pub fn from_parts(tick: u64, ticks_per_second: u32) -> Result<Self, ClockError> {
        if ticks_per_second == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "ticks_per_second must be at least 1".to_owned(),
            });
        }
        Ok(Self {
            tick,
            ticks_per_second,
        })
    }

    /// Advance the clock by one tick. Returns the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        Ok(self.tick)
    }

    /// Return the current tick number.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Return the configured tick rate.
    pub const fn ticks_per_second(&self) -> u32 {
        self.ticks_per_second
    }

    /// Duration of one tick in seconds.
    pub fn tick_duration_seconds(&self) -> f64 {
        1.0 / f64::from(self.ticks_per_second)
    }

    /// Convert a tick count to seconds.
    ///
    /// Tick counts in a match fit comfortably inside f64's 52-bit
    /// mantissa, so the conversion is exact in practice.
    #[allow(clippy::cast_precision_loss)]
    pub fn ticks_to_seconds(&self, ticks: u64) -> f64 {
        ticks as f64 / f64::from(self.ticks_per_second)
    }

    /// Convert a duration in seconds to a tick count, rounding up so a
    /// scheduled timer never fires early.
    ///
    /// Negative or non-finite input yields 0.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn seconds_to_ticks(&self, seconds: f64) -> u64 {
        if !seconds.is_finite() || seconds <= 0.0 {
            return 0;
        }
        (seconds * f64::from(self.ticks_per_second)).ceil() as u64
    }

    /// Schedule a timer to fire `seconds` from the current tick.
    ///
    /// The handle saturates at `u64::MAX` rather than wrapping.
    pub fn schedule_after(&self, seconds: f64) -> TimerHandle {
        TimerHandle {
            fire_tick: self.tick.saturating_add(self.seconds_to_ticks(seconds)),
        }
    }

    /// Schedule a timer at an absolute tick.
    pub const fn schedule_at(tick: u64) -> TimerHandle {
        TimerHandle { fire_tick: tick }
    }

    /// Seconds remaining until the handle fires; 0 if already due.
    pub fn remaining_seconds(&self, handle: TimerHandle) -> f64 {
        self.ticks_to_seconds(handle.fire_tick.saturating_sub(self.tick))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn clock_starts_at_tick_zero() {
        let clock = TickClock::new(30).unwrap();
        assert_eq!(clock.tick(), 0);
        assert_eq!(clock.ticks_per_second(), 30);
    }

    #[test]
    fn clock_advances() {
        let mut clock = TickClock::new(30).unwrap();
        assert_eq!(clock.advance().unwrap(), 1);
        assert_eq!(clock.advance().unwrap(), 2);
        assert_eq!(clock.tick(), 2);
    }

    #[test]
    fn zero_tick_rate_is_rejected() {
        assert!(TickClock::new(0).is_err());
        assert!(TickClock::from_parts(100, 0).is_err());
    }

    #[test]
    fn seconds_to_ticks_rounds_up() {
        let clock = TickClock::new(30).unwrap();
        // 1.5s * 30 = 45 exactly
        assert_eq!(clock.seconds_to_ticks(1.5), 45);
        // 0.01s * 30 = 0.3, rounds up to 1 so timers never fire early
        assert_eq!(clock.seconds_to_ticks(0.01), 1);
        assert_eq!(clock.seconds_to_ticks(0.0), 0);
        assert_eq!(clock.seconds_to_ticks(-5.0), 0);
        assert_eq!(clock.seconds_to_ticks(f64::NAN), 0);
    }

    #[test]
    fn ticks_to_seconds_is_pure_division() {
        let clock = TickClock::new(10).unwrap();
        assert_eq!(clock.ticks_to_seconds(45), 4.5);
        assert_eq!(clock.tick_duration_seconds(), 0.1);
    }

    #[test]
    fn schedule_and_remaining_are_pure_tick_arithmetic() {
        let clock = TickClock::from_parts(100, 10).unwrap();
        let handle = clock.schedule_after(4.5);
        assert_eq!(handle.fire_tick, 145);
        assert!(!handle.is_due(100));
        assert!(!handle.is_due(144));
        assert!(handle.is_due(145));
        assert_eq!(clock.remaining_seconds(handle), 4.5);

        let later = TickClock::from_parts(150, 10).unwrap();
        // Already due: remaining clamps to zero.
        assert_eq!(later.remaining_seconds(handle), 0.0);
    }

    #[test]
    fn identical_inputs_give_identical_results_on_any_replica() {
        // Host and client replicas at the same tick derive the same
        // timer state from pure arithmetic.
        let host = TickClock::from_parts(72, 30).unwrap();
        let client = TickClock::from_parts(72, 30).unwrap();
        let handle = host.schedule_after(45.0);
        assert_eq!(handle, client.schedule_after(45.0));
        assert_eq!(
            host.remaining_seconds(handle),
            client.remaining_seconds(handle)
        );
    }
}
