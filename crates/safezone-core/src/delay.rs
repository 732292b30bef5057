//! Inter-phase delay derived from the live player count.
//!
//! The wait between shrink steps scales inversely with survivors: a full
//! lobby gets `min_shrink_delay`, a near-empty one gets
//! `max_shrink_delay`, with a linear ramp between the configured player
//! bounds. Fewer survivors means a longer breather; more survivors
//! pressures eliminations.
//!
//! The scheduler polls the player count exactly once, at the instant a
//! `Paused` sub-state begins, and the resulting delay is fixed for that
//! transition. Later count changes during the same pause never
//! reschedule the transition -- recomputing it live would let players
//! oscillate the timer by timing quits and reconnects.

use crate::config::ZoneConfig;
use crate::geometry::{clamp01, lerp};

/// Source of the live player count for the current match.
///
/// Polled by the scheduler only at `Paused` entry. Implementations are
/// typically backed by the host's roster; tests use a fixed value.
pub trait LivePlayerCount {
    /// Number of players currently alive and connected.
    fn live_player_count(&self) -> u32;
}

/// A fixed player count, for tests and offline tools.
#[derive(Debug, Clone, Copy)]
pub struct FixedPlayerCount(pub u32);

impl LivePlayerCount for FixedPlayerCount {
    fn live_player_count(&self) -> u32 {
        self.0
    }
}

/// The pause delay in seconds for the given live player count.
///
/// `live_players` is clamped into the configured player band before the
/// ratio is taken, so the result equals `max_shrink_delay` for counts at
/// or below `min_shrink_delay_players` and `min_shrink_delay` for counts
/// at or above `max_shrink_delay_players`.
pub fn pause_delay(cfg: &ZoneConfig, live_players: u32) -> f64 {
    // Validation guarantees min_players < max_players, so the span is
    // at least 1.
    let clamped = live_players.clamp(cfg.min_shrink_delay_players, cfg.max_shrink_delay_players);
    let offset = clamped.saturating_sub(cfg.min_shrink_delay_players);
    let span = cfg
        .max_shrink_delay_players
        .saturating_sub(cfg.min_shrink_delay_players)
        .max(1);
    let t = clamp01(f64::from(offset) / f64::from(span));
    lerp(cfg.max_shrink_delay, cfg.min_shrink_delay, t)
}
