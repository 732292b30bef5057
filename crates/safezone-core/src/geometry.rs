//! Circle geometry derivation from zone state.
//!
//! The phase plan is derived, never stored: shrink step `i` (for `i` in
//! `0..shrink_steps`) starts at `phase_radius(i)` and ends at
//! `phase_radius(i + 1)`, with `phase_radius(0) == start_radius` and
//! `phase_radius(shrink_steps) == end_radius`. During a shrink the
//! radius interpolates linearly between the two; linear easing is
//! deliberate, because players reason about "how fast is the wall
//! moving" and any non-linear ease changes perceived fairness.
//!
//! Guarantees:
//!
//! - `phase_radius` is non-increasing in `i`.
//! - Within a single `Shrinking` sub-state the radius is non-increasing
//!   in time.
//! - The radius is continuous across every sub-state boundary (no pop).

use safezone_types::{SubState, ZoneState};

use crate::clock::TickClock;
use crate::config::ZoneConfig;

/// Linear interpolation between `a` and `b`.
pub(crate) fn lerp(a: f64, b: f64, t: f64) -> f64 {
    (b - a).mul_add(t, a)
}

/// Clamp a ratio into `[0, 1]`.
pub(crate) fn clamp01(t: f64) -> f64 {
    t.clamp(0.0, 1.0)
}

/// The radius at which shrink step `step` begins.
///
/// `step` is clamped to `shrink_steps`, so `phase_radius(cfg, steps)`
/// is exactly the end radius and out-of-range queries stay coherent.
pub fn phase_radius(cfg: &ZoneConfig, step: u32) -> f64 {
    let step = step.min(cfg.shrink_steps);
    let t = f64::from(step) / f64::from(cfg.shrink_steps);
    lerp(cfg.start_radius, cfg.end_radius, t)
}

/// The renderable radius for the given state at the given tick.
///
/// Pure: every observer holding the same `ZoneState` and tick computes
/// the identical radius. The elapsed time inside a `Shrinking` sub-state
/// is measured from `sub_state_entered_tick`, which the scheduler anchors
/// at the scheduled transition tick.
pub fn radius_at(cfg: &ZoneConfig, state: &ZoneState, clock: &TickClock) -> f64 {
    match state.sub_state {
        SubState::Idle | SubState::Announcing => phase_radius(cfg, state.phase_index),
        SubState::Shrinking => {
            let elapsed_ticks = clock.tick().saturating_sub(state.sub_state_entered_tick);
            let elapsed = clock.ticks_to_seconds(elapsed_ticks);
            let t = clamp01(elapsed / cfg.shrink_duration);
            lerp(
                phase_radius(cfg, state.phase_index),
                phase_radius(cfg, state.phase_index.saturating_add(1)),
                t,
            )
        }
        SubState::Paused => phase_radius(cfg, state.phase_index.saturating_add(1)),
        SubState::Finished => cfg.end_radius,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use safezone_types::Position;

    use super::*;

    fn test_config() -> ZoneConfig {
        ZoneConfig {
            start_radius: 120.0,
            end_radius: 30.0,
            shrink_steps: 6,
            shrink_duration: 30.0,
            ..ZoneConfig::default()
        }
    }

    fn shrinking_state(phase_index: u32, entered_tick: u64) -> ZoneState {
        let mut state = ZoneState::new(Position::default(), 120.0);
        state.is_active = true;
        state.phase_index = phase_index;
        state.sub_state = SubState::Shrinking;
        state.sub_state_entered_tick = entered_tick;
        state
    }

    #[test]
    fn phase_radii_step_down_evenly_from_start_to_end() {
        let cfg = test_config();
        // 120 -> 30 over 6 steps is a step size of 15.
        let expected = [120.0, 105.0, 90.0, 75.0, 60.0, 45.0, 30.0];
        for (step, radius) in expected.iter().enumerate() {
            assert_eq!(phase_radius(&cfg, u32::try_from(step).unwrap()), *radius);
        }
    }

    #[test]
    fn phase_radii_are_non_increasing_for_any_valid_config() {
        let cfg = ZoneConfig {
            start_radius: 333.0,
            end_radius: 7.5,
            shrink_steps: 11,
            ..ZoneConfig::default()
        };
        let mut previous = cfg.start_radius;
        for step in 0..=cfg.shrink_steps {
            let r = phase_radius(&cfg, step);
            assert!(r <= previous, "radius grew at step {step}");
            previous = r;
        }
        assert_eq!(phase_radius(&cfg, 0), cfg.start_radius);
        assert_eq!(phase_radius(&cfg, cfg.shrink_steps), cfg.end_radius);
    }

    #[test]
    fn out_of_range_step_clamps_to_end_radius() {
        let cfg = test_config();
        assert_eq!(phase_radius(&cfg, 99), cfg.end_radius);
    }

    #[test]
    fn announcing_holds_the_phase_start_radius() {
        let cfg = test_config();
        let mut state = shrinking_state(2, 0);
        state.sub_state = SubState::Announcing;
        let clock = TickClock::from_parts(500, 10).unwrap();
        assert_eq!(radius_at(&cfg, &state, &clock), 90.0);
    }

    #[test]
    fn shrinking_interpolates_linearly() {
        let cfg = test_config();
        let state = shrinking_state(0, 1000);
        // shrink_duration 30s at 10 ticks/s = 300 ticks, 120 -> 105.
        let half = TickClock::from_parts(1150, 10).unwrap();
        assert_eq!(radius_at(&cfg, &state, &half), 112.5);
        let done = TickClock::from_parts(1300, 10).unwrap();
        assert_eq!(radius_at(&cfg, &state, &done), 105.0);
        // Past the end the value clamps; no overshoot.
        let late = TickClock::from_parts(1400, 10).unwrap();
        assert_eq!(radius_at(&cfg, &state, &late), 105.0);
    }

    #[test]
    fn radius_is_non_increasing_within_a_shrink() {
        let cfg = test_config();
        let state = shrinking_state(3, 0);
        let mut previous = f64::INFINITY;
        for tick in 0..=400 {
            let clock = TickClock::from_parts(tick, 10).unwrap();
            let r = radius_at(&cfg, &state, &clock);
            assert!(r <= previous, "radius grew at tick {tick}");
            previous = r;
        }
    }

    #[test]
    fn radius_is_continuous_at_phase_boundaries() {
        let cfg = test_config();
        // End of Shrinking(1) equals Paused(1) equals start of Announcing(2).
        let shrunk = shrinking_state(1, 0);
        let end_of_shrink = TickClock::from_parts(300, 10).unwrap();
        let shrink_end = radius_at(&cfg, &shrunk, &end_of_shrink);

        let mut paused = shrunk.clone();
        paused.sub_state = SubState::Paused;
        let paused_radius = radius_at(&cfg, &paused, &end_of_shrink);

        let mut announcing = shrunk;
        announcing.sub_state = SubState::Announcing;
        announcing.phase_index = 2;
        let announce_radius = radius_at(&cfg, &announcing, &end_of_shrink);

        assert_eq!(shrink_end, paused_radius);
        assert_eq!(paused_radius, announce_radius);
    }

    #[test]
    fn finished_freezes_at_end_radius() {
        let cfg = test_config();
        let mut state = shrinking_state(5, 0);
        state.sub_state = SubState::Finished;
        let clock = TickClock::from_parts(1_000_000, 10).unwrap();
        assert_eq!(radius_at(&cfg, &state, &clock), 30.0);
    }
}
