//! Phase scheduler: the single writer of [`ZoneState`].
//!
//! The scheduler walks the zone through its sub-states by comparing the
//! authoritative tick against the scheduled transition tick -- never
//! wall-clock time:
//!
//! ```text
//! Idle       --(elapsed >= shrink_start_delay)------> Announcing(0)
//! Announcing --(elapsed >= shrink_announce_duration)-> Shrinking(i)
//! Shrinking  --(elapsed >= shrink_duration)----------> Paused       (i + 1 < steps)
//!                                                   \-> Finished    (last step)
//! Paused     --(elapsed >= pause_delay(players))-----> Announcing(i + 1)
//! ```
//!
//! Transitions are anchored at their *scheduled* tick, not the tick
//! `advance` happened to run at, so a stalled host catches up through
//! the exact same boundaries every other observer derived. `advance` is
//! idempotent: repeat calls at an unchanged tick fire nothing.
//!
//! Runtime invariant violations (tick regression, authority loss) freeze
//! the scheduler in place -- logged, state intact, no phase reset, and
//! never a panic into the surrounding simulation.

use tracing::{error, info, warn};

use safezone_types::{FreezeReason, PhaseTransition, Position, SubState, ZoneState};

use crate::clock::TickClock;
use crate::config::{ConfigError, ZoneConfig};
use crate::delay::{self, LivePlayerCount};
use crate::geometry;

/// Errors from scheduler lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// `activate` was called on an already-active scheduler.
    #[error("scheduler is already active")]
    AlreadyActive,
}

/// Drives the zone phase state machine from the authoritative clock.
///
/// Exactly one scheduler exists per match, owned by the controller. On
/// match teardown it is dropped without emitting a final transition.
#[derive(Debug, Clone)]
pub struct PhaseScheduler {
    cfg: ZoneConfig,
    state: ZoneState,
    /// Highest tick `advance` has observed; regression freezes.
    last_observed_tick: u64,
    /// Tick at which the current freeze began, for re-anchoring on
    /// authority reattach.
    freeze_tick: u64,
}

impl PhaseScheduler {
    /// Create an inactive scheduler for a validated config.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the tuning violates an invariant.
    pub fn new(cfg: ZoneConfig, center: Position) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let state = ZoneState::new(center, cfg.start_radius);
        Ok(Self {
            cfg,
            state,
            last_observed_tick: 0,
            freeze_tick: 0,
        })
    }

    /// The authoritative zone state.
    pub const fn state(&self) -> &ZoneState {
        &self.state
    }

    /// The locked tuning data.
    pub const fn config(&self) -> &ZoneConfig {
        &self.cfg
    }

    /// Activate the zone and schedule the first announcement.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::AlreadyActive`] on a second call.
    pub fn activate(&mut self, clock: &TickClock) -> Result<(), SchedulerError> {
        if self.state.is_active {
            return Err(SchedulerError::AlreadyActive);
        }
        let now = clock.tick();
        self.state.is_active = true;
        self.state.sub_state_entered_tick = now;
        self.state.next_transition_tick =
            Some(now.saturating_add(clock.seconds_to_ticks(self.cfg.shrink_start_delay)));
        self.last_observed_tick = now;
        info!(
            tick = now,
            first_announcement_tick = self.state.next_transition_tick,
            shrink_steps = self.cfg.shrink_steps,
            "Zone activated"
        );
        Ok(())
    }

    /// Advance the state machine to the clock's current tick.
    ///
    /// Fires every transition whose scheduled tick has been reached, in
    /// order, and recomputes the authoritative radius. Returns the fired
    /// transitions (usually zero or one; more if the host stalled).
    /// Idempotent: a repeat call at the same tick returns nothing and
    /// leaves the state unchanged.
    pub fn advance(
        &mut self,
        clock: &TickClock,
        players: &dyn LivePlayerCount,
    ) -> Vec<PhaseTransition> {
        let now = clock.tick();
        if now < self.last_observed_tick {
            if self.state.frozen.is_none() {
                error!(
                    tick = now,
                    last_observed = self.last_observed_tick,
                    "Authoritative tick regressed; freezing scheduler"
                );
                self.freeze(FreezeReason::TickRegression, now);
            }
            return Vec::new();
        }
        self.last_observed_tick = now;

        if !self.state.is_active || self.state.frozen.is_some() {
            return Vec::new();
        }

        let mut fired = Vec::new();
        while let Some(due) = self.state.next_transition_tick {
            if now < due {
                break;
            }
            self.fire(due, clock, players, &mut fired);
        }

        self.state.radius = geometry::radius_at(&self.cfg, &self.state, clock);
        fired
    }

    /// Seconds until the current sub-state ends, for warning UI.
    ///
    /// `None` when inactive, frozen, or finished.
    pub fn remaining_seconds(&self, clock: &TickClock) -> Option<f64> {
        if !self.state.is_active || self.state.frozen.is_some() {
            return None;
        }
        self.state
            .next_transition_tick
            .map(|due| clock.ticks_to_seconds(due.saturating_sub(clock.tick())))
    }

    /// Freeze the scheduler because authority over the match was lost.
    ///
    /// No transition fires while frozen and no phase is reset; the
    /// pending schedule is preserved for [`reattach_authority`].
    ///
    /// [`reattach_authority`]: PhaseScheduler::reattach_authority
    pub fn release_authority(&mut self, clock: &TickClock) {
        if self.state.frozen.is_none() {
            warn!(tick = clock.tick(), "Match authority lost; freezing scheduler");
            self.freeze(FreezeReason::AuthorityLost, clock.tick());
        }
    }

    /// Resume after a new authority attaches.
    ///
    /// The pending transition (and the sub-state entry anchor) is
    /// shifted forward by the frozen gap, so the sub-state resumes with
    /// exactly the remaining time it had when the freeze began.
    pub fn reattach_authority(&mut self, clock: &TickClock) {
        let Some(reason) = self.state.frozen.take() else {
            return;
        };
        let now = clock.tick();
        let gap = now.saturating_sub(self.freeze_tick);
        if let Some(due) = self.state.next_transition_tick {
            self.state.next_transition_tick = Some(due.saturating_add(gap));
        }
        self.state.sub_state_entered_tick = self.state.sub_state_entered_tick.saturating_add(gap);
        self.last_observed_tick = now;
        info!(
            tick = now,
            frozen_ticks = gap,
            %reason,
            "Authority reattached; scheduler resumed"
        );
    }

    fn freeze(&mut self, reason: FreezeReason, at_tick: u64) {
        self.state.frozen = Some(reason);
        self.freeze_tick = at_tick;
    }

    /// Fire the transition scheduled at `due` and schedule its successor.
    fn fire(
        &mut self,
        due: u64,
        clock: &TickClock,
        players: &dyn LivePlayerCount,
        fired: &mut Vec<PhaseTransition>,
    ) {
        let from = self.state.sub_state;
        match from {
            SubState::Idle | SubState::Paused => {
                if from == SubState::Paused {
                    self.state.phase_index = self.state.phase_index.saturating_add(1);
                }
                self.enter(
                    SubState::Announcing,
                    due,
                    Some(Self::after(clock, due, self.cfg.shrink_announce_duration)),
                );
            }
            SubState::Announcing => {
                self.enter(
                    SubState::Shrinking,
                    due,
                    Some(Self::after(clock, due, self.cfg.shrink_duration)),
                );
            }
            SubState::Shrinking => {
                if self.state.phase_index.saturating_add(1) < self.cfg.shrink_steps {
                    // The pause delay is locked exactly once, here. Count
                    // changes during the pause never reschedule it.
                    let live = players.live_player_count();
                    let delay = delay::pause_delay(&self.cfg, live);
                    info!(
                        tick = due,
                        live_players = live,
                        delay_seconds = delay,
                        "Pause delay locked"
                    );
                    self.enter(SubState::Paused, due, Some(Self::after(clock, due, delay)));
                } else {
                    self.enter(SubState::Finished, due, None);
                }
            }
            SubState::Finished => {
                // Terminal: nothing is ever scheduled past Finished.
                self.state.next_transition_tick = None;
                return;
            }
        }

        let transition = PhaseTransition {
            from,
            to: self.state.sub_state,
            phase_index: self.state.phase_index,
            at_tick: due,
        };
        info!(
            at_tick = due,
            from = ?transition.from,
            to = ?transition.to,
            phase = transition.phase_index,
            next_transition_tick = self.state.next_transition_tick,
            "Zone transition"
        );
        fired.push(transition);
    }

    /// Enter `to` anchored at the scheduled tick `due`.
    fn enter(&mut self, to: SubState, due: u64, next: Option<u64>) {
        self.state.sub_state = to;
        self.state.sub_state_entered_tick = due;
        self.state.next_transition_tick = next;
        if to == SubState::Finished {
            self.state.radius = self.cfg.end_radius;
        }
    }

    /// The tick `seconds` after `due`.
    fn after(clock: &TickClock, due: u64, seconds: f64) -> u64 {
        due.saturating_add(clock.seconds_to_ticks(seconds))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use std::cell::Cell;

    use safezone_types::Position;

    use super::*;
    use crate::delay::FixedPlayerCount;

    /// A player count that can change between polls.
    struct VariableCount(Cell<u32>);

    impl LivePlayerCount for VariableCount {
        fn live_player_count(&self) -> u32 {
            self.0.get()
        }
    }

    fn scenario_config() -> ZoneConfig {
        ZoneConfig {
            start_radius: 120.0,
            end_radius: 30.0,
            shrink_steps: 6,
            shrink_start_delay: 60.0,
            shrink_duration: 30.0,
            shrink_announce_duration: 45.0,
            min_shrink_delay: 45.0,
            max_shrink_delay: 120.0,
            min_shrink_delay_players: 2,
            max_shrink_delay_players: 60,
            damage_per_tick: 3,
            damage_tick_interval: 1.5,
        }
    }

    /// 10 ticks per second keeps second->tick arithmetic exact.
    fn clock_at(tick: u64) -> TickClock {
        TickClock::from_parts(tick, 10).unwrap()
    }

    fn active_scheduler() -> PhaseScheduler {
        let mut scheduler =
            PhaseScheduler::new(scenario_config(), Position::default()).unwrap();
        scheduler.activate(&clock_at(0)).unwrap();
        scheduler
    }

    #[test]
    fn activation_schedules_the_first_announcement() {
        let scheduler = active_scheduler();
        assert!(scheduler.state().is_active);
        assert_eq!(scheduler.state().sub_state, SubState::Idle);
        // 60s at 10 ticks/s.
        assert_eq!(scheduler.state().next_transition_tick, Some(600));
    }

    #[test]
    fn double_activation_is_an_error() {
        let mut scheduler = active_scheduler();
        assert!(matches!(
            scheduler.activate(&clock_at(5)),
            Err(SchedulerError::AlreadyActive)
        ));
    }

    #[test]
    fn inactive_scheduler_never_advances() {
        let mut scheduler =
            PhaseScheduler::new(scenario_config(), Position::default()).unwrap();
        let fired = scheduler.advance(&clock_at(10_000), &FixedPlayerCount(60));
        assert!(fired.is_empty());
        assert_eq!(scheduler.state().sub_state, SubState::Idle);
    }

    #[test]
    fn end_to_end_scenario_with_a_full_lobby() {
        let mut scheduler = active_scheduler();
        let players = FixedPlayerCount(60);

        // Idle until just before t=60s.
        assert!(scheduler.advance(&clock_at(599), &players).is_empty());
        assert_eq!(scheduler.state().sub_state, SubState::Idle);
        assert_eq!(scheduler.state().radius, 120.0);

        // t=60s: Announcing(0).
        let fired = scheduler.advance(&clock_at(600), &players);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired.first().unwrap().to, SubState::Announcing);
        assert_eq!(scheduler.state().phase_index, 0);

        // t=105s: Shrinking(0), radius falling from 120 toward 105.
        let fired = scheduler.advance(&clock_at(1050), &players);
        assert_eq!(fired.first().unwrap().to, SubState::Shrinking);
        assert_eq!(scheduler.state().radius, 120.0);
        let _ = scheduler.advance(&clock_at(1200), &players);
        assert_eq!(scheduler.state().radius, 112.5);

        // t=135s: the step is done; 60 live players lock the minimum
        // 45s pause, so the next announcement lands at t=180s.
        let fired = scheduler.advance(&clock_at(1350), &players);
        assert_eq!(fired.first().unwrap().to, SubState::Paused);
        assert_eq!(scheduler.state().radius, 105.0);
        assert_eq!(scheduler.state().next_transition_tick, Some(1800));

        // t=180s: Announcing(1).
        let fired = scheduler.advance(&clock_at(1800), &players);
        assert_eq!(fired.first().unwrap().to, SubState::Announcing);
        assert_eq!(scheduler.state().phase_index, 1);
    }

    #[test]
    fn advance_is_idempotent_at_a_fixed_tick() {
        let mut scheduler = active_scheduler();
        let players = FixedPlayerCount(60);

        let fired = scheduler.advance(&clock_at(600), &players);
        assert_eq!(fired.len(), 1);
        let before = scheduler.state().clone();

        let fired = scheduler.advance(&clock_at(600), &players);
        assert!(fired.is_empty());
        assert_eq!(scheduler.state(), &before);
    }

    #[test]
    fn stalled_host_catches_up_through_anchored_boundaries() {
        let mut scheduler = active_scheduler();
        let players = FixedPlayerCount(60);

        // Jump straight past announcement, shrink, and pause entry.
        let fired = scheduler.advance(&clock_at(1400), &players);
        let states: Vec<SubState> = fired.iter().map(|t| t.to).collect();
        assert_eq!(
            states,
            vec![SubState::Announcing, SubState::Shrinking, SubState::Paused]
        );
        // Each edge is anchored at its scheduled tick, not at 1400.
        let ticks: Vec<u64> = fired.iter().map(|t| t.at_tick).collect();
        assert_eq!(ticks, vec![600, 1050, 1350]);
        // The pause still ends at the tick every replica derives.
        assert_eq!(scheduler.state().next_transition_tick, Some(1800));
    }

    #[test]
    fn pause_delay_is_locked_at_pause_entry() {
        let mut scheduler = active_scheduler();
        let players = VariableCount(Cell::new(60));

        // Count changes before Paused begins are immaterial.
        players.0.set(2);
        let _ = scheduler.advance(&clock_at(600), &players);
        players.0.set(60);
        let _ = scheduler.advance(&clock_at(1350), &players);
        assert_eq!(scheduler.state().sub_state, SubState::Paused);
        // 60 players at Paused entry: minimum 45s delay.
        assert_eq!(scheduler.state().next_transition_tick, Some(1800));

        // A mass disconnect during the pause must not stretch it.
        players.0.set(2);
        let _ = scheduler.advance(&clock_at(1500), &players);
        assert_eq!(scheduler.state().next_transition_tick, Some(1800));
    }

    #[test]
    fn duo_endgame_locks_the_maximum_delay() {
        let mut scheduler = active_scheduler();
        let players = FixedPlayerCount(2);
        let _ = scheduler.advance(&clock_at(1350), &players);
        assert_eq!(scheduler.state().sub_state, SubState::Paused);
        // 120s delay at 10 ticks/s.
        assert_eq!(scheduler.state().next_transition_tick, Some(1350 + 1200));
    }

    #[test]
    fn final_step_finishes_and_freezes_the_radius() {
        let cfg = ZoneConfig {
            shrink_steps: 1,
            ..scenario_config()
        };
        let mut scheduler = PhaseScheduler::new(cfg, Position::default()).unwrap();
        scheduler.activate(&clock_at(0)).unwrap();
        let players = FixedPlayerCount(10);

        // Idle(600) -> Announcing(1050) -> Shrinking(1350) -> Finished.
        let fired = scheduler.advance(&clock_at(1350), &players);
        assert_eq!(fired.last().unwrap().to, SubState::Finished);
        assert_eq!(scheduler.state().radius, 30.0);
        assert!(scheduler.state().next_transition_tick.is_none());

        // Nothing more ever fires.
        let fired = scheduler.advance(&clock_at(100_000), &players);
        assert!(fired.is_empty());
        assert_eq!(scheduler.state().radius, 30.0);
    }

    #[test]
    fn tick_regression_freezes_without_resetting_state() {
        let mut scheduler = active_scheduler();
        let players = FixedPlayerCount(60);
        let _ = scheduler.advance(&clock_at(700), &players);
        assert_eq!(scheduler.state().sub_state, SubState::Announcing);

        let fired = scheduler.advance(&clock_at(650), &players);
        assert!(fired.is_empty());
        assert_eq!(
            scheduler.state().frozen,
            Some(FreezeReason::TickRegression)
        );
        // Frozen, not reset: phase data intact, and later ticks no-op.
        assert_eq!(scheduler.state().sub_state, SubState::Announcing);
        let fired = scheduler.advance(&clock_at(5000), &players);
        assert!(fired.is_empty());
        assert_eq!(scheduler.state().sub_state, SubState::Announcing);
    }

    #[test]
    fn authority_loss_freezes_and_reattach_preserves_remaining_time() {
        let mut scheduler = active_scheduler();
        let players = FixedPlayerCount(60);
        let _ = scheduler.advance(&clock_at(600), &players);
        // Announcing ends at 1050; 30s remain at tick 750.
        assert_eq!(scheduler.remaining_seconds(&clock_at(750)), Some(30.0));

        scheduler.release_authority(&clock_at(750));
        assert_eq!(scheduler.state().frozen, Some(FreezeReason::AuthorityLost));
        assert!(scheduler.remaining_seconds(&clock_at(900)).is_none());
        // No orphaned continuation while detached.
        assert!(scheduler.advance(&clock_at(2000), &players).is_empty());

        // Reattach 1250 ticks later: still 30s of announcement left.
        scheduler.reattach_authority(&clock_at(2000));
        assert!(scheduler.state().frozen.is_none());
        assert_eq!(scheduler.remaining_seconds(&clock_at(2000)), Some(30.0));
        let fired = scheduler.advance(&clock_at(2300), &players);
        assert_eq!(fired.first().unwrap().to, SubState::Shrinking);
    }

    #[test]
    fn remaining_seconds_counts_down_for_warning_ui() {
        let mut scheduler = active_scheduler();
        let players = FixedPlayerCount(60);
        assert_eq!(scheduler.remaining_seconds(&clock_at(0)), Some(60.0));
        let _ = scheduler.advance(&clock_at(300), &players);
        assert_eq!(scheduler.remaining_seconds(&clock_at(300)), Some(30.0));
    }
}
