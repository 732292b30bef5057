//! The match-session controller: one instance per match, wired by
//! explicit dependency injection.
//!
//! The match object owns exactly one [`ZoneController`] and hands
//! references to collaborators directly -- there is no scene-wide
//! discovery and no global singleton. All tuning flows through a single
//! config call site before activation; once `is_active` is true every
//! further write is rejected and logged, never silently applied, so no
//! mid-match patcher can desync replicas.
//!
//! Per authoritative tick the controller advances the scheduler, applies
//! zone damage against the *same* resolved position map the geometry
//! used, and commits a read-only snapshot for render/UI observers.

use std::collections::BTreeMap;

use tracing::warn;

use safezone_types::{EntityId, MatchId, PhaseTransition, Position, ZoneSnapshot, ZoneState};

use crate::clock::TickClock;
use crate::config::{ConfigError, ZoneConfig};
use crate::damage::{DamageModel, DamageSink};
use crate::delay::LivePlayerCount;
use crate::scheduler::{PhaseScheduler, SchedulerError};
use crate::snapshot::SnapshotPublisher;

/// Authoritative owner of the zone for one match session.
///
/// Dropped at match teardown, which discards the scheduler mid-phase
/// without emitting a final transition and destroys all damage timers
/// with it.
#[derive(Debug)]
pub struct ZoneController {
    match_id: MatchId,
    scheduler: PhaseScheduler,
    damage: DamageModel,
    publisher: SnapshotPublisher,
}

impl ZoneController {
    /// Create a controller for a validated config, centered at `center`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the tuning violates an invariant;
    /// the match must not start.
    pub fn new(cfg: ZoneConfig, center: Position) -> Result<Self, ConfigError> {
        Ok(Self {
            match_id: MatchId::new(),
            scheduler: PhaseScheduler::new(cfg, center)?,
            damage: DamageModel::new(),
            publisher: SnapshotPublisher::new(),
        })
    }

    /// The match this controller belongs to.
    pub const fn match_id(&self) -> MatchId {
        self.match_id
    }

    /// Replace the zone tuning. Permitted only before activation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ActiveOverride`] (and keeps the prior
    /// config) if the controller is already active, or a validation
    /// error if the new tuning is invalid (the prior config is kept
    /// then too).
    pub fn set_config(&mut self, cfg: ZoneConfig) -> Result<(), ConfigError> {
        if self.scheduler.state().is_active {
            warn!(
                match_id = %self.match_id,
                "Config override attempted after activation; rejected"
            );
            return Err(ConfigError::ActiveOverride);
        }
        let center = self.scheduler.state().center;
        self.scheduler = PhaseScheduler::new(cfg, center)?;
        Ok(())
    }

    /// Move the zone center. Permitted only before activation; the
    /// center is fixed for the match once the zone is live.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ActiveOverride`] if already active.
    pub fn set_center(&mut self, center: Position) -> Result<(), ConfigError> {
        if self.scheduler.state().is_active {
            warn!(
                match_id = %self.match_id,
                "Center override attempted after activation; rejected"
            );
            return Err(ConfigError::ActiveOverride);
        }
        let cfg = self.scheduler.config().clone();
        self.scheduler = PhaseScheduler::new(cfg, center)?;
        Ok(())
    }

    /// Activate the zone and lock the config.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::AlreadyActive`] on a second call.
    pub fn activate(&mut self, clock: &TickClock) -> Result<(), SchedulerError> {
        self.scheduler.activate(clock)
    }

    /// Freeze the zone because this process lost match authority.
    pub fn release_authority(&mut self, clock: &TickClock) {
        self.scheduler.release_authority(clock);
    }

    /// Resume the zone after authority reattaches.
    pub fn reattach_authority(&mut self, clock: &TickClock) {
        self.scheduler.reattach_authority(clock);
    }

    /// Run one authoritative tick.
    ///
    /// Must be called exactly once per fixed simulation tick, from the
    /// fixed-step path -- never from a render callback. `positions` is
    /// the tick's resolved position map, used for the damage decision
    /// against the radius derived this same tick. Returns the fired
    /// phase transitions.
    pub fn tick(
        &mut self,
        clock: &TickClock,
        players: &dyn LivePlayerCount,
        positions: &BTreeMap<EntityId, Position>,
        sink: &mut dyn DamageSink,
    ) -> Vec<PhaseTransition> {
        let transitions = self.scheduler.advance(clock, players);

        let state = self.scheduler.state();
        if state.is_active && state.frozen.is_none() {
            self.damage.apply_tick(
                clock.tick(),
                clock.tick_duration_seconds(),
                positions,
                state.center,
                state.radius,
                self.scheduler.config(),
                sink,
            );
        }

        self.publisher.publish(self.snapshot(clock));
        transitions
    }

    // -----------------------------------------------------------------------
    // Read-only exposure
    // -----------------------------------------------------------------------

    /// The authoritative zone state.
    pub const fn state(&self) -> &ZoneState {
        self.scheduler.state()
    }

    /// Current circle center.
    pub const fn center(&self) -> Position {
        self.scheduler.state().center
    }

    /// Current circle radius.
    pub const fn radius(&self) -> f64 {
        self.scheduler.state().radius
    }

    /// Whether the zone has been activated.
    pub const fn is_active(&self) -> bool {
        self.scheduler.state().is_active
    }

    /// Whether the radius is currently interpolating.
    pub const fn is_shrinking(&self) -> bool {
        self.scheduler.state().sub_state.is_shrinking()
    }

    /// Whether the zone is waiting between shrink steps.
    pub const fn is_paused(&self) -> bool {
        self.scheduler.state().sub_state.is_paused()
    }

    /// Index of the current shrink step.
    pub const fn current_phase_index(&self) -> u32 {
        self.scheduler.state().phase_index
    }

    /// Seconds until the current sub-state ends, for warning UI.
    pub fn remaining_in_sub_state(&self, clock: &TickClock) -> Option<f64> {
        self.scheduler.remaining_seconds(clock)
    }

    /// Build the committed snapshot for the current tick.
    pub fn snapshot(&self, clock: &TickClock) -> ZoneSnapshot {
        let state = self.scheduler.state();
        ZoneSnapshot {
            tick: clock.tick(),
            sub_state: state.sub_state,
            phase_index: state.phase_index,
            center: state.center,
            radius: state.radius,
            remaining_in_sub_state: self.scheduler.remaining_seconds(clock),
            is_active: state.is_active,
        }
    }

    /// Subscribe a render/UI observer to committed snapshots.
    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<ZoneSnapshot> {
        self.publisher.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::delay::FixedPlayerCount;

    #[derive(Debug, Default)]
    struct RecordingSink {
        hits: Vec<(EntityId, u32)>,
    }

    impl DamageSink for RecordingSink {
        fn apply_damage(&mut self, entity: EntityId, amount: u32) {
            self.hits.push((entity, amount));
        }
    }

    fn test_config() -> ZoneConfig {
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

    fn clock_at(tick: u64) -> TickClock {
        TickClock::from_parts(tick, 10).unwrap()
    }

    #[test]
    fn config_writes_before_activation_are_accepted() {
        let mut controller =
            ZoneController::new(test_config(), Position::default()).unwrap();
        let override_cfg = ZoneConfig {
            start_radius: 200.0,
            ..test_config()
        };
        assert!(controller.set_config(override_cfg).is_ok());
        assert_eq!(controller.radius(), 200.0);
        assert!(controller.set_center(Position::new(5.0, 5.0)).is_ok());
        assert_eq!(controller.center(), Position::new(5.0, 5.0));
    }

    #[test]
    fn config_writes_after_activation_are_rejected_and_prior_value_kept() {
        let mut controller =
            ZoneController::new(test_config(), Position::default()).unwrap();
        controller.activate(&clock_at(0)).unwrap();

        let override_cfg = ZoneConfig {
            start_radius: 500.0,
            ..test_config()
        };
        assert!(matches!(
            controller.set_config(override_cfg),
            Err(ConfigError::ActiveOverride)
        ));
        assert!(matches!(
            controller.set_center(Position::new(9.0, 9.0)),
            Err(ConfigError::ActiveOverride)
        ));
        // Prior values retained.
        assert_eq!(controller.radius(), 120.0);
        assert_eq!(controller.center(), Position::default());
    }

    #[test]
    fn invalid_override_keeps_the_prior_config() {
        let mut controller =
            ZoneController::new(test_config(), Position::default()).unwrap();
        let bad = ZoneConfig {
            start_radius: 100.0,
            end_radius: 150.0,
            ..test_config()
        };
        assert!(controller.set_config(bad).is_err());
        assert_eq!(controller.radius(), 120.0);
    }

    #[test]
    fn tick_applies_damage_against_the_same_ticks_radius() {
        let mut controller =
            ZoneController::new(test_config(), Position::default()).unwrap();
        controller.activate(&clock_at(0)).unwrap();
        let players = FixedPlayerCount(60);
        let mut sink = RecordingSink::default();

        let straggler = EntityId::new();
        let mut positions = BTreeMap::new();
        // Outside the 120 start radius the whole time.
        positions.insert(straggler, Position::new(400.0, 0.0));

        // 2 seconds at 10 Hz: interval 1.5s passes once.
        for tick in 1..=20 {
            let _ =
                controller.tick(&clock_at(tick), &players, &positions, &mut sink);
        }
        assert_eq!(sink.hits.len(), 1);
        assert_eq!(sink.hits.first().unwrap(), &(straggler, 3));
    }

    #[test]
    fn frozen_controller_applies_no_damage() {
        let mut controller =
            ZoneController::new(test_config(), Position::default()).unwrap();
        controller.activate(&clock_at(0)).unwrap();
        controller.release_authority(&clock_at(1));
        let players = FixedPlayerCount(60);
        let mut sink = RecordingSink::default();

        let mut positions = BTreeMap::new();
        positions.insert(EntityId::new(), Position::new(400.0, 0.0));
        for tick in 2..=100 {
            let _ =
                controller.tick(&clock_at(tick), &players, &positions, &mut sink);
        }
        assert!(sink.hits.is_empty());
    }

    #[test]
    fn snapshots_are_committed_per_tick() {
        let mut controller =
            ZoneController::new(test_config(), Position::default()).unwrap();
        let rx = controller.subscribe();
        controller.activate(&clock_at(0)).unwrap();
        let players = FixedPlayerCount(60);
        let mut sink = RecordingSink::default();

        let _ = controller.tick(&clock_at(300), &players, &BTreeMap::new(), &mut sink);
        let snap = rx.borrow().clone();
        assert_eq!(snap.tick, 300);
        assert!(snap.is_active);
        // 60s start delay, 30s elapsed.
        assert_eq!(snap.remaining_in_sub_state, Some(30.0));
    }

    #[test]
    fn exposure_predicates_follow_the_state_machine() {
        let mut controller =
            ZoneController::new(test_config(), Position::default()).unwrap();
        assert!(!controller.is_active());
        controller.activate(&clock_at(0)).unwrap();
        let players = FixedPlayerCount(60);
        let mut sink = RecordingSink::default();

        let _ = controller.tick(&clock_at(1100), &players, &BTreeMap::new(), &mut sink);
        assert!(controller.is_shrinking());
        assert!(!controller.is_paused());
        assert_eq!(controller.current_phase_index(), 0);

        let _ = controller.tick(&clock_at(1400), &players, &BTreeMap::new(), &mut sink);
        assert!(controller.is_paused());
    }
}
