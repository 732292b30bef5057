//! Scripted match collaborators for the demo engine.
//!
//! A real host wires the controller to its roster, replication, and
//! health systems. The demo engine substitutes small scripted stand-ins
//! so a full zone lifecycle can be watched from the terminal.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use tracing::info;

use safezone_core::damage::{DamageSink, PositionSource};
use safezone_core::delay::LivePlayerCount;
use safezone_core::runner::TickCallback;
use safezone_types::{EntityId, PhaseTransition, Position, ZoneSnapshot};

/// A roster whose live count only ever shrinks.
///
/// The count is atomic so the tick callback can run the elimination
/// script while the runner reads the count through the shared handle.
/// The demo eliminates one player at a fixed tick cadence so the pause
/// delay visibly ramps from the crowded end of the band toward the
/// sparse end over the match.
#[derive(Debug)]
pub struct ScriptedRoster {
    live: AtomicU32,
    eliminate_every_ticks: u64,
}

impl ScriptedRoster {
    /// Create a roster of `live` players that loses one player every
    /// `eliminate_every_ticks` ticks (0 disables eliminations).
    pub const fn new(live: u32, eliminate_every_ticks: u64) -> Self {
        Self {
            live: AtomicU32::new(live),
            eliminate_every_ticks,
        }
    }

    /// Advance the elimination script to the given tick.
    pub fn advance_to(&self, tick: u64) {
        if self.eliminate_every_ticks == 0 || tick % self.eliminate_every_ticks != 0 {
            return;
        }
        let live = self.live.load(Ordering::SeqCst);
        if live <= 1 {
            return;
        }
        let remaining = live.saturating_sub(1);
        self.live.store(remaining, Ordering::SeqCst);
        info!(live_players = remaining, tick, "Player eliminated");
    }
}

impl LivePlayerCount for ScriptedRoster {
    fn live_player_count(&self) -> u32 {
        self.live.load(Ordering::SeqCst)
    }
}

/// Tick callback that runs the elimination script and logs phase
/// transitions as they fire.
#[derive(Debug)]
pub struct DemoCallback {
    roster: Arc<ScriptedRoster>,
}

impl DemoCallback {
    /// Create a callback driving the given roster.
    pub const fn new(roster: Arc<ScriptedRoster>) -> Self {
        Self { roster }
    }
}

impl TickCallback for DemoCallback {
    fn on_tick(&mut self, snapshot: &ZoneSnapshot, transitions: &[PhaseTransition]) {
        self.roster.advance_to(snapshot.tick);
        for transition in transitions {
            info!(
                from = ?transition.from,
                to = ?transition.to,
                phase_index = transition.phase_index,
                at_tick = transition.at_tick,
                radius = snapshot.radius,
                "Phase transition"
            );
        }
    }
}

/// Fixed entity positions: a handful of players inside the start
/// radius and one straggler parked far outside.
#[derive(Debug)]
pub struct ScriptedPositions {
    positions: BTreeMap<EntityId, Position>,
}

impl ScriptedPositions {
    /// Build the demo position map around `center`.
    pub fn new(center: Position) -> Self {
        let mut positions = BTreeMap::new();
        positions.insert(EntityId::new(), center);
        positions.insert(
            EntityId::new(),
            Position::new(center.x + 20.0, center.z - 15.0),
        );
        positions.insert(
            EntityId::new(),
            Position::new(center.x - 40.0, center.z + 40.0),
        );
        // The straggler: outside every radius the zone will ever hold.
        positions.insert(
            EntityId::new(),
            Position::new(center.x + 500.0, center.z),
        );
        Self { positions }
    }
}

impl PositionSource for ScriptedPositions {
    fn resolve_positions(&mut self, _tick: u64) -> BTreeMap<EntityId, Position> {
        self.positions.clone()
    }
}

/// A damage sink that logs each application instead of mutating health.
#[derive(Debug, Default)]
pub struct LoggingSink {
    total_applied: u64,
}

impl LoggingSink {
    /// Total hit points applied over the run.
    pub const fn total_applied(&self) -> u64 {
        self.total_applied
    }
}

impl DamageSink for LoggingSink {
    fn apply_damage(&mut self, entity: EntityId, amount: u32) {
        self.total_applied = self.total_applied.saturating_add(u64::from(amount));
        info!(entity = %entity, amount, "Zone damage applied");
    }
}
