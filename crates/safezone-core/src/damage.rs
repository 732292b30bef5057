//! Damage-over-time for entities outside the zone.
//!
//! Each trackable entity carries a damage timer: the seconds it has
//! spent outside the circle since its last damage tick or last zone
//! re-entry. When the timer reaches `damage_tick_interval`, one
//! `damage_per_tick` hit is sent to the damage sink and the interval is
//! *subtracted* (not reset to zero), preserving the remainder so no
//! sub-tick time is lost across intervals. Re-entering the zone resets
//! the timer fully -- no credit carries across an exit/re-entry
//! boundary.
//!
//! "Outside" is a strict greater-than test: an entity standing exactly
//! on the boundary takes no damage.
//!
//! Application is idempotent per authoritative tick: a tick number that
//! has already been processed is skipped, so resimulation or replay can
//! never double-apply damage.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use safezone_types::{EntityId, Position};

use crate::config::ZoneConfig;

/// Receives damage applications from the model.
///
/// The host wires this to its health/elimination pipeline; tests record
/// the calls.
pub trait DamageSink {
    /// Apply `amount` hit points of zone damage to `entity`.
    fn apply_damage(&mut self, entity: EntityId, amount: u32);
}

/// Resolves the positions of all damage-trackable entities for a tick.
///
/// The same resolved map must be used for both the inside/outside test
/// and any geometry queries in that tick, so damage decisions are never
/// made against stale positions.
pub trait PositionSource {
    /// Positions of all trackable entities at the given tick. Entities
    /// absent from the map are treated as despawned and their timers
    /// are dropped.
    fn resolve_positions(&mut self, tick: u64) -> BTreeMap<EntityId, Position>;
}

/// Accumulates out-of-zone time per entity and applies damage.
///
/// Owned by the controller; destroyed with it at match teardown. Timers
/// live exactly as long as their entities appear in the resolved
/// position map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DamageModel {
    /// Seconds spent outside the zone per entity since the last damage
    /// tick or re-entry.
    timers: BTreeMap<EntityId, f64>,

    /// The last authoritative tick that was processed.
    last_applied_tick: Option<u64>,
}

impl DamageModel {
    /// Create an empty damage model.
    pub const fn new() -> Self {
        Self {
            timers: BTreeMap::new(),
            last_applied_tick: None,
        }
    }

    /// Process one authoritative tick.
    ///
    /// `dt_seconds` is the fixed tick duration; `positions` is the
    /// tick's resolved position map; `center`/`radius` describe the
    /// current circle. Calling this again with an already-processed
    /// tick number is a no-op.
    pub fn apply_tick(
        &mut self,
        tick: u64,
        dt_seconds: f64,
        positions: &BTreeMap<EntityId, Position>,
        center: Position,
        radius: f64,
        cfg: &ZoneConfig,
        sink: &mut dyn DamageSink,
    ) {
        if self.last_applied_tick.is_some_and(|last| tick <= last) {
            debug!(tick, "Damage tick already applied; skipping");
            return;
        }
        self.last_applied_tick = Some(tick);

        // Timers die with their entities.
        self.timers.retain(|id, _| positions.contains_key(id));

        for (entity, position) in positions {
            if position.distance_xz(&center) > radius {
                let timer = self.timers.entry(*entity).or_insert(0.0);
                *timer += dt_seconds;
                while *timer >= cfg.damage_tick_interval {
                    *timer -= cfg.damage_tick_interval;
                    trace!(tick, entity = %entity, amount = cfg.damage_per_tick, "Zone damage applied");
                    sink.apply_damage(*entity, cfg.damage_per_tick);
                }
            } else {
                // Re-entry wipes the accumulator entirely.
                self.timers.remove(entity);
            }
        }
    }

    /// The current accumulator value for an entity, if it is outside
    /// the zone.
    pub fn accumulated_seconds(&self, entity: EntityId) -> Option<f64> {
        self.timers.get(&entity).copied()
    }

    /// Number of entities currently accruing out-of-zone time.
    pub fn tracked_outside(&self) -> usize {
        self.timers.len()
    }

    /// Drop all timers (match teardown).
    pub fn clear(&mut self) {
        self.timers.clear();
    }
}
