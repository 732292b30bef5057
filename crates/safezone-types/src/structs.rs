//! Core structs for the safe-zone controller.
//!
//! [`ZoneState`] is the single authoritative record of the zone; only the
//! phase scheduler writes it. [`ZoneSnapshot`] is the committed read-only
//! projection handed to render/UI observers. [`PhaseTransition`] is the
//! typed record of a single state-machine edge, suitable for replication
//! or event logs.

use serde::{Deserialize, Serialize};

use crate::enums::{FreezeReason, SubState};

/// A position on the playfield's ground plane.
///
/// The zone is a vertical cylinder: only the X and Z coordinates matter
/// for inside/outside tests, so the Y component is never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Position {
    /// East-west coordinate in world units.
    pub x: f64,
    /// North-south coordinate in world units.
    pub z: f64,
}

impl Position {
    /// Create a position from XZ coordinates.
    pub const fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }

    /// Ground-plane distance to another position.
    pub fn distance_xz(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        dx.hypot(dz)
    }
}

/// The authoritative state of the shrinking zone.
///
/// Created at match start with `is_active == false`, driven through the
/// phase machine by the scheduler, and frozen at [`SubState::Finished`]
/// with the radius at the configured end radius. All timing fields are
/// tick numbers from the authoritative clock -- never wall-clock values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneState {
    /// Index of the current shrink step, in `0..shrink_steps`.
    pub phase_index: u32,
    /// Current sub-state of the phase machine.
    pub sub_state: SubState,
    /// Center of the circle, fixed for the match.
    pub center: Position,
    /// Current radius in world units.
    pub radius: f64,
    /// Tick at which the current sub-state was entered. Transitions are
    /// anchored here so every observer derives identical boundaries.
    pub sub_state_entered_tick: u64,
    /// Tick at which the next transition fires, if one is scheduled.
    pub next_transition_tick: Option<u64>,
    /// Whether the controller has been activated. Config writes are
    /// rejected once this is true.
    pub is_active: bool,
    /// Set when the scheduler has frozen; cleared on authority reattach.
    pub frozen: Option<FreezeReason>,
}

impl ZoneState {
    /// Create the pre-activation state for a match.
    ///
    /// The zone starts inactive and idle at the given center and start
    /// radius, with no transition scheduled.
    pub const fn new(center: Position, start_radius: f64) -> Self {
        Self {
            phase_index: 0,
            sub_state: SubState::Idle,
            center,
            radius: start_radius,
            sub_state_entered_tick: 0,
            next_transition_tick: None,
            is_active: false,
            frozen: None,
        }
    }
}

/// A committed, read-only view of the zone for observers.
///
/// Published once per authoritative tick after all state writes for that
/// tick are complete, so a render/UI thread never sees a torn update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSnapshot {
    /// The tick this snapshot was committed at.
    pub tick: u64,
    /// Current sub-state.
    pub sub_state: SubState,
    /// Current shrink step index.
    pub phase_index: u32,
    /// Circle center.
    pub center: Position,
    /// Circle radius.
    pub radius: f64,
    /// Seconds until the current sub-state ends, for warning UI.
    /// `None` when the zone is inactive, finished, or frozen.
    pub remaining_in_sub_state: Option<f64>,
    /// Whether the controller is active.
    pub is_active: bool,
}

impl Default for ZoneSnapshot {
    fn default() -> Self {
        Self {
            tick: 0,
            sub_state: SubState::Idle,
            phase_index: 0,
            center: Position::default(),
            radius: 0.0,
            remaining_in_sub_state: None,
            is_active: false,
        }
    }
}

/// A single fired edge of the phase state machine.
///
/// `at_tick` is the scheduled tick the transition is anchored to, which
/// may be earlier than the tick `advance` was called at if the host
/// stalled; anchoring to the schedule keeps every observer's derived
/// boundaries identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTransition {
    /// Sub-state before the edge.
    pub from: SubState,
    /// Sub-state after the edge.
    pub to: SubState,
    /// Shrink step index after the edge.
    pub phase_index: u32,
    /// The tick the edge is anchored to.
    pub at_tick: u64,
}
