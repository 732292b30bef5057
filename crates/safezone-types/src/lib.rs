//! Shared type definitions for the safe-zone controller.
//!
//! This crate is the single source of truth for the types that cross the
//! boundary between the authoritative controller and its observers: typed
//! identifiers, the zone sub-state machine vocabulary, and the replicable
//! state/snapshot structs.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for entity and match identifiers
//! - [`enums`] -- Sub-state, freeze-reason, and match-end vocabulary
//! - [`structs`] -- Positions, authoritative zone state, and read-only
//!   snapshots

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{FreezeReason, MatchEndReason, SubState};
pub use ids::{EntityId, MatchId};
pub use structs::{PhaseTransition, Position, ZoneSnapshot, ZoneState};
