//! Tick clock, phase scheduling, and orchestration for the shrinking
//! safe zone.
//!
//! This crate owns the authoritative zone lifecycle for one match:
//! Idle, Announcing, Shrinking, Paused, and Finished, all driven by the
//! network tick clock.
//!
//! # Modules
//!
//! - [`clock`] -- Tick clock with checked advance, tick/second
//!   conversion, and timer handles.
//! - [`config`] -- Configuration loading from `safezone-config.yaml`
//!   into strongly-typed, validated structs.
//! - [`controller`] -- [`ZoneController`], the per-match owner of the
//!   scheduler, damage model, and snapshot publisher.
//! - [`damage`] -- Out-of-zone damage timers and the [`DamageSink`] and
//!   [`PositionSource`] seams.
//! - [`delay`] -- Player-count-scaled pause delay and the
//!   [`LivePlayerCount`] seam.
//! - [`geometry`] -- Circle radius derivation per phase and sub-state.
//! - [`runner`] -- Bounded async match loop around the controller.
//! - [`scheduler`] -- The phase state machine on the tick timeline.
//! - [`snapshot`] -- Committed snapshot handoff for render observers.
//!
//! [`ZoneController`]: controller::ZoneController
//! [`DamageSink`]: damage::DamageSink
//! [`PositionSource`]: damage::PositionSource
//! [`LivePlayerCount`]: delay::LivePlayerCount

pub mod clock;
pub mod config;
pub mod controller;
pub mod damage;
pub mod delay;
pub mod geometry;
pub mod runner;
pub mod scheduler;
pub mod snapshot;
