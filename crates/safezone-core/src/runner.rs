//! Match loop runner.
//!
//! This module provides [`run_match`], the top-level async function that
//! drives the authoritative tick loop for one zone lifecycle:
//!
//! - **Bounded run**: stop after `max_ticks` (0 means unbounded)
//! - **Zone completion**: stop when the state machine reaches its
//!   terminal sub-state
//! - **External stop**: clean stop via a shared [`StopSignal`]
//! - **Realtime pacing**: sleep one tick interval per tick, or
//!   fast-forward when `realtime` is disabled
//!
//! The runner wraps the single-tick [`ZoneController::tick`] call and
//! adds the control plane around it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use safezone_types::{MatchEndReason, ZoneSnapshot};

use crate::clock::{ClockError, TickClock};
use crate::config::MatchBoundsConfig;
use crate::controller::ZoneController;
use crate::damage::{DamageSink, PositionSource};
use crate::delay::LivePlayerCount;

/// Errors that can occur during the match run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Advancing the tick clock failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// Shared stop flag for the match loop.
///
/// Cloned handles observe the same flag; any holder can request a stop
/// and the runner returns cleanly before the next tick.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    /// Create a new, unset signal.
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Request that the match loop stop before its next tick.
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of the match run.
#[derive(Debug)]
pub struct MatchResult {
    /// The reason the run ended.
    pub end_reason: MatchEndReason,
    /// The snapshot committed by the last tick, if any tick ran.
    pub final_snapshot: Option<ZoneSnapshot>,
    /// Total number of ticks executed.
    pub total_ticks: u64,
}

/// Callback invoked after each tick completes.
///
/// Implementations can use this to broadcast snapshots, drive warning
/// UI, record telemetry and so on. The callback receives the committed
/// snapshot and the phase transitions the tick fired (usually none).
pub trait TickCallback: Send {
    /// Called after a tick completes.
    fn on_tick(
        &mut self,
        snapshot: &ZoneSnapshot,
        transitions: &[safezone_types::PhaseTransition],
    );
}

/// A no-op tick callback for testing.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(
        &mut self,
        _snapshot: &ZoneSnapshot,
        _transitions: &[safezone_types::PhaseTransition],
    ) {
    }
}

/// Run the match loop until a termination condition is met.
///
/// The controller should already be activated; an inactive controller
/// simply idles until `max_ticks` or a stop request ends the run. Each
/// iteration advances the clock by exactly one tick, resolves entity
/// positions for that tick, and hands both to the controller.
///
/// # Errors
///
/// Returns [`RunnerError::Clock`] if the tick counter overflows.
#[allow(clippy::too_many_arguments)]
pub async fn run_match(
    controller: &mut ZoneController,
    clock: &mut TickClock,
    players: &dyn LivePlayerCount,
    positions: &mut dyn PositionSource,
    sink: &mut dyn DamageSink,
    bounds: &MatchBoundsConfig,
    stop: &StopSignal,
    callback: &mut dyn TickCallback,
) -> Result<MatchResult, RunnerError> {
    let mut last_snapshot: Option<ZoneSnapshot> = None;
    let mut total_ticks: u64 = 0;

    info!(
        match_id = %controller.match_id(),
        max_ticks = bounds.max_ticks,
        realtime = bounds.realtime,
        ticks_per_second = clock.ticks_per_second(),
        "Match loop starting"
    );

    loop {
        if stop.is_stop_requested() {
            info!(match_id = %controller.match_id(), "Stop requested");
            return Ok(MatchResult {
                end_reason: MatchEndReason::StopRequested,
                final_snapshot: last_snapshot,
                total_ticks,
            });
        }

        clock.advance()?;
        total_ticks = total_ticks.saturating_add(1);

        let resolved = positions.resolve_positions(clock.tick());
        let transitions = controller.tick(clock, players, &resolved, sink);
        let snapshot = controller.snapshot(clock);

        callback.on_tick(&snapshot, &transitions);

        if snapshot.sub_state.is_terminal() {
            info!(
                match_id = %controller.match_id(),
                tick = snapshot.tick,
                radius = snapshot.radius,
                "Zone finished"
            );
            return Ok(MatchResult {
                end_reason: MatchEndReason::ZoneFinished,
                final_snapshot: Some(snapshot),
                total_ticks,
            });
        }

        if bounds.max_ticks > 0 && total_ticks >= bounds.max_ticks {
            info!(
                match_id = %controller.match_id(),
                tick = snapshot.tick,
                max_ticks = bounds.max_ticks,
                "Tick limit reached"
            );
            return Ok(MatchResult {
                end_reason: MatchEndReason::MaxTicksReached,
                final_snapshot: Some(snapshot),
                total_ticks,
            });
        }

        last_snapshot = Some(snapshot);

        if bounds.realtime {
            tokio::time::sleep(tokio::time::Duration::from_secs_f64(
                clock.tick_duration_seconds(),
            ))
            .await;
        }
    }
}

/// Log the match end sequence.
///
/// Call after [`run_match`] returns to record the final state.
pub fn log_match_end(result: &MatchResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_tick = result.final_snapshot.as_ref().map(|s| s.tick),
        "Match ended"
    );

    if let Some(ref snapshot) = result.final_snapshot {
        info!(
            tick = snapshot.tick,
            sub_state = ?snapshot.sub_state,
            phase_index = snapshot.phase_index,
            radius = snapshot.radius,
            "Final zone snapshot"
        );
    } else {
        warn!("Match ended with no ticks executed");
    }
}
