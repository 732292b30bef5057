//! Match engine binary for the shrinking safe zone.
//!
//! This is the demo entry point that wires the zone controller to
//! scripted match collaborators and runs one full zone lifecycle. It
//! loads configuration, activates the zone, and drives the tick loop
//! until the zone finishes or a bound is hit.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `safezone-config.yaml`
//! 3. Create the tick clock from the clock config
//! 4. Build the scripted roster, positions, and damage sink
//! 5. Create and activate the zone controller
//! 6. Run the match loop
//! 7. Log the result

mod error;
mod sources;

use std::path::Path;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use safezone_core::clock::TickClock;
use safezone_core::config::MatchConfig;
use safezone_core::controller::ZoneController;
use safezone_core::runner::{self, StopSignal};
use safezone_types::Position;

use crate::error::EngineError;
use crate::sources::{DemoCallback, LoggingSink, ScriptedPositions, ScriptedRoster};

/// Application entry point for the match engine.
///
/// # Errors
///
/// Returns an error if any initialization step or the match run fails.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("safezone-engine starting");

    // 2. Load configuration.
    let config = load_config()?;
    info!(
        start_radius = config.zone.start_radius,
        end_radius = config.zone.end_radius,
        shrink_steps = config.zone.shrink_steps,
        ticks_per_second = config.clock.ticks_per_second,
        "Configuration loaded"
    );

    // 3. Create the tick clock.
    let mut clock = TickClock::new(config.clock.ticks_per_second)?;
    info!("Tick clock initialized");

    // 4. Build the scripted match collaborators. One player falls
    //    every 30 in-game seconds so the pause delay ramp is visible.
    let center = Position::default();
    let eliminate_every = u64::from(config.clock.ticks_per_second).saturating_mul(30);
    let roster = Arc::new(ScriptedRoster::new(
        config.zone.max_shrink_delay_players,
        eliminate_every,
    ));
    let mut positions = ScriptedPositions::new(center);
    let mut sink = LoggingSink::default();
    info!(
        live_players = config.zone.max_shrink_delay_players,
        eliminate_every_ticks = eliminate_every,
        "Scripted roster ready"
    );

    // 5. Create and activate the zone controller.
    let mut controller = ZoneController::new(config.zone, center)?;
    controller.activate(&clock)?;
    info!(match_id = %controller.match_id(), "Zone activated");

    // 6. Run the match loop.
    let stop = StopSignal::new();
    let mut callback = DemoCallback::new(Arc::clone(&roster));
    let result = runner::run_match(
        &mut controller,
        &mut clock,
        roster.as_ref(),
        &mut positions,
        &mut sink,
        &config.bounds,
        &stop,
        &mut callback,
    )
    .await?;

    // 7. Log results.
    runner::log_match_end(&result);
    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        total_damage_applied = sink.total_applied(),
        "safezone-engine shutdown complete"
    );

    Ok(())
}

/// Load the match configuration from `safezone-config.yaml`.
///
/// Looks for the config file relative to the current working directory.
fn load_config() -> Result<MatchConfig, EngineError> {
    let config_path = Path::new("safezone-config.yaml");
    if config_path.exists() {
        let config = MatchConfig::from_file(config_path)?;
        Ok(config)
    } else {
        info!("Config file not found, using defaults");
        Ok(MatchConfig::default())
    }
}
