//! Configuration loading and typed config structures for the zone controller.
//!
//! The canonical configuration lives in `safezone-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror
//! the YAML structure and provides a loader that reads and validates the
//! file.
//!
//! Validation is strict: an invalid [`ZoneConfig`] fails the load with a
//! [`ConfigError`] and the match must not start. Out-of-range values are
//! never clamped to something "safe" -- a zone with incoherent geometry
//! is worse than a match that refuses to begin.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// `end_radius` must be strictly smaller than `start_radius`.
    #[error("end_radius ({end_radius}) must be less than start_radius ({start_radius})")]
    RadiusOrder {
        /// Configured start radius.
        start_radius: f64,
        /// Configured end radius.
        end_radius: f64,
    },

    /// Radii must be finite and non-negative.
    #[error("radius values must be finite and non-negative (start: {start_radius}, end: {end_radius})")]
    RadiusRange {
        /// Configured start radius.
        start_radius: f64,
        /// Configured end radius.
        end_radius: f64,
    },

    /// At least one shrink step is required.
    #[error("shrink_steps must be at least 1")]
    NoShrinkSteps,

    /// A duration field is negative or non-finite.
    #[error("{field} must be finite and non-negative (got {value})")]
    NegativeDuration {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// The shrink duration must be strictly positive so interpolation
    /// is well-defined.
    #[error("shrink_duration must be greater than 0 (got {value})")]
    NonPositiveShrinkDuration {
        /// The rejected value.
        value: f64,
    },

    /// `min_shrink_delay` must not exceed `max_shrink_delay`.
    #[error("min_shrink_delay ({min}) must not exceed max_shrink_delay ({max})")]
    DelayOrder {
        /// Configured minimum delay.
        min: f64,
        /// Configured maximum delay.
        max: f64,
    },

    /// `min_shrink_delay_players` must be strictly below
    /// `max_shrink_delay_players`.
    #[error("min_shrink_delay_players ({min}) must be less than max_shrink_delay_players ({max})")]
    PlayerBandOrder {
        /// Configured lower player bound.
        min: u32,
        /// Configured upper player bound.
        max: u32,
    },

    /// The damage tick interval must be strictly positive.
    #[error("damage_tick_interval must be greater than 0 (got {value})")]
    NonPositiveDamageInterval {
        /// The rejected value.
        value: f64,
    },

    /// A config write was attempted after the controller activated.
    #[error("zone config is locked after activation; override rejected")]
    ActiveOverride,
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level match configuration.
///
/// Mirrors the structure of `safezone-config.yaml`. All fields have
/// defaults matching the standard tuning table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MatchConfig {
    /// Zone shrink tuning.
    #[serde(default)]
    pub zone: ZoneConfig,

    /// Authoritative clock settings.
    #[serde(default)]
    pub clock: ClockConfig,

    /// Match run boundaries.
    #[serde(default)]
    pub bounds: MatchBoundsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl MatchConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or a
    /// validation variant if the zone tuning violates an invariant.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// a validation variant if the zone tuning violates an invariant.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.zone.validate()?;
        Ok(config)
    }
}

/// Tuning data for the shrinking zone.
///
/// Loaded once before activation and immutable afterwards. All durations
/// and delays are in seconds; radii are in world units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Radius of the playable circle at match start.
    #[serde(default = "default_start_radius")]
    pub start_radius: f64,

    /// Radius of the final circle.
    #[serde(default = "default_end_radius")]
    pub end_radius: f64,

    /// Number of shrink steps from start radius to end radius.
    #[serde(default = "default_shrink_steps")]
    pub shrink_steps: u32,

    /// Seconds from activation to the first announcement.
    #[serde(default = "default_shrink_start_delay")]
    pub shrink_start_delay: f64,

    /// Shortest possible wait between shrink steps (many survivors).
    #[serde(default = "default_min_shrink_delay")]
    pub min_shrink_delay: f64,

    /// Longest possible wait between shrink steps (few survivors).
    #[serde(default = "default_max_shrink_delay")]
    pub max_shrink_delay: f64,

    /// Seconds a single shrink step takes.
    #[serde(default = "default_shrink_duration")]
    pub shrink_duration: f64,

    /// Seconds of warning before each shrink step begins.
    #[serde(default = "default_shrink_announce_duration")]
    pub shrink_announce_duration: f64,

    /// Hit points applied per damage tick to entities outside the zone.
    #[serde(default = "default_damage_per_tick")]
    pub damage_per_tick: u32,

    /// Seconds an entity must spend outside the zone per damage tick.
    #[serde(default = "default_damage_tick_interval")]
    pub damage_tick_interval: f64,

    /// At or below this live player count the pause delay is
    /// `max_shrink_delay`.
    #[serde(default = "default_min_shrink_delay_players")]
    pub min_shrink_delay_players: u32,

    /// At or above this live player count the pause delay is
    /// `min_shrink_delay`.
    #[serde(default = "default_max_shrink_delay_players")]
    pub max_shrink_delay_players: u32,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            start_radius: default_start_radius(),
            end_radius: default_end_radius(),
            shrink_steps: default_shrink_steps(),
            shrink_start_delay: default_shrink_start_delay(),
            min_shrink_delay: default_min_shrink_delay(),
            max_shrink_delay: default_max_shrink_delay(),
            shrink_duration: default_shrink_duration(),
            shrink_announce_duration: default_shrink_announce_duration(),
            damage_per_tick: default_damage_per_tick(),
            damage_tick_interval: default_damage_tick_interval(),
            min_shrink_delay_players: default_min_shrink_delay_players(),
            max_shrink_delay_players: default_max_shrink_delay_players(),
        }
    }
}

impl ZoneConfig {
    /// Validate every tuning invariant.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant as a [`ConfigError`]. Values
    /// are never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.start_radius.is_finite()
            || !self.end_radius.is_finite()
            || self.start_radius < 0.0
            || self.end_radius < 0.0
        {
            return Err(ConfigError::RadiusRange {
                start_radius: self.start_radius,
                end_radius: self.end_radius,
            });
        }
        if self.end_radius >= self.start_radius {
            return Err(ConfigError::RadiusOrder {
                start_radius: self.start_radius,
                end_radius: self.end_radius,
            });
        }
        if self.shrink_steps < 1 {
            return Err(ConfigError::NoShrinkSteps);
        }
        for (field, value) in [
            ("shrink_start_delay", self.shrink_start_delay),
            ("shrink_announce_duration", self.shrink_announce_duration),
            ("min_shrink_delay", self.min_shrink_delay),
            ("max_shrink_delay", self.max_shrink_delay),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::NegativeDuration { field, value });
            }
        }
        if !self.shrink_duration.is_finite() || self.shrink_duration <= 0.0 {
            return Err(ConfigError::NonPositiveShrinkDuration {
                value: self.shrink_duration,
            });
        }
        if self.min_shrink_delay > self.max_shrink_delay {
            return Err(ConfigError::DelayOrder {
                min: self.min_shrink_delay,
                max: self.max_shrink_delay,
            });
        }
        if self.min_shrink_delay_players >= self.max_shrink_delay_players {
            return Err(ConfigError::PlayerBandOrder {
                min: self.min_shrink_delay_players,
                max: self.max_shrink_delay_players,
            });
        }
        if !self.damage_tick_interval.is_finite() || self.damage_tick_interval <= 0.0 {
            return Err(ConfigError::NonPositiveDamageInterval {
                value: self.damage_tick_interval,
            });
        }
        Ok(())
    }
}

/// Authoritative clock configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClockConfig {
    /// Fixed simulation ticks per real-time second.
    #[serde(default = "default_ticks_per_second")]
    pub ticks_per_second: u32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: default_ticks_per_second(),
        }
    }
}

/// Match run boundary configuration.
///
/// A `max_ticks` of 0 means unlimited; the run then ends when the zone
/// finishes or a stop is requested.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MatchBoundsConfig {
    /// Maximum number of ticks before the run ends (0 = unlimited).
    #[serde(default)]
    pub max_ticks: u64,

    /// Whether the runner sleeps one tick interval per tick. Disable
    /// for fast-forward simulation in tests and tools.
    #[serde(default = "default_true")]
    pub realtime: bool,
}

impl Default for MatchBoundsConfig {
    fn default() -> Self {
        Self {
            max_ticks: 0,
            realtime: true,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_start_radius() -> f64 {
    120.0
}

const fn default_end_radius() -> f64 {
    30.0
}

const fn default_shrink_steps() -> u32 {
    6
}

const fn default_shrink_start_delay() -> f64 {
    60.0
}

const fn default_min_shrink_delay() -> f64 {
    45.0
}

const fn default_max_shrink_delay() -> f64 {
    120.0
}

const fn default_shrink_duration() -> f64 {
    30.0
}

const fn default_shrink_announce_duration() -> f64 {
    45.0
}

const fn default_damage_per_tick() -> u32 {
    3
}

const fn default_damage_tick_interval() -> f64 {
    1.5
}

const fn default_min_shrink_delay_players() -> u32 {
    2
}

const fn default_max_shrink_delay_players() -> u32 {
    60
}

const fn default_ticks_per_second() -> u32 {
    30
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}
