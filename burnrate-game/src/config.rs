//! Runtime-tunable engine parameters.
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    COOLDOWN_PRUNE_GRACE_SECS, DECAY_INTERVAL_SECS, EVENT_MEMORY_CAPACITY, FOREGROUND_TICK_SECS,
    OFFLINE_CAP_SECS, RUNWAY_PER_DAY, SECONDS_PER_DAY, TICK_EVENT_PROBABILITY_SCALE,
};
use crate::decay::{DecayRates, TimeSimulation};
use crate::events::RandomEventService;
use crate::numbers::i64_to_f64;
use crate::ticker::Ticker;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineConfigError {
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: f64,
        value: f64,
    },
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("config JSON is invalid: {0}")]
    Parse(String),
}

/// Every field falls back to the constant of the same name when omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub decay: DecayRates,
    #[serde(default = "EngineConfig::default_decay_interval_secs")]
    pub decay_interval_secs: i64,
    #[serde(default = "EngineConfig::default_tick_interval_secs")]
    pub tick_interval_secs: i64,
    #[serde(default = "EngineConfig::default_offline_cap_secs")]
    pub offline_cap_secs: i64,
    #[serde(default = "EngineConfig::default_runway_per_day")]
    pub runway_per_day: f64,
    #[serde(default = "EngineConfig::default_event_memory_capacity")]
    pub event_memory_capacity: usize,
    #[serde(default = "EngineConfig::default_tick_event_scale")]
    pub tick_event_scale: f64,
    #[serde(default = "EngineConfig::default_cooldown_prune_grace_secs")]
    pub cooldown_prune_grace_secs: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            decay: DecayRates::default(),
            decay_interval_secs: Self::default_decay_interval_secs(),
            tick_interval_secs: Self::default_tick_interval_secs(),
            offline_cap_secs: Self::default_offline_cap_secs(),
            runway_per_day: Self::default_runway_per_day(),
            event_memory_capacity: Self::default_event_memory_capacity(),
            tick_event_scale: Self::default_tick_event_scale(),
            cooldown_prune_grace_secs: Self::default_cooldown_prune_grace_secs(),
        }
    }
}

impl EngineConfig {
    const MAX_OFFLINE_CAP_SECS: i64 = 30 * SECONDS_PER_DAY;
    const MAX_RUNWAY_PER_DAY: f64 = 30.0;

    const fn default_decay_interval_secs() -> i64 {
        DECAY_INTERVAL_SECS
    }

    const fn default_tick_interval_secs() -> i64 {
        FOREGROUND_TICK_SECS
    }

    const fn default_offline_cap_secs() -> i64 {
        OFFLINE_CAP_SECS
    }

    const fn default_runway_per_day() -> f64 {
        RUNWAY_PER_DAY
    }

    const fn default_event_memory_capacity() -> usize {
        EVENT_MEMORY_CAPACITY
    }

    const fn default_tick_event_scale() -> f64 {
        TICK_EVENT_PROBABILITY_SCALE
    }

    const fn default_cooldown_prune_grace_secs() -> i64 {
        COOLDOWN_PRUNE_GRACE_SECS
    }

    /// Parse and validate a config document.
    ///
    /// # Errors
    ///
    /// Returns `EngineConfigError::Parse` for malformed JSON, or the first
    /// invariant the parsed values violate.
    pub fn from_json(json: &str) -> Result<Self, EngineConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| EngineConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns `EngineConfigError` when any field violates the documented bounds.
    pub fn validate(&self) -> Result<(), EngineConfigError> {
        self.validate_decay()?;
        validate_min("decay_interval_secs", self.decay_interval_secs, 1)?;
        validate_min("tick_interval_secs", self.tick_interval_secs, 1)?;
        validate_min("cooldown_prune_grace_secs", self.cooldown_prune_grace_secs, 0)?;
        if !(0..=Self::MAX_OFFLINE_CAP_SECS).contains(&self.offline_cap_secs) {
            return Err(EngineConfigError::RangeViolation {
                field: "offline_cap_secs",
                min: 0.0,
                max: i64_to_f64(Self::MAX_OFFLINE_CAP_SECS),
                value: i64_to_f64(self.offline_cap_secs),
            });
        }
        validate_range("runway_per_day", self.runway_per_day, 0.0, Self::MAX_RUNWAY_PER_DAY)?;
        validate_range("tick_event_scale", self.tick_event_scale, 0.0, 1.0)?;
        Ok(())
    }

    fn validate_decay(&self) -> Result<(), EngineConfigError> {
        const FIELDS: [&str; 5] = [
            "decay.energy",
            "decay.health",
            "decay.happiness",
            "decay.social",
            "decay.burnout",
        ];
        for (field, (_, rate)) in FIELDS.into_iter().zip(self.decay.entries()) {
            if !rate.is_finite() {
                return Err(EngineConfigError::NotFinite { field });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn time_simulation(&self) -> TimeSimulation {
        TimeSimulation::new(
            self.decay,
            self.decay_interval_secs,
            self.offline_cap_secs,
            self.runway_per_day,
        )
    }

    #[must_use]
    pub fn event_service(&self) -> RandomEventService {
        RandomEventService::new(self.event_memory_capacity, self.tick_event_scale)
    }

    #[must_use]
    pub fn ticker(&self) -> Ticker {
        Ticker::new(self.tick_interval_secs)
    }

    #[must_use]
    pub fn cooldown_prune_grace(&self) -> TimeDelta {
        TimeDelta::try_seconds(self.cooldown_prune_grace_secs).unwrap_or(TimeDelta::MAX)
    }
}

fn validate_min(field: &'static str, value: i64, min: i64) -> Result<(), EngineConfigError> {
    if value < min {
        return Err(EngineConfigError::MinViolation {
            field,
            min: i64_to_f64(min),
            value: i64_to_f64(value),
        });
    }
    Ok(())
}

fn validate_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), EngineConfigError> {
    if !value.is_finite() {
        return Err(EngineConfigError::NotFinite { field });
    }
    if !(min..=max).contains(&value) {
        return Err(EngineConfigError::RangeViolation {
            field,
            min,
            max,
            value,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid_and_match_constants() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.decay_interval_secs, DECAY_INTERVAL_SECS);
        assert_eq!(config.event_service().capacity(), EVENT_MEMORY_CAPACITY);
        assert_eq!(config.ticker().interval(), TimeDelta::seconds(60));
        assert_eq!(config.cooldown_prune_grace(), TimeDelta::hours(24));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config =
            EngineConfig::from_json(r#"{ "tick_event_scale": 0.1, "decay": { "energy": -1.0 } }"#)
                .unwrap();
        assert!((config.tick_event_scale - 0.1).abs() < f64::EPSILON);
        assert!((config.decay.energy + 1.0).abs() < f64::EPSILON);
        assert!((config.decay.burnout - DecayRates::default().burnout).abs() < f64::EPSILON);
        assert_eq!(config.offline_cap_secs, OFFLINE_CAP_SECS);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut config = EngineConfig::default();
        config.tick_event_scale = 1.5;
        assert!(matches!(
            config.validate(),
            Err(EngineConfigError::RangeViolation {
                field: "tick_event_scale",
                ..
            })
        ));

        let mut config = EngineConfig::default();
        config.decay_interval_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(EngineConfigError::MinViolation {
                field: "decay_interval_secs",
                ..
            })
        ));

        let mut config = EngineConfig::default();
        config.decay.social = f64::NAN;
        assert_eq!(
            config.validate(),
            Err(EngineConfigError::NotFinite {
                field: "decay.social"
            })
        );
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            EngineConfig::from_json("{ nope"),
            Err(EngineConfigError::Parse(_))
        ));
    }
}
