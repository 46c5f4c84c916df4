// lib/src/config/mod.rs

//! Engine configuration: escalation deadlines and the sweep cadence.
//!
//! Defaults match the documented offsets (5 minutes for emergencies,
//! 15 for routine referrals, a 30 second sweep). A TOML file can replace
//! the defaults and environment variables override both, in that order.

use log::warn;
use models::{RoutingError, RoutingResult, Urgency};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const ENV_EMERGENCY_DEADLINE_MINS: &str = "REFERRAL_EMERGENCY_DEADLINE_MINS";
pub const ENV_ROUTINE_DEADLINE_MINS: &str = "REFERRAL_ROUTINE_DEADLINE_MINS";
pub const ENV_SWEEP_INTERVAL_SECS: &str = "REFERRAL_SWEEP_INTERVAL_SECS";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Minutes a facility has to respond to an Emergency referral.
    pub emergency_deadline_mins: i64,
    /// Minutes a facility has to respond to a Normal referral.
    pub routine_deadline_mins: i64,
    /// Period of the background escalation sweep.
    pub sweep_interval_secs: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        CoreConfig {
            emergency_deadline_mins: 5,
            routine_deadline_mins: 15,
            sweep_interval_secs: 30,
        }
    }
}

impl CoreConfig {
    /// Loads configuration from an optional TOML file, then applies
    /// environment overrides on top.
    pub fn load(path: Option<&Path>) -> RoutingResult<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => CoreConfig::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> RoutingResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            RoutingError::ConfigError(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&raw).map_err(|e| {
            RoutingError::ConfigError(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Environment variables win over file values. Unparseable values are
    /// logged and ignored rather than aborting startup.
    pub fn apply_env_overrides(&mut self) {
        dotenvy::dotenv().ok();
        if let Some(v) = read_env::<i64>(ENV_EMERGENCY_DEADLINE_MINS) {
            self.emergency_deadline_mins = v;
        }
        if let Some(v) = read_env::<i64>(ENV_ROUTINE_DEADLINE_MINS) {
            self.routine_deadline_mins = v;
        }
        if let Some(v) = read_env::<u64>(ENV_SWEEP_INTERVAL_SECS) {
            self.sweep_interval_secs = v;
        }
    }

    pub fn validate(&self) -> RoutingResult<()> {
        if self.emergency_deadline_mins <= 0 || self.routine_deadline_mins <= 0 {
            return Err(RoutingError::ConfigError(
                "escalation deadlines must be positive".to_string(),
            ));
        }
        if self.sweep_interval_secs == 0 {
            return Err(RoutingError::ConfigError(
                "sweep interval must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// How long a facility gets before the referral becomes overdue.
    pub fn deadline_offset(&self, urgency: Urgency) -> chrono::Duration {
        match urgency {
            Urgency::Emergency => chrono::Duration::minutes(self.emergency_deadline_mins),
            Urgency::Normal => chrono::Duration::minutes(self.routine_deadline_mins),
        }
    }

    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_secs)
    }
}

fn read_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("ignoring unparseable value for {}: {:?}", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_deadlines() {
        let config = CoreConfig::default();
        assert_eq!(config.emergency_deadline_mins, 5);
        assert_eq!(config.routine_deadline_mins, 15);
        assert_eq!(config.sweep_interval_secs, 30);
        assert_eq!(
            config.deadline_offset(Urgency::Emergency),
            chrono::Duration::minutes(5)
        );
        assert_eq!(
            config.deadline_offset(Urgency::Normal),
            chrono::Duration::minutes(15)
        );
    }

    #[test]
    fn env_override_wins() {
        std::env::set_var(ENV_SWEEP_INTERVAL_SECS, "7");
        let mut config = CoreConfig::default();
        config.apply_env_overrides();
        std::env::remove_var(ENV_SWEEP_INTERVAL_SECS);
        assert_eq!(config.sweep_interval_secs, 7);
    }

    #[test]
    fn unparseable_env_value_is_ignored() {
        std::env::set_var(ENV_ROUTINE_DEADLINE_MINS, "soon");
        let mut config = CoreConfig::default();
        config.apply_env_overrides();
        std::env::remove_var(ENV_ROUTINE_DEADLINE_MINS);
        assert_eq!(config.routine_deadline_mins, 15);
    }

    #[test]
    fn zero_interval_fails_validation() {
        let config = CoreConfig {
            sweep_interval_secs: 0,
            ..CoreConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RoutingError::ConfigError(_))
        ));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = CoreConfig::from_file(Path::new("/nonexistent/referral.toml")).unwrap_err();
        assert!(matches!(err, RoutingError::ConfigError(_)));
    }
}
