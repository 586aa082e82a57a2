//! Simulation settings.
//!
//! Settings are read once from a flat YAML file and handed to every
//! generation call as an immutable [`SimulationConfig`]:
//!
//! ```yaml
//! trading_day_start: "09:30"
//! trading_day_end: "16:00"
//! base_value: 100.0
//! daily_shift_min: 0.0
//! daily_shift_max: 0.02
//! # ...
//! ```

use std::path::Path;

use chrono::NaiveTime;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::minute_bar::MAX_ROUND_PRECISION;
use crate::session::TradingSession;
use crate::tick::ShiftParams;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the settings file.
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    /// The YAML is malformed or a required key is missing.
    #[error("failed to parse config YAML: {0}")]
    Parse(#[from] serde_yaml_bw::Error),

    /// A value parsed but is outside its legal range.
    #[error("config validation failed: {0}")]
    Validation(String),
}

/// Every knob of the bar generator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationConfig {
    #[serde(deserialize_with = "hh_mm")]
    pub trading_day_start: NaiveTime,
    #[serde(deserialize_with = "hh_mm")]
    pub trading_day_end: NaiveTime,
    /// Seed price for the first simulated day.
    pub base_value: f64,

    pub daily_shift_min: f64,
    pub daily_shift_max: f64,
    pub daily_surge_probability: f64,
    pub daily_surge_limit: f64,

    pub minute_shift_min: f64,
    pub minute_shift_max: f64,
    pub minute_surge_probability: f64,
    pub minute_surge_limit: f64,

    #[serde(default = "default_ticks_per_minute_min")]
    pub ticks_per_minute_min: usize,
    #[serde(default = "default_ticks_per_minute_max")]
    pub ticks_per_minute_max: usize,
    #[serde(default = "default_volume_min")]
    pub volume_min: u64,
    #[serde(default = "default_volume_max")]
    pub volume_max: u64,

    /// Decimal places kept on every generated price.
    pub round_precision: u32,
}

fn default_ticks_per_minute_min() -> usize {
    0
}

fn default_ticks_per_minute_max() -> usize {
    5
}

fn default_volume_min() -> u64 {
    1
}

fn default_volume_max() -> u64 {
    1000
}

fn hh_mm<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(serde::de::Error::custom)
}

impl SimulationConfig {
    /// Parse and validate settings from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = serde_yaml_bw::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Perturbation used to gap the previous close into a new session.
    pub fn daily_shift(&self) -> ShiftParams {
        ShiftParams {
            shift_min: self.daily_shift_min,
            shift_max: self.daily_shift_max,
            surge_probability: self.daily_surge_probability,
            surge_limit: self.daily_surge_limit,
        }
    }

    /// Perturbation applied to every intra-minute tick.
    pub fn minute_shift(&self) -> ShiftParams {
        ShiftParams {
            shift_min: self.minute_shift_min,
            shift_max: self.minute_shift_max,
            surge_probability: self.minute_surge_probability,
            surge_limit: self.minute_surge_limit,
        }
    }

    pub fn session(&self) -> TradingSession {
        TradingSession::new(self.trading_day_start, self.trading_day_end)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_value.is_finite() && self.base_value > 0.0) {
            return Err(ConfigError::Validation(format!(
                "base_value must be a positive number, got {}",
                self.base_value
            )));
        }
        check_shift("daily", &self.daily_shift())?;
        check_shift("minute", &self.minute_shift())?;

        if self.ticks_per_minute_min > self.ticks_per_minute_max {
            return Err(ConfigError::Validation(format!(
                "ticks_per_minute_min ({}) exceeds ticks_per_minute_max ({})",
                self.ticks_per_minute_min, self.ticks_per_minute_max
            )));
        }
        if self.round_precision > MAX_ROUND_PRECISION {
            return Err(ConfigError::Validation(format!(
                "round_precision must be at most {MAX_ROUND_PRECISION}, got {}",
                self.round_precision
            )));
        }
        if self.volume_min == 0 {
            return Err(ConfigError::Validation("volume_min must be at least 1".into()));
        }
        if self.volume_min > self.volume_max {
            return Err(ConfigError::Validation(format!(
                "volume_min ({}) exceeds volume_max ({})",
                self.volume_min, self.volume_max
            )));
        }
        Ok(())
    }
}

fn check_shift(prefix: &str, p: &ShiftParams) -> Result<(), ConfigError> {
    let finite = [p.shift_min, p.shift_max, p.surge_probability, p.surge_limit]
        .iter()
        .all(|v| v.is_finite());
    if !finite {
        return Err(ConfigError::Validation(format!("{prefix}_* values must be finite")));
    }
    if p.shift_min < 0.0 || p.shift_min > p.shift_max {
        return Err(ConfigError::Validation(format!(
            "{prefix}_shift range [{}, {}] is invalid",
            p.shift_min, p.shift_max
        )));
    }
    if !(0.0..=1.0).contains(&p.surge_probability) {
        return Err(ConfigError::Validation(format!(
            "{prefix}_surge_probability must be within [0, 1], got {}",
            p.surge_probability
        )));
    }
    if p.surge_limit < 0.0 {
        return Err(ConfigError::Validation(format!(
            "{prefix}_surge_limit must not be negative, got {}",
            p.surge_limit
        )));
    }
    Ok(())
}

/// Load settings from a YAML file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SimulationConfig, ConfigError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    SimulationConfig::from_yaml_str(&contents)
}

#[cfg(test)]
pub(crate) fn test_config() -> SimulationConfig {
    SimulationConfig {
        trading_day_start: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
        trading_day_end: NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
        base_value: 100.0,
        daily_shift_min: 0.0,
        daily_shift_max: 0.02,
        daily_surge_probability: 0.05,
        daily_surge_limit: 0.1,
        minute_shift_min: 0.0,
        minute_shift_max: 0.001,
        minute_surge_probability: 0.001,
        minute_surge_limit: 0.05,
        ticks_per_minute_min: 0,
        ticks_per_minute_max: 5,
        volume_min: 1,
        volume_max: 1000,
        round_precision: 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
trading_day_start: "09:30"
trading_day_end: "16:00"
base_value: 100.0
daily_shift_min: 0.0
daily_shift_max: 0.02
daily_surge_probability: 0.05
daily_surge_limit: 0.1
minute_shift_min: 0.0
minute_shift_max: 0.001
minute_surge_probability: 0.001
minute_surge_limit: 0.05
ticks_per_minute_min: 2
ticks_per_minute_max: 8
volume_min: 10
volume_max: 500
round_precision: 2
"#;

    #[test]
    fn parses_full_settings() {
        let cfg = SimulationConfig::from_yaml_str(FULL).unwrap();
        assert_eq!(cfg.trading_day_start, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(cfg.trading_day_end, NaiveTime::from_hms_opt(16, 0, 0).unwrap());
        assert_eq!(cfg.ticks_per_minute_max, 8);
        assert_eq!(cfg.volume_min, 10);
        assert_eq!(cfg.minute_shift().shift_max, 0.001);
        assert_eq!(cfg.daily_shift().surge_probability, 0.05);
    }

    #[test]
    fn optional_keys_fall_back_to_defaults() {
        let yaml: String = FULL
            .lines()
            .filter(|l| !l.starts_with("ticks_per_minute") && !l.starts_with("volume"))
            .map(|l| format!("{l}\n"))
            .collect();
        let cfg = SimulationConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(cfg.ticks_per_minute_min, 0);
        assert_eq!(cfg.ticks_per_minute_max, 5);
        assert_eq!(cfg.volume_min, 1);
        assert_eq!(cfg.volume_max, 1000);
    }

    #[test]
    fn missing_required_key_is_fatal() {
        let yaml = FULL.replace("base_value: 100.0\n", "");
        let err = SimulationConfig::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("base_value"));
    }

    #[test]
    fn rejects_bad_session_time() {
        let yaml = FULL.replace("\"16:00\"", "\"4pm\"");
        assert!(matches!(
            SimulationConfig::from_yaml_str(&yaml),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn rejects_inverted_ranges() {
        let yaml = FULL.replace("volume_min: 10", "volume_min: 900");
        assert!(matches!(
            SimulationConfig::from_yaml_str(&yaml),
            Err(ConfigError::Validation(_))
        ));

        let yaml = FULL.replace("minute_shift_min: 0.0", "minute_shift_min: 0.5");
        assert!(matches!(
            SimulationConfig::from_yaml_str(&yaml),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn rejects_probability_above_one() {
        let yaml = FULL.replace("daily_surge_probability: 0.05", "daily_surge_probability: 1.5");
        assert!(matches!(
            SimulationConfig::from_yaml_str(&yaml),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn rejects_unrepresentable_precision() {
        let yaml = FULL.replace("round_precision: 2", "round_precision: 400");
        let err = SimulationConfig::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("round_precision"));

        let yaml = FULL.replace("round_precision: 2", "round_precision: 15");
        assert_eq!(SimulationConfig::from_yaml_str(&yaml).unwrap().round_precision, 15);
    }

    #[test]
    fn load_config_reports_path() {
        let err = load_config("/definitely/not/here.yaml").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.yaml"));
    }
}
