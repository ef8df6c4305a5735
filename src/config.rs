//! Pipeline configuration.
//!
//! Every option has a default so a partial TOML file (or none at all) is
//! valid input. Validation runs once at startup; a configuration error is the
//! only error that is fatal to the process.
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logging::LogFormat;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("critical threshold ({critical_km} km) must be positive and below the safety threshold ({safety_km} km)")]
    InvalidThreshold { critical_km: f64, safety_km: f64 },

    #[error("maneuver threshold ({maneuver}) must be below act threshold ({act}), both within [0, 1]")]
    InvalidRiskThresholds { maneuver: f64, act: f64 },

    #[error("parameter '{name}' has invalid value {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Objects closer than this are screened in (km).
    pub safety_threshold_km: f64,
    /// Objects closer than this are critical (km).
    pub critical_threshold_km: f64,
    /// Risk at or above which a conjunction is monitored.
    pub maneuver_threshold: f64,
    /// Risk at or above which an avoidance maneuver is planned.
    pub act_threshold: f64,
    /// Host wet mass (kg).
    pub satellite_mass_kg: f64,
    /// Thruster specific impulse (s).
    pub specific_impulse_s: f64,
    /// 1-sigma position uncertainty assumed for objects without covariance (km).
    pub default_uncertainty_km: f64,
    /// 1-sigma position uncertainty of the host's own navigation solution (km).
    pub host_uncertainty_km: f64,
    /// Separation an avoidance maneuver should open up at closest approach (km).
    pub target_miss_distance_km: f64,
    /// Lead time used when closest approach cannot be extrapolated (s).
    pub default_lead_time_s: f64,
    /// Strength of the uncertainty inflation applied to base risk.
    pub uncertainty_gain: f64,
    /// Output format for [`crate::logging::init`].
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            safety_threshold_km: 50.0,
            critical_threshold_km: 10.0,
            maneuver_threshold: 0.5,
            act_threshold: 0.8,
            satellite_mass_kg: 12.0,
            specific_impulse_s: 60.0,
            default_uncertainty_km: 3.0,
            host_uncertainty_km: 0.1,
            target_miss_distance_km: 10.0,
            default_lead_time_s: 4.5 * 3600.0,
            uncertainty_gain: 3.0,
            log_format: LogFormat::Text,
        }
    }
}

impl Config {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Check every invariant the pipeline relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (critical, safety) = (self.critical_threshold_km, self.safety_threshold_km);
        if !(critical.is_finite() && safety.is_finite() && critical > 0.0 && critical < safety) {
            return Err(ConfigError::InvalidThreshold { critical_km: critical, safety_km: safety });
        }

        let (maneuver, act) = (self.maneuver_threshold, self.act_threshold);
        let unit = 0.0..=1.0;
        if !(unit.contains(&maneuver) && unit.contains(&act) && maneuver < act) {
            return Err(ConfigError::InvalidRiskThresholds { maneuver, act });
        }

        positive("satellite_mass_kg", self.satellite_mass_kg)?;
        positive("specific_impulse_s", self.specific_impulse_s)?;
        positive("target_miss_distance_km", self.target_miss_distance_km)?;
        positive("default_lead_time_s", self.default_lead_time_s)?;
        non_negative("default_uncertainty_km", self.default_uncertainty_km)?;
        non_negative("host_uncertainty_km", self.host_uncertainty_km)?;
        non_negative("uncertainty_gain", self.uncertainty_gain)?;
        Ok(())
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter { name, value })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = Config::from_toml_str(
            "safety_threshold_km = 25.0\nsatellite_mass_kg = 4.0\n",
        )
        .unwrap();
        assert_eq!(config.safety_threshold_km, 25.0);
        assert_eq!(config.satellite_mass_kg, 4.0);
        assert_eq!(config.critical_threshold_km, 10.0);
        assert_eq!(config.act_threshold, 0.8);
    }

    #[test]
    fn test_inverted_distance_thresholds_rejected() {
        let config = Config {
            critical_threshold_km: 50.0,
            safety_threshold_km: 10.0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidThreshold { .. })));

        let equal = Config {
            critical_threshold_km: 20.0,
            safety_threshold_km: 20.0,
            ..Config::default()
        };
        assert!(matches!(equal.validate(), Err(ConfigError::InvalidThreshold { .. })));
    }

    #[test]
    fn test_inverted_risk_thresholds_rejected() {
        let config = Config {
            maneuver_threshold: 0.9,
            act_threshold: 0.8,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidRiskThresholds { .. })));
    }

    #[test]
    fn test_bad_parameter_reported_by_name() {
        let config = Config {
            specific_impulse_s: 0.0,
            ..Config::default()
        };
        match config.validate() {
            Err(ConfigError::InvalidParameter { name, .. }) => assert_eq!(name, "specific_impulse_s"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_log_format_from_toml() {
        let config = Config::from_toml_str("log_format = \"json\"\n").unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(Config::default().log_format, LogFormat::Text);
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("astria-config-{}.toml", std::process::id()));
        std::fs::write(&path, "critical_threshold_km = 5.0\ndefault_lead_time_s = 3600.0\n").unwrap();
        let config = Config::from_file(&path);
        std::fs::remove_file(&path).unwrap();
        let config = config.unwrap();
        assert_eq!(config.critical_threshold_km, 5.0);
        assert_eq!(config.default_lead_time_s, 3600.0);

        assert!(matches!(
            Config::from_file(std::env::temp_dir().join("astria-missing.toml")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_unknown_key_is_a_parse_error() {
        assert!(matches!(
            Config::from_toml_str("safety_radius = 3.0"),
            Err(ConfigError::Parse(_))
        ));
    }
}
