use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::TempoError;

/// Default long press threshold in seconds
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Moment at which the short branch is first activated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivateOn {
    Press,
    #[default]
    Release,
}

impl ActivateOn {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivateOn::Press => "press",
            ActivateOn::Release => "release",
        }
    }
}

impl fmt::Display for ActivateOn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ActivateOn {
    type Err = TempoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "press" => Ok(ActivateOn::Press),
            "release" => Ok(ActivateOn::Release),
            other => Err(TempoError::Config(format!(
                "Received invalid activate-on value {other:?}, expected \"press\" or \"release\""
            ))),
        }
    }
}

/// Threshold and activation policy of a Tempo action
///
/// Fields are private so every change goes through the validating setters.
/// A rejected value never replaces the previous configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoConfig {
    threshold: f64,
    activate_on: ActivateOn,
}

impl Default for TempoConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            activate_on: ActivateOn::default(),
        }
    }
}

impl TempoConfig {
    pub fn new(threshold: f64, activate_on: ActivateOn) -> Result<Self, TempoError> {
        validate_threshold(threshold)?;
        Ok(Self {
            threshold,
            activate_on,
        })
    }

    /// Builds a configuration from the textual form used in profiles
    pub fn parse(threshold: f64, activate_on: &str) -> Result<Self, TempoError> {
        Self::new(threshold, activate_on.parse()?)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Saturates at `Duration::MAX`; validated thresholds always convert.
    pub fn threshold_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.threshold).unwrap_or(Duration::MAX)
    }

    pub fn activate_on(&self) -> ActivateOn {
        self.activate_on
    }

    pub fn set_threshold(&mut self, threshold: f64) -> Result<(), TempoError> {
        validate_threshold(threshold)?;
        self.threshold = threshold;
        Ok(())
    }

    pub fn set_activate_on(&mut self, activate_on: &str) -> Result<(), TempoError> {
        self.activate_on = activate_on.parse()?;
        Ok(())
    }
}

fn validate_threshold(threshold: f64) -> Result<(), TempoError> {
    if !(threshold.is_finite() && threshold > 0.0) {
        return Err(TempoError::Config(format!(
            "Threshold must be a positive number of seconds, got {threshold}"
        )));
    }
    Duration::try_from_secs_f64(threshold)
        .map(|_| ())
        .map_err(|e| TempoError::Config(format!("Threshold {threshold}s is out of range: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_a_fresh_action() {
        let config = TempoConfig::default();
        assert_eq!(config.threshold(), 0.5);
        assert_eq!(config.activate_on(), ActivateOn::Release);
        assert_eq!(config.threshold_duration(), Duration::from_millis(500));
    }

    #[test]
    fn rejects_unknown_activation_moment() {
        let mut config = TempoConfig::parse(0.8, "press").unwrap();

        let err = config.set_activate_on("hold").unwrap_err();
        assert!(matches!(err, TempoError::Config(_)));
        assert_eq!(config.activate_on(), ActivateOn::Press);
        assert_eq!(config.threshold(), 0.8);

        assert!(TempoConfig::parse(0.5, "Release").is_err());
    }

    #[test]
    fn rejects_non_positive_threshold() {
        let mut config = TempoConfig::default();

        for bad in [0.0, -0.1, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                config.set_threshold(bad),
                Err(TempoError::Config(_))
            ));
        }
        assert_eq!(config.threshold(), DEFAULT_THRESHOLD);

        config.set_threshold(1.25).unwrap();
        assert_eq!(config.threshold(), 1.25);
    }

    #[test]
    fn rejects_threshold_beyond_duration_range() {
        let mut config = TempoConfig::default();

        assert!(matches!(
            config.set_threshold(1e20),
            Err(TempoError::Config(_))
        ));
        assert!(matches!(
            TempoConfig::parse(f64::MAX, "press"),
            Err(TempoError::Config(_))
        ));
        assert_eq!(config.threshold(), DEFAULT_THRESHOLD);

        // Large but representable values stay valid
        config.set_threshold(1e9).unwrap();
        assert_eq!(config.threshold_duration(), Duration::from_secs(1_000_000_000));
    }

    #[test]
    fn activation_moment_text_form() {
        assert_eq!("press".parse::<ActivateOn>().unwrap(), ActivateOn::Press);
        assert_eq!(ActivateOn::Release.to_string(), "release");
    }
}
