//! JSON description of the cars entered into a race.

use std::{collections::HashSet, fs, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use racetrack_core::SpeedLimits;
use racetrack_system_steering::PolicyKind;
use serde::Deserialize;
use thiserror::Error;

/// Race settings read from a configuration file.
///
/// Every field is optional; missing fields fall back to the classic
/// three-car race with limits 3/3/5.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct RaceConfig {
    /// Track file to load.
    pub(crate) track: Option<PathBuf>,
    /// Rounds to play before giving up on a winner.
    pub(crate) max_rounds: Option<u32>,
    /// Limits every car starts from before its own overrides.
    pub(crate) limits: SpeedLimits,
    /// Cars in entry order.
    pub(crate) cars: Vec<CarConfig>,
}

/// A single car entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct CarConfig {
    /// Character drawn on the track.
    pub(crate) id: char,
    /// Who steers the car.
    pub(crate) policy: PolicyKind,
    /// Fields overriding the race-wide limits.
    #[serde(default)]
    pub(crate) limits: LimitOverrides,
}

/// Per-car limit fields; any field left out keeps the race-wide value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LimitOverrides {
    max_row_delta: Option<u32>,
    max_column_delta: Option<u32>,
    max_speed: Option<u32>,
}

impl LimitOverrides {
    fn over(self, shared: SpeedLimits) -> SpeedLimits {
        SpeedLimits::new(
            self.max_row_delta.unwrap_or(shared.max_row_delta),
            self.max_column_delta.unwrap_or(shared.max_column_delta),
            self.max_speed.unwrap_or(shared.max_speed),
        )
    }
}

impl CarConfig {
    const fn new(id: char, policy: PolicyKind) -> Self {
        Self {
            id,
            policy,
            limits: LimitOverrides {
                max_row_delta: None,
                max_column_delta: None,
                max_speed: None,
            },
        }
    }
}

/// Reasons a configuration is refused after parsing.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub(crate) enum ConfigError {
    /// The configuration lists no cars.
    #[error("at least one car must be entered")]
    NoCars,
    /// Two cars share an identifier.
    #[error("car {id} is listed more than once")]
    DuplicateCar {
        /// Identifier used twice.
        id: char,
    },
    /// More than one car would read from the keyboard.
    #[error("only one car can be driven interactively")]
    SeveralInteractiveCars,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            track: None,
            max_rounds: None,
            limits: SpeedLimits::default(),
            cars: vec![
                CarConfig::new('1', PolicyKind::Speed),
                CarConfig::new('2', PolicyKind::Maneuver),
                CarConfig::new('3', PolicyKind::Interactive),
            ],
        }
    }
}

impl RaceConfig {
    /// Reads and validates the configuration stored at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read configuration {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid configuration {}", path.display()))
    }

    /// Parses and validates a configuration document.
    pub(crate) fn parse(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).context("malformed JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the car list for problems the parser cannot catch.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.cars.is_empty() {
            return Err(ConfigError::NoCars);
        }

        let mut seen = HashSet::with_capacity(self.cars.len());
        for car in &self.cars {
            if !seen.insert(car.id) {
                return Err(ConfigError::DuplicateCar { id: car.id });
            }
        }

        let interactive = self
            .cars
            .iter()
            .filter(|car| car.policy == PolicyKind::Interactive)
            .count();
        if interactive > 1 {
            return Err(ConfigError::SeveralInteractiveCars);
        }

        Ok(())
    }

    /// Limits that apply to `car`.
    pub(crate) fn limits_for(&self, car: &CarConfig) -> SpeedLimits {
        car.limits.over(self.limits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_the_classic_race() {
        let config = RaceConfig::parse("{}").expect("valid configuration");
        assert_eq!(config, RaceConfig::default());
        assert_eq!(config.cars.len(), 3);
        assert_eq!(config.cars[2].policy, PolicyKind::Interactive);
        assert_eq!(config.limits, SpeedLimits::new(3, 3, 5));
    }

    #[test]
    fn car_limits_are_merged_over_the_shared_ones() {
        let config = RaceConfig::parse(
            r#"{
                "track": "tracks/oval.txt",
                "max_rounds": 40,
                "limits": { "max_speed": 4 },
                "cars": [
                    { "id": "A", "policy": "speed" },
                    { "id": "B", "policy": "maneuver", "limits": { "max_row_delta": 1 } }
                ]
            }"#,
        )
        .expect("valid configuration");

        assert_eq!(config.track, Some(PathBuf::from("tracks/oval.txt")));
        assert_eq!(config.max_rounds, Some(40));
        assert_eq!(config.limits_for(&config.cars[0]), SpeedLimits::new(3, 3, 4));
        assert_eq!(config.limits_for(&config.cars[1]), SpeedLimits::new(1, 3, 4));
    }

    #[test]
    fn a_full_car_limits_object_replaces_every_shared_field() {
        let config = RaceConfig::parse(
            r#"{
                "limits": { "max_row_delta": 2, "max_column_delta": 2, "max_speed": 3 },
                "cars": [
                    { "id": "A", "policy": "speed",
                      "limits": { "max_row_delta": 4, "max_column_delta": 5, "max_speed": 6 } }
                ]
            }"#,
        )
        .expect("valid configuration");

        assert_eq!(config.limits_for(&config.cars[0]), SpeedLimits::new(4, 5, 6));
    }

    #[test]
    fn unknown_car_limit_fields_are_refused() {
        assert!(RaceConfig::parse(
            r#"{ "cars": [ { "id": "A", "policy": "speed", "limits": { "top_speed": 9 } } ] }"#
        )
        .is_err());
    }

    #[test]
    fn duplicate_ids_are_refused() {
        let err = RaceConfig::parse(
            r#"{ "cars": [ { "id": "1", "policy": "speed" }, { "id": "1", "policy": "maneuver" } ] }"#,
        )
        .expect_err("duplicate ids");
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::DuplicateCar { id: '1' })
        );
    }

    #[test]
    fn empty_car_list_is_refused() {
        let err = RaceConfig::parse(r#"{ "cars": [] }"#).expect_err("no cars");
        assert_eq!(err.downcast_ref::<ConfigError>(), Some(&ConfigError::NoCars));
    }

    #[test]
    fn only_one_car_reads_the_keyboard() {
        let err = RaceConfig::parse(
            r#"{ "cars": [ { "id": "1", "policy": "interactive" }, { "id": "2", "policy": "interactive" } ] }"#,
        )
        .expect_err("two interactive cars");
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::SeveralInteractiveCars)
        );
    }

    #[test]
    fn unknown_fields_and_policies_are_refused() {
        assert!(RaceConfig::parse(r#"{ "laps": 3 }"#).is_err());
        assert!(RaceConfig::parse(r#"{ "cars": [ { "id": "1", "policy": "turbo" } ] }"#).is_err());
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = RaceConfig::load(Path::new("no/such/race.json")).expect_err("missing file");
        assert!(err.to_string().contains("no/such/race.json"));
    }
}
