//! Runtime tuning for the simulations.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    BOARD_OCCURRENCE_BASE, BOARD_OCCURRENCE_CAP, BOARD_OCCURRENCE_PER_TURN, BOARD_PLAYERS,
    BOARD_SPACES, BOARD_SUPPORT_SPACE_EVERY, COUNTDOWN_SECONDS, JOURNEY_OCCURRENCE_BASE,
    JOURNEY_OCCURRENCE_PER_STEP, JOURNEY_TOKEN_AWARD_CHANCE, RECENT_LOG_CAP,
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if !(min..=max).contains(&value) {
        return Err(ConfigError::RangeViolation {
            field,
            min,
            max,
            value,
        });
    }
    Ok(())
}

/// Tuning for the two-patient journey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JourneyTuning {
    #[serde(default = "JourneyTuning::default_occurrence_base")]
    pub occurrence_base: f64,
    #[serde(default = "JourneyTuning::default_occurrence_per_step")]
    pub occurrence_per_step: f64,
    #[serde(default = "JourneyTuning::default_token_award_chance")]
    pub token_award_chance: f64,
    #[serde(default = "default_countdown_secs")]
    pub countdown_secs: u32,
    #[serde(default = "default_log_cap")]
    pub log_cap: usize,
}

impl JourneyTuning {
    const fn default_occurrence_base() -> f64 {
        JOURNEY_OCCURRENCE_BASE
    }

    const fn default_occurrence_per_step() -> f64 {
        JOURNEY_OCCURRENCE_PER_STEP
    }

    const fn default_token_award_chance() -> f64 {
        JOURNEY_TOKEN_AWARD_CHANCE
    }

    /// Occurrence threshold for a zero-based step index.
    #[must_use]
    pub fn occurrence_threshold(&self, step: usize) -> f64 {
        let step = crate::numbers::usize_to_f64(step);
        self.occurrence_per_step
            .mul_add(step, self.occurrence_base)
            .clamp(0.0, 1.0)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        check_range("journey.occurrence_base", self.occurrence_base, 0.0, 1.0)?;
        check_range(
            "journey.occurrence_per_step",
            self.occurrence_per_step,
            0.0,
            0.2,
        )?;
        check_range(
            "journey.token_award_chance",
            self.token_award_chance,
            0.0,
            1.0,
        )?;
        validate_countdown("journey.countdown_secs", self.countdown_secs)?;
        validate_log_cap("journey.log_cap", self.log_cap)
    }
}

impl Default for JourneyTuning {
    fn default() -> Self {
        Self {
            occurrence_base: Self::default_occurrence_base(),
            occurrence_per_step: Self::default_occurrence_per_step(),
            token_award_chance: Self::default_token_award_chance(),
            countdown_secs: default_countdown_secs(),
            log_cap: default_log_cap(),
        }
    }
}

/// Tuning for the board race.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardTuning {
    #[serde(default = "BoardTuning::default_spaces")]
    pub spaces: u32,
    #[serde(default = "BoardTuning::default_players")]
    pub players: usize,
    #[serde(default = "BoardTuning::default_support_every")]
    pub support_space_every: u32,
    #[serde(default = "BoardTuning::default_occurrence_base")]
    pub occurrence_base: f64,
    #[serde(default = "BoardTuning::default_occurrence_per_turn")]
    pub occurrence_per_turn: f64,
    #[serde(default = "BoardTuning::default_occurrence_cap")]
    pub occurrence_cap: f64,
    #[serde(default = "default_countdown_secs")]
    pub countdown_secs: u32,
    #[serde(default = "default_log_cap")]
    pub log_cap: usize,
}

impl BoardTuning {
    const fn default_spaces() -> u32 {
        BOARD_SPACES
    }

    const fn default_players() -> usize {
        BOARD_PLAYERS
    }

    const fn default_support_every() -> u32 {
        BOARD_SUPPORT_SPACE_EVERY
    }

    const fn default_occurrence_base() -> f64 {
        BOARD_OCCURRENCE_BASE
    }

    const fn default_occurrence_per_turn() -> f64 {
        BOARD_OCCURRENCE_PER_TURN
    }

    const fn default_occurrence_cap() -> f64 {
        BOARD_OCCURRENCE_CAP
    }

    /// Index of the final (winning) space.
    #[must_use]
    pub const fn finish_space(&self) -> u32 {
        self.spaces.saturating_sub(1)
    }

    /// Occurrence threshold for a zero-based turn (round) index.
    #[must_use]
    pub fn occurrence_threshold(&self, turn: u32) -> f64 {
        self.occurrence_per_turn
            .mul_add(f64::from(turn), self.occurrence_base)
            .min(self.occurrence_cap)
            .clamp(0.0, 1.0)
    }

    /// Whether landing on `space` earns a support token.
    #[must_use]
    pub const fn is_support_space(&self, space: u32) -> bool {
        self.support_space_every > 0 && space > 0 && space % self.support_space_every == 0
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        check_range("board.spaces", f64::from(self.spaces), 8.0, 64.0)?;
        check_range(
            "board.players",
            crate::numbers::usize_to_f64(self.players),
            2.0,
            4.0,
        )?;
        check_range(
            "board.support_space_every",
            f64::from(self.support_space_every),
            0.0,
            16.0,
        )?;
        check_range("board.occurrence_base", self.occurrence_base, 0.0, 1.0)?;
        check_range(
            "board.occurrence_per_turn",
            self.occurrence_per_turn,
            0.0,
            0.2,
        )?;
        check_range("board.occurrence_cap", self.occurrence_cap, 0.0, 1.0)?;
        validate_countdown("board.countdown_secs", self.countdown_secs)?;
        validate_log_cap("board.log_cap", self.log_cap)
    }
}

impl Default for BoardTuning {
    fn default() -> Self {
        Self {
            spaces: Self::default_spaces(),
            players: Self::default_players(),
            support_space_every: Self::default_support_every(),
            occurrence_base: Self::default_occurrence_base(),
            occurrence_per_turn: Self::default_occurrence_per_turn(),
            occurrence_cap: Self::default_occurrence_cap(),
            countdown_secs: default_countdown_secs(),
            log_cap: default_log_cap(),
        }
    }
}

const fn default_countdown_secs() -> u32 {
    COUNTDOWN_SECONDS
}

const fn default_log_cap() -> usize {
    RECENT_LOG_CAP
}

fn validate_countdown(field: &'static str, secs: u32) -> Result<(), ConfigError> {
    check_range(field, f64::from(secs), 1.0, 60.0)
}

fn validate_log_cap(field: &'static str, cap: usize) -> Result<(), ConfigError> {
    check_range(field, crate::numbers::usize_to_f64(cap), 1.0, 50.0)
}

/// Complete tuning document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub journey: JourneyTuning,
    #[serde(default)]
    pub board: BoardTuning,
}

impl SimConfig {
    /// Parse and validate a JSON tuning document; missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the JSON is malformed or a value is out of range.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when any field violates the documented bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.journey.validate()?;
        self.board.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_document_takes_defaults() {
        let cfg = SimConfig::from_json("{}").expect("parse");
        assert_eq!(cfg, SimConfig::default());
        assert_eq!(cfg.journey.countdown_secs, 5);
        assert_eq!(cfg.board.finish_space(), 31);
    }

    #[test]
    fn journey_threshold_grows_with_step() {
        let tuning = JourneyTuning::default();
        assert!((tuning.occurrence_threshold(0) - 0.55).abs() < 1e-9);
        assert!((tuning.occurrence_threshold(8) - 0.79).abs() < 1e-9);
        let mut prev = 0.0;
        for step in 0..9 {
            let threshold = tuning.occurrence_threshold(step);
            assert!(threshold >= prev);
            prev = threshold;
        }
    }

    #[test]
    fn board_threshold_caps() {
        let tuning = BoardTuning::default();
        assert!((tuning.occurrence_threshold(0) - 0.35).abs() < 1e-9);
        assert!((tuning.occurrence_threshold(200) - 0.85).abs() < 1e-9);
        assert!(tuning.is_support_space(5));
        assert!(!tuning.is_support_space(0));
        assert!(!tuning.is_support_space(7));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let err = SimConfig::from_json(r#"{ "journey": { "occurrence_base": 1.5 } }"#)
            .expect_err("range violation");
        assert!(matches!(
            err,
            ConfigError::RangeViolation {
                field: "journey.occurrence_base",
                ..
            }
        ));

        let err = SimConfig::from_json(r#"{ "board": { "players": 9 } }"#).expect_err("players");
        assert!(err.to_string().contains("board.players"));

        let err = SimConfig::from_json("not json").expect_err("parse");
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
