//! Host-tunable game configuration.
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{
    EASY_ROUNDS, GOOD_GUESS_RADIUS_M, GUESS_PACING, HARD_ROUNDS, HINT_PENALTY, MEDIUM_ROUNDS,
    RECENT_PICK_WINDOW, SKIP_PACING,
};
use crate::data::Difficulty;

/// Rounds played per difficulty tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundsCfg {
    pub easy: u32,
    pub medium: u32,
    pub hard: u32,
}

impl Default for RoundsCfg {
    fn default() -> Self {
        Self {
            easy: EASY_ROUNDS,
            medium: MEDIUM_ROUNDS,
            hard: HARD_ROUNDS,
        }
    }
}

/// Delay a host should wait before revealing the next round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingCfg {
    pub after_guess_ms: u64,
    pub after_skip_ms: u64,
}

impl Default for PacingCfg {
    fn default() -> Self {
        Self {
            after_guess_ms: duration_ms(GUESS_PACING),
            after_skip_ms: duration_ms(SKIP_PACING),
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl PacingCfg {
    #[must_use]
    pub const fn after_guess(&self) -> Duration {
        Duration::from_millis(self.after_guess_ms)
    }

    #[must_use]
    pub const fn after_skip(&self) -> Duration {
        Duration::from_millis(self.after_skip_ms)
    }
}

/// Scoring and pacing knobs. `Default` matches the shipped game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub hint_penalty: u32,
    pub recent_window: usize,
    pub good_guess_radius_m: f64,
    pub rounds: RoundsCfg,
    pub pacing: PacingCfg,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            hint_penalty: HINT_PENALTY,
            recent_window: RECENT_PICK_WINDOW,
            good_guess_radius_m: GOOD_GUESS_RADIUS_M,
            rounds: RoundsCfg::default(),
            pacing: PacingCfg::default(),
        }
    }
}

impl GameConfig {
    /// Parse a config, filling missing fields from the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Round count for `difficulty`, never zero.
    #[must_use]
    pub fn rounds_for(&self, difficulty: Difficulty) -> u32 {
        let rounds = match difficulty {
            Difficulty::Easy => self.rounds.easy,
            Difficulty::Medium => self.rounds.medium,
            Difficulty::Hard => self.rounds.hard,
        };
        rounds.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_shipped_rules() {
        let cfg = GameConfig::default();
        assert_eq!(cfg.hint_penalty, 100);
        assert_eq!(cfg.recent_window, 20);
        assert_eq!(cfg.rounds_for(Difficulty::Easy), 5);
        assert_eq!(cfg.rounds_for(Difficulty::Medium), 10);
        assert_eq!(cfg.rounds_for(Difficulty::Hard), 15);
        assert_eq!(cfg.pacing.after_guess(), Duration::from_secs(3));
        assert_eq!(cfg.pacing.after_skip(), Duration::from_secs(2));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = GameConfig::from_json(r#"{ "hint_penalty": 250, "rounds": { "hard": 0 } }"#)
            .unwrap();
        assert_eq!(cfg.hint_penalty, 250);
        assert_eq!(cfg.rounds.easy, 5);
        assert_eq!(cfg.rounds_for(Difficulty::Hard), 1);
        assert_eq!(cfg.pacing, PacingCfg::default());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(GameConfig::from_json("{ nope").is_err());
    }
}
