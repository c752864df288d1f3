//! End-of-session statistics and the share line.
use serde::{Deserialize, Serialize};

use crate::data::Difficulty;
use crate::numbers::round_f64_to_u32;
use crate::round::GuessOutcome;

/// Everything the result screen shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub score: u32,
    /// Percentage of configured rounds with a good guess, 0..=100.
    pub accuracy: u32,
    /// Cumulative guess distance divided by configured rounds, meters.
    pub avg_distance: f64,
    pub total_rounds: u32,
    pub rounds_played: u32,
    pub skipped: u32,
    pub hints_used: u32,
    pub is_new_best: bool,
    pub best_score: u32,
    pub difficulty: Difficulty,
    pub player_name: String,
}

impl SessionSummary {
    /// Aggregate a round log. Skipped rounds stay in both denominators.
    #[must_use]
    pub fn from_outcomes(
        outcomes: &[GuessOutcome],
        total_rounds: u32,
        good_guess_radius_m: f64,
        difficulty: Difficulty,
        player_name: &str,
    ) -> Self {
        let score = outcomes
            .iter()
            .fold(0_u32, |acc, outcome| acc.saturating_add(outcome.score));
        let distance: f64 = outcomes.iter().filter_map(|o| o.distance_m).sum();
        let good = outcomes
            .iter()
            .filter(|o| o.is_good_guess(good_guess_radius_m))
            .count();
        let skipped = outcomes.iter().filter(|o| o.skipped).count();
        let hints: usize = outcomes.iter().map(|o| o.hints_used).sum();

        let (accuracy, avg_distance) = if total_rounds == 0 {
            (0, 0.0)
        } else {
            let total = f64::from(total_rounds);
            (
                round_f64_to_u32(100.0 * f64::from(count_u32(good)) / total),
                distance / total,
            )
        };

        Self {
            score,
            accuracy,
            avg_distance,
            total_rounds,
            rounds_played: count_u32(outcomes.len()),
            skipped: count_u32(skipped),
            hints_used: count_u32(hints),
            is_new_best: false,
            best_score: score,
            difficulty,
            player_name: player_name.to_string(),
        }
    }

    /// Compare against the stored best and fill the best-score fields.
    #[must_use]
    pub fn with_previous_best(mut self, previous: u32) -> Self {
        self.is_new_best = self.score > previous;
        self.best_score = self.score.max(previous);
        self
    }

    /// "I scored 12,345 points on Kingston GeoGuesser! Can you beat my score?"
    #[must_use]
    pub fn share_text(&self) -> String {
        format!(
            "I scored {} points on Kingston GeoGuesser! Can you beat my score?",
            format_points(self.score)
        )
    }

    /// Average distance the way the result screen prints it.
    #[must_use]
    pub fn avg_distance_label(&self) -> String {
        format_distance(self.avg_distance)
    }
}

fn count_u32(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Group digits in threes: `12345` becomes `12,345`.
#[must_use]
pub fn format_points(points: u32) -> String {
    let digits = points.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Meters under a kilometer, otherwise kilometers to one decimal.
#[must_use]
pub fn format_distance(meters: f64) -> String {
    if meters < 1_000.0 {
        format!("{}m", round_f64_to_u32(meters))
    } else {
        format!("{:.1}km", meters / 1_000.0)
    }
}
