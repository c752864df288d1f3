//! Single-round state machine: present a landmark, take hints, resolve by guess or skip.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::LandmarkCatalog;
use crate::constants::HINT_PENALTY;
use crate::data::{Difficulty, Landmark};
use crate::geo::{GeoPoint, round_score};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RoundPhase {
    #[default]
    AwaitingLandmark,
    Presented,
    Resolved,
}

/// A hint handed to the player. `index` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintReveal {
    pub text: String,
    pub index: usize,
    pub total: usize,
}

/// Immutable record of a finished round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuessOutcome {
    pub round: u32,
    pub landmark: Landmark,
    pub guess: Option<GeoPoint>,
    pub distance_m: Option<f64>,
    pub score: u32,
    pub hints_used: usize,
    pub skipped: bool,
}

impl GuessOutcome {
    /// A non-skipped guess landing within `radius_m` of the target.
    #[must_use]
    pub fn is_good_guess(&self, radius_m: f64) -> bool {
        !self.skipped && self.distance_m.is_some_and(|d| d <= radius_m)
    }
}

/// Transient state of the live round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundState {
    pub round: u32,
    pub landmark: Landmark,
    pub hints_used: usize,
    pub hint_penalty: u32,
}

impl RoundState {
    #[must_use]
    pub fn hints_remaining(&self) -> usize {
        self.landmark.hint_count().saturating_sub(self.hints_used)
    }
}

#[derive(Debug, Clone)]
pub struct RoundEngine {
    phase: RoundPhase,
    state: Option<RoundState>,
    penalty_per_hint: u32,
}

impl Default for RoundEngine {
    fn default() -> Self {
        Self::new(HINT_PENALTY)
    }
}

impl RoundEngine {
    #[must_use]
    pub const fn new(penalty_per_hint: u32) -> Self {
        Self {
            phase: RoundPhase::AwaitingLandmark,
            state: None,
            penalty_per_hint,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> RoundPhase {
        self.phase
    }

    #[must_use]
    pub const fn state(&self) -> Option<&RoundState> {
        self.state.as_ref()
    }

    #[must_use]
    pub fn current_landmark(&self) -> Option<&Landmark> {
        self.state.as_ref().map(|state| &state.landmark)
    }

    /// Select a target and present it. Any live round is replaced.
    ///
    /// Returns `None` (and stays in `AwaitingLandmark`) if the catalog is empty.
    pub fn start_round<R>(
        &mut self,
        catalog: &LandmarkCatalog,
        difficulty: Option<Difficulty>,
        round: u32,
        rng: &mut R,
    ) -> Option<&Landmark>
    where
        R: Rng + ?Sized,
    {
        if self.phase == RoundPhase::Presented {
            log::debug!("round {round} replaces an unresolved round");
        }
        let Some(landmark) = catalog.random_landmark(difficulty, rng) else {
            self.abandon();
            return None;
        };
        log::debug!("round {round}: {} ({})", landmark.name, landmark.id);
        self.phase = RoundPhase::Presented;
        self.state = Some(RoundState {
            round,
            landmark,
            hints_used: 0,
            hint_penalty: 0,
        });
        self.current_landmark()
    }

    /// Reveal the next hint and charge the penalty.
    pub fn request_hint(&mut self) -> Option<HintReveal> {
        if self.phase != RoundPhase::Presented {
            log::debug!("hint ignored: no presented round");
            return None;
        }
        let state = self.state.as_mut()?;
        let text = state.landmark.hints.get(state.hints_used)?.clone();
        state.hints_used += 1;
        state.hint_penalty = state.hint_penalty.saturating_add(self.penalty_per_hint);
        Some(HintReveal {
            text,
            index: state.hints_used,
            total: state.landmark.hint_count(),
        })
    }

    /// Score a guess against the target and resolve the round.
    /// Non-finite coordinates are ignored and the round stays open.
    pub fn submit_guess(&mut self, lat: f64, lon: f64) -> Option<GuessOutcome> {
        if !lat.is_finite() || !lon.is_finite() {
            log::debug!("guess ignored: non-finite coordinates ({lat}, {lon})");
            return None;
        }
        let state = self.take_presented("guess")?;
        let guess = GeoPoint::new(lat, lon);
        let distance = guess.distance_to(state.landmark.position());
        let score = round_score(distance, state.hint_penalty);
        Some(GuessOutcome {
            round: state.round,
            landmark: state.landmark,
            guess: Some(guess),
            distance_m: Some(distance),
            score,
            hints_used: state.hints_used,
            skipped: false,
        })
    }

    /// Give up on the round for zero points.
    pub fn skip_round(&mut self) -> Option<GuessOutcome> {
        let state = self.take_presented("skip")?;
        Some(GuessOutcome {
            round: state.round,
            landmark: state.landmark,
            guess: None,
            distance_m: None,
            score: 0,
            hints_used: state.hints_used,
            skipped: true,
        })
    }

    /// Drop round-local state without producing an outcome.
    pub fn abandon(&mut self) {
        self.phase = RoundPhase::AwaitingLandmark;
        self.state = None;
    }

    fn take_presented(&mut self, action: &str) -> Option<RoundState> {
        if self.phase != RoundPhase::Presented {
            log::debug!("{action} ignored: no presented round");
            return None;
        }
        let state = self.state.take()?;
        self.phase = RoundPhase::Resolved;
        Some(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::LandmarkData;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn grant_hall() -> Landmark {
        Landmark {
            id: "grant-hall".to_string(),
            name: "Grant Hall".to_string(),
            description: "Historic clock tower".to_string(),
            lat: 44.2315,
            lon: -76.4959,
            hints: vec!["Clock tower".to_string(), "Archives".to_string()],
            difficulty: Difficulty::Easy,
            category: None,
            street_view: None,
        }
    }

    fn presented_engine() -> RoundEngine {
        let catalog = LandmarkCatalog::new(LandmarkData::from_landmarks(vec![grant_hall()]));
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let mut engine = RoundEngine::default();
        assert!(engine.start_round(&catalog, None, 1, &mut rng).is_some());
        engine
    }

    #[test]
    fn exact_guess_scores_maximum() {
        let mut engine = presented_engine();
        let outcome = engine.submit_guess(44.2315, -76.4959).unwrap();
        assert!(outcome.distance_m.unwrap().abs() < 1e-9);
        assert_eq!(outcome.score, 5_000);
        assert_eq!(engine.phase(), RoundPhase::Resolved);
        assert!(engine.state().is_none());
    }

    #[test]
    fn hints_reduce_score_and_stop_at_list_end() {
        let mut engine = presented_engine();
        let first = engine.request_hint().unwrap();
        assert_eq!(first.text, "Clock tower");
        assert_eq!((first.index, first.total), (1, 2));
        assert_eq!(engine.state().unwrap().hint_penalty, 100);
        let second = engine.request_hint().unwrap();
        assert_eq!(second.index, 2);
        assert!(engine.request_hint().is_none());
        assert_eq!(engine.state().unwrap().hints_used, 2);
        assert_eq!(engine.state().unwrap().hints_remaining(), 0);

        let outcome = engine.submit_guess(44.2315, -76.4959).unwrap();
        assert_eq!(outcome.score, 4_800);
        assert_eq!(outcome.hints_used, 2);
    }

    #[test]
    fn skip_produces_empty_outcome() {
        let mut engine = presented_engine();
        engine.request_hint();
        let outcome = engine.skip_round().unwrap();
        assert!(outcome.skipped);
        assert!(outcome.guess.is_none());
        assert!(outcome.distance_m.is_none());
        assert_eq!(outcome.score, 0);
        assert_eq!(outcome.hints_used, 1);
        assert!(!outcome.is_good_guess(100.0));
    }

    #[test]
    fn calls_after_resolution_are_ignored() {
        let mut engine = presented_engine();
        assert!(engine.submit_guess(44.0, -76.0).is_some());
        assert!(engine.submit_guess(44.0, -76.0).is_none());
        assert!(engine.skip_round().is_none());
        assert!(engine.request_hint().is_none());
    }

    #[test]
    fn non_finite_guess_keeps_round_open() {
        let mut engine = presented_engine();
        assert!(engine.submit_guess(f64::NAN, f64::NAN).is_none());
        assert!(engine.submit_guess(44.2315, f64::INFINITY).is_none());
        assert_eq!(engine.phase(), RoundPhase::Presented);
        let outcome = engine.submit_guess(44.2315, -76.4959).unwrap();
        assert_eq!(outcome.score, 5_000);
    }

    #[test]
    fn calls_without_round_are_ignored() {
        let mut engine = RoundEngine::default();
        assert_eq!(engine.phase(), RoundPhase::AwaitingLandmark);
        assert!(engine.request_hint().is_none());
        assert!(engine.submit_guess(0.0, 0.0).is_none());
        assert!(engine.skip_round().is_none());
    }

    #[test]
    fn empty_catalog_leaves_round_unstarted() {
        let catalog = LandmarkCatalog::new(LandmarkData::empty());
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        let mut engine = RoundEngine::default();
        assert!(engine.start_round(&catalog, None, 1, &mut rng).is_none());
        assert_eq!(engine.phase(), RoundPhase::AwaitingLandmark);
    }

    #[test]
    fn abandon_discards_state() {
        let mut engine = presented_engine();
        engine.request_hint();
        engine.abandon();
        assert_eq!(engine.phase(), RoundPhase::AwaitingLandmark);
        assert!(engine.current_landmark().is_none());
    }

    #[test]
    fn far_guess_uses_tail_of_curve() {
        let mut engine = presented_engine();
        // ~600 m due north of Grant Hall.
        let north = 44.2315 + 600.0 / 111_194.93;
        let outcome = engine.submit_guess(north, -76.4959).unwrap();
        let d = outcome.distance_m.unwrap();
        assert!((d - 600.0).abs() < 0.5, "distance was {d}");
        assert!((699..=700).contains(&outcome.score));
    }
}
