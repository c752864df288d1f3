//! Full-game state machine: configure, play N rounds, summarize.
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::catalog::LandmarkCatalog;
use crate::config::GameConfig;
use crate::data::{Difficulty, Landmark};
use crate::events::GameObserver;
use crate::imagery::{ImageProvider, PlaceholderImages, resolve_image};
use crate::result::SessionSummary;
use crate::round::{GuessOutcome, HintReveal, RoundEngine, RoundState};
use crate::storage::{BestScore, ScoreStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionPhase {
    #[default]
    Configuring,
    InProgress,
    Finished,
}

/// What follows a resolved round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionStep {
    /// `round` is already presented; hosts may hold the reveal for `pacing`.
    NextRound { round: u32, pacing: Duration },
    Finished(SessionSummary),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundReport {
    pub outcome: GuessOutcome,
    pub step: SessionStep,
}

/// Running totals for the current session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionState {
    pub phase: SessionPhase,
    /// 1-based index of the current round, 0 before the first.
    pub round: u32,
    pub total_rounds: u32,
    pub score: u32,
    pub total_distance: f64,
    pub log: Vec<GuessOutcome>,
    pub difficulty: Difficulty,
    pub player_name: String,
}

/// Read-only view for hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub is_playing: bool,
    pub current_round: u32,
    pub total_rounds: u32,
    pub score: u32,
    pub current_landmark_id: Option<String>,
    pub hints_used: usize,
}

pub struct SessionEngine<O, S, P = PlaceholderImages> {
    catalog: Arc<LandmarkCatalog>,
    config: GameConfig,
    seed: u64,
    rng: ChaCha20Rng,
    round: RoundEngine,
    state: SessionState,
    summary: Option<SessionSummary>,
    best: BestScore<S>,
    images: P,
    observer: O,
}

impl<O, S> SessionEngine<O, S, PlaceholderImages>
where
    O: GameObserver,
    S: ScoreStore,
{
    /// New engine in `Configuring` with default rules and placeholder photos.
    pub fn new(catalog: Arc<LandmarkCatalog>, seed: u64, observer: O, store: S) -> Self {
        let config = GameConfig::default();
        Self {
            catalog,
            round: RoundEngine::new(config.hint_penalty),
            config,
            seed,
            rng: ChaCha20Rng::seed_from_u64(seed),
            state: SessionState::default(),
            summary: None,
            best: BestScore::new(store),
            images: PlaceholderImages,
            observer,
        }
    }
}

impl<O, S, P> SessionEngine<O, S, P>
where
    O: GameObserver,
    S: ScoreStore,
    P: ImageProvider,
{
    /// Replace the rules. Takes effect for the next round started.
    #[must_use]
    pub fn with_config(mut self, config: GameConfig) -> Self {
        self.round = RoundEngine::new(config.hint_penalty);
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_images<Q: ImageProvider>(self, images: Q) -> SessionEngine<O, S, Q> {
        SessionEngine {
            catalog: self.catalog,
            config: self.config,
            seed: self.seed,
            rng: self.rng,
            round: self.round,
            state: self.state,
            summary: self.summary,
            best: self.best,
            images,
            observer: self.observer,
        }
    }

    pub const fn phase(&self) -> SessionPhase {
        self.state.phase
    }

    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    pub const fn seed(&self) -> u64 {
        self.seed
    }

    pub fn catalog(&self) -> &LandmarkCatalog {
        &self.catalog
    }

    pub const fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    pub const fn round_state(&self) -> Option<&RoundState> {
        self.round.state()
    }

    pub fn current_landmark(&self) -> Option<&Landmark> {
        self.round.current_landmark()
    }

    pub const fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    pub fn into_observer(self) -> O {
        self.observer
    }

    pub const fn best_store(&self) -> &S {
        self.best.store()
    }

    /// Stored best score, 0 when nothing is stored or the store fails.
    pub fn personal_best(&self) -> u32 {
        self.best.get()
    }

    /// Begin a new game and present round 1.
    ///
    /// Returns `false` and stays in `Configuring` when the catalog is empty.
    pub fn start_session(&mut self, difficulty: Difficulty, player_name: &str) -> bool {
        self.round.abandon();
        self.summary = None;
        self.state = SessionState {
            phase: SessionPhase::InProgress,
            round: 0,
            total_rounds: self.config.rounds_for(difficulty),
            score: 0,
            total_distance: 0.0,
            log: Vec::new(),
            difficulty,
            player_name: player_name.to_string(),
        };
        log::info!(
            "session start: {difficulty}, {} rounds, player {player_name:?}",
            self.state.total_rounds
        );
        if self.begin_round(1) {
            return true;
        }
        log::warn!("no landmarks available; session not started");
        self.state = SessionState::default();
        false
    }

    /// Reveal the next hint of the live round.
    pub fn request_hint(&mut self) -> Option<HintReveal> {
        if !self.in_progress("hint") {
            return None;
        }
        let hint = self.round.request_hint()?;
        self.observer.hint_revealed(&hint);
        Some(hint)
    }

    /// Score a guess and advance the session.
    pub fn submit_guess(&mut self, lat: f64, lon: f64) -> Option<RoundReport> {
        if !self.in_progress("guess") {
            return None;
        }
        let outcome = self.round.submit_guess(lat, lon)?;
        self.observer.guess_resolved(
            outcome.distance_m.unwrap_or_default(),
            outcome.score,
            &outcome.landmark,
        );
        self.report(outcome)
    }

    /// Give up on the live round and advance the session.
    pub fn skip_round(&mut self) -> Option<RoundReport> {
        if !self.in_progress("skip") {
            return None;
        }
        let outcome = self.round.skip_round()?;
        self.observer.round_skipped(&outcome.landmark);
        self.report(outcome)
    }

    /// Append a resolved round, then present the next one or finish.
    ///
    /// Returns `None` outside `InProgress`.
    pub fn record_round_result(&mut self, outcome: GuessOutcome) -> Option<SessionStep> {
        if !self.in_progress("round result") {
            return None;
        }
        self.state.score = self.state.score.saturating_add(outcome.score);
        if let Some(distance) = outcome.distance_m {
            self.state.total_distance += distance;
        }
        let pacing = if outcome.skipped {
            self.config.pacing.after_skip()
        } else {
            self.config.pacing.after_guess()
        };
        self.state.log.push(outcome);

        if self.state.round >= self.state.total_rounds {
            return self.finish_session().map(SessionStep::Finished);
        }
        let next = self.state.round + 1;
        if self.begin_round(next) {
            Some(SessionStep::NextRound {
                round: next,
                pacing,
            })
        } else {
            log::warn!("round {next} could not start; finishing early");
            self.finish_session().map(SessionStep::Finished)
        }
    }

    /// Close the session and compute its summary.
    ///
    /// Returns `None` while `Configuring`; repeated calls after finishing
    /// return the same summary without touching the store again.
    pub fn finish_session(&mut self) -> Option<SessionSummary> {
        match self.state.phase {
            SessionPhase::Configuring => {
                log::debug!("finish ignored: no session");
                None
            }
            SessionPhase::Finished => self.summary.clone(),
            SessionPhase::InProgress => {
                self.round.abandon();
                let previous = self.best.get();
                let summary = SessionSummary::from_outcomes(
                    &self.state.log,
                    self.state.total_rounds,
                    self.config.good_guess_radius_m,
                    self.state.difficulty,
                    &self.state.player_name,
                )
                .with_previous_best(previous);
                self.state.phase = SessionPhase::Finished;
                if summary.is_new_best {
                    self.best.set(summary.score);
                    self.observer.personal_best_updated(summary.score);
                }
                log::info!(
                    "session finished: score {}, accuracy {}%",
                    summary.score,
                    summary.accuracy
                );
                self.observer.session_finished(&summary);
                self.summary = Some(summary.clone());
                Some(summary)
            }
        }
    }

    /// Abandon any session and return to `Configuring`.
    pub fn reset_to_menu(&mut self) {
        self.round.abandon();
        self.summary = None;
        self.state = SessionState::default();
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let live = self.round.state();
        SessionSnapshot {
            phase: self.state.phase,
            is_playing: self.state.phase == SessionPhase::InProgress,
            current_round: self.state.round,
            total_rounds: self.state.total_rounds,
            score: self.state.score,
            current_landmark_id: live.map(|round| round.landmark.id.clone()),
            hints_used: live.map_or(0, |round| round.hints_used),
        }
    }

    fn report(&mut self, outcome: GuessOutcome) -> Option<RoundReport> {
        let step = self.record_round_result(outcome.clone())?;
        Some(RoundReport { outcome, step })
    }

    fn in_progress(&self, action: &str) -> bool {
        let ok = self.state.phase == SessionPhase::InProgress;
        if !ok {
            log::debug!("{action} ignored: session is {:?}", self.state.phase);
        }
        ok
    }

    fn begin_round(&mut self, round: u32) -> bool {
        let Some(landmark) = self.round.start_round(
            &self.catalog,
            Some(self.state.difficulty),
            round,
            &mut self.rng,
        ) else {
            return false;
        };
        self.state.round = round;
        self.observer
            .round_started(round, self.state.total_rounds, self.state.score);
        let image = resolve_image(&self.images, landmark);
        self.observer.photo_ready(&image, landmark);
        true
    }
}
