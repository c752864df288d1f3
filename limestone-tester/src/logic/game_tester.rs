use anyhow::{Context, Result};
use colored::Colorize;
use limestone_game::{
    BundledData, Difficulty, EventLog, FileDataLoader, GameEngine, GameEvent, GuessOutcome,
    JsonFileScoreStore, LandmarkCatalog, LandmarkData, MemoryScoreStore, ScoreStore,
    SessionPhase, SessionSummary, StorageError,
};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use crate::logic::policy::{GuessStrategy, PlayerAction};

/// Player name used for simulated sessions.
pub const SIM_PLAYER: &str = "limestone-bot";

/// Upper bound on policy actions per round.
const MAX_ACTIONS_PER_ROUND: usize = 16;

/// Best-score backend selected on the command line.
#[derive(Debug, Clone)]
pub enum TesterStore {
    Memory(MemoryScoreStore),
    File(JsonFileScoreStore),
}

impl Default for TesterStore {
    fn default() -> Self {
        Self::Memory(MemoryScoreStore::default())
    }
}

impl ScoreStore for TesterStore {
    fn load_best(&self) -> Result<Option<u32>, StorageError> {
        match self {
            Self::Memory(store) => store.load_best(),
            Self::File(store) => store.load_best(),
        }
    }

    fn save_best(&self, score: u32) -> Result<(), StorageError> {
        match self {
            Self::Memory(store) => store.save_best(score),
            Self::File(store) => store.save_best(score),
        }
    }
}

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn =
    Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl std::fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub difficulty: Difficulty,
    pub strategy: GuessStrategy,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub const fn new(difficulty: Difficulty, strategy: GuessStrategy) -> Self {
        Self {
            difficulty,
            strategy,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Per-session numbers used by playability analysis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayabilityMetrics {
    pub score: u32,
    pub accuracy: u32,
    pub avg_distance: f64,
    pub rounds_played: u32,
    pub hints_used: u32,
    pub skipped: u32,
    pub perfect_rounds: u32,
    pub unique_landmarks: usize,
    pub is_new_best: bool,
}

impl PlayabilityMetrics {
    fn collect(outcomes: &[GuessOutcome], summary: Option<&SessionSummary>) -> Self {
        let unique: HashSet<&str> = outcomes.iter().map(|o| o.landmark.id.as_str()).collect();
        let perfect = outcomes.iter().filter(|o| o.score == 5_000).count();
        Self {
            score: summary.map_or(0, |s| s.score),
            accuracy: summary.map_or(0, |s| s.accuracy),
            avg_distance: summary.map_or(0.0, |s| s.avg_distance),
            rounds_played: summary.map_or(0, |s| s.rounds_played),
            hints_used: summary.map_or(0, |s| s.hints_used),
            skipped: summary.map_or(0, |s| s.skipped),
            perfect_rounds: u32::try_from(perfect).unwrap_or(u32::MAX),
            unique_landmarks: unique.len(),
            is_new_best: summary.is_some_and(|s| s.is_new_best),
        }
    }
}

/// Complete record of a simulated session.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub difficulty: Difficulty,
    pub strategy: GuessStrategy,
    pub started: bool,
    pub summary: Option<SessionSummary>,
    pub outcomes: Vec<GuessOutcome>,
    pub events: Vec<GameEvent>,
    pub metrics: PlayabilityMetrics,
    pub actions: usize,
}

impl SimulationSummary {
    #[must_use]
    pub fn ending_message(&self) -> String {
        match (&self.summary, self.started) {
            (Some(summary), _) => format!(
                "{} pts, {}% accuracy, avg {}",
                summary.score,
                summary.accuracy,
                summary.avg_distance_label()
            ),
            (None, false) => "session did not start".to_string(),
            (None, true) => "session did not finish".to_string(),
        }
    }
}

/// Drives sessions against one shared engine.
#[derive(Clone)]
pub struct GameTester {
    engine: Arc<GameEngine<TesterStore>>,
    data: Arc<LandmarkData>,
    verbose: bool,
}

impl GameTester {
    /// Load landmarks from `landmarks`, or the bundled gazetteer when absent.
    pub fn load(landmarks: Option<&Path>, store: TesterStore, verbose: bool) -> Result<Self> {
        let engine = match landmarks {
            Some(path) => GameEngine::load(&FileDataLoader::new(path), store)
                .with_context(|| format!("failed to load landmarks from {}", path.display()))?,
            None => GameEngine::load(&BundledData, store)
                .context("bundled landmark data is invalid")?,
        };
        let data = LandmarkData::from_landmarks(engine.catalog().iter().cloned().collect());
        Ok(Self {
            engine: Arc::new(engine),
            data: Arc::new(data),
            verbose,
        })
    }

    /// Bundled gazetteer with an in-memory store.
    pub fn try_new(verbose: bool) -> Result<Self> {
        Self::load(None, TesterStore::default(), verbose)
    }

    #[must_use]
    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    /// A tester over the same landmarks with fresh anti-repeat memory and
    /// a private in-memory store, so runs are reproducible per seed.
    #[must_use]
    pub fn isolated(&self) -> Self {
        let catalog = Arc::new(LandmarkCatalog::with_recent_capacity(
            (*self.data).clone(),
            self.engine.config().recent_window,
        ));
        let engine =
            GameEngine::with_catalog(catalog, self.engine.config().clone(), TesterStore::default());
        Self {
            engine: Arc::new(engine),
            data: Arc::clone(&self.data),
            verbose: self.verbose,
        }
    }

    pub fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> SimulationSummary {
        let mut session = self.engine.create_session(seed, EventLog::default());
        let started = session.start_session(plan.difficulty, SIM_PLAYER);
        let mut policy = plan.strategy.create_policy(seed);
        let budget = MAX_ACTIONS_PER_ROUND * usize::try_from(session.state().total_rounds).unwrap_or(1);
        let mut actions = 0;

        while session.phase() == SessionPhase::InProgress && actions < budget {
            let Some(round) = session.round_state() else {
                break;
            };
            let action = policy.act(round);
            actions += 1;
            match action {
                PlayerAction::Hint => {
                    if session.request_hint().is_none() {
                        log::debug!("{} asked for a hint that was refused", policy.name());
                    }
                }
                PlayerAction::Guess(point) => {
                    session.submit_guess(point.lat, point.lon);
                }
                PlayerAction::Skip => {
                    session.skip_round();
                }
            }
        }

        if session.phase() == SessionPhase::InProgress {
            log::warn!("{} exhausted its action budget; closing session", policy.name());
            session.finish_session();
        }

        let summary = session.summary().cloned();
        let outcomes = session.state().log.clone();
        let metrics = PlayabilityMetrics::collect(&outcomes, summary.as_ref());
        if self.verbose {
            println!(
                "    {} {} seed {} -> {}",
                plan.difficulty.to_string().cyan(),
                plan.strategy.label().bright_white(),
                seed,
                metrics.score
            );
        }
        SimulationSummary {
            seed,
            difficulty: plan.difficulty,
            strategy: plan.strategy,
            started,
            summary,
            outcomes,
            events: session.into_observer().into_events(),
            metrics,
            actions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_easy_run_scores_full_marks() {
        let tester = GameTester::try_new(false).unwrap();
        let plan = SimulationPlan::new(Difficulty::Easy, GuessStrategy::Perfect);
        let run = tester.run_plan(&plan, 42);
        assert!(run.started);
        assert_eq!(run.outcomes.len(), 5);
        assert_eq!(run.metrics.score, 25_000);
        assert_eq!(run.metrics.perfect_rounds, 5);
        assert_eq!(run.actions, 5);
        assert!(run.ending_message().contains("25000 pts"));
    }

    #[test]
    fn hinter_pays_for_every_hint() {
        let tester = GameTester::try_new(false).unwrap();
        let plan = SimulationPlan::new(Difficulty::Medium, GuessStrategy::Hinter);
        let run = tester.run_plan(&plan, 7);
        let hints: usize = run.outcomes.iter().map(|o| o.hints_used).sum();
        assert_eq!(run.metrics.hints_used as usize, hints);
        assert!(hints >= 10);
        for outcome in &run.outcomes {
            assert_eq!(outcome.hints_used, outcome.landmark.hints.len());
            assert!(outcome.score <= 5_000 - 100 * u32::try_from(outcome.hints_used).unwrap());
        }
    }

    #[test]
    fn isolated_testers_are_reproducible() {
        let tester = GameTester::try_new(false).unwrap();
        let plan = SimulationPlan::new(Difficulty::Hard, GuessStrategy::Noisy);
        let a = tester.isolated().run_plan(&plan, 99);
        let b = tester.isolated().run_plan(&plan, 99);
        let ids = |run: &SimulationSummary| {
            run.outcomes
                .iter()
                .map(|o| o.landmark.id.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(&a), ids(&b));
        assert_eq!(a.metrics, b.metrics);
    }

    #[test]
    fn file_store_backs_best_score() {
        let path = std::env::temp_dir().join(format!("limestone-tester-{}.json", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let store = TesterStore::File(JsonFileScoreStore::new(&path));
        let tester = GameTester::load(None, store, false).unwrap();
        let run = tester.run_plan(&SimulationPlan::new(Difficulty::Easy, GuessStrategy::Perfect), 1);
        assert!(run.metrics.is_new_best);
        assert_eq!(
            JsonFileScoreStore::new(&path).load_best().unwrap(),
            Some(25_000)
        );
        let _ = std::fs::remove_file(path);
    }
}
