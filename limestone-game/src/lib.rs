//! Limestone GeoGuesser Engine
//!
//! Platform-agnostic scoring and round logic for the Kingston / Queen's campus
//! geography guessing game. Rendering, imagery fetching, input and networking
//! stay with the host; the core talks to them through the traits below and in
//! [`events`], [`imagery`], [`storage`] and [`leaderboard`].

pub mod catalog;
pub mod config;
pub mod constants;
pub mod data;
pub mod events;
pub mod geo;
pub mod imagery;
pub mod leaderboard;
pub mod numbers;
pub mod result;
pub mod round;
pub mod seed;
pub mod session;
pub mod storage;

use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use catalog::{LandmarkCatalog, RecentPicks};
pub use config::{GameConfig, PacingCfg, RoundsCfg};
pub use data::{CatalogError, Category, Difficulty, Landmark, LandmarkData, ViewParams};
pub use events::{EventLog, GameEvent, GameObserver, NoopObserver};
pub use geo::{
    Bounds, GeoPoint, KINGSTON_BOUNDS, distance_meters, round_score, score_for_distance,
};
pub use imagery::{
    ImageError, ImageProvider, ImageRef, PlaceholderImages, StreetViewUrls, resolve_image,
};
pub use leaderboard::{
    Leaderboard, LeaderboardClient, LeaderboardEntry, LeaderboardError, MemoryLeaderboard,
    ScoreSubmission,
};
pub use result::{SessionSummary, format_distance, format_points};
pub use round::{GuessOutcome, HintReveal, RoundEngine, RoundPhase, RoundState};
pub use seed::{decode_to_seed, encode_friendly, generate_code_from_entropy, parse_seed};
pub use session::{
    RoundReport, SessionEngine, SessionPhase, SessionSnapshot, SessionState, SessionStep,
};
pub use storage::{BestScore, JsonFileScoreStore, MemoryScoreStore, ScoreStore, StorageError};

/// Source of landmark data and configuration.
/// Platform-specific implementations should provide this.
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the landmark gazetteer.
    ///
    /// # Errors
    ///
    /// Returns an error if the gazetteer cannot be loaded.
    fn load_landmarks(&self) -> Result<LandmarkData, Self::Error>;

    /// Load game rules. Defaults to the shipped rules.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration exists but cannot be parsed.
    fn load_config(&self) -> Result<GameConfig, Self::Error> {
        Ok(GameConfig::default())
    }
}

/// The gazetteer compiled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledData;

impl DataLoader for BundledData {
    type Error = CatalogError;

    fn load_landmarks(&self) -> Result<LandmarkData, Self::Error> {
        LandmarkData::kingston()
    }
}

/// Landmarks and optional rules from files on disk.
#[derive(Debug, Clone)]
pub struct FileDataLoader {
    landmarks: PathBuf,
    config: Option<PathBuf>,
}

impl FileDataLoader {
    pub fn new(landmarks: impl Into<PathBuf>) -> Self {
        Self {
            landmarks: landmarks.into(),
            config: None,
        }
    }

    #[must_use]
    pub fn with_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.config = Some(path.into());
        self
    }

    pub fn landmarks_path(&self) -> &Path {
        &self.landmarks
    }
}

impl DataLoader for FileDataLoader {
    type Error = CatalogError;

    fn load_landmarks(&self) -> Result<LandmarkData, Self::Error> {
        LandmarkData::from_path(&self.landmarks)
    }

    fn load_config(&self) -> Result<GameConfig, Self::Error> {
        let Some(path) = &self.config else {
            return Ok(GameConfig::default());
        };
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(GameConfig::from_json(&text)?)
    }
}

/// Owns the shared catalog and best-score store, and hands out sessions.
///
/// Every session created here shares one catalog, so the anti-repeat memory
/// spans sessions.
pub struct GameEngine<S>
where
    S: ScoreStore + Clone,
{
    catalog: Arc<LandmarkCatalog>,
    config: GameConfig,
    store: S,
}

impl<S> GameEngine<S>
where
    S: ScoreStore + Clone,
{
    /// Load data and rules through `loader`.
    ///
    /// # Errors
    ///
    /// Returns an error if the landmarks or config cannot be loaded.
    pub fn load<L: DataLoader>(loader: &L, store: S) -> Result<Self, L::Error> {
        let config = loader.load_config()?;
        let data = loader.load_landmarks()?;
        log::debug!("loaded {} landmarks", data.landmarks.len());
        let catalog = Arc::new(LandmarkCatalog::with_recent_capacity(
            data,
            config.recent_window,
        ));
        Ok(Self {
            catalog,
            config,
            store,
        })
    }

    /// Use an existing catalog, e.g. [`LandmarkCatalog::kingston`].
    pub const fn with_catalog(catalog: Arc<LandmarkCatalog>, config: GameConfig, store: S) -> Self {
        Self {
            catalog,
            config,
            store,
        }
    }

    pub fn catalog(&self) -> &Arc<LandmarkCatalog> {
        &self.catalog
    }

    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// New session in `Configuring`, seeded with `seed`.
    pub fn create_session<O: GameObserver>(&self, seed: u64, observer: O) -> SessionEngine<O, S> {
        SessionEngine::new(Arc::clone(&self.catalog), seed, observer, self.store.clone())
            .with_config(self.config.clone())
    }

    /// Session from a share code or decimal seed, started immediately.
    /// A code's tier wins over `fallback`. Returns `None` for an unparseable
    /// seed or an empty catalog.
    pub fn start_seeded<O: GameObserver>(
        &self,
        seed: &str,
        fallback: Difficulty,
        player_name: &str,
        observer: O,
    ) -> Option<SessionEngine<O, S>> {
        let (tier, seed) = parse_seed(seed)?;
        let mut session = self.create_session(seed, observer);
        session
            .start_session(tier.unwrap_or(fallback), player_name)
            .then_some(session)
    }
}
