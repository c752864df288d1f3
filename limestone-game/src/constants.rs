//! Centralized scoring and pacing constants for Limestone GeoGuesser.
//!
//! These values define the deterministic math for the core game. Keeping
//! them together means scoring only changes through reviewed code, while
//! `GameConfig` exposes the subset a host may tune.

use std::time::Duration;

// Geo ----------------------------------------------------------------------
/// Mean Earth radius used by the haversine distance.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

// Score curve --------------------------------------------------------------
pub const MAX_ROUND_SCORE: u32 = 5_000;
pub const MIN_GUESS_SCORE: u32 = 100;
pub(crate) const PERFECT_RADIUS_M: f64 = 10.0;
pub(crate) const EXCELLENT_RADIUS_M: f64 = 50.0;
pub(crate) const GOOD_RADIUS_M: f64 = 100.0;
pub(crate) const FAIR_RADIUS_M: f64 = 200.0;
pub(crate) const POOR_RADIUS_M: f64 = 500.0;

// Rounds -------------------------------------------------------------------
pub const HINT_PENALTY: u32 = 100;
/// Guesses at or under this distance count towards accuracy.
pub const GOOD_GUESS_RADIUS_M: f64 = 100.0;
pub const EASY_ROUNDS: u32 = 5;
pub const MEDIUM_ROUNDS: u32 = 10;
pub const HARD_ROUNDS: u32 = 15;
pub const GUESS_PACING: Duration = Duration::from_millis(3_000);
pub const SKIP_PACING: Duration = Duration::from_millis(2_000);

// Catalog ------------------------------------------------------------------
pub const RECENT_PICK_WINDOW: usize = 20;

// Persistence --------------------------------------------------------------
pub const BEST_SCORE_KEY: &str = "queens_geoguesser_pb";

// Leaderboard --------------------------------------------------------------
pub const LEADERBOARD_NAME_MAXLEN: usize = 20;
pub const LEADERBOARD_TOP_LIMIT: usize = 10;
pub const LEADERBOARD_WINDOW_HOURS: i64 = 24;

// Imagery ------------------------------------------------------------------
pub(crate) const STREET_VIEW_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/streetview";
pub(crate) const STREET_VIEW_SIZE: &str = "800x600";
pub(crate) const STREET_VIEW_FOV: u32 = 90;
