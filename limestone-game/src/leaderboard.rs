//! Room-scoped leaderboard contract and an optional client around it.
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

use crate::constants::{LEADERBOARD_NAME_MAXLEN, LEADERBOARD_TOP_LIMIT, LEADERBOARD_WINDOW_HOURS};
use crate::numbers::floor_f64_to_u32;
use crate::result::SessionSummary;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LeaderboardError {
    #[error("leaderboard backend error: {0}")]
    Backend(String),
    #[error("submission rejected: {0}")]
    Rejected(String),
}

/// A normalized score ready for a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub room: String,
    pub name: String,
    pub score: u32,
}

impl ScoreSubmission {
    /// Lowercase the room, cut the name to 20 characters and floor the score.
    #[must_use]
    pub fn new(room: &str, name: &str, score: f64) -> Self {
        Self {
            room: room.to_lowercase(),
            name: name.chars().take(LEADERBOARD_NAME_MAXLEN).collect(),
            score: floor_f64_to_u32(score),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub room: String,
    pub name: String,
    pub score: u32,
    pub created_at: DateTime<Utc>,
}

/// Storage backend for shared scores.
pub trait Leaderboard {
    /// Record a submission.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects or cannot store the row.
    fn submit_score(&self, submission: &ScoreSubmission) -> Result<(), LeaderboardError>;

    /// Highest scores in `room` created at or after `since`, best first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be queried.
    fn fetch_top(
        &self,
        room: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<LeaderboardEntry>, LeaderboardError>;
}

/// In-process backend. Clones share rows.
#[derive(Debug, Clone, Default)]
pub struct MemoryLeaderboard {
    rows: Arc<Mutex<Vec<LeaderboardEntry>>>,
}

impl MemoryLeaderboard {
    /// Insert a row with an explicit timestamp.
    pub fn insert(&self, entry: LeaderboardEntry) {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Leaderboard for MemoryLeaderboard {
    fn submit_score(&self, submission: &ScoreSubmission) -> Result<(), LeaderboardError> {
        if submission.room.is_empty() {
            return Err(LeaderboardError::Rejected("empty room".to_string()));
        }
        self.insert(LeaderboardEntry {
            room: submission.room.clone(),
            name: submission.name.clone(),
            score: submission.score,
            created_at: Utc::now(),
        });
        Ok(())
    }

    fn fetch_top(
        &self,
        room: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        let mut matching: Vec<LeaderboardEntry> = rows
            .iter()
            .filter(|row| row.room == room && row.created_at >= since)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.score.cmp(&a.score));
        matching.truncate(limit);
        Ok(matching)
    }
}

/// Optional leaderboard. Without a backend every call is a no-op.
/// Backend failures are logged and swallowed.
#[derive(Debug, Clone)]
pub struct LeaderboardClient<B> {
    backend: Option<B>,
}

impl<B> Default for LeaderboardClient<B> {
    fn default() -> Self {
        Self::disabled()
    }
}

impl<B> LeaderboardClient<B> {
    pub const fn new(backend: B) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    #[must_use]
    pub const fn disabled() -> Self {
        Self { backend: None }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }
}

impl<B: Leaderboard> LeaderboardClient<B> {
    /// Submit a score. Returns whether the backend accepted it.
    pub fn submit(&self, room: &str, name: &str, score: f64) -> bool {
        let Some(backend) = &self.backend else {
            return false;
        };
        let submission = ScoreSubmission::new(room, name, score);
        match backend.submit_score(&submission) {
            Ok(()) => {
                log::info!(
                    "submitted {} for {} in room {}",
                    submission.score,
                    submission.name,
                    submission.room
                );
                true
            }
            Err(err) => {
                log::warn!("score submission failed: {err}");
                false
            }
        }
    }

    /// Submit a finished session under its player's name.
    pub fn submit_summary(&self, room: &str, summary: &SessionSummary) -> bool {
        self.submit(room, &summary.player_name, f64::from(summary.score))
    }

    /// Top scores for `room` over the last 24 hours.
    #[must_use]
    pub fn top(&self, room: &str) -> Vec<LeaderboardEntry> {
        self.top_at(room, Utc::now())
    }

    /// Like [`Self::top`] with an explicit clock.
    #[must_use]
    pub fn top_at(&self, room: &str, now: DateTime<Utc>) -> Vec<LeaderboardEntry> {
        let Some(backend) = &self.backend else {
            return Vec::new();
        };
        let since = now - Duration::hours(LEADERBOARD_WINDOW_HOURS);
        backend
            .fetch_top(&room.to_lowercase(), since, LEADERBOARD_TOP_LIMIT)
            .unwrap_or_else(|err| {
                log::warn!("leaderboard fetch failed: {err}");
                Vec::new()
            })
    }
}
