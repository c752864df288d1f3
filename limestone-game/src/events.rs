//! One-way notifications from the core to the UI layer.
use serde::{Deserialize, Serialize};

use crate::data::Landmark;
use crate::imagery::ImageRef;
use crate::result::SessionSummary;
use crate::round::HintReveal;

/// Receives state-change notifications. Every method defaults to a no-op so
/// hosts implement only what they render.
pub trait GameObserver {
    fn round_started(&mut self, _round: u32, _total: u32, _score: u32) {}

    fn photo_ready(&mut self, _image: &ImageRef, _landmark: &Landmark) {}

    fn hint_revealed(&mut self, _hint: &HintReveal) {}

    fn guess_resolved(&mut self, _distance_m: f64, _score: u32, _landmark: &Landmark) {}

    fn round_skipped(&mut self, _landmark: &Landmark) {}

    fn session_finished(&mut self, _summary: &SessionSummary) {}

    fn personal_best_updated(&mut self, _best: u32) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl GameObserver for NoopObserver {}

/// A recorded notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameEvent {
    RoundStarted {
        round: u32,
        total: u32,
        score: u32,
    },
    PhotoReady {
        image: ImageRef,
        landmark_id: String,
    },
    HintRevealed(HintReveal),
    GuessResolved {
        distance_m: f64,
        score: u32,
        landmark_id: String,
    },
    RoundSkipped {
        landmark_id: String,
    },
    SessionFinished(SessionSummary),
    PersonalBestUpdated {
        best: u32,
    },
}

/// Observer that keeps every notification in order.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<GameEvent>,
}

impl EventLog {
    #[must_use]
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    #[must_use]
    pub fn into_events(self) -> Vec<GameEvent> {
        self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    #[must_use]
    pub fn count_where(&self, predicate: impl Fn(&GameEvent) -> bool) -> usize {
        self.events.iter().filter(|event| predicate(event)).count()
    }
}

impl GameObserver for EventLog {
    fn round_started(&mut self, round: u32, total: u32, score: u32) {
        self.events.push(GameEvent::RoundStarted {
            round,
            total,
            score,
        });
    }

    fn photo_ready(&mut self, image: &ImageRef, landmark: &Landmark) {
        self.events.push(GameEvent::PhotoReady {
            image: image.clone(),
            landmark_id: landmark.id.clone(),
        });
    }

    fn hint_revealed(&mut self, hint: &HintReveal) {
        self.events.push(GameEvent::HintRevealed(hint.clone()));
    }

    fn guess_resolved(&mut self, distance_m: f64, score: u32, landmark: &Landmark) {
        self.events.push(GameEvent::GuessResolved {
            distance_m,
            score,
            landmark_id: landmark.id.clone(),
        });
    }

    fn round_skipped(&mut self, landmark: &Landmark) {
        self.events.push(GameEvent::RoundSkipped {
            landmark_id: landmark.id.clone(),
        });
    }

    fn session_finished(&mut self, summary: &SessionSummary) {
        self.events
            .push(GameEvent::SessionFinished(summary.clone()));
    }

    fn personal_best_updated(&mut self, best: u32) {
        self.events.push(GameEvent::PersonalBestUpdated { best });
    }
}

impl<T: GameObserver + ?Sized> GameObserver for &mut T {
    fn round_started(&mut self, round: u32, total: u32, score: u32) {
        (**self).round_started(round, total, score);
    }

    fn photo_ready(&mut self, image: &ImageRef, landmark: &Landmark) {
        (**self).photo_ready(image, landmark);
    }

    fn hint_revealed(&mut self, hint: &HintReveal) {
        (**self).hint_revealed(hint);
    }

    fn guess_resolved(&mut self, distance_m: f64, score: u32, landmark: &Landmark) {
        (**self).guess_resolved(distance_m, score, landmark);
    }

    fn round_skipped(&mut self, landmark: &Landmark) {
        (**self).round_skipped(landmark);
    }

    fn session_finished(&mut self, summary: &SessionSummary) {
        (**self).session_finished(summary);
    }

    fn personal_best_updated(&mut self, best: u32) {
        (**self).personal_best_updated(best);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_log_records_in_order() {
        let mut log = EventLog::default();
        log.round_started(1, 5, 0);
        log.personal_best_updated(9_000);
        assert_eq!(
            log.events(),
            &[
                GameEvent::RoundStarted {
                    round: 1,
                    total: 5,
                    score: 0
                },
                GameEvent::PersonalBestUpdated { best: 9_000 },
            ]
        );
        assert_eq!(
            log.count_where(|e| matches!(e, GameEvent::RoundStarted { .. })),
            1
        );
        log.clear();
        assert!(log.into_events().is_empty());
    }

    #[test]
    fn events_serialize_with_kind_tag() {
        let json = serde_json::to_value(GameEvent::RoundSkipped {
            landmark_id: "fort-henry".to_string(),
        })
        .unwrap();
        assert_eq!(json["kind"], "round_skipped");
        assert_eq!(json["landmark_id"], "fort-henry");
    }
}
