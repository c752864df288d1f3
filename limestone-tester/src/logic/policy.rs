use std::fmt;

use limestone_game::{GeoPoint, KINGSTON_BOUNDS, RoundState};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Meters per degree of latitude on the haversine sphere.
const METERS_PER_DEGREE: f64 = 111_194.93;

/// What an automated player does next in a presented round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerAction {
    Hint,
    Guess(GeoPoint),
    Skip,
}

/// Scripted player used by simulations.
pub trait GuessPolicy {
    fn name(&self) -> &'static str;

    fn act(&mut self, round: &RoundState) -> PlayerAction;
}

/// Built-in guessing strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GuessStrategy {
    /// Clicks exactly on the target.
    Perfect,
    /// Lands within 40 m.
    Sharp,
    /// Lands within 400 m.
    Noisy,
    /// Reads every hint, then lands within 80 m.
    Hinter,
    /// Clicks anywhere in the play area.
    Wild,
    /// Skips every round.
    Skipper,
}

impl GuessStrategy {
    pub const ALL: [Self; 6] = [
        Self::Perfect,
        Self::Sharp,
        Self::Noisy,
        Self::Hinter,
        Self::Wild,
        Self::Skipper,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Perfect => "Perfect",
            Self::Sharp => "Sharp",
            Self::Noisy => "Noisy",
            Self::Hinter => "Hinter",
            Self::Wild => "Wild",
            Self::Skipper => "Skipper",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn GuessPolicy + Send> {
        match self {
            Self::Perfect => Box::new(PerfectPolicy),
            Self::Sharp => Box::new(ScatterPolicy::new("sharp", 40.0, seed)),
            Self::Noisy => Box::new(ScatterPolicy::new("noisy", 400.0, seed)),
            Self::Hinter => Box::new(HinterPolicy {
                scatter: ScatterPolicy::new("hinter", 80.0, seed),
            }),
            Self::Wild => Box::new(WildPolicy {
                rng: ChaCha20Rng::seed_from_u64(seed),
            }),
            Self::Skipper => Box::new(SkipperPolicy),
        }
    }
}

impl fmt::Display for GuessStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Move `origin` by `meters` along `bearing` (radians from north).
#[must_use]
pub fn offset_point(origin: GeoPoint, meters: f64, bearing: f64) -> GeoPoint {
    let dlat = meters * bearing.cos() / METERS_PER_DEGREE;
    let dlon = meters * bearing.sin() / (METERS_PER_DEGREE * origin.lat.to_radians().cos());
    GeoPoint::new(origin.lat + dlat, origin.lon + dlon)
}

struct PerfectPolicy;

impl GuessPolicy for PerfectPolicy {
    fn name(&self) -> &'static str {
        "perfect"
    }

    fn act(&mut self, round: &RoundState) -> PlayerAction {
        PlayerAction::Guess(round.landmark.position())
    }
}

struct ScatterPolicy {
    name: &'static str,
    radius_m: f64,
    rng: ChaCha20Rng,
}

impl ScatterPolicy {
    fn new(name: &'static str, radius_m: f64, seed: u64) -> Self {
        Self {
            name,
            radius_m,
            rng: ChaCha20Rng::seed_from_u64(seed ^ 0x5CA7_7E12),
        }
    }

    fn scatter(&mut self, target: GeoPoint) -> GeoPoint {
        let distance = self.rng.gen_range(0.0..=self.radius_m);
        let bearing = self.rng.gen_range(0.0..std::f64::consts::TAU);
        offset_point(target, distance, bearing)
    }
}

impl GuessPolicy for ScatterPolicy {
    fn name(&self) -> &'static str {
        self.name
    }

    fn act(&mut self, round: &RoundState) -> PlayerAction {
        PlayerAction::Guess(self.scatter(round.landmark.position()))
    }
}

struct HinterPolicy {
    scatter: ScatterPolicy,
}

impl GuessPolicy for HinterPolicy {
    fn name(&self) -> &'static str {
        "hinter"
    }

    fn act(&mut self, round: &RoundState) -> PlayerAction {
        if round.hints_remaining() > 0 {
            PlayerAction::Hint
        } else {
            self.scatter.act(round)
        }
    }
}

struct WildPolicy {
    rng: ChaCha20Rng,
}

impl GuessPolicy for WildPolicy {
    fn name(&self) -> &'static str {
        "wild"
    }

    fn act(&mut self, _round: &RoundState) -> PlayerAction {
        let lat = self
            .rng
            .gen_range(KINGSTON_BOUNDS.south..=KINGSTON_BOUNDS.north);
        let lon = self.rng.gen_range(KINGSTON_BOUNDS.west..=KINGSTON_BOUNDS.east);
        PlayerAction::Guess(GeoPoint::new(lat, lon))
    }
}

struct SkipperPolicy;

impl GuessPolicy for SkipperPolicy {
    fn name(&self) -> &'static str {
        "skipper"
    }

    fn act(&mut self, _round: &RoundState) -> PlayerAction {
        PlayerAction::Skip
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use limestone_game::{Difficulty, Landmark};

    fn round() -> RoundState {
        RoundState {
            round: 1,
            landmark: Landmark {
                id: "grant-hall".to_string(),
                name: "Grant Hall".to_string(),
                description: String::new(),
                lat: 44.2315,
                lon: -76.4959,
                hints: vec!["Clock tower".to_string()],
                difficulty: Difficulty::Easy,
                category: None,
                street_view: None,
            },
            hints_used: 0,
            hint_penalty: 0,
        }
    }

    #[test]
    fn offset_point_moves_requested_distance() {
        let origin = GeoPoint::new(44.2315, -76.4959);
        for bearing in [0.0, 1.0, 2.5, 4.0] {
            let moved = offset_point(origin, 250.0, bearing);
            let d = origin.distance_to(moved);
            assert!((d - 250.0).abs() < 1.0, "bearing {bearing}: {d}");
        }
    }

    #[test]
    fn scatter_stays_inside_radius() {
        let mut policy = GuessStrategy::Sharp.create_policy(3);
        let round = round();
        for _ in 0..50 {
            let PlayerAction::Guess(point) = policy.act(&round) else {
                panic!("sharp policy must guess");
            };
            assert!(point.distance_to(round.landmark.position()) <= 41.0);
        }
    }

    #[test]
    fn hinter_exhausts_hints_first() {
        let mut policy = GuessStrategy::Hinter.create_policy(1);
        let mut round = round();
        assert_eq!(policy.act(&round), PlayerAction::Hint);
        round.hints_used = 1;
        assert!(matches!(policy.act(&round), PlayerAction::Guess(_)));
    }

    #[test]
    fn wild_guesses_in_bounds_and_skipper_skips() {
        let mut wild = GuessStrategy::Wild.create_policy(9);
        let round = round();
        for _ in 0..20 {
            let PlayerAction::Guess(point) = wild.act(&round) else {
                panic!("wild policy must guess");
            };
            assert!(KINGSTON_BOUNDS.contains(point));
        }
        let mut skipper = GuessStrategy::Skipper.create_policy(0);
        assert_eq!(skipper.act(&round), PlayerAction::Skip);
        assert_eq!(skipper.name(), "skipper");
    }
}
