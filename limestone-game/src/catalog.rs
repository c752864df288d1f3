//! Landmark catalog with filtered random selection and anti-repeat memory.
use rand::Rng;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use crate::constants::RECENT_PICK_WINDOW;
use crate::data::{Category, Difficulty, Landmark, LandmarkData};

/// Rolling memory of the most recently chosen landmark ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentPicks {
    ids: VecDeque<String>,
    capacity: usize,
}

impl RecentPicks {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            ids: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|seen| seen == id)
    }

    /// Record a pick, dropping the oldest entries beyond capacity.
    pub fn remember(&mut self, id: impl Into<String>) {
        self.ids.push_back(id.into());
        while self.ids.len() > self.capacity {
            self.ids.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

impl Default for RecentPicks {
    fn default() -> Self {
        Self::new(RECENT_PICK_WINDOW)
    }
}

/// Immutable landmark list plus the shared anti-repeat memory.
///
/// Share one catalog through `Arc` to keep a single process-wide memory;
/// every clone of the `Arc` sees the same recent picks.
#[derive(Debug)]
pub struct LandmarkCatalog {
    landmarks: Vec<Landmark>,
    recent: Mutex<RecentPicks>,
}

impl LandmarkCatalog {
    #[must_use]
    pub fn new(data: LandmarkData) -> Self {
        Self::with_recent_capacity(data, RECENT_PICK_WINDOW)
    }

    #[must_use]
    pub fn with_recent_capacity(data: LandmarkData, capacity: usize) -> Self {
        Self {
            landmarks: data.landmarks,
            recent: Mutex::new(RecentPicks::new(capacity)),
        }
    }

    /// The bundled Kingston gazetteer, parsed once per process.
    #[must_use]
    pub fn kingston() -> Arc<Self> {
        static CATALOG: OnceLock<Arc<LandmarkCatalog>> = OnceLock::new();
        Arc::clone(CATALOG.get_or_init(|| {
            let data = LandmarkData::kingston().unwrap_or_else(|err| {
                log::warn!("bundled landmark data failed to parse: {err}");
                LandmarkData::empty()
            });
            Arc::new(Self::new(data))
        }))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Landmark> {
        self.landmarks.iter()
    }

    #[must_use]
    pub fn get_by_id(&self, id: &str) -> Option<&Landmark> {
        self.landmarks.iter().find(|landmark| landmark.id == id)
    }

    #[must_use]
    pub fn by_difficulty(&self, tier: Difficulty) -> Vec<&Landmark> {
        self.landmarks
            .iter()
            .filter(|landmark| landmark.difficulty == tier)
            .collect()
    }

    #[must_use]
    pub fn by_category(&self, category: Category) -> Vec<&Landmark> {
        self.landmarks
            .iter()
            .filter(|landmark| landmark.category == Some(category))
            .collect()
    }

    /// Pick a landmark uniformly, preferring the requested tier and avoiding
    /// recent picks.
    ///
    /// An empty tier falls back to the whole catalog. When every candidate
    /// is in the recent memory the memory is cleared first. Returns `None`
    /// only for an empty catalog.
    pub fn random_landmark<R>(&self, tier: Option<Difficulty>, rng: &mut R) -> Option<Landmark>
    where
        R: Rng + ?Sized,
    {
        let mut pool = tier.map(|tier| self.by_difficulty(tier)).unwrap_or_default();
        if pool.is_empty() {
            pool = self.landmarks.iter().collect();
        }
        if pool.is_empty() {
            return None;
        }

        let mut recent = self.recent();
        let mut available: Vec<&Landmark> = pool
            .iter()
            .copied()
            .filter(|landmark| !recent.contains(&landmark.id))
            .collect();
        if available.is_empty() {
            log::debug!(
                "anti-repeat memory exhausted for {} candidates; resetting",
                pool.len()
            );
            recent.clear();
            available = pool;
        }

        let chosen = available[rng.gen_range(0..available.len())];
        recent.remember(chosen.id.clone());
        Some(chosen.clone())
    }

    /// Ids currently excluded from selection, oldest first.
    #[must_use]
    pub fn recent_ids(&self) -> Vec<String> {
        self.recent().iter().map(str::to_owned).collect()
    }

    pub fn reset_recent(&self) {
        self.recent().clear();
    }

    fn recent(&self) -> MutexGuard<'_, RecentPicks> {
        self.recent.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<'a> IntoIterator for &'a LandmarkCatalog {
    type Item = &'a Landmark;
    type IntoIter = std::slice::Iter<'a, Landmark>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use std::collections::HashSet;

    fn landmark(id: &str, difficulty: Difficulty) -> Landmark {
        Landmark {
            id: id.to_string(),
            name: id.to_uppercase(),
            description: String::new(),
            lat: 44.23,
            lon: -76.49,
            hints: vec![],
            difficulty,
            category: Some(Category::Campus),
            street_view: None,
        }
    }

    fn catalog_of(count: usize, difficulty: Difficulty) -> LandmarkCatalog {
        let landmarks = (0..count)
            .map(|i| landmark(&format!("lm-{i}"), difficulty))
            .collect();
        LandmarkCatalog::new(LandmarkData::from_landmarks(landmarks))
    }

    #[test]
    fn recent_picks_trim_to_capacity() {
        let mut recent = RecentPicks::new(2);
        recent.remember("a");
        recent.remember("b");
        recent.remember("c");
        assert_eq!(recent.len(), 2);
        assert!(!recent.contains("a"));
        assert_eq!(recent.iter().collect::<Vec<_>>(), vec!["b", "c"]);
        recent.clear();
        assert!(recent.is_empty());
        assert_eq!(RecentPicks::default().capacity(), RECENT_PICK_WINDOW);
    }

    #[test]
    fn no_repeat_within_window() {
        let catalog = catalog_of(21, Difficulty::Medium);
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let picks: Vec<String> = (0..200)
            .map(|_| {
                catalog
                    .random_landmark(Some(Difficulty::Medium), &mut rng)
                    .unwrap()
                    .id
            })
            .collect();
        for window in picks.windows(RECENT_PICK_WINDOW) {
            let unique: HashSet<&String> = window.iter().collect();
            assert_eq!(unique.len(), window.len());
        }
    }

    #[test]
    fn small_pool_resets_memory() {
        let catalog = catalog_of(3, Difficulty::Easy);
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let first: HashSet<String> = (0..3)
            .map(|_| catalog.random_landmark(None, &mut rng).unwrap().id)
            .collect();
        assert_eq!(first.len(), 3);
        let fourth = catalog.random_landmark(None, &mut rng).unwrap();
        assert_eq!(catalog.recent_ids(), vec![fourth.id]);
    }

    #[test]
    fn empty_tier_falls_back_to_full_catalog() {
        let catalog = catalog_of(4, Difficulty::Easy);
        assert!(catalog.by_difficulty(Difficulty::Hard).is_empty());
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let pick = catalog.random_landmark(Some(Difficulty::Hard), &mut rng);
        assert_eq!(pick.map(|l| l.difficulty), Some(Difficulty::Easy));
    }

    #[test]
    fn tier_filter_is_respected() {
        let mut landmarks: Vec<Landmark> = (0..5)
            .map(|i| landmark(&format!("easy-{i}"), Difficulty::Easy))
            .collect();
        landmarks.push(landmark("hard-0", Difficulty::Hard));
        let catalog = LandmarkCatalog::new(LandmarkData::from_landmarks(landmarks));
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        for _ in 0..10 {
            let pick = catalog
                .random_landmark(Some(Difficulty::Hard), &mut rng)
                .unwrap();
            assert_eq!(pick.id, "hard-0");
        }
    }

    #[test]
    fn empty_catalog_yields_nothing() {
        let catalog = LandmarkCatalog::new(LandmarkData::empty());
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        assert!(catalog.random_landmark(None, &mut rng).is_none());
        assert!(catalog.is_empty());
    }

    #[test]
    fn zero_capacity_disables_memory() {
        let catalog = LandmarkCatalog::with_recent_capacity(
            LandmarkData::from_landmarks(vec![landmark("solo", Difficulty::Easy)]),
            0,
        );
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        for _ in 0..3 {
            assert!(catalog.random_landmark(None, &mut rng).is_some());
            assert!(catalog.recent_ids().is_empty());
        }
    }

    #[test]
    fn kingston_catalog_has_every_tier_and_category() {
        let catalog = LandmarkCatalog::kingston();
        for tier in Difficulty::ALL {
            assert!(!catalog.by_difficulty(tier).is_empty(), "{tier} is empty");
        }
        for category in [Category::Campus, Category::Downtown, Category::Bars] {
            assert!(!catalog.by_category(category).is_empty());
        }
        let grant = catalog.get_by_id("grant-hall-1").unwrap();
        assert!((grant.lat - 44.2315).abs() < 1e-9);
        assert_eq!((&*catalog).into_iter().count(), catalog.len());
    }
}
