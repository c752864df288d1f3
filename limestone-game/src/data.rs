use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::geo::GeoPoint;

/// Failure loading or validating a landmark gazetteer.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("landmark data is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate landmark id {0}")]
    DuplicateId(String),
    #[error("landmark {id} has invalid coordinates ({lat}, {lon})")]
    BadCoordinates { id: String, lat: f64, lon: f64 },
}

/// Difficulty tier shared by landmarks and sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Self; 3] = [Self::Easy, Self::Medium, Self::Hard];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    /// Parse a tier name, ignoring ASCII case.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.key().eq_ignore_ascii_case(value.trim()))
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Neighbourhood a landmark belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Campus,
    Downtown,
    Bars,
}

impl Category {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Campus => "Queen's Campus",
            Self::Downtown => "Downtown Kingston",
            Self::Bars => "Kingston Nightlife",
        }
    }
}

/// Camera placement used when requesting a street-level photo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewParams {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub heading: f64,
    #[serde(default)]
    pub pitch: f64,
}

/// A named, geolocated point of interest used as a round's target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub id: String,
    pub name: String,
    pub description: String,
    pub lat: f64,
    pub lon: f64,
    /// Revealed in order, one per hint request.
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub street_view: Option<ViewParams>,
}

impl Landmark {
    #[must_use]
    pub const fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }

    #[must_use]
    pub fn hint_count(&self) -> usize {
        self.hints.len()
    }
}

/// Container for all landmark data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LandmarkData {
    pub landmarks: Vec<Landmark>,
}

impl LandmarkData {
    /// Create empty landmark data (useful for tests)
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            landmarks: Vec::new(),
        }
    }

    /// Load landmark data from JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into valid landmark data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub const fn from_landmarks(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks }
    }

    /// Read and validate a gazetteer file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_checked(&text)
    }

    /// Parse a gazetteer and run [`Self::validate`] on it.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or fails validation.
    pub fn from_json_checked(json: &str) -> Result<Self, CatalogError> {
        let data = Self::from_json(json)?;
        data.validate()?;
        Ok(data)
    }

    /// The bundled Kingston gazetteer, validated like any file on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded asset fails to parse or validate.
    pub fn kingston() -> Result<Self, CatalogError> {
        Self::from_json_checked(include_str!("../assets/kingston_landmarks.json"))
    }

    /// Reject duplicate ids and out-of-range coordinates.
    ///
    /// # Errors
    ///
    /// Returns the first offending landmark.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for landmark in &self.landmarks {
            if !seen.insert(landmark.id.as_str()) {
                return Err(CatalogError::DuplicateId(landmark.id.clone()));
            }
            let lat_ok = landmark.lat.is_finite() && landmark.lat.abs() <= 90.0;
            let lon_ok = landmark.lon.is_finite() && landmark.lon.abs() <= 180.0;
            if !(lat_ok && lon_ok) {
                return Err(CatalogError::BadCoordinates {
                    id: landmark.id.clone(),
                    lat: landmark.lat,
                    lon: landmark.lon,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_data_from_json() {
        let json = r#"{
            "landmarks": [
                {
                    "id": "grant-hall-1",
                    "name": "Grant Hall",
                    "description": "Historic clock tower",
                    "lat": 44.2315,
                    "lon": -76.4959,
                    "hints": ["Clock tower"],
                    "difficulty": "easy",
                    "category": "campus",
                    "street_view": { "lat": 44.2315, "lon": -76.4959, "heading": 180 }
                }
            ]
        }"#;

        let data = LandmarkData::from_json(json).unwrap();
        assert_eq!(data.landmarks.len(), 1);
        let landmark = &data.landmarks[0];
        assert_eq!(landmark.name, "Grant Hall");
        assert_eq!(landmark.difficulty, Difficulty::Easy);
        assert_eq!(landmark.category, Some(Category::Campus));
        assert_eq!(landmark.hint_count(), 1);
        let view = landmark.street_view.unwrap();
        assert!((view.heading - 180.0).abs() < f64::EPSILON);
        assert!(view.pitch.abs() < f64::EPSILON);
    }

    #[test]
    fn missing_optional_fields_default() {
        let json = r#"{ "landmarks": [
            { "id": "x", "name": "X", "description": "", "lat": 1.0, "lon": 2.0 }
        ] }"#;
        let data = LandmarkData::from_json(json).unwrap();
        let landmark = &data.landmarks[0];
        assert_eq!(landmark.difficulty, Difficulty::Medium);
        assert!(landmark.hints.is_empty());
        assert!(landmark.category.is_none());
        assert!(landmark.street_view.is_none());
    }

    #[test]
    fn difficulty_parses_case_insensitively() {
        assert_eq!(Difficulty::parse("HARD"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::parse(" easy "), Some(Difficulty::Easy));
        assert_eq!(Difficulty::parse("expert"), None);
        assert_eq!(Difficulty::Medium.to_string(), "medium");
    }

    #[test]
    fn bundled_gazetteer_parses() {
        let data = LandmarkData::kingston().unwrap();
        assert!(data.landmarks.len() > 60);
        data.validate().unwrap();
    }

    #[test]
    fn validate_rejects_duplicates_and_bad_coordinates() {
        let json = r#"{ "landmarks": [
            { "id": "a", "name": "A", "description": "", "lat": 44.0, "lon": -76.0 },
            { "id": "a", "name": "B", "description": "", "lat": 44.0, "lon": -76.0 }
        ] }"#;
        let data = LandmarkData::from_json(json).unwrap();
        assert!(matches!(data.validate(), Err(CatalogError::DuplicateId(id)) if id == "a"));
        assert!(matches!(
            LandmarkData::from_json_checked(json),
            Err(CatalogError::DuplicateId(_))
        ));

        let json = r#"{ "landmarks": [
            { "id": "b", "name": "B", "description": "", "lat": 144.0, "lon": -76.0 }
        ] }"#;
        let data = LandmarkData::from_json(json).unwrap();
        assert!(matches!(
            data.validate(),
            Err(CatalogError::BadCoordinates { .. })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = LandmarkData::from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
        assert!(err.to_string().contains("here.json"));
    }
}
