//! Photo references for landmarks, with a deterministic placeholder fallback.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{STREET_VIEW_ENDPOINT, STREET_VIEW_FOV, STREET_VIEW_SIZE};
use crate::data::Landmark;

/// Environment variable holding the Street View Static API key.
pub const STREET_VIEW_KEY_ENV: &str = "LIMESTONE_STREET_VIEW_KEY";

/// Something a host can display for a landmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageRef {
    Url {
        url: String,
    },
    Placeholder {
        landmark_id: String,
        title: String,
        subtitle: String,
    },
}

impl ImageRef {
    /// Placeholder card naming the landmark and its neighbourhood.
    #[must_use]
    pub fn placeholder(landmark: &Landmark) -> Self {
        let subtitle = landmark
            .category
            .map_or("Kingston", |category| category.label())
            .to_string();
        Self::Placeholder {
            landmark_id: landmark.id.clone(),
            title: landmark.name.clone(),
            subtitle,
        }
    }

    #[must_use]
    pub const fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder { .. })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageError {
    #[error("no Street View API key configured")]
    MissingApiKey,
    #[error("landmark {0} has no view parameters")]
    MissingViewParams(String),
    #[error("image unavailable: {0}")]
    Unavailable(String),
}

/// Source of landmark photos.
pub trait ImageProvider {
    /// Produce an image reference for `landmark`.
    ///
    /// # Errors
    ///
    /// Returns an error if no image can be produced; callers substitute a
    /// placeholder.
    fn image_for(&self, landmark: &Landmark) -> Result<ImageRef, ImageError>;
}

/// Always answers with the placeholder card.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderImages;

impl ImageProvider for PlaceholderImages {
    fn image_for(&self, landmark: &Landmark) -> Result<ImageRef, ImageError> {
        Ok(ImageRef::placeholder(landmark))
    }
}

/// Builds Street View Static API URLs from a landmark's view parameters.
/// Fetching the image is left to the host.
#[derive(Debug, Clone, Default)]
pub struct StreetViewUrls {
    api_key: Option<String>,
}

impl StreetViewUrls {
    #[must_use]
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        }
    }

    /// Read the key from `LIMESTONE_STREET_VIEW_KEY`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(std::env::var(STREET_VIEW_KEY_ENV).ok())
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

impl ImageProvider for StreetViewUrls {
    fn image_for(&self, landmark: &Landmark) -> Result<ImageRef, ImageError> {
        let key = self.api_key.as_deref().ok_or(ImageError::MissingApiKey)?;
        let view = landmark
            .street_view
            .ok_or_else(|| ImageError::MissingViewParams(landmark.id.clone()))?;
        let url = format!(
            "{STREET_VIEW_ENDPOINT}?size={STREET_VIEW_SIZE}&location={},{}&heading={}&pitch={}&fov={STREET_VIEW_FOV}&key={key}",
            view.lat, view.lon, view.heading, view.pitch
        );
        Ok(ImageRef::Url { url })
    }
}

/// Ask `provider` for an image, falling back to the placeholder on failure.
pub fn resolve_image<P>(provider: &P, landmark: &Landmark) -> ImageRef
where
    P: ImageProvider + ?Sized,
{
    provider.image_for(landmark).unwrap_or_else(|err| {
        log::warn!("using placeholder image for {}: {err}", landmark.id);
        ImageRef::placeholder(landmark)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Category, Difficulty, ViewParams};

    fn fort_henry() -> Landmark {
        Landmark {
            id: "fort-henry".to_string(),
            name: "Fort Henry".to_string(),
            description: "Historic fort".to_string(),
            lat: 44.2366,
            lon: -76.4583,
            hints: vec!["Military".to_string()],
            difficulty: Difficulty::Hard,
            category: Some(Category::Downtown),
            street_view: Some(ViewParams {
                lat: 44.2366,
                lon: -76.4583,
                heading: 270.0,
                pitch: 0.0,
            }),
        }
    }

    #[test]
    fn street_view_url_carries_view_params() {
        let provider = StreetViewUrls::new(Some("test-key".to_string()));
        assert!(provider.is_enabled());
        let ImageRef::Url { url } = provider.image_for(&fort_henry()).unwrap() else {
            panic!("expected url");
        };
        assert!(url.starts_with("https://maps.googleapis.com/maps/api/streetview?size=800x600"));
        assert!(url.contains("location=44.2366,-76.4583"));
        assert!(url.contains("heading=270"));
        assert!(url.contains("fov=90"));
        assert!(url.ends_with("key=test-key"));
    }

    #[test]
    fn missing_key_or_view_falls_back_to_placeholder() {
        let disabled = StreetViewUrls::new(Some("  ".to_string()));
        assert!(!disabled.is_enabled());
        assert_eq!(
            disabled.image_for(&fort_henry()),
            Err(ImageError::MissingApiKey)
        );
        let image = resolve_image(&disabled, &fort_henry());
        assert_eq!(
            image,
            ImageRef::Placeholder {
                landmark_id: "fort-henry".to_string(),
                title: "Fort Henry".to_string(),
                subtitle: "Downtown Kingston".to_string(),
            }
        );

        let mut no_view = fort_henry();
        no_view.street_view = None;
        let enabled = StreetViewUrls::new(Some("k".to_string()));
        assert!(resolve_image(&enabled, &no_view).is_placeholder());
    }

    #[test]
    fn placeholder_is_deterministic() {
        let a = resolve_image(&PlaceholderImages, &fort_henry());
        let b = resolve_image(&PlaceholderImages, &fort_henry());
        assert_eq!(a, b);
    }
}
