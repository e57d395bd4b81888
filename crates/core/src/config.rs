use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Duration;

use conf_hero_protocol::{CallToAction, HeroCopy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("at least one hero image is required")]
    NoSlides,
    #[error("rotate_interval_ms must be greater than zero")]
    ZeroInterval,
    #[error("scroll_step must be a finite positive number, got {0}")]
    InvalidScrollStep(f32),
}

/// Static configuration of one hero banner.
///
/// Every field has a default, so a config file only needs the fields it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeroConfig {
    /// Slide image URIs, in display order.
    pub images: Vec<String>,
    pub rotate_interval_ms: u64,
    /// Ticker advance per frame, in renderer units.
    pub scroll_step: f32,
    /// Path appended to the resolved endpoint, before the conference id.
    pub announcements_path: String,
    /// Conference whose announcements are shown.
    pub conf_id: Option<String>,
    pub copy: HeroCopy,
    pub links: Vec<CallToAction>,
    pub organizer: String,
}

impl Default for HeroConfig {
    fn default() -> Self {
        Self {
            images: (1..=5).map(|n| format!("/heroImages/hero{n}.jpg")).collect(),
            rotate_interval_ms: 4000,
            scroll_step: 0.5,
            announcements_path: "/conferencemodule/announcements/conf".into(),
            conf_id: None,
            copy: HeroCopy::default(),
            links: vec![
                CallToAction::new("Submit Paper", "/submit-paper"),
                CallToAction::new("Register Now", "/registration"),
                CallToAction::new("Contact Us", "/contact"),
            ],
            organizer: "ORGANIZED BY DEPARTMENT OF ELECTRONICS AND COMMUNICATION ENGINEERING, NIT JALANDHAR".into(),
        }
    }
}

impl HeroConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(data: &[u8]) -> Result<Self, ConfigError> {
        let config: HeroConfig = serde_json::from_slice(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data = std::fs::read(path)?;
        Self::from_json(&data)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.images.is_empty() {
            return Err(ConfigError::NoSlides);
        }
        if self.rotate_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if !self.scroll_step.is_finite() || self.scroll_step <= 0.0 {
            return Err(ConfigError::InvalidScrollStep(self.scroll_step));
        }
        Ok(())
    }

    pub fn slide_count(&self) -> Result<NonZeroUsize, ConfigError> {
        NonZeroUsize::new(self.images.len()).ok_or(ConfigError::NoSlides)
    }

    pub fn rotate_interval(&self) -> Duration {
        Duration::from_millis(self.rotate_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_the_original_site() {
        let config = HeroConfig::default();
        assert_eq!(config.images.len(), 5);
        assert_eq!(config.images[4], "/heroImages/hero5.jpg");
        assert_eq!(config.rotate_interval(), Duration::from_secs(4));
        assert_eq!(config.scroll_step, 0.5);
        assert_eq!(config.links[1].href, "/registration");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            HeroConfig::from_json(br#"{"conf_id":"6863b4da","rotate_interval_ms":2500}"#).unwrap();
        assert_eq!(config.conf_id.as_deref(), Some("6863b4da"));
        assert_eq!(config.rotate_interval_ms, 2500);
        assert_eq!(config.images.len(), 5);
    }

    #[test]
    fn rejects_unusable_values() {
        assert!(matches!(
            HeroConfig::from_json(br#"{"images":[]}"#),
            Err(ConfigError::NoSlides)
        ));
        assert!(matches!(
            HeroConfig::from_json(br#"{"rotate_interval_ms":0}"#),
            Err(ConfigError::ZeroInterval)
        ));
        assert!(matches!(
            HeroConfig::from_json(br#"{"scroll_step":-1.0}"#),
            Err(ConfigError::InvalidScrollStep(_))
        ));
        assert!(matches!(
            HeroConfig::from_json(b"{not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hero.json");
        std::fs::write(&path, br#"{"images":["/a.jpg","/b.jpg"]}"#).unwrap();
        let config = HeroConfig::load(&path).unwrap();
        assert_eq!(config.slide_count().unwrap().get(), 2);

        assert!(matches!(
            HeroConfig::load(dir.path().join("missing.json")),
            Err(ConfigError::Io(_))
        ));
    }
}
