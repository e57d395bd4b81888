use serde::{Deserialize, Serialize};

/// Geometry of the ticker strip as laid out by the renderer, in the
/// renderer's own horizontal units (pixels, terminal cells).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrollMetrics {
    /// Visible width of the strip.
    pub viewport: f32,
    /// Total width of the laid-out content.
    pub content: f32,
}

impl ScrollMetrics {
    pub fn new(viewport: f32, content: f32) -> Self {
        Self { viewport, content }
    }

    /// Largest offset at which the end of the content is still not visible.
    pub fn max_offset(&self) -> f32 {
        (self.content - self.viewport).max(0.0)
    }
}

/// A static link in the row under the hero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallToAction {
    pub label: String,
    pub href: String,
}

impl CallToAction {
    pub fn new(label: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            href: href.into(),
        }
    }
}

/// Text shown over the slides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroCopy {
    pub title: String,
    pub subtitle: String,
    pub register: CallToAction,
}

impl Default for HeroCopy {
    fn default() -> Self {
        Self {
            title: "International Conference on Intelligent Processing".into(),
            subtitle: "Hardware, Electronics, and Radio Systems | February 13-15, 2026 | NIT Jalandhar"
                .into(),
            register: CallToAction::new("Register", "/6863b4da7b0acf10390f6b41"),
        }
    }
}
