use serde::{Deserialize, Serialize};

use crate::types::{CallToAction, HeroCopy};

/// Everything a renderer needs to draw one frame of the hero.
///
/// The core builds a fresh snapshot on request. Renderers never mutate it;
/// user input travels back as [`HeroAction`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeroSnapshot {
    /// The slide to show, `None` until every image has been preloaded.
    pub slide: Option<SlideView>,
    /// Number of slides, for the progress dots.
    pub slide_count: usize,
    /// Index of the current slide, for the progress dots.
    pub current: usize,
    pub ticker: TickerView,
    pub copy: HeroCopy,
    pub links: Vec<CallToAction>,
    pub organizer: String,
}

impl HeroSnapshot {
    /// Accessible label of the dot for slide `index`.
    pub fn dot_label(index: usize) -> String {
        format!("Go to slide {}", index + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideView {
    pub index: usize,
    pub uri: String,
    pub alt: String,
}

impl SlideView {
    pub fn new(index: usize, uri: impl Into<String>) -> Self {
        Self {
            index,
            uri: uri.into(),
            alt: format!("Conference image {}", index + 1),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickerView {
    /// Horizontal scroll offset to apply to the strip.
    pub offset: f32,
    /// Whether the frame loop is running.
    pub scrolling: bool,
    /// Headlines in display order.
    pub headlines: Vec<String>,
}

/// User input a renderer hands back to the component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeroAction {
    Previous,
    Next,
    JumpTo(usize),
}

impl HeroAction {
    /// Accessible label of the control that produces this action.
    pub fn label(&self) -> String {
        match self {
            HeroAction::Previous => "Previous slide".into(),
            HeroAction::Next => "Next slide".into(),
            HeroAction::JumpTo(index) => HeroSnapshot::dot_label(*index),
        }
    }
}
