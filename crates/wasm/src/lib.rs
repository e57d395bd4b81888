use std::num::NonZeroUsize;

use conf_hero_core::HeroConfig;
use conf_hero_core::announcements::{decode_sorted, endpoint_url};
use conf_hero_core::rotator::{Rotator, next_index, previous_index};
use conf_hero_core::ticker::advance_offset;
use conf_hero_protocol::ScrollMetrics;
use wasm_bindgen::prelude::*;

fn slide_count(count: usize) -> Result<NonZeroUsize, JsError> {
    NonZeroUsize::new(count).ok_or_else(|| JsError::new("slide count must be positive"))
}

/// Index of the slide after `index` in a ring of `count` slides.
#[wasm_bindgen]
pub fn next_slide(index: usize, count: usize) -> Result<usize, JsError> {
    Ok(next_index(index, slide_count(count)?))
}

/// Index of the slide before `index` in a ring of `count` slides.
#[wasm_bindgen]
pub fn previous_slide(index: usize, count: usize) -> Result<usize, JsError> {
    Ok(previous_index(index, slide_count(count)?))
}

/// Ticker offset for the next frame, wrapping to 0 at the end of the content.
#[wasm_bindgen]
pub fn advance_ticker(offset: f32, step: f32, viewport: f32, content: f32) -> f32 {
    advance_offset(offset, step, ScrollMetrics::new(viewport, content))
}

/// Announcements URL for a conference, or `undefined` while either input
/// is missing.
#[wasm_bindgen]
pub fn announcements_url(base: &str, conf_id: &str) -> Option<String> {
    if base.trim().is_empty() || conf_id.trim().is_empty() {
        return None;
    }
    let path = HeroConfig::default().announcements_path;
    Some(endpoint_url(base, &path, conf_id))
}

/// Parse an announcements response and return it ordered by `sequence`.
#[wasm_bindgen]
pub fn sort_announcements(json: &str) -> Result<String, JsError> {
    let items = decode_sorted(json.as_bytes()).map_err(|e| JsError::new(&e.to_string()))?;
    serde_json::to_string(&items).map_err(|e| JsError::new(&e.to_string()))
}

/// Slide cursor for hosts that run their own timer.
#[wasm_bindgen]
pub struct SlideCursor {
    rotator: Rotator,
}

#[wasm_bindgen]
impl SlideCursor {
    #[wasm_bindgen(constructor)]
    pub fn new(count: usize) -> Result<SlideCursor, JsError> {
        Ok(Self {
            rotator: Rotator::new(slide_count(count)?),
        })
    }

    #[wasm_bindgen(getter)]
    pub fn index(&self) -> usize {
        self.rotator.index()
    }

    #[wasm_bindgen(getter)]
    pub fn count(&self) -> usize {
        self.rotator.slide_count().get()
    }

    pub fn next(&mut self) -> usize {
        self.rotator.next()
    }

    pub fn previous(&mut self) -> usize {
        self.rotator.previous()
    }

    #[wasm_bindgen(js_name = jumpTo)]
    pub fn jump_to(&mut self, index: usize) -> Result<usize, JsError> {
        self.rotator
            .jump_to(index)
            .map_err(|e| JsError::new(&e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slides_wrap_both_ways() {
        assert_eq!(next_slide(4, 5).ok(), Some(0));
        assert_eq!(previous_slide(0, 5).ok(), Some(4));
        assert_eq!(next_slide(1, 5).ok(), Some(2));
    }

    #[test]
    fn ticker_wraps_at_content_end() {
        assert_eq!(advance_ticker(10.0, 0.5, 100.0, 400.0), 10.5);
        assert_eq!(advance_ticker(299.8, 0.5, 100.0, 400.0), 0.0);
    }

    #[test]
    fn url_needs_both_inputs() {
        assert_eq!(
            announcements_url("https://api.example.org/", "conf 1").as_deref(),
            Some("https://api.example.org/conferencemodule/announcements/conf/conf%201")
        );
        assert_eq!(announcements_url("", "x"), None);
        assert_eq!(announcements_url("https://api.example.org", " "), None);
    }

    #[test]
    fn sorts_by_sequence() {
        let sorted = sort_announcements(
            r#"[{"sequence":2,"title":"b"},{"sequence":1,"title":"a"}]"#,
        )
        .ok()
        .unwrap();
        let items: Vec<serde_json::Value> = serde_json::from_str(&sorted).unwrap();
        assert_eq!(items[0]["title"], "a");
        assert_eq!(items[1]["title"], "b");
    }

    #[test]
    fn cursor_walks_the_ring() {
        let mut cursor = SlideCursor::new(3).ok().unwrap();
        assert_eq!(cursor.count(), 3);
        assert_eq!(cursor.previous(), 2);
        assert_eq!(cursor.next(), 0);
        assert_eq!(cursor.jump_to(1).ok(), Some(1));
        assert_eq!(cursor.index(), 1);
    }
}
