use std::cell::RefCell;
use std::rc::Rc;

use conf_hero_protocol::ScrollMetrics;

use crate::schedule::{Cadence, Scheduler, TaskHandle};

/// Offset after one frame: move by `step`, or snap back to the start once
/// the end of the content would come into view.
pub fn advance_offset(offset: f32, step: f32, metrics: ScrollMetrics) -> f32 {
    let next = offset + step;
    if next + metrics.viewport >= metrics.content {
        0.0
    } else {
        next
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerPhase {
    Idle,
    Scrolling,
}

#[derive(Debug, Default)]
struct Strip {
    offset: f32,
    metrics: ScrollMetrics,
    frames: u64,
}

/// Auto-scrolling announcements strip.
///
/// Idle while there is nothing to show. [`sync`](Self::sync) with a
/// non-empty list starts a per-frame task from offset zero; syncing with an
/// empty list, or [`stop`](Self::stop), cancels it.
pub struct Ticker {
    strip: Rc<RefCell<Strip>>,
    step: f32,
    task: Option<TaskHandle>,
}

impl Ticker {
    pub fn new(step: f32) -> Self {
        Self {
            strip: Rc::new(RefCell::new(Strip::default())),
            step,
            task: None,
        }
    }

    pub fn phase(&self) -> TickerPhase {
        if self.task.is_some() {
            TickerPhase::Scrolling
        } else {
            TickerPhase::Idle
        }
    }

    pub fn offset(&self) -> f32 {
        self.strip.borrow().offset
    }

    /// Frames run since the loop last (re)started.
    pub fn frames(&self) -> u64 {
        self.strip.borrow().frames
    }

    /// Latest geometry reported by the renderer.
    pub fn set_metrics(&self, metrics: ScrollMetrics) {
        self.strip.borrow_mut().metrics = metrics;
    }

    /// React to a new announcement list. Any change restarts the loop so
    /// new content always starts from the left edge.
    pub fn sync(&mut self, has_items: bool, scheduler: &dyn Scheduler) {
        self.stop(scheduler);
        if !has_items {
            return;
        }

        {
            let mut strip = self.strip.borrow_mut();
            strip.offset = 0.0;
            strip.frames = 0;
        }
        let strip = Rc::downgrade(&self.strip);
        let step = self.step;
        self.task = Some(scheduler.schedule(
            Cadence::Frame,
            Box::new(move || {
                if let Some(strip) = strip.upgrade() {
                    let mut strip = strip.borrow_mut();
                    strip.offset = advance_offset(strip.offset, step, strip.metrics);
                    strip.frames += 1;
                }
            }),
        ));
        log::debug!("ticker scrolling");
    }

    pub fn stop(&mut self, scheduler: &dyn Scheduler) {
        if let Some(handle) = self.task.take() {
            scheduler.cancel(handle);
            log::debug!("ticker idle");
        }
        let mut strip = self.strip.borrow_mut();
        strip.offset = 0.0;
        strip.frames = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::FrameClock;

    #[test]
    fn offset_grows_by_step_until_wrap() {
        let metrics = ScrollMetrics::new(100.0, 102.0);
        let mut offset = 0.0;
        offset = advance_offset(offset, 0.5, metrics);
        assert_eq!(offset, 0.5);
        offset = advance_offset(offset, 0.5, metrics);
        offset = advance_offset(offset, 0.5, metrics);
        assert_eq!(offset, 1.5);
        // 2.0 + 100 reaches the content end.
        offset = advance_offset(offset, 0.5, metrics);
        assert_eq!(offset, 0.0);
    }

    #[test]
    fn short_content_never_scrolls() {
        let metrics = ScrollMetrics::new(300.0, 120.0);
        assert_eq!(advance_offset(0.0, 0.5, metrics), 0.0);
        assert_eq!(advance_offset(0.0, 0.5, ScrollMetrics::default()), 0.0);
    }

    #[test]
    fn offset_stays_below_scroll_range() {
        let metrics = ScrollMetrics::new(80.0, 200.0);
        let mut offset = 0.0;
        let mut wraps = 0;
        for k in 1..=1000 {
            let next = advance_offset(offset, 0.5, metrics);
            if next == 0.0 {
                wraps += 1;
            } else {
                assert_eq!(next, offset + 0.5, "frame {k}");
            }
            assert!(next < metrics.max_offset());
            offset = next;
        }
        // 240 frames per pass (0.5 .. 119.5 then reset).
        assert_eq!(wraps, 1000 / 240);
    }

    #[test]
    fn loop_runs_only_while_items_exist() {
        let clock = FrameClock::new();
        let mut ticker = Ticker::new(0.5);
        ticker.set_metrics(ScrollMetrics::new(100.0, 1000.0));

        ticker.sync(false, &clock);
        assert_eq!(ticker.phase(), TickerPhase::Idle);
        assert_eq!(clock.pending(), 0);

        ticker.sync(true, &clock);
        assert_eq!(ticker.phase(), TickerPhase::Scrolling);
        for _ in 0..10 {
            clock.frame();
        }
        assert_eq!(ticker.offset(), 5.0);
        assert_eq!(ticker.frames(), 10);

        ticker.sync(false, &clock);
        assert_eq!(ticker.phase(), TickerPhase::Idle);
        assert_eq!(clock.pending(), 0);
        clock.frame();
        assert_eq!(ticker.offset(), 0.0);
    }

    #[test]
    fn new_content_restarts_from_zero() {
        let clock = FrameClock::new();
        let mut ticker = Ticker::new(0.5);
        ticker.set_metrics(ScrollMetrics::new(100.0, 1000.0));
        ticker.sync(true, &clock);
        clock.frame();
        clock.frame();
        assert_eq!(ticker.offset(), 1.0);

        ticker.sync(true, &clock);
        assert_eq!(ticker.offset(), 0.0);
        assert_eq!(clock.pending(), 1);
        clock.frame();
        assert_eq!(ticker.offset(), 0.5);
    }
}
