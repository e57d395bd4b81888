use std::cell::RefCell;
use std::num::NonZeroUsize;
use std::rc::Rc;
use std::time::Duration;

use thiserror::Error;

use crate::schedule::{Cadence, Scheduler, TaskHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RotatorError {
    #[error("slide {requested} is out of range (0..{len})")]
    OutOfRange { requested: usize, len: usize },
}

/// Index after `index` in a ring of `len` slides.
pub fn next_index(index: usize, len: NonZeroUsize) -> usize {
    (index % len.get() + 1) % len.get()
}

/// Index before `index` in a ring of `len` slides.
pub fn previous_index(index: usize, len: NonZeroUsize) -> usize {
    let index = index % len.get();
    if index == 0 { len.get() - 1 } else { index - 1 }
}

/// Current-slide cursor over a fixed ring of slides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rotator {
    index: usize,
    len: NonZeroUsize,
}

impl Rotator {
    pub fn new(len: NonZeroUsize) -> Self {
        Self { index: 0, len }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn slide_count(&self) -> NonZeroUsize {
        self.len
    }

    pub fn next(&mut self) -> usize {
        self.index = next_index(self.index, self.len);
        self.index
    }

    pub fn previous(&mut self) -> usize {
        self.index = previous_index(self.index, self.len);
        self.index
    }

    /// Move straight to `index`. Out-of-range targets leave the cursor
    /// where it is.
    pub fn jump_to(&mut self, index: usize) -> Result<usize, RotatorError> {
        if index >= self.len.get() {
            return Err(RotatorError::OutOfRange {
                requested: index,
                len: self.len.get(),
            });
        }
        self.index = index;
        Ok(index)
    }
}

/// A [`Rotator`] advanced by a recurring timer.
///
/// The timer callback holds only a weak reference to the cursor, so a
/// dropped slideshow never keeps its state alive through the scheduler.
pub struct SlideShow {
    rotator: Rc<RefCell<Rotator>>,
    period: Duration,
    task: Option<TaskHandle>,
}

impl SlideShow {
    pub fn new(len: NonZeroUsize, period: Duration) -> Self {
        Self {
            rotator: Rc::new(RefCell::new(Rotator::new(len))),
            period,
            task: None,
        }
    }

    /// Start the timer. Returns `false` if it was already running.
    pub fn activate(&mut self, scheduler: &dyn Scheduler) -> bool {
        if self.task.is_some() {
            return false;
        }
        let rotator = Rc::downgrade(&self.rotator);
        let handle = scheduler.schedule(
            Cadence::Interval(self.period),
            Box::new(move || {
                if let Some(rotator) = rotator.upgrade() {
                    let index = rotator.borrow_mut().next();
                    log::trace!("slide timer advanced to {index}");
                }
            }),
        );
        self.task = Some(handle);
        true
    }

    pub fn deactivate(&mut self, scheduler: &dyn Scheduler) {
        if let Some(handle) = self.task.take() {
            scheduler.cancel(handle);
        }
    }

    pub fn is_active(&self) -> bool {
        self.task.is_some()
    }

    pub fn index(&self) -> usize {
        self.rotator.borrow().index()
    }

    pub fn slide_count(&self) -> NonZeroUsize {
        self.rotator.borrow().slide_count()
    }

    pub fn next(&self) -> usize {
        self.rotator.borrow_mut().next()
    }

    pub fn previous(&self) -> usize {
        self.rotator.borrow_mut().previous()
    }

    pub fn jump_to(&self, index: usize) -> Result<usize, RotatorError> {
        self.rotator.borrow_mut().jump_to(index)
    }
}
