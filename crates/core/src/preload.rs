use futures::future::LocalBoxFuture;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error("not found")]
    NotFound,
    #[error("i/o error: {0}")]
    Io(String),
    #[error("rejected by host: {0}")]
    Rejected(String),
}

/// Fetches an image ahead of display.
pub trait ImageLoader {
    fn load(&self, uri: &str) -> LocalBoxFuture<'static, Result<(), AssetError>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Waiting,
    Loaded,
    Failed,
}

/// Tracks the one-shot preload of every slide image.
///
/// The gate opens once every image has settled, whether it loaded or not.
/// Failures are counted but never keep the gate shut.
#[derive(Debug, Clone)]
pub struct PreloadGate {
    uris: Vec<String>,
    slots: Vec<Slot>,
    started: bool,
}

impl PreloadGate {
    pub fn new(uris: Vec<String>) -> Self {
        let slots = vec![Slot::Waiting; uris.len()];
        Self {
            uris,
            slots,
            started: false,
        }
    }

    /// Hand out the `(slot, uri)` pairs to load. Only the first call
    /// returns anything.
    pub fn begin(&mut self) -> Vec<(usize, String)> {
        if self.started {
            return Vec::new();
        }
        self.started = true;
        self.uris.iter().cloned().enumerate().collect()
    }

    /// Record the outcome for `slot`. Returns `true` if this settled the
    /// last outstanding image. Repeated or unknown slots are ignored.
    pub fn settle(&mut self, slot: usize, outcome: &Result<(), AssetError>) -> bool {
        let was_ready = self.is_ready();
        let Some(state) = self.slots.get_mut(slot) else {
            return false;
        };
        if *state != Slot::Waiting {
            return false;
        }
        *state = if outcome.is_ok() {
            Slot::Loaded
        } else {
            Slot::Failed
        };
        !was_ready && self.is_ready()
    }

    pub fn uri(&self, slot: usize) -> Option<&str> {
        self.uris.get(slot).map(String::as_str)
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Every image has settled.
    pub fn is_ready(&self) -> bool {
        self.slots.iter().all(|s| *s != Slot::Waiting)
    }

    pub fn loaded(&self) -> usize {
        self.count(Slot::Loaded)
    }

    pub fn failures(&self) -> usize {
        self.count(Slot::Failed)
    }

    pub fn outstanding(&self) -> usize {
        self.count(Slot::Waiting)
    }

    fn count(&self, wanted: Slot) -> usize {
        self.slots.iter().filter(|s| **s == wanted).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(n: usize) -> PreloadGate {
        PreloadGate::new((0..n).map(|i| format!("/heroImages/hero{}.jpg", i + 1)).collect())
    }

    #[test]
    fn opens_after_every_image_settles() {
        let mut gate = gate(3);
        let jobs = gate.begin();
        assert_eq!(jobs.len(), 3);
        assert_eq!(jobs[2], (2, "/heroImages/hero3.jpg".to_string()));
        assert!(!gate.is_ready());

        assert!(!gate.settle(0, &Ok(())));
        assert!(!gate.settle(2, &Ok(())));
        assert!(!gate.is_ready());
        assert!(gate.settle(1, &Ok(())));
        assert!(gate.is_ready());
        assert_eq!(gate.loaded(), 3);
    }

    #[test]
    fn failures_do_not_block() {
        let mut gate = gate(2);
        gate.begin();
        gate.settle(0, &Err(AssetError::NotFound));
        assert!(!gate.is_ready());
        assert!(gate.settle(1, &Ok(())));
        assert!(gate.is_ready());
        assert_eq!(gate.failures(), 1);
        assert_eq!(gate.loaded(), 1);
    }

    #[test]
    fn begin_hands_out_work_once() {
        let mut gate = gate(5);
        assert_eq!(gate.begin().len(), 5);
        assert!(gate.begin().is_empty());
        assert!(gate.is_started());
    }

    #[test]
    fn duplicate_and_unknown_slots_are_ignored() {
        let mut gate = gate(2);
        gate.begin();
        gate.settle(0, &Ok(()));
        assert!(!gate.settle(0, &Err(AssetError::NotFound)));
        assert!(!gate.settle(7, &Ok(())));
        assert_eq!(gate.loaded(), 1);
        assert_eq!(gate.outstanding(), 1);
    }

    #[test]
    fn empty_gate_is_ready() {
        let mut gate = gate(0);
        assert!(gate.begin().is_empty());
        assert!(gate.is_ready());
    }
}
