use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;

use log::Level;

/// A non-fatal event worth surfacing to whoever watches the component.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A fetch was skipped because an input is missing.
    ConfigurationMissing { endpoint: bool, conf_id: bool },
    /// The announcements request failed; the list was cleared.
    FetchFailed { url: String, reason: String },
    /// A slide image could not be preloaded.
    AssetFailed { uri: String, reason: String },
    /// A response arrived for a request that had been superseded.
    StaleResponse { ticket: u64 },
    /// A jump targeted a slide that does not exist.
    InvalidSlide { requested: usize, len: usize },
    /// The executor refused a task.
    SpawnFailed { task: &'static str, reason: String },
}

impl Diagnostic {
    pub fn level(&self) -> Level {
        match self {
            Diagnostic::FetchFailed { .. } | Diagnostic::SpawnFailed { .. } => Level::Error,
            Diagnostic::ConfigurationMissing { .. }
            | Diagnostic::AssetFailed { .. }
            | Diagnostic::InvalidSlide { .. } => Level::Warn,
            Diagnostic::StaleResponse { .. } => Level::Debug,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::ConfigurationMissing { endpoint, conf_id } => {
                let mut missing = Vec::with_capacity(2);
                if *endpoint {
                    missing.push("endpoint");
                }
                if *conf_id {
                    missing.push("conf_id");
                }
                write!(f, "announcements not requested, missing {}", missing.join(" and "))
            }
            Diagnostic::FetchFailed { url, reason } => {
                write!(f, "announcements request to {url} failed: {reason}")
            }
            Diagnostic::AssetFailed { uri, reason } => {
                write!(f, "failed to preload {uri}: {reason}")
            }
            Diagnostic::StaleResponse { ticket } => {
                write!(f, "discarded response for superseded request #{ticket}")
            }
            Diagnostic::InvalidSlide { requested, len } => {
                write!(f, "slide {requested} requested but only {len} exist")
            }
            Diagnostic::SpawnFailed { task, reason } => {
                write!(f, "could not spawn {task}: {reason}")
            }
        }
    }
}

/// Observability sink for [`Diagnostic`]s.
pub trait Diagnostics {
    fn report(&self, diagnostic: Diagnostic);
}

/// Forwards every diagnostic to the `log` facade at its level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn report(&self, diagnostic: Diagnostic) {
        log::log!(target: "conf_hero", diagnostic.level(), "{diagnostic}");
    }
}

/// Entries kept by [`MemoryDiagnostics::default`].
pub const DEFAULT_HISTORY: usize = 256;

/// Logs every diagnostic and keeps the most recent ones in memory.
///
/// Per-level counts cover everything reported, including entries that have
/// already been evicted from the history.
#[derive(Debug)]
pub struct MemoryDiagnostics {
    entries: RefCell<VecDeque<Diagnostic>>,
    capacity: usize,
    counts: RefCell<[usize; 5]>,
}

impl Default for MemoryDiagnostics {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY)
    }
}

fn level_slot(level: Level) -> usize {
    level as usize - 1
}

impl MemoryDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `capacity` entries, dropping the oldest first.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RefCell::new(VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY))),
            capacity,
            counts: RefCell::new([0; 5]),
        }
    }

    /// Retained entries, oldest first.
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.borrow().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Number of diagnostics ever reported at `level`.
    pub fn count_at(&self, level: Level) -> usize {
        self.counts.borrow()[level_slot(level)]
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
        *self.counts.borrow_mut() = [0; 5];
    }
}

impl Diagnostics for MemoryDiagnostics {
    fn report(&self, diagnostic: Diagnostic) {
        LogDiagnostics.report(diagnostic.clone());
        self.counts.borrow_mut()[level_slot(diagnostic.level())] += 1;
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.borrow_mut();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(diagnostic);
    }
}
