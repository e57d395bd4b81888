use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::time::Duration;

/// Work run by a scheduled task.
pub type TaskCallback = Box<dyn FnMut()>;

/// Identifies a scheduled task for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskHandle(u64);

/// How often a task fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Every time the given wall-clock period elapses.
    Interval(Duration),
    /// Once per rendered frame.
    Frame,
}

/// Timer and frame-loop capability injected into the component.
///
/// Implementations must tolerate callbacks that schedule or cancel tasks,
/// including their own, while running.
pub trait Scheduler {
    fn schedule(&self, cadence: Cadence, callback: TaskCallback) -> TaskHandle;

    /// Cancel a task. Returns `false` if it was not live.
    fn cancel(&self, handle: TaskHandle) -> bool;
}

struct Task {
    cadence: Cadence,
    elapsed: Duration,
    /// Taken out while the callback runs.
    callback: Option<TaskCallback>,
}

/// A [`Scheduler`] driven explicitly by its host.
///
/// The host reports elapsed time with [`advance`](Self::advance) and frame
/// boundaries with [`frame`](Self::frame) (or both with
/// [`tick`](Self::tick)). Nothing fires on its own, which makes it suitable
/// both for render loops and for deterministic tests.
#[derive(Default)]
pub struct FrameClock {
    tasks: RefCell<BTreeMap<TaskHandle, Task>>,
    next_id: Cell<u64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live tasks.
    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn is_live(&self, handle: TaskHandle) -> bool {
        self.tasks.borrow().contains_key(&handle)
    }

    /// Let `dt` pass and fire every interval task once per whole period
    /// accumulated. Returns the number of callbacks run.
    pub fn advance(&self, dt: Duration) -> usize {
        let due: Vec<(TaskHandle, u128)> = {
            let mut tasks = self.tasks.borrow_mut();
            tasks
                .iter_mut()
                .filter_map(|(handle, task)| {
                    let Cadence::Interval(period) = task.cadence else {
                        return None;
                    };
                    task.elapsed += dt;
                    if period.is_zero() {
                        task.elapsed = Duration::ZERO;
                        return Some((*handle, 1));
                    }
                    let times = task.elapsed.as_nanos() / period.as_nanos();
                    if times == 0 {
                        return None;
                    }
                    task.elapsed = duration_from_nanos(task.elapsed.as_nanos() % period.as_nanos());
                    Some((*handle, times))
                })
                .collect()
        };

        let mut fired = 0;
        for (handle, times) in due {
            for _ in 0..times {
                if !self.run(handle) {
                    break;
                }
                fired += 1;
            }
        }
        fired
    }

    /// Fire every frame task once. Tasks scheduled while the frame runs
    /// start on the next one.
    pub fn frame(&self) -> usize {
        let due: Vec<TaskHandle> = self
            .tasks
            .borrow()
            .iter()
            .filter(|(_, task)| task.cadence == Cadence::Frame)
            .map(|(handle, _)| *handle)
            .collect();

        due.into_iter().filter(|handle| self.run(*handle)).count()
    }

    /// One host frame: advance time, then run frame tasks.
    pub fn tick(&self, dt: Duration) -> usize {
        self.advance(dt) + self.frame()
    }

    fn run(&self, handle: TaskHandle) -> bool {
        let callback = self
            .tasks
            .borrow_mut()
            .get_mut(&handle)
            .and_then(|task| task.callback.take());
        let Some(mut callback) = callback else {
            return false;
        };

        callback();

        // Put it back unless the callback cancelled its own task.
        if let Some(task) = self.tasks.borrow_mut().get_mut(&handle) {
            task.callback = Some(callback);
        }
        true
    }
}

impl Scheduler for FrameClock {
    fn schedule(&self, cadence: Cadence, callback: TaskCallback) -> TaskHandle {
        let handle = TaskHandle(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);
        self.tasks.borrow_mut().insert(
            handle,
            Task {
                cadence,
                elapsed: Duration::ZERO,
                callback: Some(callback),
            },
        );
        handle
    }

    fn cancel(&self, handle: TaskHandle) -> bool {
        self.tasks.borrow_mut().remove(&handle).is_some()
    }
}

fn duration_from_nanos(nanos: u128) -> Duration {
    // Remainders are always below one period, which fits in u64 nanoseconds
    // for any realistic period.
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}
