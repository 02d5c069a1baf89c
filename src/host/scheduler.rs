//! Cooperative host scheduler
//!
//! Single-threaded stand-in for the host's per-frame callback and timer
//! facilities, driven by a virtual millisecond clock. Callers pop due tasks
//! one at a time and dispatch them, so no two callbacks ever run at once.
//!
//! Every scheduled task is owned through a [`TaskHandle`]. Cancelling or
//! dropping the handle marks the task dead, and dead tasks are never
//! returned, even if they were already due when the handle was released.

use std::cell::Cell;
use std::rc::Rc;

use log::debug;

/// Identifier of a scheduled task
pub type TaskId = u64;

/// Owned handle to a scheduled task; dropping it cancels the task
#[derive(Debug)]
pub struct TaskHandle {
    id: TaskId,
    alive: Rc<Cell<bool>>,
}

impl TaskHandle {
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Cancel the task; further dispatch is suppressed
    pub fn cancel(&self) {
        self.alive.set(false);
    }

    pub fn is_live(&self) -> bool {
        self.alive.get()
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.alive.set(false);
    }
}

/// A task that came due
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fired<T> {
    pub id: TaskId,
    pub tag: T,
    pub at_ms: f64,
}

#[derive(Debug)]
struct Entry<T> {
    id: TaskId,
    due_ms: f64,
    period_ms: Option<f64>,
    tag: T,
    alive: Rc<Cell<bool>>,
}

/// Virtual-clock scheduler for frame callbacks, intervals and timeouts
#[derive(Debug)]
pub struct Scheduler<T> {
    now_ms: f64,
    frame_interval_ms: f64,
    next_id: TaskId,
    entries: Vec<Entry<T>>,
}

impl<T: Copy + std::fmt::Debug> Scheduler<T> {
    /// Create a scheduler whose display refreshes every `frame_interval_ms`
    pub fn new(frame_interval_ms: f64) -> Self {
        Self {
            now_ms: 0.0,
            frame_interval_ms: frame_interval_ms.max(f64::EPSILON),
            next_id: 1,
            entries: Vec::new(),
        }
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    pub fn frame_interval_ms(&self) -> f64 {
        self.frame_interval_ms
    }

    /// Run `tag` once at the next display refresh
    pub fn request_frame(&mut self, tag: T) -> TaskHandle {
        // Tolerance keeps a frame fired exactly on a boundary from re-firing now
        let frame_index = (self.now_ms / self.frame_interval_ms + 1e-9).floor() + 1.0;
        let due = frame_index * self.frame_interval_ms;
        self.schedule(due, None, tag)
    }

    /// Run `tag` every `period_ms`, first after one period
    pub fn set_interval(&mut self, period_ms: f64, tag: T) -> TaskHandle {
        let period = period_ms.max(f64::EPSILON);
        self.schedule(self.now_ms + period, Some(period), tag)
    }

    /// Run `tag` once after `delay_ms`
    pub fn set_timeout(&mut self, delay_ms: f64, tag: T) -> TaskHandle {
        self.schedule(self.now_ms + delay_ms.max(0.0), None, tag)
    }

    /// Number of live scheduled tasks
    pub fn pending(&self) -> usize {
        self.entries.iter().filter(|e| e.alive.get()).count()
    }

    /// Due time of the earliest live task
    pub fn next_due_ms(&self) -> Option<f64> {
        self.entries
            .iter()
            .filter(|e| e.alive.get())
            .map(|e| e.due_ms)
            .min_by(|a, b| a.total_cmp(b))
    }

    /// Pop the earliest live task due at or before `until_ms`
    ///
    /// The clock moves to the task's due time. Intervals are re-armed for
    /// their next period; one-shot tasks are removed.
    pub fn pop_due(&mut self, until_ms: f64) -> Option<Fired<T>> {
        self.entries.retain(|e| e.alive.get());

        let index = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due_ms <= until_ms)
            .min_by(|(_, a), (_, b)| a.due_ms.total_cmp(&b.due_ms).then(a.id.cmp(&b.id)))
            .map(|(i, _)| i)?;

        let entry = &mut self.entries[index];
        let fired = Fired {
            id: entry.id,
            tag: entry.tag,
            at_ms: entry.due_ms,
        };
        self.now_ms = self.now_ms.max(entry.due_ms);

        match entry.period_ms {
            Some(period) => entry.due_ms += period,
            None => {
                self.entries.swap_remove(index);
            }
        }

        Some(fired)
    }

    /// Move the clock forward without dispatching anything
    pub fn advance_clock(&mut self, to_ms: f64) {
        self.now_ms = self.now_ms.max(to_ms);
    }

    fn schedule(&mut self, due_ms: f64, period_ms: Option<f64>, tag: T) -> TaskHandle {
        let id = self.next_id;
        self.next_id += 1;

        let alive = Rc::new(Cell::new(true));
        self.entries.push(Entry {
            id,
            due_ms,
            period_ms,
            tag,
            alive: Rc::clone(&alive),
        });
        debug!("[SCHED] Task {} {:?} due at {:.2}ms", id, tag, due_ms);

        TaskHandle { id, alive }
    }
}
