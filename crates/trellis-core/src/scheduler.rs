//! Cooperative timer scheduler for Trellis.
//!
//! Provides one-shot and repeating timers with attached callbacks, plus a
//! queue of deferred ("idle") tasks. The scheduler never spawns threads:
//! the host toolkit's event loop calls [`Scheduler::pump`] whenever it is
//! idle, and due callbacks run to completion inside that call.
//!
//! Tests drive the scheduler with [`Scheduler::pump_at`], passing synthetic
//! instants, so timing behavior is fully deterministic.
//!
//! # Cancellation
//!
//! [`Scheduler::cancel`] takes effect synchronously: once it returns, the
//! timer's callback will never run again, even if the timer was due. A
//! callback may cancel its own timer (or any other) while running.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::time::{Duration, Instant};
//! use trellis_core::Scheduler;
//!
//! let scheduler = Scheduler::new();
//! let fired = Arc::new(AtomicUsize::new(0));
//!
//! let fired_clone = fired.clone();
//! let start = Instant::now();
//! scheduler.after(Duration::from_millis(100), move || {
//!     fired_clone.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! scheduler.pump_at(start + Duration::from_millis(150));
//! assert_eq!(fired.load(Ordering::SeqCst), 1);
//! ```

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::error::{Result, TimerError};

new_key_type! {
    /// A unique identifier for a scheduled timer.
    pub struct TimerId;
}

/// The type of timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Fires once after the specified duration.
    OneShot,
    /// Fires repeatedly at the specified interval.
    Repeating,
}

type TimerCallback = Box<dyn FnMut() + Send>;
type IdleTask = Box<dyn FnOnce() + Send>;

/// Internal timer data.
struct TimerData {
    /// When this timer should next fire.
    next_fire: Instant,
    /// The interval for repeating timers.
    interval: Duration,
    /// The kind of timer.
    kind: TimerKind,
    /// Whether this timer is active.
    active: bool,
    /// The callback to invoke. Taken out of the slot while running so the
    /// callback may re-enter the scheduler.
    callback: Option<TimerCallback>,
}

/// An entry in the timer queue (min-heap by fire time).
#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    id: TimerId,
    fire_time: Instant,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.fire_time == other.fire_time
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap (BinaryHeap is max-heap by default).
        other.fire_time.cmp(&self.fire_time)
    }
}

#[derive(Default)]
struct SchedulerInner {
    timers: SlotMap<TimerId, TimerData>,
    queue: BinaryHeap<QueueEntry>,
    idle: Vec<IdleTask>,
}

/// Manages all timers and idle tasks for the binding layer.
///
/// The scheduler is pumped cooperatively by the host event loop; see the
/// module docs for the execution model.
pub struct Scheduler {
    inner: Mutex<SchedulerInner>,
}

impl Scheduler {
    /// Create a new, empty scheduler.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SchedulerInner::default()),
        }
    }

    /// Start a one-shot timer that fires after `delay`.
    ///
    /// Returns the timer ID that can be used to cancel the timer. After the
    /// timer fires its ID becomes invalid.
    pub fn after<F>(&self, delay: Duration, callback: F) -> TimerId
    where
        F: FnMut() + Send + 'static,
    {
        self.insert(delay, TimerKind::OneShot, Box::new(callback))
    }

    /// Start a repeating timer that fires every `interval`.
    ///
    /// The first fire occurs after one full interval. The timer reschedules
    /// itself until cancelled.
    pub fn every<F>(&self, interval: Duration, callback: F) -> TimerId
    where
        F: FnMut() + Send + 'static,
    {
        self.insert(interval, TimerKind::Repeating, Box::new(callback))
    }

    fn insert(&self, interval: Duration, kind: TimerKind, callback: TimerCallback) -> TimerId {
        let next_fire = Instant::now() + interval;
        let mut inner = self.inner.lock();
        let id = inner.timers.insert(TimerData {
            next_fire,
            interval,
            kind,
            active: true,
            callback: Some(callback),
        });
        inner.queue.push(QueueEntry {
            id,
            fire_time: next_fire,
        });
        tracing::trace!(target: "trellis_core::scheduler", ?id, ?kind, "timer started");
        id
    }

    /// Queue a task to run at the next pump, before any due timers.
    pub fn post<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner.lock().idle.push(Box::new(task));
    }

    /// Stop a timer.
    ///
    /// Takes effect synchronously: the callback will not run after this
    /// returns. Returns an error if the ID is unknown or already expired.
    pub fn cancel(&self, id: TimerId) -> Result<()> {
        let mut inner = self.inner.lock();
        if let Some(timer) = inner.timers.get_mut(id) {
            timer.active = false;
            // If the callback is in flight, the pump loop removes the slot
            // when it sees the cleared flag; otherwise remove it now.
            if timer.callback.is_some() {
                inner.timers.remove(id);
            }
            tracing::trace!(target: "trellis_core::scheduler", ?id, "timer cancelled");
            Ok(())
        } else {
            Err(TimerError::InvalidTimerId.into())
        }
    }

    /// Check if a timer is currently active.
    pub fn is_active(&self, id: TimerId) -> bool {
        self.inner
            .lock()
            .timers
            .get(id)
            .is_some_and(|t| t.active)
    }

    /// Get the number of active timers.
    pub fn active_count(&self) -> usize {
        self.inner
            .lock()
            .timers
            .iter()
            .filter(|(_, t)| t.active)
            .count()
    }

    /// Get the duration until the next timer fires, if any.
    ///
    /// The host loop can use this to size its poll timeout. Returns `None`
    /// if there are no active timers (pending idle tasks are due
    /// immediately and reported as `Duration::ZERO`).
    pub fn time_until_next(&self) -> Option<Duration> {
        let mut inner = self.inner.lock();
        if !inner.idle.is_empty() {
            return Some(Duration::ZERO);
        }
        // Drop stale entries for removed timers from the front of the queue.
        while let Some(entry) = inner.queue.peek() {
            if inner.timers.get(entry.id).is_some_and(|t| t.active) {
                break;
            }
            inner.queue.pop();
        }
        let now = Instant::now();
        inner.queue.peek().map(|entry| {
            if entry.fire_time > now {
                entry.fire_time - now
            } else {
                Duration::ZERO
            }
        })
    }

    /// Run all idle tasks and due timer callbacks, using the current time.
    ///
    /// Returns the number of callbacks invoked.
    pub fn pump(&self) -> usize {
        self.pump_at(Instant::now())
    }

    /// Run all idle tasks and timer callbacks due at `now`.
    ///
    /// Callbacks run outside the scheduler lock, so they may freely start or
    /// cancel timers. Repeating timers are rescheduled relative to `now`
    /// after their callback returns, unless the callback cancelled them.
    ///
    /// Returns the number of callbacks invoked.
    pub fn pump_at(&self, now: Instant) -> usize {
        let mut count = 0;

        // Idle tasks first; tasks posted by a task run on the next pump.
        let idle: Vec<IdleTask> = std::mem::take(&mut self.inner.lock().idle);
        for task in idle {
            task();
            count += 1;
        }

        loop {
            let (id, mut callback, kind, interval) = {
                let mut inner = self.inner.lock();
                let Some(entry) = inner.queue.peek().copied() else {
                    break;
                };
                if entry.fire_time > now {
                    break;
                }
                inner.queue.pop();

                let Some(timer) = inner.timers.get_mut(entry.id) else {
                    continue; // stale entry for a removed timer
                };
                if !timer.active {
                    inner.timers.remove(entry.id);
                    continue;
                }
                if timer.next_fire != entry.fire_time {
                    continue; // stale entry from before a reschedule
                }
                let Some(callback) = timer.callback.take() else {
                    continue;
                };
                (entry.id, callback, timer.kind, timer.interval)
            };

            tracing::trace!(target: "trellis_core::scheduler", ?id, "timer fired");
            callback();
            count += 1;

            let mut inner = self.inner.lock();
            let Some(timer) = inner.timers.get_mut(id) else {
                continue;
            };
            if !timer.active {
                // Cancelled from inside the callback.
                inner.timers.remove(id);
                continue;
            }
            match kind {
                TimerKind::OneShot => {
                    inner.timers.remove(id);
                }
                TimerKind::Repeating => {
                    let next_fire = now + interval;
                    timer.callback = Some(callback);
                    timer.next_fire = next_fire;
                    inner.queue.push(QueueEntry { id, fire_time: next_fire });
                }
            }
        }

        count
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
