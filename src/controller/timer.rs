//! Timer scheduling for the dissolve and the malformed-duration fallback

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// Host timer facility (`setTimeout`/`clearTimeout`).
///
/// Expiry is reported back to the controller as `Event::TimerFired`.
pub trait Scheduler {
    fn schedule(&mut self, delay: Duration) -> TimerId;
    fn cancel(&mut self, id: TimerId);
}

/// Holds at most one outstanding timer; arming again cancels the previous one.
#[derive(Debug, Default)]
pub(crate) struct TimerSlot(Option<TimerId>);

impl TimerSlot {
    pub(crate) fn arm(&mut self, scheduler: &mut dyn Scheduler, delay: Duration) -> TimerId {
        self.cancel(scheduler);
        let id = scheduler.schedule(delay);
        self.0 = Some(id);
        id
    }

    pub(crate) fn cancel(&mut self, scheduler: &mut dyn Scheduler) {
        if let Some(id) = self.0.take() {
            scheduler.cancel(id);
        }
    }

    /// Disarm and return true when `id` is the timer held here.
    pub(crate) fn take_if(&mut self, id: TimerId) -> bool {
        if self.0 == Some(id) {
            self.0 = None;
            true
        } else {
            false
        }
    }
}

/// The media duration when it is usable for waiting on `ended`.
///
/// Zero, negative, NaN and infinite durations are not: a controller seeing
/// one must fall back to a fixed timeout instead of waiting forever.
pub fn usable_duration(raw_secs: f64) -> Option<Duration> {
    if raw_secs.is_finite() && raw_secs > 0.0 {
        Some(Duration::from_secs_f64(raw_secs))
    } else {
        None
    }
}

#[derive(Debug, Default)]
struct ManualClock {
    now: Duration,
    next_id: u64,
    pending: Vec<(TimerId, Duration)>,
    cancelled: u32,
}

/// A scheduler whose clock only moves when told to.
///
/// Clones share the clock, so a test keeps one handle while the controller
/// owns the other.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    clock: Rc<RefCell<ManualClock>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.clock.borrow().now
    }

    pub fn pending(&self) -> usize {
        self.clock.borrow().pending.len()
    }

    pub fn cancelled(&self) -> u32 {
        self.clock.borrow().cancelled
    }

    /// Move the clock forward and return the timers that came due,
    /// earliest deadline first.
    pub fn advance(&self, by: Duration) -> Vec<TimerId> {
        let mut c = self.clock.borrow_mut();
        c.now += by;
        let now = c.now;
        let mut due: Vec<(TimerId, Duration)> = Vec::new();
        c.pending.retain(|&(id, deadline)| {
            if deadline <= now {
                due.push((id, deadline));
                false
            } else {
                true
            }
        });
        due.sort_by_key(|&(id, deadline)| (deadline, id));
        due.into_iter().map(|(id, _)| id).collect()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, delay: Duration) -> TimerId {
        let mut c = self.clock.borrow_mut();
        c.next_id += 1;
        let id = TimerId(c.next_id);
        let deadline = c.now + delay;
        c.pending.push((id, deadline));
        id
    }

    fn cancel(&mut self, id: TimerId) {
        let mut c = self.clock.borrow_mut();
        let before = c.pending.len();
        c.pending.retain(|&(pending, _)| pending != id);
        if c.pending.len() != before {
            c.cancelled += 1;
        }
    }
}
