//! Frame-paced scroll handling.
//!
//! Scroll and resize events arrive far more often than frames. Both types
//! here keep a single slot: a new post overwrites whatever is pending, and
//! the slot is drained at most once per `interval` when the host ticks a
//! frame. The latest state always wins and a burst is always followed by
//! one run.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use web_time::{Duration, Instant};

use crate::clock::{Clock, SystemClock};
use crate::dispose::Dispose;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Scheduled,
    Disposed,
}

/// Single-slot mailbox drained by frame ticks.
pub struct FrameMailbox<S> {
    pending: Option<S>,
    state: SchedulerState,
    last_run: Option<Instant>,
    interval: Duration,
    clock: Rc<dyn Clock>,
}

impl<S: fmt::Debug> fmt::Debug for FrameMailbox<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameMailbox")
            .field("pending", &self.pending)
            .field("state", &self.state)
            .field("interval", &self.interval)
            .finish()
    }
}

impl<S> FrameMailbox<S> {
    pub fn new(interval: Duration) -> Self {
        Self::with_clock(interval, Rc::new(SystemClock))
    }

    pub fn with_clock(interval: Duration, clock: Rc<dyn Clock>) -> Self {
        Self {
            pending: None,
            state: SchedulerState::Idle,
            last_run: None,
            interval,
            clock,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_scheduled(&self) -> bool {
        self.state == SchedulerState::Scheduled
    }

    /// Stores `state` as the pending value. Returns `false` once disposed.
    pub fn post(&mut self, state: S) -> bool {
        match self.state {
            SchedulerState::Disposed => false,
            SchedulerState::Idle => {
                self.state = SchedulerState::Scheduled;
                self.pending = Some(state);
                true
            }
            SchedulerState::Scheduled => {
                self.pending = Some(state);
                true
            }
        }
    }

    fn due(&self, now: Instant) -> bool {
        match self.last_run {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    /// Takes the pending value if one is scheduled and the interval since the
    /// last drain has elapsed.
    pub fn take_due(&mut self) -> Option<S> {
        if self.state != SchedulerState::Scheduled {
            return None;
        }
        let now = self.clock.now();
        if !self.due(now) {
            return None;
        }
        self.take_at(now)
    }

    /// Takes the pending value regardless of pacing.
    pub fn flush(&mut self) -> Option<S> {
        if self.state != SchedulerState::Scheduled {
            return None;
        }
        let now = self.clock.now();
        self.take_at(now)
    }

    fn take_at(&mut self, now: Instant) -> Option<S> {
        self.state = SchedulerState::Idle;
        self.last_run = Some(now);
        self.pending.take()
    }

    /// Drops pending work; later posts are ignored.
    pub fn dispose(&mut self) {
        if self.pending.take().is_some() {
            log::debug!("scheduler: discarded pending frame on dispose");
        }
        self.state = SchedulerState::Disposed;
    }
}

/// Runs a handler with the latest posted state at most once per frame.
pub struct ScrollScheduler<S: 'static> {
    mailbox: Rc<RefCell<FrameMailbox<S>>>,
    handler: Box<dyn FnMut(S)>,
}

impl<S: 'static> fmt::Debug for ScrollScheduler<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollScheduler")
            .field("state", &self.state())
            .finish()
    }
}

impl<S: 'static> ScrollScheduler<S> {
    pub fn new(interval: Duration, handler: impl FnMut(S) + 'static) -> Self {
        Self::with_clock(interval, Rc::new(SystemClock), handler)
    }

    pub fn with_clock(
        interval: Duration,
        clock: Rc<dyn Clock>,
        handler: impl FnMut(S) + 'static,
    ) -> Self {
        Self {
            mailbox: Rc::new(RefCell::new(FrameMailbox::with_clock(interval, clock))),
            handler: Box::new(handler),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.mailbox.borrow().state()
    }

    pub fn post(&self, state: S) -> bool {
        self.mailbox.borrow_mut().post(state)
    }

    /// Animation-frame tick. Returns `true` if the handler ran.
    pub fn on_frame(&mut self) -> bool {
        let next = self.mailbox.borrow_mut().take_due();
        match next {
            Some(state) => {
                (self.handler)(state);
                true
            }
            None => false,
        }
    }

    pub fn dispose(&self) {
        self.mailbox.borrow_mut().dispose();
    }

    /// Handle that disposes this scheduler without borrowing it, for hosts
    /// that tear down from a different owner.
    pub fn dispose_handle(&self) -> Dispose {
        let weak: Weak<RefCell<FrameMailbox<S>>> = Rc::downgrade(&self.mailbox);
        Dispose::new(move || {
            if let Some(mailbox) = weak.upgrade() {
                mailbox.borrow_mut().dispose();
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TestClock;
    use std::cell::Cell;

    const FRAME: Duration = Duration::from_millis(16);

    #[test]
    fn test_burst_runs_once_with_latest_state() {
        let clock = TestClock::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let mut sched =
            ScrollScheduler::with_clock(FRAME, Rc::new(clock.clone()), move |top: f64| {
                s.borrow_mut().push(top)
            });

        for i in 0..10 {
            assert!(sched.post(i as f64 * 10.0));
            clock.advance(Duration::from_millis(1));
        }
        assert_eq!(sched.state(), SchedulerState::Scheduled);
        assert!(sched.on_frame());
        assert!(!sched.on_frame());
        assert_eq!(*seen.borrow(), vec![90.0]);
        assert_eq!(sched.state(), SchedulerState::Idle);
    }

    #[test]
    fn test_paced_to_interval() {
        let clock = TestClock::new();
        let runs = Rc::new(Cell::new(0));
        let r = runs.clone();
        let mut sched =
            ScrollScheduler::with_clock(FRAME, Rc::new(clock.clone()), move |_: ()| {
                r.set(r.get() + 1)
            });

        sched.post(());
        assert!(sched.on_frame());
        sched.post(());
        clock.advance(Duration::from_millis(8));
        assert!(!sched.on_frame());
        assert_eq!(sched.state(), SchedulerState::Scheduled);
        clock.advance(Duration::from_millis(8));
        assert!(sched.on_frame());
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_dispose_discards_pending() {
        let runs = Rc::new(Cell::new(0));
        let r = runs.clone();
        let mut sched = ScrollScheduler::new(FRAME, move |_: u8| r.set(r.get() + 1));
        sched.post(1);
        let handle = sched.dispose_handle();
        handle.run();
        assert_eq!(sched.state(), SchedulerState::Disposed);
        assert!(!sched.post(2));
        assert!(!sched.on_frame());
        assert_eq!(runs.get(), 0);
    }

    #[test]
    fn test_mailbox_flush_ignores_pacing() {
        let clock = TestClock::new();
        let mut mb = FrameMailbox::with_clock(FRAME, Rc::new(clock.clone()));
        mb.post(1);
        assert_eq!(mb.take_due(), Some(1));
        mb.post(2);
        mb.post(3);
        assert_eq!(mb.take_due(), None);
        assert_eq!(mb.flush(), Some(3));
        assert_eq!(mb.flush(), None);
    }
}
