//! Poll cadence state machine.
//!
//! Pure bookkeeping: the session asks for the next deadline, sleeps until
//! it, and reports back. Keeping the clock outside makes cadence testable.
//!
//! ```text
//!            show (fires now)
//!   Hidden ───────────────────► Visible ──tick──► Dispatch (in flight)
//!     ▲                            │               │
//!     └──────────── hide ──────────┘      complete │
//!                                  ◄───────────────┘
//! ```

use std::time::Duration;

use tokio::time::Instant;

/// What to do when the tick deadline is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickAction {
    /// Start a fetch.
    Dispatch,
    /// A fetch is still outstanding; wait for the next tick.
    SkipInFlight,
}

/// Fixed-interval schedule with visibility and in-flight tracking.
#[derive(Debug, Clone)]
pub struct PollSchedule {
    interval: Duration,
    visible: bool,
    in_flight: bool,
    next_tick: Option<Instant>,
    last_dispatch: Option<Instant>,
    /// Shown while a fetch from before the hide was still running.
    resume_pending: bool,
}

impl PollSchedule {
    /// A visible schedule fires its first tick at `now`.
    pub fn new(interval: Duration, visible: bool, now: Instant) -> Self {
        Self {
            interval,
            visible,
            in_flight: false,
            next_tick: visible.then_some(now),
            last_dispatch: None,
            resume_pending: false,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Deadline of the next tick; `None` while hidden.
    pub fn next_tick(&self) -> Option<Instant> {
        self.next_tick
    }

    pub fn last_dispatch(&self) -> Option<Instant> {
        self.last_dispatch
    }

    /// The tick deadline was reached at `now`.
    ///
    /// The following tick is armed one interval from `now` before the
    /// caller starts any work.
    pub fn on_tick(&mut self, now: Instant) -> TickAction {
        self.next_tick = self.visible.then(|| now + self.interval);

        if self.in_flight {
            return TickAction::SkipInFlight;
        }

        self.in_flight = true;
        self.last_dispatch = Some(now);
        TickAction::Dispatch
    }

    /// The outstanding fetch finished at `now`, successfully or not.
    ///
    /// A resume that arrived while the fetch was running fires now.
    pub fn on_complete(&mut self, now: Instant) {
        self.in_flight = false;
        if self.resume_pending && self.visible {
            self.next_tick = Some(now);
        }
        self.resume_pending = false;
    }

    /// Stop ticking. Returns `false` if already hidden.
    pub fn hide(&mut self) -> bool {
        if !self.visible {
            return false;
        }
        self.visible = false;
        self.next_tick = None;
        self.resume_pending = false;
        true
    }

    /// Resume ticking with an immediate tick. Returns `false` if already
    /// visible, in which case the running cadence is left untouched.
    ///
    /// If a fetch is still outstanding the immediate tick is deferred until
    /// it completes, so the two never overlap.
    pub fn show(&mut self, now: Instant) -> bool {
        if self.visible {
            return false;
        }
        self.visible = true;
        if self.in_flight {
            self.resume_pending = true;
            self.next_tick = None;
        } else {
            self.next_tick = Some(now);
        }
        true
    }
}
