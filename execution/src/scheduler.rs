//! Virtual clock and timer queue driving every in-flight ball.
//!
//! Time is a [Duration] since the session started. Nothing here sleeps: the
//! owner moves the clock forward and pops whatever became due, which makes the
//! row cadence testable without real delays.

use plinko_types::BallId;
use std::{cmp::Reverse, collections::BinaryHeap, time::Duration};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Timer {
    deadline: Duration,
    // Breaks deadline ties in scheduling order
    sequence: u64,
    ball: BallId,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    now: Duration,
    sequence: u64,
    timers: BinaryHeap<Reverse<Timer>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Move the clock forward. The clock never runs backwards.
    pub fn set_now(&mut self, now: Duration) {
        if now > self.now {
            self.now = now;
        }
    }

    /// Fire a timer for `ball` at `deadline`.
    pub fn schedule(&mut self, deadline: Duration, ball: BallId) {
        let sequence = self.sequence;
        self.sequence += 1;
        self.timers.push(Reverse(Timer {
            deadline,
            sequence,
            ball,
        }));
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.peek().map(|Reverse(timer)| timer.deadline)
    }

    /// Remove and return the earliest timer due at or before `until`.
    pub fn pop_due(&mut self, until: Duration) -> Option<(Duration, BallId)> {
        if self.next_deadline()? > until {
            return None;
        }
        self.timers
            .pop()
            .map(|Reverse(timer)| (timer.deadline, timer.ball))
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_idle(&self) -> bool {
        self.timers.is_empty()
    }
}
