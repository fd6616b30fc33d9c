//! Frame scheduling.
//!
//! The render loop is a task re-armed at the end of every tick rather than a
//! recursive callback. The runtime asks how long it may wait for input
//! before the next frame is due, runs the tick when it is, then re-arms.

use std::time::{Duration, Instant};

pub const DEFAULT_FPS: u32 = 60;

#[derive(Debug, Clone)]
pub struct FrameScheduler {
    interval: Duration,
    deadline: Instant,
    ticks: u64,
}

impl FrameScheduler {
    /// First frame is due immediately.
    pub fn new(fps: u32, now: Instant) -> Self {
        let fps = fps.max(1);
        Self {
            interval: Duration::from_secs(1) / fps,
            deadline: now,
            ticks: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.deadline
    }

    /// Time left before the next frame; zero when due.
    pub fn until_due(&self, now: Instant) -> Duration {
        self.deadline.saturating_duration_since(now)
    }

    /// Re-arm after a tick. A loop that fell behind resumes from `now`
    /// instead of running a burst of catch-up frames.
    pub fn rearm(&mut self, now: Instant) {
        self.ticks += 1;
        self.deadline += self.interval;
        if self.deadline <= now {
            self.deadline = now + self.interval;
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
