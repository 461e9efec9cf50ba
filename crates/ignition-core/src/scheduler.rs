//! Decay tick scheduling, owned by the store and driven by explicit time
//! so tests can step it without wall-clock timers.

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct DecayScheduler {
    interval: Duration,
    next_due: Option<DateTime<Utc>>,
}

impl DecayScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    /// Start ticking; the first tick is due one interval after `now`.
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.next_due = Some(now + self.interval);
    }

    pub fn stop(&mut self) {
        self.next_due = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.next_due
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True when a tick is due. Fires at most once per call; missed
    /// intervals collapse into one tick because decay integrates from its
    /// own anchor.
    pub fn poll(&mut self, now: DateTime<Utc>) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = Some(now + self.interval);
                true
            }
            _ => false,
        }
    }
}
