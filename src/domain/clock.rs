use chrono::{DateTime, Utc};
use std::time::Instant;

/// Tracks when the current process started.
///
/// The start time is derived as "now minus uptime" rather than stored, so it
/// stays consistent with the wall clock used to stamp scan rows.
#[derive(Debug, Clone, Copy)]
pub struct ProcessClock {
    started: Instant,
}

impl ProcessClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    #[must_use]
    pub fn uptime(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.started.elapsed()).unwrap_or_else(|_| chrono::Duration::zero())
    }

    #[must_use]
    pub fn process_started_at(&self) -> DateTime<Utc> {
        Utc::now() - self.uptime()
    }
}

impl Default for ProcessClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_start_is_not_in_the_future() {
        let clock = ProcessClock::new();
        assert!(clock.process_started_at() <= Utc::now());
    }

    #[test]
    fn uptime_grows() {
        let clock = ProcessClock::new();
        let first = clock.uptime();
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(clock.uptime() > first);
    }
}
