//! Fixed-rate render tick.

use std::time::{Duration, Instant};

/// Decides whether a render tick is due.
///
/// A tick that arrives before the frame interval has elapsed is skipped.
/// Skipped ticks are not queued, so a slow frame never causes a burst of
/// catch-up renders.
#[derive(Debug, Clone)]
pub struct FrameClock {
    interval: Duration,
    last: Option<Instant>,
}

impl FrameClock {
    pub fn new(frame_rate: u32) -> Self {
        Self {
            interval: Duration::from_secs(1) / frame_rate.max(1),
            last: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns true, and records `now`, when a frame should render.
    pub fn tick(&mut self, now: Instant) -> bool {
        let due = match self.last {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        };
        if due {
            self.last = Some(now);
        }
        due
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_are_skipped_not_queued() {
        let mut clock = FrameClock::new(60);
        let start = Instant::now();
        assert!(clock.tick(start));
        assert!(!clock.tick(start + Duration::from_millis(5)));
        assert!(clock.tick(start + Duration::from_millis(17)));
        // A long stall yields a single frame.
        let later = start + Duration::from_millis(500);
        assert!(clock.tick(later));
        assert!(!clock.tick(later + Duration::from_millis(1)));
    }

    #[test]
    fn test_interval() {
        assert_eq!(FrameClock::new(50).interval(), Duration::from_millis(20));
        assert_eq!(FrameClock::new(0).interval(), Duration::from_secs(1));
    }
}
