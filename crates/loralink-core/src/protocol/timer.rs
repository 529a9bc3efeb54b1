//! Acknowledgement timer
//!
//! The transport's only time-driven behaviour is chunk retransmission, so
//! the timer is a one-shot: armed when a chunk is written, disarmed by the
//! matching ACK, and reported expired at most once per arming. Abstracting
//! it behind a trait lets tests drive timeouts without sleeping.

use std::time::{Duration, Instant};

/// One-shot retransmission timer.
pub trait AckTimer {
    /// Arm the timer. Restarts it if already armed.
    fn start(&mut self, timeout: Duration);

    /// Disarm without firing.
    fn stop(&mut self);

    /// True exactly once after the deadline passes; the timer disarms
    /// itself when it reports expiry.
    fn expired(&mut self) -> bool;
}

/// Wall-clock timer used in production
#[derive(Debug, Default)]
pub struct SystemTimer {
    deadline: Option<Instant>,
}

impl SystemTimer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AckTimer for SystemTimer {
    fn start(&mut self, timeout: Duration) {
        self.deadline = Some(Instant::now() + timeout);
    }

    fn stop(&mut self) {
        self.deadline = None;
    }

    fn expired(&mut self) -> bool {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_after_deadline() {
        let mut timer = SystemTimer::new();
        timer.start(Duration::from_millis(0));

        assert!(timer.expired());
        assert!(!timer.expired());
    }

    #[test]
    fn test_stop_disarms() {
        let mut timer = SystemTimer::new();
        timer.start(Duration::from_millis(0));
        timer.stop();

        assert!(!timer.expired());
    }

    #[test]
    fn test_unarmed_never_fires() {
        let mut timer = SystemTimer::new();
        assert!(!timer.expired());
    }
}
