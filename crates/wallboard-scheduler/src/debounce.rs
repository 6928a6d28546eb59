use std::time::Duration;

use tokio::time::Instant;

/// Trailing debounce without rescheduling.
///
/// The first trigger arms a deadline `delay` ahead; further triggers while it
/// is armed are absorbed. The owner fires once the deadline passes, which
/// disarms it. N triggers inside one window therefore yield exactly one fire.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Returns true when this trigger armed a new window.
    pub fn trigger(&mut self, now: Instant) -> bool {
        if self.deadline.is_some() {
            return false;
        }
        self.deadline = Some(now + self.delay);
        true
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Disarm; returns whether a window was pending.
    pub fn fire(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_arms_once() {
        let start = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(300));
        assert!(d.trigger(start));
        for i in 1..10 {
            assert!(!d.trigger(start + Duration::from_millis(i * 20)));
        }
        assert_eq!(d.deadline(), Some(start + Duration::from_millis(300)));
        assert!(d.fire());
        assert!(!d.fire());
        assert!(d.trigger(start + Duration::from_millis(400)));
    }

    #[test]
    fn cancel_disarms() {
        let mut d = Debouncer::new(Duration::from_millis(300));
        d.trigger(Instant::now());
        d.cancel();
        assert!(!d.is_pending());
    }
}
