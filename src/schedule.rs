//! Periodic timers driven by caller-supplied monotonic timestamps

/// Fires once every `period_ms`.
///
/// The timer never fires before a full period has elapsed since it last
/// fired, unless it was created with [`Interval::due_now`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    period_ms: u64,
    last_ms: Option<u64>,
}

impl Interval {
    /// First fires one period after `now_ms`
    pub fn new(period_ms: u64, now_ms: u64) -> Self {
        Self {
            period_ms,
            last_ms: Some(now_ms),
        }
    }

    /// First fires on the next poll
    pub fn due_now(period_ms: u64) -> Self {
        Self {
            period_ms,
            last_ms: None,
        }
    }

    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        match self.last_ms {
            Some(last) => now_ms.saturating_sub(last) >= self.period_ms,
            None => true,
        }
    }

    /// Returns `true` and restarts the period when the timer is due
    pub fn poll(&mut self, now_ms: u64) -> bool {
        if self.is_due(now_ms) {
            self.last_ms = Some(now_ms);
            true
        } else {
            false
        }
    }

    /// Milliseconds until the next firing
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        match self.last_ms {
            Some(last) => (last + self.period_ms).saturating_sub(now_ms),
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_only_after_full_period() {
        let mut timer = Interval::new(30_000, 1_000);
        assert!(!timer.poll(1_000));
        assert!(!timer.poll(30_999));
        assert_eq!(timer.remaining_ms(30_999), 1);
        assert!(timer.poll(31_000));
        assert!(!timer.poll(31_100));
        assert!(timer.poll(61_000));
    }

    #[test]
    fn period_restarts_from_the_firing_poll() {
        let mut timer = Interval::new(100, 0);
        assert!(timer.poll(250));
        assert!(!timer.poll(349));
        assert!(timer.poll(350));
    }

    #[test]
    fn due_now_fires_immediately_once() {
        let mut timer = Interval::due_now(10_000);
        assert_eq!(timer.remaining_ms(5), 0);
        assert!(timer.poll(5));
        assert!(!timer.poll(6));
        assert!(timer.poll(10_005));
    }

    #[test]
    fn clock_going_backwards_never_fires() {
        let mut timer = Interval::new(100, 500);
        assert!(!timer.poll(10));
    }
}
