use std::time::{Duration, Instant};

/// Minimum-interval gate.
///
/// Callers pass `now` explicitly so the gate can be driven by a recorded
/// clock in tests.
#[derive(Debug, Clone)]
pub struct Throttle {
    min_interval: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: None,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Time left until the gate opens (zero when open).
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.last {
            None => Duration::ZERO,
            Some(last) => self
                .min_interval
                .saturating_sub(now.saturating_duration_since(last)),
        }
    }

    /// Marks an emission at `now` if the gate is open.
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        if !self.remaining(now).is_zero() {
            return false;
        }
        self.last = Some(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::Throttle;
    use std::time::{Duration, Instant};

    #[test]
    fn first_emission_is_immediate() {
        let mut t = Throttle::new(Duration::from_millis(33));
        let now = Instant::now();
        assert_eq!(t.remaining(now), Duration::ZERO);
        assert!(t.try_acquire(now));
    }

    #[test]
    fn blocks_within_interval() {
        let mut t = Throttle::new(Duration::from_millis(33));
        let t0 = Instant::now();
        assert!(t.try_acquire(t0));
        assert!(!t.try_acquire(t0 + Duration::from_millis(10)));
        assert_eq!(
            t.remaining(t0 + Duration::from_millis(10)),
            Duration::from_millis(23)
        );
        assert!(t.try_acquire(t0 + Duration::from_millis(33)));
    }

    #[test]
    fn zero_interval_never_blocks() {
        let mut t = Throttle::new(Duration::ZERO);
        let t0 = Instant::now();
        assert!(t.try_acquire(t0));
        assert!(t.try_acquire(t0));
    }
}
