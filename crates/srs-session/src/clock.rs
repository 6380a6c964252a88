use std::time::Instant;

use srs_alarm::{micros_to_secs, secs_to_micros};

/// Elapsed-time source sampled once per session step.
pub trait Clock {
    /// Micros since the session epoch. Should not go backwards; the alarm
    /// controller holds its step time if it does.
    fn now_micros(&self) -> i64;

    fn now_secs(&self) -> f64 {
        micros_to_secs(self.now_micros())
    }
}

/// Virtual time for scripts and tests. Only moves when told to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ManualClock {
    now_micros: i64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at_secs(secs: f64) -> Self {
        Self {
            now_micros: secs_to_micros(secs),
        }
    }

    pub fn set_micros(&mut self, now_micros: i64) {
        self.now_micros = now_micros;
    }

    pub fn set_secs(&mut self, now_secs: f64) {
        self.now_micros = secs_to_micros(now_secs);
    }

    pub fn advance_micros(&mut self, delta_micros: i64) {
        self.now_micros = self.now_micros.saturating_add(delta_micros.max(0));
    }

    pub fn advance_secs(&mut self, delta_secs: f64) {
        self.advance_micros(secs_to_micros(delta_secs));
    }
}

impl Clock for ManualClock {
    fn now_micros(&self) -> i64 {
        self.now_micros
    }
}

/// Wall-clock time since construction, from `std::time::Instant`.
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn now_micros(&self) -> i64 {
        i64::try_from(self.epoch.elapsed().as_micros()).unwrap_or(i64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_moves_only_forward_on_advance() {
        let mut c = ManualClock::at_secs(1.5);
        assert_eq!(c.now_micros(), 1_500_000);
        c.advance_secs(-3.0);
        assert_eq!(c.now_micros(), 1_500_000);
        c.advance_micros(500_000);
        assert_eq!(c.now_secs(), 2.0);
        c.set_secs(0.25);
        assert_eq!(c.now_micros(), 250_000);
    }

    #[test]
    fn monotonic_clock_is_non_decreasing() {
        let c = MonotonicClock::new();
        let a = c.now_micros();
        let b = c.now_micros();
        assert!(a >= 0);
        assert!(b >= a);
    }
}
