//! Police escalation progress.
//!
//! # Invariants
//!
//! - `accumulated <= threshold` at all times.
//! - `arrived => accumulated == threshold`.
//! - Once arrived, `advance` neither accumulates nor broadcasts until `reset`.
//! - No decay: while not counting, `accumulated` holds steady.
//!
//! The tracker is pure: it returns the notifications it wants published and
//! leaves delivery to the controller.

use crate::{micros_to_secs, AlarmEvent};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoliceEscalationTracker {
    threshold_micros: i64,
    eta_epsilon_micros: i64,
    accumulated_micros: i64,
    arrived: bool,
    /// Remaining value carried by the last ETA broadcast (None = never / reset).
    last_broadcast_remaining_micros: Option<i64>,
}

impl PoliceEscalationTracker {
    pub fn new(threshold_micros: i64, eta_epsilon_micros: i64) -> Self {
        Self {
            threshold_micros: threshold_micros.max(0),
            eta_epsilon_micros: eta_epsilon_micros.max(1),
            accumulated_micros: 0,
            arrived: false,
            last_broadcast_remaining_micros: None,
        }
    }

    pub fn threshold_micros(&self) -> i64 {
        self.threshold_micros
    }

    pub fn accumulated_micros(&self) -> i64 {
        self.accumulated_micros
    }

    pub fn arrived(&self) -> bool {
        self.arrived
    }

    /// `max(0, threshold - accumulated)`, and 0 once arrived.
    pub fn remaining_micros(&self) -> i64 {
        if self.arrived {
            return 0;
        }
        self.threshold_micros
            .saturating_sub(self.accumulated_micros)
            .max(0)
    }

    /// Apply one step of the escalation rule.
    ///
    /// `counting` is `active && !suppressed` as observed by the caller.
    pub fn advance(&mut self, elapsed_micros: i64, counting: bool) -> Vec<AlarmEvent> {
        if self.arrived {
            return Vec::new();
        }

        if counting {
            self.accumulated_micros = self
                .accumulated_micros
                .saturating_add(elapsed_micros.max(0))
                .min(self.threshold_micros);

            if self.accumulated_micros >= self.threshold_micros {
                self.accumulated_micros = self.threshold_micros;
                self.arrived = true;

                let mut out = Vec::with_capacity(2);
                out.extend(self.eta_event(true));
                out.push(AlarmEvent::PoliceArrived);
                return out;
            }
        }

        self.eta_event(false).into_iter().collect()
    }

    /// ETA notification, throttled by epsilon unless `force` is set.
    pub fn eta_event(&mut self, force: bool) -> Option<AlarmEvent> {
        let remaining = self
            .threshold_micros
            .saturating_sub(self.accumulated_micros)
            .max(0);

        if !force {
            if let Some(last) = self.last_broadcast_remaining_micros {
                if remaining.abs_diff(last) < self.eta_epsilon_micros.unsigned_abs() {
                    return None;
                }
            }
        }

        self.last_broadcast_remaining_micros = Some(remaining);
        Some(AlarmEvent::PoliceEtaChanged {
            remaining_secs: micros_to_secs(remaining),
            total_secs: micros_to_secs(self.threshold_micros),
        })
    }

    /// Zero progress, clear arrival, force-broadcast the full threshold.
    pub fn reset(&mut self) -> Vec<AlarmEvent> {
        self.accumulated_micros = 0;
        self.arrived = false;
        self.last_broadcast_remaining_micros = None;

        let mut out = vec![AlarmEvent::EscalationReset];
        out.extend(self.eta_event(true));
        out
    }
}
