//! Alarm controller: the single authority over alarm, suppression and
//! escalation state.
//!
//! # State machine
//!
//! ```text
//!            trigger                      start_suppression
//!   Idle ─────────────► Active ───────────────────────────► Suppressed
//!    ▲  ◄───────────────  │                                    │
//!    │       stop         │ start_suppression (forces stop)    │
//!    │                    └────────────────────────────────────┤
//!    └──────────────── tick: now >= suppressed_until ──────────┘
//! ```
//!
//! - `trigger` is ignored while active or suppressed.
//! - `start_suppression` is valid from any phase and refreshes (never stacks).
//! - Suppression expiry does NOT resume the alarm.
//!
//! # Step time
//!
//! Commands observe the `now` of the most recent `tick`, the same way a
//! frame-based engine holds time fixed within one frame. Before the first
//! tick the step time is 0.

use tracing::{debug, info};

use crate::{
    micros_to_secs, secs_to_micros, AlarmConfig, AlarmEvent, AlarmPhase, AlarmSnapshot,
    EventBus, PoliceEscalationTracker, SubscriptionId, SuppressionWindow,
};

#[derive(Debug)]
pub struct AlarmController {
    cfg: AlarmConfig,
    active: bool,
    suppression: SuppressionWindow,
    escalation: PoliceEscalationTracker,
    now_micros: i64,
    last_tick_micros: Option<i64>,
    bus: EventBus,
}

impl AlarmController {
    pub fn new(cfg: AlarmConfig) -> Self {
        Self::with_bus(cfg, EventBus::new())
    }

    /// Construct on an existing subscriber list (two-phase init: the bus may
    /// already hold subscribers queued before the controller existed).
    pub fn with_bus(cfg: AlarmConfig, bus: EventBus) -> Self {
        let escalation =
            PoliceEscalationTracker::new(cfg.police_threshold_micros, cfg.eta_epsilon_micros);
        Self {
            cfg,
            active: false,
            suppression: SuppressionWindow::new(),
            escalation,
            now_micros: 0,
            last_tick_micros: None,
            bus,
        }
    }

    pub fn config(&self) -> &AlarmConfig {
        &self.cfg
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: FnMut(&AlarmEvent) + Send + 'static,
    {
        self.bus.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppression.is_active(self.now_micros)
    }

    pub fn phase(&self) -> AlarmPhase {
        if self.is_suppressed() {
            AlarmPhase::Suppressed
        } else if self.active {
            AlarmPhase::Active
        } else {
            AlarmPhase::Idle
        }
    }

    pub fn now_micros(&self) -> i64 {
        self.now_micros
    }

    pub fn suppression_remaining_micros(&self) -> i64 {
        self.suppression.remaining_micros(self.now_micros)
    }

    pub fn suppression_remaining_secs(&self) -> f64 {
        micros_to_secs(self.suppression_remaining_micros())
    }

    pub fn suppression(&self) -> &SuppressionWindow {
        &self.suppression
    }

    pub fn escalation(&self) -> &PoliceEscalationTracker {
        &self.escalation
    }

    pub fn police_arrived(&self) -> bool {
        self.escalation.arrived()
    }

    pub fn police_remaining_secs(&self) -> f64 {
        micros_to_secs(self.escalation.remaining_micros())
    }

    pub fn police_total_secs(&self) -> f64 {
        micros_to_secs(self.escalation.threshold_micros())
    }

    pub fn snapshot(&self) -> AlarmSnapshot {
        AlarmSnapshot {
            phase: self.phase(),
            active: self.active,
            suppressed: self.is_suppressed(),
            suppression_remaining_secs: self.suppression_remaining_secs(),
            police_remaining_secs: self.police_remaining_secs(),
            police_total_secs: self.police_total_secs(),
            police_arrived: self.police_arrived(),
            accumulated_secs: micros_to_secs(self.escalation.accumulated_micros()),
            now_secs: micros_to_secs(self.now_micros),
        }
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance to `now` (micros). Call once per simulation step.
    ///
    /// A clock observed going backwards is held at the previous step time.
    pub fn tick(&mut self, now_micros: i64) {
        let now = now_micros.max(self.now_micros);
        let elapsed = match self.last_tick_micros {
            Some(prev) => now.saturating_sub(prev).max(0),
            None => 0,
        };
        self.last_tick_micros = Some(now);
        self.now_micros = now;

        // 1) Suppression expiry.
        if self.suppression.expire(now) {
            info!(now_micros = now, "alarm/suppression ended");
            self.emit(AlarmEvent::SuppressionEnded);
        }

        // 2) Escalation.
        let counting = self.active && !self.suppression.is_active(now);
        for ev in self.escalation.advance(elapsed, counting) {
            if ev == AlarmEvent::PoliceArrived {
                info!(
                    threshold_micros = self.escalation.threshold_micros(),
                    "alarm/police arrived"
                );
            }
            self.emit(ev);
        }
    }

    pub fn tick_secs(&mut self, now_secs: f64) {
        self.tick(secs_to_micros(now_secs));
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Idle -> Active. Returns `true` if the alarm transitioned.
    pub fn trigger(&mut self, reason: &str) -> bool {
        if self.is_suppressed() {
            debug!(reason, "alarm/trigger ignored (suppressed)");
            return false;
        }
        if self.active {
            debug!(reason, "alarm/trigger ignored (already active)");
            return false;
        }

        self.active = true;
        info!(reason, now_micros = self.now_micros, "alarm/triggered");
        self.emit(AlarmEvent::AlarmTriggered);
        self.broadcast_eta(true);
        true
    }

    /// Active -> Idle. Returns `true` if the alarm transitioned.
    pub fn stop(&mut self, reason: &str) -> bool {
        if !self.active {
            debug!(reason, "alarm/stop ignored (already inactive)");
            return false;
        }

        self.active = false;
        info!(reason, now_micros = self.now_micros, "alarm/stopped");
        self.emit(AlarmEvent::AlarmStopped);
        self.broadcast_eta(true);
        true
    }

    /// Any -> Suppressed for `duration_micros` from the current step time.
    ///
    /// Forces `stop` first. Re-entrant: a second call refreshes the deadline.
    pub fn start_suppression(&mut self, duration_micros: i64, reason: &str) {
        let duration = duration_micros.max(0);

        self.stop("suppression started");
        self.suppression.start(self.now_micros, duration);
        info!(
            reason,
            duration_micros = duration,
            until_micros = ?self.suppression.suppressed_until_micros(),
            "alarm/suppression started"
        );

        if self.cfg.suppression_resets_progress {
            self.reset_escalation("suppression resets police progress");
        }

        self.emit(AlarmEvent::SuppressionStarted {
            duration_secs: micros_to_secs(duration),
        });
    }

    pub fn start_suppression_secs(&mut self, duration_secs: f64, reason: &str) {
        self.start_suppression(secs_to_micros(duration_secs), reason);
    }

    /// Suppress for the configured grant length.
    pub fn grant_suppression(&mut self, reason: &str) {
        self.start_suppression(self.cfg.suppression_micros, reason);
    }

    /// Zero escalation progress and re-broadcast the full threshold.
    pub fn reset_escalation(&mut self, reason: &str) {
        info!(reason, "alarm/escalation reset");
        for ev in self.escalation.reset() {
            self.emit(ev);
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn broadcast_eta(&mut self, force: bool) {
        if let Some(ev) = self.escalation.eta_event(force) {
            self.emit(ev);
        }
    }

    fn emit(&self, ev: AlarmEvent) {
        self.bus.publish(&ev);
    }
}
