use serde::{Deserialize, Serialize};

/// 1e-6 fixed-point scale (micros per second).
pub const MICROS_SCALE: i64 = 1_000_000;

/// Default ETA broadcast threshold: 0.01s.
pub const DEFAULT_ETA_EPSILON_MICROS: i64 = 10_000;

/// Convert boundary seconds into micros.
///
/// NaN and non-positive input map to 0 so every command stays total.
/// `+inf` and very large values saturate at `i64::MAX`.
pub fn secs_to_micros(secs: f64) -> i64 {
    if secs.is_nan() || secs <= 0.0 {
        return 0;
    }
    // `as` saturates on overflow.
    (secs * MICROS_SCALE as f64).round() as i64
}

/// Convert micros into boundary seconds.
pub fn micros_to_secs(micros: i64) -> f64 {
    micros as f64 / MICROS_SCALE as f64
}

/// Alarm controller configuration (set once at initialization).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlarmConfig {
    /// Length of a keypad-granted suppression window.
    pub suppression_micros: i64,

    /// Active-and-unsuppressed time before police arrive.
    pub police_threshold_micros: i64,

    /// If true, starting suppression zeroes escalation progress.
    /// If false (default), suppression only pauses it.
    pub suppression_resets_progress: bool,

    /// Minimum ETA change that is worth re-broadcasting.
    pub eta_epsilon_micros: i64,
}

impl AlarmConfig {
    /// 300s suppression, 120s police threshold, pause policy.
    pub fn sane_defaults() -> Self {
        Self {
            suppression_micros: 300 * MICROS_SCALE,
            police_threshold_micros: 120 * MICROS_SCALE,
            suppression_resets_progress: false,
            eta_epsilon_micros: DEFAULT_ETA_EPSILON_MICROS,
        }
    }

    pub fn from_secs(suppression_secs: f64, police_threshold_secs: f64) -> Self {
        Self {
            suppression_micros: secs_to_micros(suppression_secs),
            police_threshold_micros: secs_to_micros(police_threshold_secs),
            ..Self::sane_defaults()
        }
    }

    pub fn with_reset_policy(mut self, suppression_resets_progress: bool) -> Self {
        self.suppression_resets_progress = suppression_resets_progress;
        self
    }
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self::sane_defaults()
    }
}

/// Observable phase of the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmPhase {
    /// Inactive, not suppressed.
    Idle,
    /// Alarm sounding.
    Active,
    /// Silenced under a time-limited grant.
    Suppressed,
}

impl AlarmPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlarmPhase::Idle => "IDLE",
            AlarmPhase::Active => "ACTIVE",
            AlarmPhase::Suppressed => "SUPPRESSED",
        }
    }
}

/// Notifications published to subscribers.
///
/// Seconds at this boundary; micros internally.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AlarmEvent {
    AlarmTriggered,
    AlarmStopped,
    SuppressionStarted { duration_secs: f64 },
    SuppressionEnded,
    PoliceEtaChanged { remaining_secs: f64, total_secs: f64 },
    PoliceArrived,
    EscalationReset,
}

impl AlarmEvent {
    /// Stable snake_case name (matches the serde tag).
    pub fn kind(&self) -> &'static str {
        match self {
            AlarmEvent::AlarmTriggered => "alarm_triggered",
            AlarmEvent::AlarmStopped => "alarm_stopped",
            AlarmEvent::SuppressionStarted { .. } => "suppression_started",
            AlarmEvent::SuppressionEnded => "suppression_ended",
            AlarmEvent::PoliceEtaChanged { .. } => "police_eta_changed",
            AlarmEvent::PoliceArrived => "police_arrived",
            AlarmEvent::EscalationReset => "escalation_reset",
        }
    }
}

/// Point-in-time view of the controller, for drivers and status output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlarmSnapshot {
    pub phase: AlarmPhase,
    pub active: bool,
    pub suppressed: bool,
    pub suppression_remaining_secs: f64,
    pub police_remaining_secs: f64,
    pub police_total_secs: f64,
    pub police_arrived: bool,
    pub accumulated_secs: f64,
    pub now_secs: f64,
}
