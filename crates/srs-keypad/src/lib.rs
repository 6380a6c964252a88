//! srs-keypad
//!
//! Code keypad that grants a suppression window.
//!
//! Stateless apart from configuration: every gate is read fresh from the
//! alarm controller at call time.

use serde::{Deserialize, Serialize};
use srs_alarm::AlarmController;
use tracing::{debug, info};

/// Default upper bound on entered code length.
pub const DEFAULT_MAX_DIGITS: usize = 6;

const ACCEPTED_REASON: &str = "keypad code accepted";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeypadConfig {
    pub secret: String,
    /// If false, the keypad only accepts input while the alarm is sounding.
    pub allow_when_inactive: bool,
    /// Codes longer than this are malformed.
    pub max_digits: usize,
}

impl KeypadConfig {
    pub fn new<S: Into<String>>(secret: S) -> Self {
        Self {
            secret: secret.into(),
            allow_when_inactive: false,
            max_digits: DEFAULT_MAX_DIGITS,
        }
    }
}

/// Why a submission did not grant suppression.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeypadRejection {
    Suppressed,
    AlarmInactive,
    Malformed,
    WrongCode,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Keypad {
    cfg: KeypadConfig,
}

impl Keypad {
    pub fn new(cfg: KeypadConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &KeypadConfig {
        &self.cfg
    }

    /// Single source of truth for whether input should be accepted right now.
    pub fn can_interact_now(&self, alarm: &AlarmController) -> bool {
        self.gate(alarm).is_none()
    }

    fn gate(&self, alarm: &AlarmController) -> Option<KeypadRejection> {
        if alarm.is_suppressed() {
            return Some(KeypadRejection::Suppressed);
        }
        if !self.cfg.allow_when_inactive && !alarm.is_active() {
            return Some(KeypadRejection::AlarmInactive);
        }
        None
    }

    fn is_malformed(&self, code: &str) -> bool {
        code.is_empty() || code.chars().count() > self.cfg.max_digits
    }

    /// Submit a code. On match, starts the configured suppression window.
    pub fn try_submit(&self, code: &str, alarm: &mut AlarmController) -> Result<(), KeypadRejection> {
        if let Some(rejection) = self.gate(alarm) {
            debug!(?rejection, "keypad/submit blocked");
            return Err(rejection);
        }
        if self.is_malformed(code) {
            debug!(len = code.len(), max_digits = self.cfg.max_digits, "keypad/submit malformed");
            return Err(KeypadRejection::Malformed);
        }
        if code != self.cfg.secret {
            info!("keypad/wrong code");
            return Err(KeypadRejection::WrongCode);
        }

        info!("keypad/code accepted");
        alarm.grant_suppression(ACCEPTED_REASON);
        Ok(())
    }

    /// `true` if the code was accepted and suppression started.
    pub fn submit(&self, code: &str, alarm: &mut AlarmController) -> bool {
        self.try_submit(code, alarm).is_ok()
    }
}
