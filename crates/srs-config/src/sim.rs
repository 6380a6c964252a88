use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Typed view of the merged config document.
///
/// Every field has a default, so an empty document is a valid session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub alarm: AlarmSection,
    pub panel: PanelSection,
    pub keypad: KeypadSection,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlarmSection {
    pub suppression_secs: f64,
    pub police_threshold_secs: f64,
    /// true: a new suppression window resets police progress.
    /// false: suppression only pauses it.
    pub suppression_resets_progress: bool,
    pub eta_epsilon_secs: f64,
}

impl Default for AlarmSection {
    fn default() -> Self {
        Self {
            suppression_secs: 300.0,
            police_threshold_secs: 120.0,
            suppression_resets_progress: false,
            eta_epsilon_secs: 0.01,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelSection {
    pub wires: Vec<String>,
    pub correct_wire: CorrectWireSection,
}

impl Default for PanelSection {
    fn default() -> Self {
        Self {
            wires: vec!["red".to_string(), "blue".to_string(), "green".to_string()],
            correct_wire: CorrectWireSection::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CorrectWireSection {
    /// Clamped into the wire range when the panel is built, negatives
    /// included.
    Fixed {
        #[serde(default)]
        index: i64,
    },
    /// `seed: None` draws from OS entropy.
    Random {
        #[serde(default)]
        seed: Option<u64>,
    },
}

impl Default for CorrectWireSection {
    fn default() -> Self {
        CorrectWireSection::Fixed { index: 0 }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeypadSection {
    pub code: String,
    pub allow_when_inactive: bool,
    pub max_digits: usize,
}

impl Default for KeypadSection {
    fn default() -> Self {
        Self {
            code: "3917".to_string(),
            allow_when_inactive: false,
            max_digits: 6,
        }
    }
}

impl SimConfig {
    /// Deserialize and validate a merged config document.
    pub fn from_config_json(v: &Value) -> Result<Self> {
        let cfg: SimConfig =
            serde_json::from_value(v.clone()).context("CONFIG_INVALID: sim config shape")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        let a = &self.alarm;
        check_duration("alarm.suppression_secs", a.suppression_secs)?;
        check_duration("alarm.police_threshold_secs", a.police_threshold_secs)?;
        if !(a.eta_epsilon_secs.is_finite() && a.eta_epsilon_secs > 0.0) {
            bail!(
                "CONFIG_INVALID: alarm.eta_epsilon_secs must be > 0 (got {})",
                a.eta_epsilon_secs
            );
        }

        let p = &self.panel;
        let mut seen = BTreeSet::new();
        for w in &p.wires {
            if w.trim().is_empty() {
                bail!("CONFIG_INVALID: panel.wires contains an empty wire id");
            }
            if !seen.insert(w.as_str()) {
                bail!("CONFIG_INVALID: panel.wires contains duplicate wire id '{}'", w);
            }
        }

        let k = &self.keypad;
        if k.max_digits == 0 {
            bail!("CONFIG_INVALID: keypad.max_digits must be >= 1");
        }
        if k.code.is_empty() {
            bail!("CONFIG_INVALID: keypad.code must not be empty");
        }
        if k.code.chars().count() > k.max_digits {
            bail!(
                "CONFIG_INVALID: keypad.code is longer than keypad.max_digits ({})",
                k.max_digits
            );
        }
        Ok(())
    }
}

fn check_duration(name: &str, secs: f64) -> Result<()> {
    if !secs.is_finite() || secs < 0.0 {
        bail!("CONFIG_INVALID: {} must be a finite, non-negative number of seconds (got {})", name, secs);
    }
    Ok(())
}
