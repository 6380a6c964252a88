use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use srs_alarm::secs_to_micros;
use srs_keypad::KeypadRejection;
use srs_panel::CutOutcome;

fn default_reason() -> String {
    "script".to_string()
}

/// Keypad codes are digit strings. A bare YAML number is refused so a code
/// like `0042` cannot silently become `42`.
fn quoted_code<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Text(code) => Ok(code),
        Raw::Number(n) => Err(serde::de::Error::custom(format!(
            "keypad code must be quoted: write code: \"{n}\""
        ))),
    }
}

/// One externally issued command. Serialized with a `command` tag:
/// `{"command": "cut_wire", "index": 1}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    Trigger {
        #[serde(default = "default_reason")]
        reason: String,
    },
    Stop {
        #[serde(default = "default_reason")]
        reason: String,
    },
    StartSuppression {
        duration_secs: f64,
        #[serde(default = "default_reason")]
        reason: String,
    },
    SubmitCode {
        #[serde(deserialize_with = "quoted_code")]
        code: String,
    },
    /// Signed so that negative indices from a driver are rejected as
    /// out-of-range instead of failing to parse.
    CutWire {
        index: i64,
    },
    CutWireById {
        id: String,
    },
    ResetEscalation {
        #[serde(default = "default_reason")]
        reason: String,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Trigger { .. } => "trigger",
            Command::Stop { .. } => "stop",
            Command::StartSuppression { .. } => "start_suppression",
            Command::SubmitCode { .. } => "submit_code",
            Command::CutWire { .. } => "cut_wire",
            Command::CutWireById { .. } => "cut_wire_by_id",
            Command::ResetEscalation { .. } => "reset_escalation",
        }
    }
}

/// What a command did.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CommandOutcome {
    /// `trigger` / `stop`: whether the alarm changed phase.
    Transition { changed: bool },
    SuppressionStarted { duration_secs: f64 },
    CodeAccepted,
    CodeRejected { reason: KeypadRejection },
    Cut { outcome: CutOutcome },
    EscalationReset,
}

/// A command scheduled at a session time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    pub at_secs: f64,
    #[serde(flatten)]
    pub command: Command,
}

/// Timed command list, ordered by `at_secs` (stable for equal times).
///
/// YAML (or JSON) form:
///
/// ```yaml
/// steps:
///   - { at_secs: 0,   command: trigger, reason: motion }
///   - { at_secs: 121, command: submit_code, code: "3917" }
/// ```
///
/// Codes must be quoted; `code: 3917` is rejected.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
}

impl Script {
    pub fn new(mut steps: Vec<ScriptStep>) -> Result<Self> {
        for (i, s) in steps.iter().enumerate() {
            if !s.at_secs.is_finite() || s.at_secs < 0.0 {
                bail!(
                    "SCRIPT_INVALID: step {} ({}) has invalid at_secs {}",
                    i,
                    s.command.name(),
                    s.at_secs
                );
            }
        }
        steps.sort_by(|a, b| a.at_secs.total_cmp(&b.at_secs));
        Ok(Self { steps })
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let parsed: Script = serde_yaml::from_str(raw).context("invalid script yaml")?;
        Self::new(parsed.steps)
    }

    pub fn from_path(path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script path: {path}"))?;
        Self::from_yaml_str(&raw).with_context(|| format!("script: {path}"))
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Time of the last step, 0 for an empty script.
    pub fn end_micros(&self) -> i64 {
        self.steps
            .last()
            .map(|s| secs_to_micros(s.at_secs))
            .unwrap_or(0)
    }
}

/// Cursor over a script. Hands out each step once its time is reached.
#[derive(Clone, Debug)]
pub struct ScriptPlayer {
    steps: Vec<ScriptStep>,
    next: usize,
}

impl ScriptPlayer {
    pub fn new(script: &Script) -> Self {
        Self {
            steps: script.steps.clone(),
            next: 0,
        }
    }

    /// Steps with `at <= now`, in script order. Each is returned once.
    pub fn pop_due(&mut self, now_micros: i64) -> Vec<ScriptStep> {
        let start = self.next;
        while self.next < self.steps.len() && secs_to_micros(self.steps[self.next].at_secs) <= now_micros {
            self.next += 1;
        }
        self.steps[start..self.next].to_vec()
    }

    /// Time of the next pending step.
    pub fn next_due_micros(&self) -> Option<i64> {
        self.steps.get(self.next).map(|s| secs_to_micros(s.at_secs))
    }

    pub fn remaining(&self) -> usize {
        self.steps.len() - self.next
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.steps.len()
    }
}
