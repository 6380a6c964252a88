use serde::{Deserialize, Serialize};

/// Wire identifier (e.g. a colour). Ordering is the panel order, not this type's.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WireId(pub String);

impl WireId {
    pub fn new<S: Into<String>>(s: S) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WireId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the correct wire is chosen at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CorrectWireSelection {
    /// Index into the wire list, clamped into `[0, N)`.
    Fixed(usize),
    /// Uniform draw over `[0, N)` from the supplied RNG.
    Random,
}

/// Result of one cut attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutOutcome {
    /// Correct wire: response system disabled for the session.
    Disarmed,
    /// Wrong wire: alarm (re-)triggered (subject to suppression).
    FalseTrigger,
    /// Wrong wire after disarm: marked cut, nothing else happens.
    Inert,
    /// Wire was already cut. No mutation.
    AlreadyCut,
    /// Index outside `[0, N)`. No mutation.
    OutOfRange,
}

impl CutOutcome {
    /// `true` if the cut set changed.
    pub fn resolved_wire(&self) -> bool {
        matches!(
            self,
            CutOutcome::Disarmed | CutOutcome::FalseTrigger | CutOutcome::Inert
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CutOutcome::Disarmed => "DISARMED",
            CutOutcome::FalseTrigger => "FALSE_TRIGGER",
            CutOutcome::Inert => "INERT",
            CutOutcome::AlreadyCut => "ALREADY_CUT",
            CutOutcome::OutOfRange => "OUT_OF_RANGE",
        }
    }
}
