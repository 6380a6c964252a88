//! srs-session
//!
//! Session driver for the security response core.
//!
//! A `Session` owns one alarm controller, disarm panel, keypad and camera
//! feed set, plus the clock it samples once per step. It is the only place
//! these parts meet: collaborators are lent the controller per call.
//!
//! - `SessionBuilder`: two-phase init. Subscribers queue on the builder and
//!   are registered only after the controller exists.
//! - `Command` / `Script`: serializable commands and timed scripts.
//! - `run_script_virtual`: deterministic playback on a manual clock.

mod clock;
mod script;
mod session;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use script::{Command, CommandOutcome, Script, ScriptPlayer, ScriptStep};
pub use session::{
    run_script_virtual, RunOptions, ScriptReport, Session, SessionBuilder, SessionStatus,
    TimelineEntry,
};
