//! srs-panel
//!
//! Wire disarm panel: N wires, exactly one correct.
//!
//! - The correct wire is chosen once at construction (fixed or random) and
//!   never changes.
//! - Each wire resolves at most once; the cut set only grows.
//! - Correct cut: stop alarm, reset escalation, cameras to static. Terminal.
//! - Wrong cut before disarm: trigger the alarm.
//! - Wrong cut after disarm: inert.
//!
//! The panel owns only its wire registry. Alarm and camera collaborators are
//! lent to it per cut.

mod panel;
mod response;
mod types;

pub use panel::DisarmPanel;
pub use response::{CameraFeeds, FeedMode, ResponseSubsystem};
pub use types::*;
