//! srs-alarm
//!
//! Alarm / escalation state machine for the security-response simulation.
//!
//! Architectural decisions:
//! - One writer: `AlarmController` owns alarm state, the suppression window and
//!   police escalation progress. Nothing else mutates them.
//! - One entry point for time: `tick(now)` per simulation step. Suppression
//!   expiry, escalation accumulation and ETA broadcast are evaluated there.
//! - Commands are total. Invalid-state calls are logged no-ops, never errors.
//! - Notifications are delivered synchronously, in subscription order, before
//!   the command or tick that produced them returns.
//!
//! Deterministic integer time: all timestamps and durations are micros.
//! No wall-clock here; the driver samples its clock and passes `now` in.

mod bus;
mod controller;
mod escalation;
mod suppression;
mod types;

pub use bus::{EventBus, EventRecorder, SubscriptionId};
pub use controller::AlarmController;
pub use escalation::PoliceEscalationTracker;
pub use suppression::SuppressionWindow;
pub use types::*;
