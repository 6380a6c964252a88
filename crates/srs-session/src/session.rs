use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use srs_alarm::{
    micros_to_secs, secs_to_micros, AlarmConfig, AlarmController, AlarmEvent, AlarmSnapshot,
    EventRecorder, SubscriptionId,
};
use srs_config::{CorrectWireSection, LoadedConfig, SimConfig};
use srs_keypad::{Keypad, KeypadConfig, KeypadRejection};
use srs_panel::{CameraFeeds, CorrectWireSelection, CutOutcome, DisarmPanel, FeedMode, WireId};
use tracing::{debug, info};
use uuid::Uuid;

use crate::clock::{Clock, ManualClock};
use crate::script::{Command, CommandOutcome, Script, ScriptPlayer};

type PendingHandler = Box<dyn FnMut(&AlarmEvent) + Send + 'static>;

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Two-phase session construction.
///
/// Subscribers handed to the builder are queued and registered, in order,
/// once the alarm controller exists.
pub struct SessionBuilder {
    cfg: SimConfig,
    config_hash: Option<String>,
    session_id: Option<Uuid>,
    pending: Vec<PendingHandler>,
}

impl SessionBuilder {
    pub fn new(cfg: SimConfig) -> Self {
        Self {
            cfg,
            config_hash: None,
            session_id: None,
            pending: Vec::new(),
        }
    }

    /// Validated config plus its hash, from a layered load.
    pub fn from_loaded(loaded: &LoadedConfig) -> Result<Self> {
        let cfg = loaded.sim_config()?;
        Ok(Self::new(cfg).config_hash(loaded.config_hash.clone()))
    }

    pub fn config_hash<S: Into<String>>(mut self, hash: S) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    pub fn session_id(mut self, id: Uuid) -> Self {
        self.session_id = Some(id);
        self
    }

    pub fn subscribe<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&AlarmEvent) + Send + 'static,
    {
        self.pending.push(Box::new(handler));
        self
    }

    /// Build on virtual time starting at 0.
    pub fn build(self) -> Session<ManualClock> {
        self.build_with_clock(ManualClock::new())
    }

    pub fn build_with_clock<C: Clock>(self, clock: C) -> Session<C> {
        let session_id = self.session_id.unwrap_or_else(Uuid::new_v4);

        // Phase 1: core.
        let alarm = AlarmController::new(alarm_config(&self.cfg));
        let panel = build_panel(&self.cfg);
        let keypad = Keypad::new(KeypadConfig {
            secret: self.cfg.keypad.code.clone(),
            allow_when_inactive: self.cfg.keypad.allow_when_inactive,
            max_digits: self.cfg.keypad.max_digits,
        });

        // Phase 2: subscribers.
        let mut subscriptions = Vec::with_capacity(self.pending.len());
        for handler in self.pending {
            subscriptions.push(alarm.subscribe(handler));
        }
        let journal = EventRecorder::attach(alarm.bus());

        info!(
            %session_id,
            config_hash = self.config_hash.as_deref().unwrap_or("-"),
            wires = panel.wire_count(),
            subscribers = subscriptions.len(),
            "session/built"
        );

        Session {
            session_id,
            config_hash: self.config_hash,
            alarm,
            panel,
            keypad,
            cameras: CameraFeeds::new(),
            clock,
            journal,
            subscriptions,
        }
    }
}

fn alarm_config(cfg: &SimConfig) -> AlarmConfig {
    let a = &cfg.alarm;
    AlarmConfig {
        eta_epsilon_micros: secs_to_micros(a.eta_epsilon_secs).max(1),
        ..AlarmConfig::from_secs(a.suppression_secs, a.police_threshold_secs)
            .with_reset_policy(a.suppression_resets_progress)
    }
}

fn build_panel(cfg: &SimConfig) -> DisarmPanel {
    let wires: Vec<WireId> = cfg.panel.wires.iter().map(WireId::new).collect();
    match cfg.panel.correct_wire {
        CorrectWireSection::Fixed { index } => {
            // Negative clamps to the first wire; too large clamps in the panel.
            let index = usize::try_from(index.max(0)).unwrap_or(usize::MAX);
            DisarmPanel::with_fixed(wires, index)
        }
        CorrectWireSection::Random { seed } => {
            let mut rng = match seed {
                Some(s) => StdRng::seed_from_u64(s),
                None => StdRng::from_entropy(),
            };
            DisarmPanel::new(wires, CorrectWireSelection::Random, &mut rng)
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Notification stamped with the step time it was published at.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimelineEntry {
    Event {
        t_secs: f64,
        event: AlarmEvent,
    },
    Command {
        t_secs: f64,
        command: Command,
        outcome: CommandOutcome,
    },
}

/// Point-in-time view of the whole session. Does not reveal the correct wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub session_id: Uuid,
    pub config_hash: Option<String>,
    pub alarm: AlarmSnapshot,
    pub feeds: FeedMode,
    pub disarmed: bool,
    pub wires: Vec<String>,
    pub wires_cut: Vec<String>,
    pub keypad_accepting: bool,
}

pub struct Session<C: Clock> {
    session_id: Uuid,
    config_hash: Option<String>,
    alarm: AlarmController,
    panel: DisarmPanel,
    keypad: Keypad,
    cameras: CameraFeeds,
    clock: C,
    journal: EventRecorder,
    subscriptions: Vec<SubscriptionId>,
}

impl<C: Clock> Session<C> {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn config_hash(&self) -> Option<&str> {
        self.config_hash.as_deref()
    }

    pub fn alarm(&self) -> &AlarmController {
        &self.alarm
    }

    pub fn panel(&self) -> &DisarmPanel {
        &self.panel
    }

    pub fn keypad(&self) -> &Keypad {
        &self.keypad
    }

    pub fn cameras(&self) -> &CameraFeeds {
        &self.cameras
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Ids of the subscribers registered at build time, in order.
    pub fn subscriptions(&self) -> &[SubscriptionId] {
        &self.subscriptions
    }

    /// Late subscription. Prefer the builder so nothing misses early events.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: FnMut(&AlarmEvent) + Send + 'static,
    {
        self.alarm.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.alarm.unsubscribe(id)
    }

    pub fn now_secs(&self) -> f64 {
        micros_to_secs(self.alarm.now_micros())
    }

    /// Sample the clock and tick the controller once.
    ///
    /// Undrained events from the previous step are discarded, so a host that
    /// never drains holds at most one step's worth.
    pub fn step(&mut self) {
        self.journal.take();
        let now = self.clock.now_micros();
        self.alarm.tick(now);
    }

    /// Events published since the current step began (or the last drain),
    /// stamped with the step time. Drain after every step or command to keep
    /// stamps exact.
    pub fn drain_events(&self) -> Vec<TimelineEntry> {
        let t_secs = self.now_secs();
        self.journal
            .take()
            .into_iter()
            .map(|event| TimelineEntry::Event { t_secs, event })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Ignored once the panel is disarmed: the response system stays off for
    /// the rest of the session.
    pub fn trigger(&mut self, reason: &str) -> bool {
        if self.panel.is_disarmed() {
            debug!(reason, "session/trigger ignored (disarmed)");
            return false;
        }
        self.alarm.trigger(reason)
    }

    pub fn stop(&mut self, reason: &str) -> bool {
        self.alarm.stop(reason)
    }

    pub fn start_suppression(&mut self, duration_secs: f64, reason: &str) {
        self.alarm.start_suppression_secs(duration_secs, reason);
    }

    pub fn submit_code(&mut self, code: &str) -> Result<(), KeypadRejection> {
        self.keypad.try_submit(code, &mut self.alarm)
    }

    /// Negative or too-large indices are `OutOfRange` with no side effects.
    pub fn cut_wire(&mut self, index: i64) -> CutOutcome {
        match usize::try_from(index) {
            Ok(i) => self.panel.cut(i, &mut self.alarm, &mut self.cameras),
            Err(_) => {
                debug!(index, "session/cut rejected (negative index)");
                CutOutcome::OutOfRange
            }
        }
    }

    pub fn cut_wire_by_id(&mut self, id: &str) -> CutOutcome {
        self.panel
            .cut_by_id(&WireId::new(id), &mut self.alarm, &mut self.cameras)
    }

    pub fn reset_escalation(&mut self, reason: &str) {
        self.alarm.reset_escalation(reason);
    }

    /// Route a serialized command.
    pub fn apply(&mut self, command: &Command) -> CommandOutcome {
        match command {
            Command::Trigger { reason } => CommandOutcome::Transition {
                changed: self.trigger(reason),
            },
            Command::Stop { reason } => CommandOutcome::Transition {
                changed: self.stop(reason),
            },
            Command::StartSuppression {
                duration_secs,
                reason,
            } => {
                self.start_suppression(*duration_secs, reason);
                CommandOutcome::SuppressionStarted {
                    duration_secs: micros_to_secs(secs_to_micros(*duration_secs)),
                }
            }
            Command::SubmitCode { code } => match self.submit_code(code) {
                Ok(()) => CommandOutcome::CodeAccepted,
                Err(reason) => CommandOutcome::CodeRejected { reason },
            },
            Command::CutWire { index } => CommandOutcome::Cut {
                outcome: self.cut_wire(*index),
            },
            Command::CutWireById { id } => CommandOutcome::Cut {
                outcome: self.cut_wire_by_id(id),
            },
            Command::ResetEscalation { reason } => {
                self.reset_escalation(reason);
                CommandOutcome::EscalationReset
            }
        }
    }

    /// One driver step: tick at the clock's time, then apply every script
    /// step due by then. Each command entry is followed by the events it
    /// published.
    pub fn step_with<F>(&mut self, player: &mut ScriptPlayer, sink: &mut F)
    where
        F: FnMut(&TimelineEntry),
    {
        self.step();
        for entry in self.drain_events() {
            sink(&entry);
        }

        for due in player.pop_due(self.alarm.now_micros()) {
            let outcome = self.apply(&due.command);
            debug!(
                command = due.command.name(),
                phase = self.alarm.phase().as_str(),
                ?outcome,
                "session/command"
            );
            sink(&TimelineEntry::Command {
                t_secs: self.now_secs(),
                command: due.command,
                outcome,
            });
            for entry in self.drain_events() {
                sink(&entry);
            }
        }
    }

    pub fn status(&self) -> SessionStatus {
        let wires = self.panel.wires();
        SessionStatus {
            session_id: self.session_id,
            config_hash: self.config_hash.clone(),
            alarm: self.alarm.snapshot(),
            feeds: self.cameras.mode(),
            disarmed: self.panel.is_disarmed(),
            wires: wires.iter().map(|w| w.to_string()).collect(),
            wires_cut: wires
                .iter()
                .enumerate()
                .filter(|(i, _)| self.panel.is_cut(*i))
                .map(|(_, w)| w.to_string())
                .collect(),
            keypad_accepting: self.keypad.can_interact_now(&self.alarm),
        }
    }
}

// ---------------------------------------------------------------------------
// Virtual-time playback
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunOptions {
    /// Step size between script times.
    pub tick_micros: i64,
    /// Keep stepping this long after the last script step.
    pub tail_micros: i64,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            tick_micros: 100_000,
            tail_micros: 0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScriptReport {
    pub session_id: Uuid,
    pub steps_applied: usize,
    pub ticks: usize,
    pub timeline: Vec<TimelineEntry>,
    pub final_status: SessionStatus,
}

/// Play `script` on the session's manual clock, from the current clock time
/// to the last step plus `tail_micros`.
///
/// Stepping is every `tick_micros`, plus exactly at each script time, so
/// commands run at their scheduled step time.
pub fn run_script_virtual<F>(
    session: &mut Session<ManualClock>,
    script: &Script,
    opts: &RunOptions,
    mut sink: F,
) -> Result<ScriptReport>
where
    F: FnMut(&TimelineEntry),
{
    if opts.tick_micros <= 0 {
        bail!("RUN_INVALID: tick must be > 0 micros (got {})", opts.tick_micros);
    }

    let mut player = ScriptPlayer::new(script);
    let end = script
        .end_micros()
        .max(session.clock().now_micros())
        .saturating_add(opts.tail_micros.max(0));

    info!(
        session_id = %session.session_id(),
        steps = script.steps.len(),
        end_micros = end,
        "session/script start"
    );

    let mut timeline = Vec::new();
    let mut ticks = 0usize;
    let total = player.remaining();

    loop {
        session.step_with(&mut player, &mut |entry: &TimelineEntry| {
            sink(entry);
            timeline.push(entry.clone());
        });
        ticks += 1;

        let now = session.clock().now_micros();
        if now >= end && player.is_finished() {
            break;
        }

        // Pending steps are all later than `now` here.
        let mut next = now.saturating_add(opts.tick_micros).min(end);
        if let Some(due) = player.next_due_micros() {
            next = next.min(due);
        }
        session.clock_mut().set_micros(next);
    }

    let report = ScriptReport {
        session_id: session.session_id(),
        steps_applied: total - player.remaining(),
        ticks,
        timeline,
        final_status: session.status(),
    };
    info!(
        session_id = %report.session_id,
        steps_applied = report.steps_applied,
        ticks = report.ticks,
        "session/script done"
    );
    Ok(report)
}
