//! `srs simulate`: build a session from layered config and play a script.

use std::io::Write;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Args;
use serde_json::json;
use srs_alarm::{micros_to_secs, secs_to_micros};
use srs_config::{report_unused_keys, LoadedConfig, UnusedKeyPolicy};
use srs_session::{
    run_script_virtual, Clock, MonotonicClock, RunOptions, Script, ScriptPlayer, Session,
    SessionBuilder, TimelineEntry,
};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Layered config paths in merge order. Defaults apply when omitted.
    #[arg(long = "config")]
    pub config_paths: Vec<String>,

    /// Timed command script (YAML or JSON)
    #[arg(long)]
    pub script: String,

    /// Step size in milliseconds
    #[arg(long, default_value_t = 100)]
    pub tick_ms: u64,

    /// Keep stepping this many seconds after the last script step
    #[arg(long, default_value_t = 0.0)]
    pub tail_secs: f64,

    /// Pace steps in wall-clock time instead of virtual time
    #[arg(long, default_value_t = false)]
    pub realtime: bool,

    /// Unused config key policy: warn | fail
    #[arg(long, default_value = "warn")]
    pub unused_keys: String,
}

pub async fn run(args: SimulateArgs) -> Result<()> {
    if args.tick_ms == 0 {
        bail!("--tick-ms must be > 0");
    }
    let policy = UnusedKeyPolicy::parse(&args.unused_keys)?;

    let path_refs: Vec<&str> = args.config_paths.iter().map(|s| s.as_str()).collect();
    let loaded = if path_refs.is_empty() {
        srs_config::load_layered_yaml_from_strings(&[])?
    } else {
        srs_config::load_layered_yaml(&path_refs)?
    };
    check_unused_keys(&loaded, policy)?;

    let script = Script::from_path(&args.script)?;
    let builder = SessionBuilder::from_loaded(&loaded)?;

    let tick_micros = i64::try_from(args.tick_ms)
        .unwrap_or(i64::MAX / 1_000)
        .saturating_mul(1_000);
    let opts = RunOptions {
        tick_micros,
        tail_micros: secs_to_micros(args.tail_secs),
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if args.realtime {
        let mut session = builder.build_with_clock(MonotonicClock::new());
        emit_start(&mut out, &session, &loaded, "realtime")?;
        let mut write_err = None;
        run_realtime(&mut session, &script, &opts, |entry| {
            if write_err.is_none() {
                write_err = emit_line(&mut out, entry).err();
            }
        })
        .await;
        if let Some(e) = write_err {
            return Err(e);
        }
        emit_final(&mut out, &session)?;
    } else {
        let mut session = builder.build();
        emit_start(&mut out, &session, &loaded, "virtual")?;
        let mut write_err = None;
        run_script_virtual(&mut session, &script, &opts, |entry| {
            if write_err.is_none() {
                write_err = emit_line(&mut out, entry).err();
            }
        })?;
        if let Some(e) = write_err {
            return Err(e);
        }
        emit_final(&mut out, &session)?;
    }

    Ok(())
}

fn check_unused_keys(loaded: &LoadedConfig, policy: UnusedKeyPolicy) -> Result<()> {
    let report = report_unused_keys(&loaded.config_json, policy)?;
    if !report.is_clean() {
        warn!(
            unused = ?report.unused_leaf_pointers,
            "config/unused keys"
        );
    }
    Ok(())
}

/// Step on a tokio interval until the script is done and the tail has run.
async fn run_realtime<F>(
    session: &mut Session<MonotonicClock>,
    script: &Script,
    opts: &RunOptions,
    mut sink: F,
) where
    F: FnMut(&TimelineEntry),
{
    let mut player = ScriptPlayer::new(script);
    let end = script.end_micros().saturating_add(opts.tail_micros.max(0));
    let period = Duration::from_micros(u64::try_from(opts.tick_micros).unwrap_or(1).max(1));

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        session_id = %session.session_id(),
        end_secs = micros_to_secs(end),
        "simulate/realtime start"
    );

    loop {
        interval.tick().await;
        session.step_with(&mut player, &mut sink);
        if player.is_finished() && session.clock().now_micros() >= end {
            break;
        }
    }
}

fn emit_start<C: Clock, W: Write>(
    out: &mut W,
    session: &Session<C>,
    loaded: &LoadedConfig,
    mode: &str,
) -> Result<()> {
    let line = json!({
        "kind": "session_start",
        "session_id": session.session_id(),
        "config_hash": loaded.config_hash,
        "mode": mode,
        "started_at_utc": Utc::now(),
    });
    writeln!(out, "{line}").context("write stdout")
}

fn emit_line<W: Write>(out: &mut W, entry: &TimelineEntry) -> Result<()> {
    let s = serde_json::to_string(entry).context("serialize timeline entry")?;
    writeln!(out, "{s}").context("write stdout")
}

fn emit_final<C: Clock, W: Write>(out: &mut W, session: &Session<C>) -> Result<()> {
    let line = json!({
        "kind": "final_status",
        "status": session.status(),
        "finished_at_utc": Utc::now(),
    });
    writeln!(out, "{line}").context("write stdout")
}
