use srs_alarm::*;

#[test]
fn scenario_suppression_blocks_trigger() {
    let mut alarm = AlarmController::new(AlarmConfig::sane_defaults());
    let rec = EventRecorder::attach(alarm.bus());

    alarm.tick_secs(0.0);
    alarm.start_suppression_secs(300.0, "keypad");

    alarm.tick_secs(1.0);
    assert!(!alarm.trigger("camera"), "suppression blocks re-trigger");
    assert!(!alarm.is_active());
    assert!(alarm.is_suppressed());
    assert_eq!(alarm.phase(), AlarmPhase::Suppressed);
    assert_eq!(rec.count("alarm_triggered"), 0);
}

#[test]
fn scenario_suppression_silences_active_alarm() {
    let mut alarm = AlarmController::new(AlarmConfig::sane_defaults());
    let rec = EventRecorder::attach(alarm.bus());

    alarm.tick_secs(0.0);
    alarm.trigger("camera");
    rec.take();

    alarm.start_suppression_secs(30.0, "keypad");
    assert!(!alarm.is_active());

    let kinds: Vec<&str> = rec.take().iter().map(AlarmEvent::kind).collect();
    assert_eq!(
        kinds,
        vec!["alarm_stopped", "police_eta_changed", "suppression_started"]
    );
}

#[test]
fn scenario_suppression_expiry_emits_ended_once() {
    let mut alarm = AlarmController::new(AlarmConfig::sane_defaults());
    let rec = EventRecorder::attach(alarm.bus());

    alarm.tick_secs(0.0);
    alarm.start_suppression_secs(10.0, "keypad");

    alarm.tick_secs(9.999);
    assert!(alarm.is_suppressed());
    assert_eq!(rec.count("suppression_ended"), 0);

    alarm.tick_secs(10.001);
    assert!(!alarm.is_suppressed());
    assert_eq!(alarm.phase(), AlarmPhase::Idle);
    assert_eq!(rec.count("suppression_ended"), 1);

    alarm.tick_secs(11.0);
    alarm.tick_secs(50.0);
    assert_eq!(rec.count("suppression_ended"), 1, "ended fires exactly once");
    assert!(!alarm.is_active(), "alarm does not auto-resume");
}

#[test]
fn scenario_restart_refreshes_deadline() {
    let mut alarm = AlarmController::new(AlarmConfig::sane_defaults());

    alarm.tick_secs(0.0);
    alarm.start_suppression_secs(10.0, "first");
    alarm.tick_secs(8.0);
    alarm.start_suppression_secs(10.0, "second");

    assert!((alarm.suppression_remaining_secs() - 10.0).abs() < 1e-9);

    alarm.tick_secs(12.0);
    assert!(alarm.is_suppressed(), "deadline is 18s, not 10s");
    alarm.tick_secs(18.0);
    assert!(!alarm.is_suppressed());
}

#[test]
fn scenario_grant_uses_configured_duration() {
    let mut alarm = AlarmController::new(AlarmConfig::from_secs(45.0, 120.0));
    let rec = EventRecorder::attach(alarm.bus());

    alarm.tick_secs(5.0);
    alarm.grant_suppression("keypad");

    assert_eq!(
        rec.events().last(),
        Some(&AlarmEvent::SuppressionStarted {
            duration_secs: 45.0
        })
    );
    assert_eq!(alarm.suppression().suppressed_until_micros(), Some(50 * MICROS_SCALE));
}

#[test]
fn scenario_trigger_allowed_again_after_expiry() {
    let mut alarm = AlarmController::new(AlarmConfig::sane_defaults());

    alarm.tick_secs(0.0);
    alarm.start_suppression_secs(10.0, "keypad");
    alarm.tick_secs(10.0);
    assert!(alarm.trigger("camera"));
    assert!(alarm.is_active());
}
