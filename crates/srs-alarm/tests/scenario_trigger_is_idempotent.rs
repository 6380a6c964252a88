use srs_alarm::*;

#[test]
fn scenario_second_trigger_is_a_no_op() {
    let mut alarm = AlarmController::new(AlarmConfig::sane_defaults());
    let rec = EventRecorder::attach(alarm.bus());

    alarm.tick_secs(0.0);
    assert!(alarm.trigger("camera"));
    assert!(!alarm.trigger("camera again"));

    assert!(alarm.is_active());
    assert_eq!(alarm.phase(), AlarmPhase::Active);
    assert_eq!(rec.count("alarm_triggered"), 1, "no second alarm_triggered");
}

#[test]
fn scenario_stop_when_idle_is_a_no_op() {
    let mut alarm = AlarmController::new(AlarmConfig::sane_defaults());
    let rec = EventRecorder::attach(alarm.bus());

    assert!(!alarm.stop("nothing to stop"));
    assert!(rec.events().is_empty(), "no-op must not notify");

    alarm.trigger("camera");
    assert!(alarm.stop("operator"));
    assert!(!alarm.stop("operator again"));
    assert_eq!(rec.count("alarm_stopped"), 1);
}

#[test]
fn scenario_trigger_and_stop_force_eta_broadcast() {
    let mut alarm = AlarmController::new(AlarmConfig::from_secs(300.0, 120.0));
    let rec = EventRecorder::attach(alarm.bus());

    alarm.trigger("camera");
    assert_eq!(
        rec.take(),
        vec![
            AlarmEvent::AlarmTriggered,
            AlarmEvent::PoliceEtaChanged {
                remaining_secs: 120.0,
                total_secs: 120.0
            },
        ]
    );

    alarm.stop("operator");
    assert_eq!(
        rec.take(),
        vec![
            AlarmEvent::AlarmStopped,
            AlarmEvent::PoliceEtaChanged {
                remaining_secs: 120.0,
                total_secs: 120.0
            },
        ]
    );
}
