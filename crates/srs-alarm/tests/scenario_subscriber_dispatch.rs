use std::sync::{Arc, Mutex};

use srs_alarm::*;

#[test]
fn scenario_subscribers_notified_in_order_before_command_returns() {
    let mut alarm = AlarmController::new(AlarmConfig::sane_defaults());
    let log = Arc::new(Mutex::new(Vec::<String>::new()));

    for name in ["lights", "audio", "ui"] {
        let l = Arc::clone(&log);
        alarm.subscribe(move |ev| {
            if *ev == AlarmEvent::AlarmTriggered {
                l.lock().unwrap().push(name.to_string());
            }
        });
    }

    alarm.trigger("camera");
    assert_eq!(*log.lock().unwrap(), vec!["lights", "audio", "ui"]);
}

#[test]
fn scenario_handler_can_unsubscribe_another_mid_dispatch() {
    let mut alarm = AlarmController::new(AlarmConfig::sane_defaults());
    let bus = alarm.bus().clone();
    let seen = Arc::new(Mutex::new(Vec::<&'static str>::new()));

    let victim_id = Arc::new(Mutex::new(None::<SubscriptionId>));

    // First subscriber removes the second on alarm_triggered.
    {
        let bus = bus.clone();
        let victim_id = Arc::clone(&victim_id);
        let seen = Arc::clone(&seen);
        alarm.subscribe(move |ev| {
            if *ev == AlarmEvent::AlarmTriggered {
                seen.lock().unwrap().push("remover");
                if let Some(id) = victim_id.lock().unwrap().take() {
                    assert!(bus.unsubscribe(id));
                }
            }
        });
    }
    {
        let seen = Arc::clone(&seen);
        let id = alarm.subscribe(move |ev| {
            if *ev == AlarmEvent::AlarmTriggered {
                seen.lock().unwrap().push("victim");
            }
        });
        *victim_id.lock().unwrap() = Some(id);
    }

    // The snapshot taken for this event still includes the victim.
    alarm.trigger("camera");
    assert_eq!(*seen.lock().unwrap(), vec!["remover", "victim"]);
    assert_eq!(bus.subscriber_count(), 1);

    // From the next event on, the victim is gone.
    alarm.stop("operator");
    alarm.trigger("camera");
    assert_eq!(*seen.lock().unwrap(), vec!["remover", "victim", "remover"]);
}

#[test]
fn scenario_handler_can_unsubscribe_itself() {
    let mut alarm = AlarmController::new(AlarmConfig::sane_defaults());
    let bus = alarm.bus().clone();
    let hits = Arc::new(Mutex::new(0));
    let my_id = Arc::new(Mutex::new(None::<SubscriptionId>));

    let id = {
        let hits = Arc::clone(&hits);
        let my_id = Arc::clone(&my_id);
        alarm.subscribe(move |_| {
            *hits.lock().unwrap() += 1;
            if let Some(id) = *my_id.lock().unwrap() {
                bus.unsubscribe(id);
            }
        })
    };
    *my_id.lock().unwrap() = Some(id);

    alarm.trigger("camera");
    alarm.stop("operator");
    assert_eq!(*hits.lock().unwrap(), 1, "one-shot subscriber saw only the first event");
}

#[test]
fn scenario_unsubscribed_recorder_stops_receiving() {
    let mut alarm = AlarmController::new(AlarmConfig::sane_defaults());
    let rec = EventRecorder::attach(alarm.bus());

    alarm.trigger("camera");
    assert!(alarm.unsubscribe(rec.id()));
    alarm.stop("operator");

    assert_eq!(rec.count("alarm_triggered"), 1);
    assert_eq!(rec.count("alarm_stopped"), 0);
}

#[test]
fn scenario_snapshot_serializes() {
    let mut alarm = AlarmController::new(AlarmConfig::from_secs(300.0, 120.0));
    alarm.tick_secs(0.0);
    alarm.trigger("camera");
    alarm.tick_secs(20.0);

    let snap = alarm.snapshot();
    assert_eq!(snap.phase, AlarmPhase::Active);
    assert_eq!(snap.police_remaining_secs, 100.0);

    let v = serde_json::to_value(&snap).unwrap();
    assert_eq!(v["phase"], "active");
    assert_eq!(v["accumulated_secs"], 20.0);
}
