use srs_config::{load_layered_yaml_from_strings, CorrectWireSection, SimConfig};

fn sim(doc: &str) -> anyhow::Result<SimConfig> {
    load_layered_yaml_from_strings(&[doc])?.sim_config()
}

#[test]
fn scenario_empty_document_yields_defaults() {
    let cfg = sim("").expect("defaults are valid");
    assert_eq!(cfg, SimConfig::default());
    assert_eq!(cfg.alarm.suppression_secs, 300.0);
    assert_eq!(cfg.alarm.police_threshold_secs, 120.0);
    assert!(!cfg.alarm.suppression_resets_progress);
    assert_eq!(cfg.panel.wires.len(), 3);
    assert_eq!(cfg.panel.correct_wire, CorrectWireSection::Fixed { index: 0 });
    assert_eq!(cfg.keypad.code, "3917");
    assert_eq!(cfg.keypad.max_digits, 6);
}

#[test]
fn scenario_correct_wire_modes_parse() {
    let cfg = sim("panel:\n  correct_wire:\n    mode: fixed\n    index: 2\n").expect("fixed");
    assert_eq!(cfg.panel.correct_wire, CorrectWireSection::Fixed { index: 2 });

    let cfg = sim("panel:\n  correct_wire:\n    mode: random\n    seed: 42\n").expect("random");
    assert_eq!(cfg.panel.correct_wire, CorrectWireSection::Random { seed: Some(42) });

    let cfg = sim("panel:\n  correct_wire:\n    mode: random\n").expect("random unseeded");
    assert_eq!(cfg.panel.correct_wire, CorrectWireSection::Random { seed: None });

    // Out-of-range indices load; the panel clamps them.
    let cfg = sim("panel:\n  correct_wire:\n    mode: fixed\n    index: -1\n").expect("negative");
    assert_eq!(cfg.panel.correct_wire, CorrectWireSection::Fixed { index: -1 });

    assert!(sim("panel:\n  correct_wire:\n    mode: psychic\n").is_err());
}

#[test]
fn scenario_invalid_values_rejected() {
    let cases = [
        "alarm:\n  suppression_secs: -1\n",
        "alarm:\n  police_threshold_secs: -0.5\n",
        "alarm:\n  eta_epsilon_secs: 0\n",
        "panel:\n  wires: [red, red]\n",
        "panel:\n  wires: [red, \"\"]\n",
        "keypad:\n  max_digits: 0\n",
        "keypad:\n  code: \"\"\n",
        "keypad:\n  code: \"1234567\"\n",
    ];
    for doc in cases {
        let err = sim(doc).expect_err(doc);
        assert!(
            format!("{err:#}").contains("CONFIG_INVALID"),
            "unexpected error for {doc:?}: {err:#}"
        );
    }
}

#[test]
fn scenario_zero_durations_and_empty_panel_are_allowed() {
    let cfg = sim("alarm:\n  suppression_secs: 0\n  police_threshold_secs: 0\npanel:\n  wires: []\n")
        .expect("valid");
    assert_eq!(cfg.alarm.suppression_secs, 0.0);
    assert!(cfg.panel.wires.is_empty());
}
