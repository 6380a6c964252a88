use srs_config::{
    load_layered_yaml_from_strings, report_unused_keys, report_unused_keys_against,
    UnusedKeyPolicy,
};

const WITH_TYPO: &str = r#"
alarm:
  suppression_secs: 300
  police_treshold_secs: 60
keypad:
  code: "3917"
extra:
  note: hello
"#;

#[test]
fn scenario_warn_reports_unused_leaves_sorted() {
    let loaded = load_layered_yaml_from_strings(&[WITH_TYPO]).expect("load");
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn).expect("warn is ok");
    assert!(!report.is_clean());
    assert_eq!(
        report.unused_leaf_pointers,
        vec![
            "/alarm/police_treshold_secs".to_string(),
            "/extra/note".to_string(),
        ]
    );
}

#[test]
fn scenario_fail_policy_errors_on_unused_keys() {
    let loaded = load_layered_yaml_from_strings(&[WITH_TYPO]).expect("load");
    let err = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail).unwrap_err();
    assert!(err.to_string().contains("CONFIG_UNUSED_KEYS"));
}

#[test]
fn scenario_fully_consumed_config_is_clean() {
    let doc = r#"
alarm:
  suppression_secs: 300
  police_threshold_secs: 120
  suppression_resets_progress: true
  eta_epsilon_secs: 0.05
panel:
  wires: [red, blue]
  correct_wire:
    mode: random
    seed: 9
keypad:
  code: "3917"
  allow_when_inactive: false
  max_digits: 4
"#;
    let loaded = load_layered_yaml_from_strings(&[doc]).expect("load");
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail).expect("clean");
    assert!(report.is_clean());

    let empty = load_layered_yaml_from_strings(&[]).expect("empty");
    assert!(report_unused_keys(&empty.config_json, UnusedKeyPolicy::Fail)
        .expect("empty is clean")
        .is_clean());
}

#[test]
fn scenario_prefix_consumes_subtree_only_on_segment_boundary() {
    let v = serde_json::json!({"a": {"b": {"c": 1}, "bc": 2}});
    let report = report_unused_keys_against(&["a/b/"], &v, UnusedKeyPolicy::Warn).expect("warn");
    assert_eq!(report.consumed_prefixes, vec!["/a/b".to_string()]);
    assert_eq!(report.unused_leaf_pointers, vec!["/a/bc".to_string()]);
}

#[test]
fn scenario_policy_parses_case_insensitively() {
    assert_eq!(UnusedKeyPolicy::parse("WARN").expect("warn"), UnusedKeyPolicy::Warn);
    assert_eq!(UnusedKeyPolicy::parse(" fail ").expect("fail"), UnusedKeyPolicy::Fail);
    assert!(UnusedKeyPolicy::parse("ignore").is_err());
}

#[test]
fn scenario_correct_wire_keys_count_only_for_their_mode() {
    let base = "panel:\n  correct_wire:\n    mode: fixed\n    index: 1\n";
    let random = "panel:\n  correct_wire:\n    mode: random\n    seed: 7\n";

    // The base index survives a random overlay but is never read.
    let loaded = load_layered_yaml_from_strings(&[base, random]).expect("load");
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn).expect("warn");
    assert_eq!(
        report.unused_leaf_pointers,
        vec!["/panel/correct_wire/index".to_string()]
    );

    // A seed left on a fixed panel is just as dead.
    let fixed_with_seed = "panel:\n  correct_wire:\n    mode: fixed\n    index: 0\n    seed: 3\n";
    let loaded = load_layered_yaml_from_strings(&[fixed_with_seed]).expect("load");
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn).expect("warn");
    assert_eq!(
        report.unused_leaf_pointers,
        vec!["/panel/correct_wire/seed".to_string()]
    );

    // Clearing the index in the overlay leaves a clean report.
    let cleared = "panel:\n  correct_wire:\n    mode: random\n    index: ~\n    seed: 7\n";
    let loaded = load_layered_yaml_from_strings(&[base, cleared]).expect("load");
    assert!(report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail)
        .expect("clean")
        .is_clean());
    loaded.sim_config().expect("random panel loads");
}

#[test]
fn scenario_shipped_random_scenario_layers_cleanly_over_defaults() {
    let root = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config");
    let base = format!("{root}/defaults/base.yaml");
    let random = format!("{root}/scenarios/random_wire.yaml");
    let loaded = srs_config::load_layered_yaml(&[&base, &random]).expect("load");
    assert!(report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail)
        .expect("no unused keys")
        .is_clean());
}
