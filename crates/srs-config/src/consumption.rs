use serde_json::Value;

/// JSON-pointer prefixes always read by [`crate::SimConfig`].
///
/// A leaf under any of these is consumed; anything else is reported by
/// [`crate::report_unused_keys`]. Keep this in step with `sim.rs`: only list
/// keys that are actually read.
pub static CONSUMED_POINTERS: &[&str] = &[
    "/alarm/suppression_secs",
    "/alarm/police_threshold_secs",
    "/alarm/suppression_resets_progress",
    "/alarm/eta_epsilon_secs",
    "/panel/wires",
    "/panel/correct_wire/mode",
    "/keypad/code",
    "/keypad/allow_when_inactive",
    "/keypad/max_digits",
];

const FIXED_INDEX: &str = "/panel/correct_wire/index";
const RANDOM_SEED: &str = "/panel/correct_wire/seed";

/// [`CONSUMED_POINTERS`] plus the correct-wire key the configured mode reads:
/// `index` for `fixed` (also the default), `seed` for `random`.
pub fn consumed_pointers_for(config_json: &Value) -> Vec<&'static str> {
    let mode = config_json
        .pointer("/panel/correct_wire/mode")
        .and_then(Value::as_str)
        .unwrap_or("fixed");

    let mut out = CONSUMED_POINTERS.to_vec();
    match mode {
        "fixed" => out.push(FIXED_INDEX),
        "random" => out.push(RANDOM_SEED),
        // Unknown modes fail typed loading; report both keys as unused.
        _ => {}
    }
    out
}
