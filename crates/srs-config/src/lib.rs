//! srs-config
//!
//! Layered YAML configuration for a simulation session.
//!
//! - Documents merge in order: earlier docs are base, later docs override
//!   (deep merge of mappings; scalars and sequences replace; null removes).
//! - The merged document is rendered as canonical JSON and hashed (SHA-256,
//!   hex) so every session can report exactly what it ran with.
//! - Unused-key guard: leaf keys no consumer reads are reported, and can be
//!   made fatal.
//!
//! Typed access lives in [`SimConfig`]; consumers convert it into their own
//! domain configs.

mod consumption;
mod sim;

pub use consumption::{consumed_pointers_for, CONSUMED_POINTERS};
pub use sim::{AlarmSection, CorrectWireSection, KeypadSection, PanelSection, SimConfig};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

impl UnusedKeyPolicy {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "warn" => Ok(UnusedKeyPolicy::Warn),
            "fail" => Ok(UnusedKeyPolicy::Fail),
            other => bail!("invalid unused-key policy '{}'. expected one of: warn | fail", other),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    /// Consumed JSON-pointer prefixes used for this analysis (sorted, unique)
    pub consumed_prefixes: Vec<String>,
    /// Unused leaf pointers (sorted)
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// Unused-key report against the keys the session reads for this document
/// (see [`consumed_pointers_for`]). `Fail` turns unused keys into an error.
pub fn report_unused_keys(config_json: &Value, policy: UnusedKeyPolicy) -> Result<UnusedKeyReport> {
    report_unused_keys_against(&consumed_pointers_for(config_json), config_json, policy)
}

pub fn report_unused_keys_against(
    consumed_pointers: &[&str],
    config_json: &Value,
    policy: UnusedKeyPolicy,
) -> Result<UnusedKeyReport> {
    let consumed: BTreeSet<String> = consumed_pointers
        .iter()
        .map(|p| normalize_pointer(p))
        .collect();
    let consumed_prefixes: Vec<String> = consumed.into_iter().collect();

    let mut leaves: Vec<String> = Vec::new();
    collect_leaf_pointers(config_json, "", &mut leaves);

    // An empty document has a single "/" leaf; that is not an unused key.
    let mut unused: Vec<String> = leaves
        .into_iter()
        .filter(|lp| lp != "/" || !config_json.is_object())
        .filter(|lp| !consumed_prefixes.iter().any(|cp| is_prefix_pointer(cp, lp)))
        .collect();

    unused.sort();
    unused.dedup();

    let report = UnusedKeyReport {
        consumed_prefixes,
        unused_leaf_pointers: unused,
    };

    if policy == UnusedKeyPolicy::Fail && !report.is_clean() {
        bail!(
            "CONFIG_UNUSED_KEYS: {} key(s) not read by the session: {}",
            report.unused_leaf_pointers.len(),
            report.unused_leaf_pointers.join(", ")
        );
    }

    Ok(report)
}

/// `alarm/` and `/alarm` both become `/alarm`; blank is the root.
fn normalize_pointer(p: &str) -> String {
    format!("/{}", p.trim().trim_matches('/'))
}

/// Return true if `prefix` is a JSON-pointer prefix of `leaf`.
///
/// "/a/b" consumes "/a/b" and "/a/b/c" but NOT "/a/bc".
fn is_prefix_pointer(prefix: &str, leaf: &str) -> bool {
    if prefix == "/" || leaf == prefix {
        return true;
    }
    leaf.strip_prefix(prefix)
        .map(|rest| rest.starts_with('/'))
        .unwrap_or(false)
}

fn collect_leaf_pointers(v: &Value, prefix: &str, out: &mut Vec<String>) {
    match v {
        Value::Object(map) if !map.is_empty() => {
            for (k, vv) in map.iter() {
                let token = k.replace('~', "~0").replace('/', "~1");
                let next = format!("{prefix}/{token}");
                collect_leaf_pointers(vv, &next, out);
            }
        }
        Value::Array(arr) if !arr.is_empty() => {
            for (i, vv) in arr.iter().enumerate() {
                let next = format!("{prefix}/{i}");
                collect_leaf_pointers(vv, &next, out);
            }
        }
        _ if prefix.is_empty() => out.push("/".into()),
        _ => out.push(prefix.into()),
    }
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

impl LoadedConfig {
    /// Typed, validated view of the merged document.
    pub fn sim_config(&self) -> Result<SimConfig> {
        SimConfig::from_config_json(&self.config_json)
    }
}

/// Read each file and layer them in argument order.
pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let docs = paths
        .iter()
        .map(|p| fs::read_to_string(p).with_context(|| format!("config layer {p}")))
        .collect::<Result<Vec<_>>>()?;
    let refs: Vec<&str> = docs.iter().map(String::as_str).collect();
    load_layered_yaml_from_strings(&refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        // A blank document is an empty layer, not a null override.
        if v_json.is_null() {
            continue;
        }
        if !v_json.is_object() {
            bail!("CONFIG_NOT_A_MAPPING: each yaml layer must be a mapping at the top level");
        }
        merge_into(&mut merged, v_json);
    }

    // serde_json's default Map is key-ordered, so this rendering is canonical.
    let canonical_json = serde_json::to_string(&merged).context("render merged config")?;
    let config_hash = hex::encode(Sha256::digest(canonical_json.as_bytes()));
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

/// Mappings merge key by key; any other overlay value replaces the base.
/// A null overlay value removes the key.
fn merge_into(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (k, v) in overlay_map {
                if v.is_null() {
                    base_map.remove(&k);
                } else {
                    merge_into(base_map.entry(k).or_insert(Value::Null), v);
                }
            }
        }
        (slot, v) => *slot = v,
    }
}
