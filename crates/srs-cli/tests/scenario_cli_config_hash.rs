use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::PathBuf;
use std::process::Command;

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("..").join("..")
}

#[test]
fn cli_config_hash_prints_hash_and_canonical_json() -> anyhow::Result<()> {
    let base = repo_root().join("config/defaults/base.yaml");

    let out = Command::cargo_bin("srs")?
        .arg("config-hash")
        .arg(&base)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("config_hash="))
        .get_output()
        .stdout
        .clone();

    let text = String::from_utf8(out)?;
    let mut lines = text.lines();
    let hash = lines
        .next()
        .and_then(|l| l.strip_prefix("config_hash="))
        .unwrap_or_default();
    assert_eq!(hash.len(), 64);

    let canonical: serde_json::Value = serde_json::from_str(lines.next().unwrap_or_default())?;
    assert_eq!(canonical["alarm"]["police_threshold_secs"], 120);
    assert_eq!(canonical["panel"]["correct_wire"]["mode"], "fixed");
    Ok(())
}

#[test]
fn cli_config_hash_requires_paths_and_existing_files() -> anyhow::Result<()> {
    Command::cargo_bin("srs")?
        .arg("config-hash")
        .assert()
        .failure();

    Command::cargo_bin("srs")?
        .args(["config-hash", "/definitely/not/here.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config layer"));
    Ok(())
}
