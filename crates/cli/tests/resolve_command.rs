use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::{TempDir, tempdir};

const DEATHS: &str = r#"
definitions:
  common:
    processing_level: minor
tables:
  deaths:
    parameters:
      age_group: ["0-17", "65+"]
    variables:
      death_rate:
        title: Death rate - << age_group >>
        unit: deaths per 100,000 people
"#;

const VARIANTS: &str = r#"
tables:
  sequences:
    variables:
      share:
        title: Share of sequences, << variant >>
        unit: "%"
"#;

fn write(path: &PathBuf, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// A command with no config file in reach.
fn metagen(xdg: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("metagen"));
    cmd.env("XDG_CONFIG_HOME", xdg.path());
    cmd.env("NO_COLOR", "1");
    cmd
}

fn doc(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    write(&path, content);
    path
}

#[test]
fn resolves_a_file_to_yaml() {
    let tmp = tempdir().unwrap();
    let path = doc(tmp.path(), "deaths.meta.yml", DEATHS);

    metagen(&tmp)
        .args(["resolve", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("short_name: death_rate_0_17"))
        .stdout(predicate::str::contains("title: Death rate - 65+"))
        .stdout(predicate::str::contains("processing_level: minor"));
}

#[test]
fn flat_json_is_a_list_of_records() {
    let tmp = tempdir().unwrap();
    let path = doc(tmp.path(), "deaths.meta.yml", DEATHS);

    let assert = metagen(&tmp)
        .args(["resolve", path.to_str().unwrap(), "--format", "json", "--flat"])
        .assert()
        .success();

    let out = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let records: serde_json::Value = serde_json::from_str(&out).unwrap();
    let names: Vec<&str> = records
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["short_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["death_rate_0_17", "death_rate_65_plus"]);
    assert_eq!(records[1]["bindings"]["age_group"], "65+");
}

#[test]
fn param_flags_supply_enumerations() {
    let tmp = tempdir().unwrap();
    let path = doc(tmp.path(), "variants.meta.yml", VARIANTS);

    metagen(&tmp)
        .args(["resolve", path.to_str().unwrap(), "--flat", "--param", "variant=Alpha,Delta"])
        .assert()
        .success()
        .stdout(predicate::str::contains("short_name: share_alpha"))
        .stdout(predicate::str::contains("short_name: share_delta"));
}

#[test]
fn unbound_parameter_fails_unless_lenient() {
    let tmp = tempdir().unwrap();
    let path = doc(tmp.path(), "variants.meta.yml", VARIANTS);

    metagen(&tmp)
        .args(["resolve", path.to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("FAIL metagen resolve"))
        .stdout(predicate::str::contains("unbound parameter 'variant'"));

    metagen(&tmp)
        .args(["resolve", path.to_str().unwrap(), "--lenient"])
        .assert()
        .success()
        .stdout(predicate::str::contains("short_name: share"))
        .stderr(predicate::str::contains("parameter 'variant' is unbound"));
}

#[test]
fn output_is_written_under_output_dir() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("metadata");
    doc(&root, "covid/deaths.meta.yml", DEATHS);
    let cfg = tmp.path().join("config.toml");
    write(
        &cfg,
        &format!(
            "version = 1\n[profiles.default]\nmetadata_dir = \"{}\"\noutput_dir = \"{{{{metadata_dir}}}}/resolved\"\n",
            root.display()
        ),
    );

    metagen(&tmp)
        .args(["--config", cfg.to_str().unwrap(), "resolve", "covid/deaths", "-o", "deaths.yml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("OK   metagen resolve"))
        .stdout(predicate::str::contains("records: 2"));

    let written = fs::read_to_string(root.join("resolved").join("deaths.yml")).unwrap();
    assert!(written.contains("death_rate_65_plus"));
}

#[test]
fn cyclic_aliases_are_reported() {
    let tmp = tempdir().unwrap();
    let path = doc(
        tmp.path(),
        "cycle.meta.yml",
        "definitions:\n  A:\n    <<: B\n  B:\n    <<: A\ntables:\n  t:\n    variables:\n      v:\n        <<: A\n",
    );

    metagen(&tmp)
        .args(["resolve", path.to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("cyclic alias A -> B -> A"));
}

#[test]
fn unknown_document_fails() {
    let tmp = tempdir().unwrap();
    metagen(&tmp)
        .current_dir(tmp.path())
        .args(["resolve", "nothing/here"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("metadata document not found: nothing/here"));
}
