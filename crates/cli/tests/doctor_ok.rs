use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_file(path: &PathBuf, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

#[test]
fn doctor_reads_provided_config_path() {
    let tmp = tempdir().unwrap();
    let cfg = tmp.path().join("config.toml");
    let toml = r#"
version = 1
profile = "default"

[profiles.default]
metadata_dir = "/tmp/etl/metadata"
output_dir = "{{metadata_dir}}/resolved"
"#;
    write_file(&cfg, toml);

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("metagen"));
    cmd.args(["doctor", "--config", cfg.to_str().unwrap()]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("OK   metagen doctor"))
        .stdout(predicate::str::contains("profile: default"))
        .stdout(predicate::str::contains("metadata_dir: /tmp/etl/metadata"))
        .stdout(predicate::str::contains("output_dir: /tmp/etl/metadata/resolved"));
}

#[test]
fn doctor_uses_xdg_default_when_present() {
    let tmp = tempdir().unwrap();
    let cfg_path = tmp.path().join("metagen").join("config.toml");
    write_file(
        &cfg_path,
        r#"
version = 1
profile = "default"
[profiles.default]
metadata_dir = "/tmp/m"
strict = false
"#,
    );

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("metagen"));
    cmd.env("XDG_CONFIG_HOME", tmp.path());
    cmd.arg("doctor");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("OK   metagen doctor"))
        .stdout(predicate::str::contains("metadata_dir: /tmp/m"))
        .stdout(predicate::str::contains("strict: false"));
}
