//! CLI surface smoke tests. Nothing here talks to a TestRail
//! instance; network-dependent paths are covered up to the point where
//! credentials are required.

use assert_cmd::Command;
use predicates::prelude::*;

fn railgun() -> Command {
    let mut cmd = Command::cargo_bin("railgun").unwrap();
    cmd.env_remove("TESTRAIL_URL")
        .env_remove("TESTRAIL_USER")
        .env_remove("TESTRAIL_PASSWORD");
    cmd
}

#[test]
fn help_describes_the_tool() {
    railgun()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Sync xUnit test results"));
}

#[test]
fn init_writes_a_valid_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("railgun.toml");

    railgun()
        .arg("-c")
        .arg(&config)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote starter configuration"));

    railgun()
        .arg("-c")
        .arg(&config)
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration OK"));
}

#[test]
fn init_refuses_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("railgun.toml");
    std::fs::write(&config, "# existing").unwrap();

    railgun()
        .arg("-c")
        .arg(&config)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not overwriting"));
}

#[test]
fn validate_rejects_a_config_without_a_plan_name() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("railgun.toml");
    std::fs::write(
        &config,
        r#"
        [testrail]
        url = "https://example.testrail.net"
        project = "P"
        milestone = "M"
        suite = "S"
        "#,
    )
    .unwrap();

    railgun()
        .arg("-c")
        .arg(&config)
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("railgun.build_id"));
}

#[test]
fn report_requires_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("railgun.toml");

    railgun().arg("-c").arg(&config).arg("init").assert().success();

    railgun()
        .arg("-c")
        .arg(&config)
        .arg("report")
        .arg("does-not-matter.xml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("TESTRAIL_USER"));
}
