use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn abacus_run_quickstart() {
    let mut cmd = Command::cargo_bin("abacus").expect("binary exists");
    cmd.arg("run").arg("demos/quickstart.abc");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Hello from Abacus!"))
        .stdout(predicate::str::contains("hypotenuse(3, 4) = 5"))
        .stdout(predicate::str::contains("det = -2"))
        .stdout(predicate::str::contains("1 + ... + 10 = 55"))
        .stdout(predicate::str::contains("1/3 + 1/6 = 0.5"));
}

#[test]
fn abacus_eval_snippet() {
    let mut cmd = Command::cargo_bin("abacus").expect("binary exists");
    cmd.arg("eval").arg("print(2 + 2)");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("4"));
}

#[test]
fn abacus_run_script_from_disk() {
    let dir = tempdir().expect("create temp dir");
    let script_path = dir.path().join("sum.abc");
    fs::write(&script_path, "total = 0\nfor n in range(1, 4, 1) { total += n }\nprint(\"total $total\")\n")
        .expect("write script");

    let mut cmd = Command::cargo_bin("abacus").expect("binary exists");
    cmd.arg("run").arg(&script_path);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("total 6"));
}

#[test]
fn abacus_eval_reports_diagnostics() {
    let mut cmd = Command::cargo_bin("abacus").expect("binary exists");
    cmd.arg("eval").arg("1/0");
    cmd.assert().failure();
}

#[test]
fn abacus_run_missing_file_fails() {
    let mut cmd = Command::cargo_bin("abacus").expect("binary exists");
    cmd.arg("run").arg("demos/no-such-script.abc");
    cmd.assert().failure();
}
