use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

fn app() -> Command {
    let mut cmd = Command::cargo_bin("sced-app").expect("binary builds");
    cmd.env_remove("SCED_CONFIG").current_dir(std::env::temp_dir());
    cmd
}

fn script(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp file");
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn demo_runs_by_default() {
    app()
        .assert()
        .success()
        .stdout(predicate::str::contains("Rust 版场景编辑器 CLI 演示"))
        .stdout(predicate::str::contains("cube_copy"));
}

#[test]
fn script_output_can_be_json() {
    let file = script("action light.add spot\naction gizmo.scale\n");
    let output = app()
        .arg("--script")
        .arg(file.path())
        .arg("--json")
        .output()
        .expect("run app");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("stdout is json");
    assert_eq!(value["objects"][0]["name"], "spot_light");
    assert_eq!(value["transform_mode"], "scale");
}

#[test]
fn config_file_sets_default_mode_and_output() {
    let config = script(
        "[editor]\ndefault_transform_mode = \"combined\"\n\n[frontend]\noutput = \"json\"\n",
    );
    let file = script("action light.add\n");
    let output = app()
        .arg("--config")
        .arg(config.path())
        .arg("--script")
        .arg(file.path())
        .output()
        .expect("run app");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("stdout is json");
    assert_eq!(value["transform_mode"], "combined");
}

#[test]
fn parse_errors_fail_the_run() {
    let file = script("down 1\n");
    app()
        .arg("--script")
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("脚本第 1 行无法解析"));
}

#[test]
fn bad_arguments_are_rejected() {
    app()
        .arg("--frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("未知参数：--frobnicate"));
    app()
        .arg("--script")
        .assert()
        .failure()
        .stderr(predicate::str::contains("`--script` 需要提供脚本路径"));
}
