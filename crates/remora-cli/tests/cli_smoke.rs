use assert_cmd::prelude::*;
use std::fs;
use std::process::Command;

#[test]
fn cli_parses_flowchart_to_json() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let input = tmp.path().join("basic.mmd");
    fs::write(&input, "flowchart LR\nA[Start] --> B[Finish]\n").expect("write fixture");
    let out = tmp.path().join("out.json");

    let exe = assert_cmd::cargo_bin!("remora-cli");
    Command::new(exe)
        .args([
            "parse",
            "--no-geometry",
            "--out",
            out.to_string_lossy().as_ref(),
            input.to_string_lossy().as_ref(),
        ])
        .assert()
        .success();

    let text = fs::read_to_string(&out).expect("read json");
    let doc: serde_json::Value = serde_json::from_str(&text).expect("valid json");
    assert_eq!(doc["dialect"], "flowchart");
    assert_eq!(doc["orientation"], "LR");
    assert_eq!(doc["nodes"][0]["id"], "A");
    assert_eq!(doc["nodes"][0]["label"], "Start");
    assert_eq!(doc["edges"][0]["arrow"], true);
}

#[test]
fn cli_detects_dialect_from_stdin() {
    let exe = assert_cmd::cargo_bin!("remora-cli");
    assert_cmd::Command::new(exe)
        .args(["detect", "-"])
        .write_stdin("sequenceDiagram\nA->>B: hi\n")
        .assert()
        .success()
        .stdout("sequenceDiagram\n");
}

#[test]
fn cli_forced_dialect_skips_detection() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let input = tmp.path().join("headerless.txt");
    fs::write(&input, "A --> B\n").expect("write fixture");
    let out = tmp.path().join("out.json");

    let exe = assert_cmd::cargo_bin!("remora-cli");
    Command::new(exe)
        .args([
            "parse",
            "--no-geometry",
            "--dialect",
            "flowchart",
            "--out",
            out.to_string_lossy().as_ref(),
            input.to_string_lossy().as_ref(),
        ])
        .assert()
        .success();

    let doc: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).expect("read json")).expect("valid json");
    assert_eq!(doc["nodes"].as_array().map(Vec::len), Some(2));
}

#[test]
fn cli_rejects_undetectable_input_with_code_3() {
    let exe = assert_cmd::cargo_bin!("remora-cli");
    assert_cmd::Command::new(exe)
        .args(["parse", "-"])
        .write_stdin("just some prose\n")
        .assert()
        .failure()
        .code(3);
}

#[test]
fn cli_rejects_unknown_flag_with_usage() {
    let exe = assert_cmd::cargo_bin!("remora-cli");
    Command::new(exe)
        .args(["parse", "--bogus"])
        .assert()
        .failure()
        .code(2);
}
