use assert_cmd::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn repo_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("expected crates/<name> layout")
        .to_path_buf()
}

fn fixture() -> PathBuf {
    let path = repo_root().join("fixtures").join("nad").join("basic.json");
    assert!(path.exists(), "fixture missing: {}", path.display());
    path
}

#[test]
fn cli_route_prints_geometry_json() {
    let exe = assert_cmd::cargo_bin!("nadraw");
    let out = Command::new(exe)
        .args(["route", fixture().to_string_lossy().as_ref()])
        .output()
        .expect("run nadraw");
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let json: Value = serde_json::from_slice(&out.stdout).expect("stdout is JSON");
    assert!(json["edges"]["20"]["half1"]["points"].is_array());
    assert_eq!(json["buses"]["10"]["kind"], "circle");
    assert_eq!(json["buses"]["11"]["kind"], "annulus");
    assert!(json["angles"].as_array().is_some_and(|a| !a.is_empty()));
    // The unknown-kind and dangling-reference edges are reported, not drawn.
    assert!(json["edges"].get("33").is_none());
    assert!(json["edges"].get("34").is_none());
    assert_eq!(json["diagnostics"].as_array().map(Vec::len), Some(2));
}

#[test]
fn cli_drag_rounds_and_reports_original_position() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let input = tmp.path().join("basic.json");
    fs::copy(fixture(), &input).expect("copy fixture");

    let exe = assert_cmd::cargo_bin!("nadraw");
    let out = Command::new(exe)
        .args([
            "drag",
            "--node",
            "2",
            "--to",
            "-395.1338734,-352.76892014",
            input.to_string_lossy().as_ref(),
        ])
        .output()
        .expect("run nadraw");
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let json: Value = serde_json::from_slice(&out.stdout).expect("stdout is JSON");
    assert_eq!(json["event"]["event"], "nodeMoved");
    assert_eq!(json["event"]["x"], -395.13);
    assert_eq!(json["event"]["y"], -352.77);
    assert_eq!(json["event"]["xOrig"], -452.59);
    assert_eq!(json["event"]["yOrig"], -274.01);
    assert_eq!(json["metadata"]["nodes"][2]["x"], -395.13);
    assert!(
        json["edges"]
            .as_array()
            .is_some_and(|ids| ids.iter().any(|id| id == "23"))
    );
}

#[test]
fn cli_reads_stdin_and_rejects_bad_usage() {
    let exe = assert_cmd::cargo_bin!("nadraw");
    Command::new(exe)
        .args(["drag", "--node", "0"])
        .assert()
        .code(2);

    let exe = assert_cmd::cargo_bin!("nadraw");
    assert_cmd::Command::new(exe)
        .args(["route", "-"])
        .write_stdin(fs::read_to_string(fixture()).expect("read fixture"))
        .assert()
        .success();
}
