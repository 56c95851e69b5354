//! Integration tests for the barrage scenario runner.
//!
//! Spawns the binary, feeds a scenario on stdin and checks the JSON report
//! it writes to stdout.

use std::io::Write;
use std::process::{Command, Output, Stdio};

use serde_json::Value;

/// Runs the binary with `args`, writing `input` to its stdin.
fn run_barrage(args: &[&str], input: &str) -> Output {
    let exe = env!("CARGO_BIN_EXE_barrage");
    let mut child = Command::new(exe)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to start barrage");

    let mut stdin = child.stdin.take().unwrap();
    // The runner may exit before reading, e.g. on a bad argument.
    let _ = stdin.write_all(input.as_bytes());
    drop(stdin);

    child.wait_with_output().expect("failed to wait on child")
}

fn report(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "barrage failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("report is not JSON")
}

/// Two British fighters flying over a German AA gun in the Ruhr.
const FLYOVER: &str = r#"{
    "player": "British",
    "data": {
        "players": [
            {"id": "Germans", "alliance": "Axis"},
            {"id": "British", "alliance": "Allies"}
        ],
        "unit_types": [
            {"name": "aaGun", "aa": {"aa_type": "AA", "strength": 1, "targets": ["fighter"]}},
            {"name": "fighter"}
        ],
        "units": [
            {"id": 1, "unit_type": "fighter", "owner": "British", "movement_left": 2},
            {"id": 2, "unit_type": "fighter", "owner": "British", "movement_left": 1},
            {"id": 10, "unit_type": "aaGun", "owner": "Germans"}
        ],
        "territories": [
            {"name": "London", "owner": "British", "units": [1, 2]},
            {"name": "Ruhr", "owner": "Germans", "units": [10]},
            {"name": "Berlin", "owner": "Germans"}
        ]
    },
    "route": ["London", "Ruhr", "Berlin"],
    "units": [1, 2],
    "dice": [0, 5]
}"#;

#[test]
fn resolves_scenario_from_stdin() {
    let report = report(&run_barrage(&[], FLYOVER));

    assert_eq!(report["fired_in"], serde_json::json!(["Ruhr"]));
    assert_eq!(report["casualties"], serde_json::json!([2]));
    assert_eq!(report["cant_undo"], "Move cannot be undone after AA has fired.");
    assert_eq!(report["groups"][0]["aa_type"], "AA");
    assert_eq!(report["groups"][0]["dice"], serde_json::json!([0, 5]));
    assert_eq!(report["history"][0]["text"], "1 fighter lost in Ruhr");
}

#[test]
fn interactive_scenario_collects_messages() {
    let interactive = FLYOVER.replacen("\"dice\"", "\"interactive\": true, \"dice\"", 1);
    let report = report(&run_barrage(&[], &interactive));

    let british = report["messages"]["British"].as_array().unwrap();
    assert!(british.iter().any(|m| m == "own: British remove AA casualties"));
}

#[test]
fn seed_flag_is_accepted() {
    let seeded = FLYOVER.replacen("\"dice\": [0, 5]", "\"seed\": 1", 1);
    let a = report(&run_barrage(&["--seed", "42"], &seeded));
    let b = report(&run_barrage(&["--seed", "42"], &seeded));
    assert_eq!(a["groups"], b["groups"]);
}

#[test]
fn help_exits_cleanly() {
    let output = run_barrage(&["--help"], "");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage: barrage"));
}

#[test]
fn bad_arguments_fail() {
    assert!(!run_barrage(&["--frobnicate"], "").status.success());
    assert!(!run_barrage(&["--seed", "many"], FLYOVER).status.success());
    assert!(!run_barrage(&[], "{not json").status.success());
}
