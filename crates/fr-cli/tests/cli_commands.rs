//! Integration tests for the fr-cli binary.
#![allow(deprecated)] // Command::cargo_bin – macro replacement not yet stable

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SCENARIO: &str = r#"{
    "type": "world_init",
    "world": {
        "map": {
            "rooms": [{"id": "Room1", "pos": [0, 0, 0]}, {"id": "Room2", "pos": [12, 0, 0]}],
            "obstacles": [{"id": "Obstacle1", "room": "Room1", "aabb": [[-1, 0, 6], [1, 1, 7]]}]
        },
        "entities": {
            "fires": [{"id": "Fire1", "room": "Room1"}],
            "first_aid_kits": [{"id": "Kit1", "room": "Room1"}],
            "survivors": [{"id": "Survivor1", "room": "Room2"}]
        },
        "robots": [{"id": "robot1", "room": "Room1"}, {"id": "robot2", "room": "Room2"}]
    },
    "candidates": [
        {"robot": "robot1", "action": "pick_extinguisher", "target": ""},
        {"robot": "robot2", "action": "rescue_fov", "target": ""}
    ],
    "dynamic": {"enabled": false}
}"#;

/// A temp directory holding `scenario.json`.
fn test_scenario() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("scenario.json");
    fs::write(&path, SCENARIO).unwrap();
    (dir, path)
}

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn fr() -> Command {
    Command::cargo_bin("fire-rescue").unwrap()
}

fn run_json(args: &[&str]) -> serde_json::Value {
    let output = fr().args(args).output().unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn check_accepts_valid_scenario() {
    let (_dir, path) = test_scenario();
    fr().args(["check", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("All checks passed")
                .and(predicate::str::contains("2 robots"))
                .and(predicate::str::contains("2 candidate actions")),
        );
}

#[test]
fn check_rejects_invalid_json() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "broken.json", "{ not json");
    fr().args(["check", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:").and(predicate::str::contains("invalid scenario")));
}

#[test]
fn check_rejects_unknown_room() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "bad_room.json",
        r#"{"map": {"rooms": [{"id": "Room1", "pos": [0, 0, 0]}]},
            "entities": {"fires": [{"id": "Fire1", "room": "Room9"}]}}"#,
    );
    fr().args(["check", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Room9"));
}

#[test]
fn check_rejects_missing_file() {
    fr().args(["check", "/no/such/scenario.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read scenario"));
}

// ---------------------------------------------------------------------------
// list / show / candidates
// ---------------------------------------------------------------------------

#[test]
fn list_shows_all_entities() {
    let (_dir, path) = test_scenario();
    fr().args(["list", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Fire1")
                .and(predicate::str::contains("Obstacle1"))
                .and(predicate::str::contains("SafeZone"))
                .and(predicate::str::contains("robot2")),
        );
}

#[test]
fn list_filters_by_kind() {
    let (_dir, path) = test_scenario();
    fr().args(["list", path.to_str().unwrap(), "survivor"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Survivor1").and(predicate::str::contains("Fire1").not()));
}

#[test]
fn list_rejects_unknown_kind() {
    let (_dir, path) = test_scenario();
    fr().args(["list", path.to_str().unwrap(), "dragon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown entity kind"));
}

#[test]
fn show_robot_details() {
    let (_dir, path) = test_scenario();
    fr().args(["show", path.to_str().unwrap(), "robot1"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("robot1")
                .and(predicate::str::contains("fov:"))
                .and(predicate::str::contains("Room1")),
        );
}

#[test]
fn show_unknown_entity_fails() {
    let (_dir, path) = test_scenario();
    fr().args(["show", path.to_str().unwrap(), "Nobody"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("entity not found"));
}

#[test]
fn candidates_are_listed() {
    let (_dir, path) = test_scenario();
    fr().args(["candidates", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("pick_extinguisher")
                .and(predicate::str::contains("rescue_fov"))
                .and(predicate::str::contains("2 candidate actions")),
        );
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

#[test]
fn run_reports_ticks_and_robots() {
    let (_dir, path) = test_scenario();
    fr().args(["run", path.to_str().unwrap(), "--ticks", "5"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("5 ticks")
                .and(predicate::str::contains("Robots"))
                .and(predicate::str::contains("fires burning")),
        );
}

#[test]
fn run_executes_script() {
    let (dir, path) = test_scenario();
    let script = write(
        &dir,
        "cmds.txt",
        "# equip then sweep\nrobot1 pick_extinguisher\ntick 1\nrobot1 extinguish_all_fov\nrobot1 dance\n",
    );
    fr().args([
        "run",
        path.to_str().unwrap(),
        "--commands",
        script.to_str().unwrap(),
        "--ticks",
        "1",
    ])
    .assert()
    .success()
    .stdout(
        predicate::str::contains("extinguisher equipped")
            .and(predicate::str::contains("extinguished"))
            .and(predicate::str::contains("rejected: unknown action")),
    );
}

#[test]
fn run_rejects_malformed_script() {
    let (dir, path) = test_scenario();
    let script = write(&dir, "cmds.txt", "robot1 drop\ntick lots\n");
    fr().args(["run", path.to_str().unwrap(), "-c", script.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 2"));
}

#[test]
fn run_select_unknown_robot_fails() {
    let (dir, path) = test_scenario();
    let script = write(&dir, "cmds.txt", "select robot7\n");
    fr().args(["run", path.to_str().unwrap(), "-c", script.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("robot7"));
}

#[test]
fn run_json_frame() {
    let (_dir, path) = test_scenario();
    let report = run_json(&[
        "run",
        path.to_str().unwrap(),
        "--ticks",
        "3",
        "--candidates",
        "--json",
    ]);
    assert_eq!(report["frame"]["tick"], 3);
    assert_eq!(report["frame"]["robots"].as_array().unwrap().len(), 2);
    assert_eq!(report["commands"].as_array().unwrap().len(), 2);
    assert_eq!(report["frame"]["robots"][0]["equipped"], true);
    assert!(!report["events"].as_array().unwrap().is_empty());
}

#[test]
fn run_is_deterministic_for_a_seed() {
    let (dir, path) = test_scenario();
    let script = write(&dir, "cmds.txt", "dynamics on on 1\nrobot1 move_forward\ntick 4\n");
    let args = [
        "run",
        path.to_str().unwrap(),
        "-c",
        script.to_str().unwrap(),
        "--step",
        "--seed",
        "7",
        "--json",
    ];
    let first = run_json(&args);
    let second = run_json(&args);
    assert_eq!(first, second);
}

#[test]
fn run_without_dynamics_spawns_nothing() {
    let (dir, path) = test_scenario();
    let script = write(&dir, "cmds.txt", "dynamics on off 1\n");
    let report = run_json(&[
        "run",
        path.to_str().unwrap(),
        "-c",
        script.to_str().unwrap(),
        "--ticks",
        "4",
        "--json",
    ]);
    let fires = report["frame"]["entities"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|e| e["kind"] == "fire")
        .count();
    assert_eq!(fires, 5);

    let quiet = run_json(&["run", path.to_str().unwrap(), "--no-dynamics", "--ticks", "4", "--json"]);
    let fires = quiet["frame"]["entities"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|e| e["kind"] == "fire")
        .count();
    assert_eq!(fires, 1);
}

#[test]
fn run_rejects_non_positive_tick_length() {
    let (_dir, path) = test_scenario();
    fr().args(["run", path.to_str().unwrap(), "--seconds-per-tick", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("seconds per tick"));
}

#[test]
fn run_rejects_non_finite_tick_length() {
    let (_dir, path) = test_scenario();
    for bad in ["inf", "NaN"] {
        fr().args(["run", path.to_str().unwrap(), "--ticks", "1", "--seconds-per-tick", bad])
            .timeout(std::time::Duration::from_secs(10))
            .assert()
            .failure()
            .stderr(predicate::str::contains("positive and finite"));
    }
}
