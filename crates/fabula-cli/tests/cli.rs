#![allow(deprecated)] // Command::cargo_bin – macro replacement not yet stable

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Create a temp directory holding a small but complete story.
fn test_story() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("story.json");
    fs::write(
        &path,
        r#"{
    "title": "The Chapel",
    "start": "intro",
    "scene": "chapel",
    "selected": "kaela",
    "flags": { "gold": 12 },
    "characters": [
        { "id": "kaela", "name": "Kaela", "resources": { "health": 20 } }
    ],
    "inventory": ["lantern"],
    "templates": { "blessing": "May the light keep you." },
    "fragments": {
        "intro": {
            "text": "kaela: We reached the chapel. |$blessing|",
            "choices": [
                { "id": "enter", "name": "Enter the chapel", "params": { "goTo": "inside" } },
                { "id": "rest", "name": "Rest at the door", "params": "active: 'gold >= 100'" }
            ]
        },
        "inside": {
            "text": "{flag: {id: chapel.visited, value: 1}}Candles burn within."
        }
    }
}
"#,
    )
    .unwrap();
    (dir, path)
}

/// A story whose single fragment has an unmatched brace.
fn broken_story() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(
        &path,
        r#"{
    "fragments": {
        "intro": { "text": "An unfinished {flag: {id: oops" }
    }
}
"#,
    )
    .unwrap();
    (dir, path)
}

fn fabula() -> Command {
    Command::cargo_bin("fabula").unwrap()
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn check_passes_for_a_valid_story() {
    let (_dir, path) = test_story();
    fabula()
        .args(["check", "-s", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("All checks passed for 'The Chapel'")
                .and(predicate::str::contains("2 fragments")),
        );
}

#[test]
fn check_fails_on_errors() {
    let (_dir, path) = broken_story();
    fabula()
        .args(["check", "-s", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("1 error"));
}

#[test]
fn check_rejects_unknown_fragments() {
    let (_dir, path) = test_story();
    fabula()
        .args(["check", "finale", "-s", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown fragment"));
}

#[test]
fn check_fails_on_a_missing_story_file() {
    fabula()
        .args(["check", "-s", "no-such-story.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

#[test]
fn run_resolves_a_fragment() {
    let (_dir, path) = test_story();
    fabula()
        .args(["run", "intro", "-s", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Kaela:")
                .and(predicate::str::contains("We reached the chapel."))
                .and(predicate::str::contains("May the light keep you.")),
        );
}

#[test]
fn run_lists_extracted_actions() {
    let (_dir, path) = test_story();
    fabula()
        .args(["run", "inside", "-s", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Candles burn within.")
                .and(predicate::str::contains("Actions"))
                .and(predicate::str::contains("flag")),
        );
}

#[test]
fn run_rejects_unknown_fragments() {
    let (_dir, path) = test_story();
    fabula()
        .args(["run", "finale", "-s", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown fragment"));
}

// ---------------------------------------------------------------------------
// registry
// ---------------------------------------------------------------------------

#[test]
fn registry_lists_the_defaults() {
    fabula()
        .arg("registry")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("_hasItem")
                .and(predicate::str::contains("charName"))
                .and(predicate::str::contains("conditions")),
        );
}

#[test]
fn registry_includes_story_templates() {
    let (_dir, path) = test_story();
    fabula()
        .args(["registry", "-s", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("blessing").and(predicate::str::contains("1 template")));
}

// ---------------------------------------------------------------------------
// play
// ---------------------------------------------------------------------------

#[test]
fn play_follows_a_goto_choice_to_the_end() {
    let (_dir, path) = test_story();
    fabula()
        .args(["play", "-s", path.to_str().unwrap()])
        .write_stdin("1\n")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("We reached the chapel.")
                .and(predicate::str::contains("Enter the chapel"))
                .and(predicate::str::contains("Candles burn within."))
                .and(predicate::str::contains("The end.")),
        );
}

#[test]
fn play_quits_on_request() {
    let (_dir, path) = test_story();
    fabula()
        .args(["play", "-s", path.to_str().unwrap()])
        .write_stdin("quit\n")
        .assert()
        .success();
}
