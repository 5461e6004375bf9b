/*
Copyright 2024 San Francisco Compute Company

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! Command line behavior against the bundled fixture

use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;
use std::path::Path;
use std::process::{Command, Output};

fn run(args: &[&str]) -> Output {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    Command::new(env!("CARGO_BIN_EXE_hardware_inventory"))
        .arg("--fixture")
        .arg(root.join("fixtures/sample_workstation.json"))
        .arg("--dataset-dir")
        .arg(root.join("dataset"))
        .args(args)
        .env_remove("HARDWARE_INVENTORY_CONFIG")
        .output()
        .unwrap()
}

#[test]
fn test_summary_to_stdout() {
    let output = run(&["--summary"]);
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["chipset_model"], "Z790");
    assert_eq!(summary["memory_slots"], "2/4");
    assert_eq!(summary["dataset_enhanced"], true);
}

#[test]
fn test_snapshot_written_as_toml() {
    let dir = TempDir::new().unwrap();
    let target = dir.child("snapshot.toml");

    let output = run(&[
        "--format",
        "toml",
        "--include-sensitive",
        "-o",
        target.path().to_str().unwrap(),
    ]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("System Summary:"));
    assert!(stdout.contains("Snapshot written to"));

    target.assert(predicate::str::contains("[cpu]"));
    target.assert(predicate::str::contains("03D502E0-045E-0577-9A06-D80700080009"));
}

#[test]
fn test_failed_probe_logged_to_stderr() {
    let output = run(&["--summary"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("PhysicalMemoryArray"));
}

#[test]
fn test_invalid_config_file_fails() {
    let dir = TempDir::new().unwrap();
    let config = dir.child("bad.toml");
    config.write_str("unknown_key = 1").unwrap();

    let output = run(&["--config", config.path().to_str().unwrap()]);
    assert!(!output.status.success());
}
