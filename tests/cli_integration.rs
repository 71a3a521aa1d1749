//! CLI integration tests for openchamp.
//!
//! These tests drive the binary without docker, cmake or Godot: compile is
//! exercised through `--plan`, and everything else through its argument
//! handling and early failures.

use std::fs;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

/// Get the openchamp binary command.
fn openchamp() -> Command {
    Command::cargo_bin("openchamp").unwrap()
}

/// Create an empty Godot project.
fn project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("project.godot"), "config_version=5\n").unwrap();
    tmp
}

/// An architecture from the table that is not the host's.
fn foreign_arch() -> &'static str {
    if std::env::consts::ARCH == "aarch64" {
        "x86_64"
    } else {
        "aarch64"
    }
}

fn plan(tmp: &TempDir, extra: &[&str]) -> Value {
    let output = openchamp()
        .arg("-C")
        .arg(tmp.path())
        .args(["compile", "--plan"])
        .args(extra)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

fn phase_command(plan: &Value, index: usize) -> Vec<String> {
    plan["phases"][index]["command"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

// ============================================================================
// openchamp compile
// ============================================================================

#[test]
fn test_native_plan() {
    let tmp = project();
    let plan = plan(&tmp, &["--target_arch", "native", "--set_linker", "LLD"]);

    assert_eq!(plan["plan"]["invocation_prefix"], serde_json::json!(["cmake"]));
    assert_eq!(plan["plan"]["environment_overlay"]["CMAKE_LINKER_TYPE"], "LLD");
    assert_eq!(plan["phases"].as_array().unwrap().len(), 3);

    let setup = phase_command(&plan, 0);
    assert!(setup.contains(&"-DCMAKE_BUILD_TYPE=Debug".to_string()));
    assert!(setup.contains(&"-GNinja".to_string()));
    assert_eq!(setup.last().map(String::as_str), Some("extensions"));

    // Nothing is created when only planning
    assert!(!tmp.path().join("extensions").exists());
}

#[test]
fn test_cross_plan() {
    let tmp = project();
    let arch = foreign_arch();
    let plan = plan(&tmp, &["--target_arch", arch, "--mode", "release", "-j", "4"]);

    let prefix = plan["plan"]["invocation_prefix"].as_array().unwrap();
    assert_eq!(prefix.len(), 2);
    assert!(prefix[0]
        .as_str()
        .unwrap()
        .ends_with(&format!("cross_compile_stuff/{}.sh", arch)));
    assert_eq!(prefix[1], "cmake");

    let build_dir = plan["plan"]["build_directory"].as_str().unwrap();
    assert!(build_dir.ends_with(&format!("build_{}_release", arch)));

    let build = phase_command(&plan, 1);
    assert_eq!(build.iter().filter(|a| *a == "--parallel").count(), 1);
    assert_eq!(build.last().map(String::as_str), Some("4"));
}

#[test]
fn test_host_alias_plans_native_build() {
    let alias = match std::env::consts::ARCH {
        "aarch64" => "arm64",
        "x86_64" => "amd64",
        _ => return,
    };
    let tmp = project();
    let plan = plan(&tmp, &["--target_arch", alias]);

    assert_eq!(plan["plan"]["invocation_prefix"], serde_json::json!(["cmake"]));
    assert_eq!(plan["plan"]["target_arch"], std::env::consts::ARCH);
}

#[test]
fn test_plan_without_jobs_or_setup() {
    let tmp = project();
    let plan = plan(&tmp, &["--threads", "0", "--skip_setup"]);

    let phases = plan["phases"].as_array().unwrap();
    assert_eq!(phases.len(), 2);
    assert_eq!(phases[0]["phase"], "build");
    assert!(!phase_command(&plan, 0).contains(&"--parallel".to_string()));
}

#[test]
fn test_unsupported_arch_fails() {
    let tmp = project();

    openchamp()
        .arg("-C")
        .arg(tmp.path())
        .args(["compile", "--target_arch", "mips"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unsupported target architecture `mips`"));

    assert!(!tmp.path().join("extensions").exists());
}

#[test]
fn test_invalid_mode_rejected() {
    let tmp = project();

    openchamp()
        .arg("-C")
        .arg(tmp.path())
        .args(["compile", "--mode", "fast"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_missing_project_dir_fails() {
    let tmp = TempDir::new().unwrap();

    openchamp()
        .arg("-C")
        .arg(tmp.path().join("nope"))
        .args(["compile", "--plan"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("project directory does not exist"));
}

// ============================================================================
// openchamp export / format
// ============================================================================

#[test]
fn test_export_requires_godot_path() {
    let tmp = project();

    openchamp()
        .arg("-C")
        .arg(tmp.path())
        .args(["export", "--export_platform", "linux_amd64"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no Godot executable"));
}

#[test]
fn test_export_rejects_unknown_platform() {
    let tmp = project();

    openchamp()
        .arg("-C")
        .arg(tmp.path())
        .args(["export", "--export_platform", "amiga"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_format_requires_mode() {
    openchamp()
        .arg("format")
        .assert()
        .failure()
        .stderr(predicate::str::contains("<MODE>"));
}

// ============================================================================
// openchamp completions
// ============================================================================

#[test]
fn test_completions_bash() {
    openchamp()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("openchamp"));
}

#[test]
fn test_help_lists_commands() {
    openchamp()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("compile")
                .and(predicate::str::contains("export"))
                .and(predicate::str::contains("aseprite")),
        );
}
