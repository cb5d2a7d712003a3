//! Command-line surface.

use assert_cmd::Command;
use predicates::prelude::*;

use crate::common::{FileAssert, TestProject};

#[test]
fn test_missing_config_is_reported() {
    let project = TestProject::new().unwrap();

    project
        .run_ttbuild(&["build"])
        .unwrap()
        .assert_failure()
        .assert_stderr_contains("Build configuration not found")
        .assert_stderr_contains("--config");
}

#[test]
fn test_invalid_parameter_argument() {
    let project = TestProject::new().unwrap();
    project.write_config("transform = []\n").unwrap();

    project.run_ttbuild(&["build", "--param", "NoEquals"]).unwrap().assert_failure().assert_stderr_contains("NoEquals");
    FileAssert::not_exists(project.path(".ttbuild/state.toml"));
}

#[test]
fn test_config_flag_resolves_relative_to_config_dir() {
    let project = TestProject::new().unwrap();
    project.write_file("site/hello.tt", "hi").unwrap();
    project.write_file("site/build.toml", "transform = [\"hello.tt\"]\n").unwrap();

    project.run_ttbuild(&["--config", "site/build.toml", "build"]).unwrap().assert_success();

    FileAssert::equals(project.path("site/hello.txt"), "hi");
    FileAssert::exists(project.path("site/.ttbuild/state.toml"));
}

#[test]
fn test_preprocess_only_skips_transforms() {
    let project = TestProject::new().unwrap();
    project.write_file("plain.tt", "plain").unwrap();
    project.write_file("Gen.tt", "generated {{ 1 }}").unwrap();
    project
        .write_config(
            r#"
transform = ["plain.tt"]

[[preprocess]]
input = "Gen.tt"
output = "gen.rs"
namespace = "app"
"#,
        )
        .unwrap();

    project.run_ttbuild(&["build", "--preprocess-only"]).unwrap().assert_success();

    FileAssert::contains(project.path("gen.rs"), "pub struct Gen {");
    FileAssert::not_exists(project.path("plain.txt"));
}

#[test]
fn test_status_lists_stale_templates() {
    let project = TestProject::new().unwrap();
    project.write_file("a.tt", "a").unwrap();
    project.write_file("Gen.tt", "g").unwrap();
    project
        .write_config(
            r#"
transform = ["a.tt"]

[[preprocess]]
input = "Gen.tt"
output = "gen.rs"
class_name = "Generator"
"#,
        )
        .unwrap();

    project
        .run_ttbuild(&["status"])
        .unwrap()
        .assert_success()
        .assert_stdout_contains("a.tt")
        .assert_stdout_contains("(Generator)");
    FileAssert::not_exists(project.path("a.txt"));
}

#[test]
fn test_quiet_suppresses_summary() {
    let project = TestProject::new().unwrap();
    project.write_file("a.tt", "a").unwrap();
    project.write_config("transform = [\"a.tt\"]\n").unwrap();

    let output = project.run_ttbuild(&["-q", "build"]).unwrap();
    output.assert_success();
    assert!(output.stdout.is_empty(), "{}", output.stdout);
}

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("ttbuild")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("build").and(predicate::str::contains("status")));
}

#[test]
fn test_newer_state_version_is_rejected() {
    let project = TestProject::new().unwrap();
    project.write_config("transform = []\n").unwrap();
    project.write_file(".ttbuild/state.toml", "version = 99\n").unwrap();

    Command::cargo_bin("ttbuild")
        .unwrap()
        .arg("build")
        .current_dir(project.project_path())
        .env_remove("TTBUILD_CONFIG")
        .env("NO_COLOR", "1")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("newer than supported version 1"));
}
