//! Staleness across consecutive builds.

use crate::common::{FileAssert, TestProject, modified};

const INCLUDE_PROJECT: &str = r#"
include_paths = ["include"]
transform = ["page.tt", "other.tt"]
"#;

fn include_project() -> TestProject {
    let project = TestProject::new().unwrap();
    project.write_file("include/header.ttinclude", "HEADER v1\n").unwrap();
    project.write_file("page.tt", "<#@ include file=\"header.ttinclude\" #>\nbody").unwrap();
    project.write_file("other.tt", "other").unwrap();
    project.write_config(INCLUDE_PROJECT).unwrap();
    project
}

#[test]
fn test_second_run_is_up_to_date() {
    let project = include_project();
    project.run_ttbuild(&["build"]).unwrap().assert_success();
    let first = modified(project.path("page.txt"));
    let state_before = modified(project.path(".ttbuild/state.toml"));

    project
        .run_ttbuild(&["build"])
        .unwrap()
        .assert_success()
        .assert_stdout_contains("0 template(s) processed, 2 up to date");

    assert_eq!(modified(project.path("page.txt")), first);
    assert_eq!(modified(project.path(".ttbuild/state.toml")), state_before);
    project.run_ttbuild(&["status"]).unwrap().assert_success().assert_stdout_contains("All templates are up to date");
}

#[test]
fn test_changed_include_rebuilds_only_dependents() {
    let project = include_project();
    project.run_ttbuild(&["build"]).unwrap().assert_success();
    FileAssert::equals(project.path("page.txt"), "HEADER v1\nbody");
    let other_before = modified(project.path("other.txt"));

    project.write_file("include/header.ttinclude", "HEADER v2\n").unwrap();
    project.touch_ahead("include/header.ttinclude", 60).unwrap();

    let status = project.run_ttbuild(&["status"]).unwrap();
    status.assert_success().assert_stdout_contains("page.tt");
    assert!(!status.stdout.contains("other.tt"), "{}", status.stdout);

    project.run_ttbuild(&["build"]).unwrap().assert_success().assert_stdout_contains("1 template(s) processed, 1 up to date");

    FileAssert::equals(project.path("page.txt"), "HEADER v2\nbody");
    assert_eq!(modified(project.path("other.txt")), other_before);
}

#[test]
fn test_changed_settings_rebuild_everything() {
    let project = include_project();
    project.run_ttbuild(&["build"]).unwrap().assert_success();

    project
        .write_config(&format!("{INCLUDE_PROJECT}\n[[parameters]]\nname = \"Unused\"\nvalue = \"1\"\n"))
        .unwrap();

    project.run_ttbuild(&["build"]).unwrap().assert_success().assert_stdout_contains("2 template(s) processed, 0 up to date");
}

#[test]
fn test_command_line_parameter_change_rebuilds() {
    let project = TestProject::new().unwrap();
    project.write_file("count.tt", "<#@ parameter name=\"Count\" type=\"int\" #>\n{{ Count }}").unwrap();
    project.write_config("transform = [\"count.tt\"]\n").unwrap();

    project.run_ttbuild(&["build", "-p", "Count=1"]).unwrap().assert_success();
    FileAssert::equals(project.path("count.txt"), "1");

    project.run_ttbuild(&["build", "-p", "Count=2"]).unwrap().assert_success();
    FileAssert::equals(project.path("count.txt"), "2");
}

#[test]
fn test_force_ignores_saved_state() {
    let project = include_project();
    project.run_ttbuild(&["build"]).unwrap().assert_success();

    project
        .run_ttbuild(&["build", "--force"])
        .unwrap()
        .assert_success()
        .assert_stdout_contains("2 template(s) processed");
}

#[test]
fn test_failed_item_is_retried() {
    let project = TestProject::new().unwrap();
    project.write_config("transform = [\"late.tt\"]\n").unwrap();
    project.run_ttbuild(&["build"]).unwrap().assert_failure();

    project.write_file("late.tt", "arrived").unwrap();
    project.run_ttbuild(&["build"]).unwrap().assert_success();
    FileAssert::equals(project.path("late.txt"), "arrived");
}

#[test]
fn test_deleted_output_is_regenerated() {
    let project = include_project();
    project.run_ttbuild(&["build"]).unwrap().assert_success();

    std::fs::remove_file(project.path("other.txt")).unwrap();
    project.run_ttbuild(&["build"]).unwrap().assert_success().assert_stdout_contains("1 template(s) processed, 1 up to date");
    FileAssert::equals(project.path("other.txt"), "other");
}

#[test]
fn test_status_with_same_parameters_is_up_to_date() {
    let project = TestProject::new().unwrap();
    project.write_file("count.tt", "<#@ parameter name=\"Count\" type=\"int\" #>\n{{ Count }}").unwrap();
    project.write_config("transform = [\"count.tt\"]\n").unwrap();
    project.run_ttbuild(&["build", "-p", "Count=1"]).unwrap().assert_success();

    project
        .run_ttbuild(&["status", "-p", "Count=1"])
        .unwrap()
        .assert_success()
        .assert_stdout_contains("All templates are up to date");
    project.run_ttbuild(&["status", "-p", "Count=2"]).unwrap().assert_success().assert_stdout_contains("count.tt");
}

#[test]
fn test_glob_and_literal_entry_name_one_template() {
    let project = TestProject::new().unwrap();
    project.write_file("a.tt", "a").unwrap();
    project.write_config("transform = [\"*.tt\", \"a.tt\"]\n").unwrap();

    project.run_ttbuild(&["build"]).unwrap().assert_success().assert_stdout_contains("1 template(s) processed, 0 up to date");
    project.run_ttbuild(&["build"]).unwrap().assert_success().assert_stdout_contains("0 template(s) processed, 1 up to date");

    let state = project.read(".ttbuild/state.toml");
    assert_eq!(state.matches("a.tt").count(), 1, "{state}");
}
