//! Full builds from a fresh project.

use crate::common::{FileAssert, TestProject};

#[test]
fn test_transform_greeting() {
    let project = TestProject::new().unwrap();
    project
        .write_file("greeting.tt", "<#@ template language=\"Rust\" #>\nHello, World!")
        .unwrap();
    project.write_config("transform = [\"greeting.tt\"]\n").unwrap();

    project.run_ttbuild(&["build"]).unwrap().assert_success().assert_stdout_contains("1 template(s) processed");

    FileAssert::equals(project.path("greeting.txt"), "Hello, World!");
    FileAssert::contains(project.path(".ttbuild/state.toml"), "greeting.tt");
}

#[test]
fn test_output_extension_and_parameters() {
    let project = TestProject::new().unwrap();
    project
        .write_file(
            "templates/summary.tt",
            "<#@ output extension=\".md\" #>\n<#@ parameter name=\"Count\" type=\"int\" #>\n<#@ parameter name=\"Title\" #>\n# {{ Title }}\n{{ Count * 2 }}",
        )
        .unwrap();
    project
        .write_config(
            r#"
transform = ["templates/*.tt"]

[[parameters]]
name = "Count"
value = "21"

[[parameters]]
name = "Title"
value = "Summary"
"#,
        )
        .unwrap();

    project.run_ttbuild(&["build"]).unwrap().assert_success();

    FileAssert::equals(project.path("templates/summary.md"), "# Summary\n42");
    FileAssert::not_exists(project.path("templates/summary.txt"));
}

#[test]
fn test_preprocess_generates_rust_module() {
    let project = TestProject::new().unwrap();
    project
        .write_file(
            "templates/Report.tt",
            "<#@ parameter name=\"Rows\" type=\"int\" #>\n<#@ import namespace=\"std.fmt\" #>\nRows: {{ Rows }}",
        )
        .unwrap();
    project
        .write_config(
            r#"
default_namespace = "MyApp.Generated"

[[preprocess]]
input = "templates/Report.tt"
output = "src/generated/report.rs"
"#,
        )
        .unwrap();

    project.run_ttbuild(&["build"]).unwrap().assert_success();

    let code = project.read("src/generated/report.rs");
    assert!(code.contains("Generated by ttbuild from"), "{code}");
    assert!(code.contains("pub mod MyApp {"), "{code}");
    assert!(code.contains("pub mod Generated {"), "{code}");
    assert!(code.contains("pub struct Report {"), "{code}");
    assert!(code.contains("pub Rows: i32,"), "{code}");
    assert!(code.contains("use std::fmt;"), "{code}");
    assert!(code.contains("Rows: {{ Rows }}"), "{code}");
}

#[test]
fn test_failing_template_does_not_stop_the_batch() {
    let project = TestProject::new().unwrap();
    project.write_file("good.tt", "fine").unwrap();
    project.write_file("broken.tt", "line one\n{% if %}\n").unwrap();
    project.write_config("transform = [\"missing.tt\", \"broken.tt\", \"good.tt\"]\n").unwrap();

    let output = project.run_ttbuild(&["build"]).unwrap();
    output
        .assert_failure()
        .assert_stdout_contains("2 template(s) failed")
        .assert_stderr_contains("does not exist");

    FileAssert::equals(project.path("good.txt"), "fine");
    FileAssert::not_exists(project.path("broken.txt"));
}

#[test]
fn test_parameter_conversion_failure_is_reported() {
    let project = TestProject::new().unwrap();
    project
        .write_file("count.tt", "<#@ parameter name=\"Count\" type=\"int\" #>\n{{ Count }}")
        .unwrap();
    project.write_config("transform = [\"count.tt\"]\n").unwrap();

    project
        .run_ttbuild(&["build", "--param", "Count=abc"])
        .unwrap()
        .assert_failure()
        .assert_stderr_contains("Could not convert property 'Count'='abc' to parameter type 'int'");

    FileAssert::not_exists(project.path("count.txt"));
}

#[test]
fn test_write_failure_fails_item() {
    let project = TestProject::new().unwrap();
    project.write_file("blocked.tt", "text").unwrap();
    std::fs::create_dir_all(project.path("blocked.txt/inner")).unwrap();
    project.write_config("transform = [\"blocked.tt\"]\n").unwrap();

    project.run_ttbuild(&["build"]).unwrap().assert_failure();
}
