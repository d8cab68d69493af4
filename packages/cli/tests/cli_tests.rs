/// End-to-end tests for the viewcompose binary
///
/// Each test builds a small project in a temporary directory and runs the
/// binary inside it.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn viewcompose(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("viewcompose").expect("binary not built");
    cmd.current_dir(dir).env("RUST_LOG", "warn");
    cmd
}

fn project(extension_body: &str) -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let base = dir.path().join("base");
    let sale = dir.path().join("sale");
    fs::create_dir_all(&base).unwrap();
    fs::create_dir_all(&sale).unwrap();

    fs::write(
        base.join("User.xml"),
        r#"<object-views><form name="user-form" id="base-user-form"><panel name="main"/></form></object-views>"#,
    )
    .unwrap();
    fs::write(
        sale.join("User.xml"),
        format!(
            r#"<object-views><form name="user-form" id="sale-user-form" extension="true">{}</form></object-views>"#,
            extension_body
        ),
    )
    .unwrap();
    fs::write(
        dir.path().join("viewcompose.config.json"),
        r#"{
            "modules": [
                { "name": "base", "dir": "base" },
                { "name": "sale", "dir": "sale" }
            ],
            "features": ["beta"],
            "workers": 2
        }"#,
    )
    .unwrap();
    dir
}

#[test]
fn test_init_then_compose() {
    let dir = tempfile::tempdir().unwrap();

    viewcompose(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Project initialized"));
    assert!(dir.path().join("viewcompose.config.json").exists());
    assert!(dir.path().join("modules/sale/views/User.xml").exists());

    viewcompose(dir.path()).arg("compose").assert().success();

    let xml = fs::read_to_string(dir.path().join("dist/user-form.form.xml")).unwrap();
    assert!(xml.contains(r#"<field name="salesTeam"/>"#));
    assert!(xml.contains(r#"<button name="showOrders" title="Orders"/>"#));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("dist/user-form.form.json")).unwrap()).unwrap();
    assert_eq!(json["xmlId"], "base-user-form__computed__");
    assert_eq!(json["computed"], true);
    assert_eq!(json["priority"], 21);
    assert_eq!(json["module"], "sale");
}

#[test]
fn test_init_keeps_existing_config() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("viewcompose.config.json"), "{}").unwrap();

    viewcompose(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
    assert_eq!(
        fs::read_to_string(dir.path().join("viewcompose.config.json")).unwrap(),
        "{}"
    );
}

#[test]
fn test_compose_to_stdout() {
    let dir = project(
        r#"<extend target="panel[@name='main']" if-feature="beta"><insert position="inside"><field name="age"/></insert></extend>"#,
    );

    viewcompose(dir.path())
        .args(["compose", "--stdout"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"<field name="age"/>"#));
    assert!(!dir.path().join("dist").exists());
}

#[test]
fn test_compose_out_dir_override() {
    let dir = project(r#"<extend target="panel"><attribute name="title" value="Main"/></extend>"#);

    viewcompose(dir.path())
        .args(["compose", "--out-dir", "build"])
        .assert()
        .success();

    let xml = fs::read_to_string(dir.path().join("build/user-form.form.xml")).unwrap();
    assert!(xml.contains(r#"<panel name="main" title="Main"/>"#));
}

#[test]
fn test_skipped_blocks_are_reported() {
    let dir = project(r#"<extend target="panel[@name='missing']"><replace/></extend>"#);

    viewcompose(dir.path())
        .arg("compose")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 skipped"));
}

#[test]
fn test_malformed_path_fails() {
    let dir = project(r#"<extend target="panel[@name="><replace/></extend>"#);

    viewcompose(dir.path())
        .arg("compose")
        .assert()
        .failure()
        .stderr(predicate::str::contains("user-form(form)"));
}

#[test]
fn test_unknown_view() {
    let dir = project("");

    viewcompose(dir.path())
        .args(["compose", "--view", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown view: ghost"));
}

#[test]
fn test_compose_without_config() {
    let dir = tempfile::tempdir().unwrap();

    viewcompose(dir.path())
        .arg("compose")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No modules configured"));
}
