//! CLI integration tests using assert_cmd.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const MOCK_CONFIG: &str = r#"
backend = "mock"
store = "sqlite"

[retry]
base_delay_ms = 10

[trainer]
person_count = 2
"#;

fn facename(dir: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("facename").unwrap();
    cmd.current_dir(dir)
        .env_remove("FACENAME_API_KEY")
        .env_remove("STABILITY_API_KEY")
        .env("RUST_LOG", "facename=warn");
    cmd
}

/// Initialised directory using the offline backend.
fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    facename(dir.path()).arg("init").assert().success();
    std::fs::write(dir.path().join("facename.toml"), MOCK_CONFIG).unwrap();
    dir
}

#[test]
fn help_lists_commands() {
    let dir = TempDir::new().unwrap();
    facename(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("query"))
        .stdout(predicate::str::contains("train"))
        .stdout(predicate::str::contains("stats"));
}

#[test]
fn init_writes_config_and_name_lists() {
    let dir = TempDir::new().unwrap();
    facename(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created facename.toml"))
        .stdout(predicate::str::contains("Created 13 name lists"));

    assert!(dir.path().join("facename.toml").exists());
    let family = std::fs::read_to_string(dir.path().join("assets/names/familyNames.txt")).unwrap();
    assert!(family.lines().any(|l| l == "佐藤"));
    assert!(dir.path().join("assets/names/70-female-Names.txt").exists());

    facename(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists, skipping."))
        .stdout(predicate::str::contains("Created 0 name lists"));
}

#[test]
fn upstream_backend_without_key_fails_at_startup() {
    let dir = TempDir::new().unwrap();
    facename(dir.path()).arg("init").assert().success();
    facename(dir.path())
        .arg("random")
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key"));
}

#[test]
fn invalid_age_is_rejected_by_parser() {
    let dir = workspace();
    facename(dir.path())
        .args(["generate", "--age", "25"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not one of"));
}

#[test]
fn generate_then_show() {
    let dir = workspace();
    let output = facename(dir.path())
        .args(["generate", "--count", "1", "--age", "30", "--gender", "female"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("female"));

    let id = stdout
        .split(|c: char| c.is_whitespace() || c == '|' || c == '│')
        .find(|token| token.starts_with("img_"))
        .expect("pair id in output")
        .to_string();

    let faces: Vec<_> = std::fs::read_dir(dir.path().join("assets/faces"))
        .unwrap()
        .collect();
    assert_eq!(faces.len(), 1);

    facename(dir.path())
        .args(["show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("age:       30"))
        .stdout(predicate::str::contains("ethnicity: japanese"));
}

#[test]
fn show_unknown_id_fails() {
    let dir = workspace();
    facename(dir.path())
        .args(["show", "img_missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no pair with id img_missing"));
}

#[test]
fn query_generates_and_wraps_in_envelope() {
    let dir = workspace();
    let output = facename(dir.path())
        .args(["query", "action=generate_pairs&count=2&gender=male"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let response: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(response["success"], true);
    let pairs = response["data"].as_array().unwrap();
    assert_eq!(pairs.len(), 2);
    assert!(pairs.iter().all(|p| p["gender"] == "male"));
}

#[test]
fn query_errors_are_user_messages() {
    let dir = workspace();
    facename(dir.path())
        .args(["query", "action=dance"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"success\": false"))
        .stdout(predicate::str::contains("The request was not valid"));

    facename(dir.path())
        .args(["query", "action=get_pair_by_id&id=img_nope"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("No face matches the given id."));
}

#[test]
fn batch_writes_html_report() {
    let dir = workspace();
    facename(dir.path())
        .args(["batch", "--count", "3", "--age", "50", "--html", "reports/batch.html"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Succeeded"))
        .stdout(predicate::str::contains("0.0%"));

    let html = std::fs::read_to_string(dir.path().join("reports/batch.html")).unwrap();
    assert!(html.contains("Batch generation"));
    assert!(html.contains("3 succeeded"));
}

#[test]
fn train_course_a_records_history() {
    let dir = workspace();
    facename(dir.path())
        .args(["train", "--course", "a", "--html", "reports/results.html"])
        .write_stdin("n\nn\nt\n1\n1\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Memorize 2 faces"))
        .stdout(predicate::str::contains("Question 2/2"))
        .stdout(predicate::str::contains("Accuracy:"));

    assert!(dir.path().join("assets/data/history.json").exists());
    let html = std::fs::read_to_string(dir.path().join("reports/results.html")).unwrap();
    assert!(html.contains("Course A"));

    facename(dir.path())
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Stored pairs: 2"))
        .stdout(predicate::str::contains("Test runs:    1"))
        .stdout(predicate::str::contains("Generations (last 2): 2 ok, 0 failed"));
}

#[test]
fn train_course_b_checks_typed_names() {
    let dir = workspace();
    facename(dir.path())
        .args(["train", "--course", "b", "--count", "1"])
        .write_stdin("n\nt\n\nnobody\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Type a name."))
        .stdout(predicate::str::contains("Incorrect (none)"))
        .stdout(predicate::str::contains("Accuracy: 0%"));
}

#[test]
fn quitting_during_memorization_records_nothing() {
    let dir = workspace();
    facename(dir.path())
        .args(["train", "--count", "1"])
        .write_stdin("q\n")
        .assert()
        .success();
    assert!(!dir.path().join("assets/data/history.json").exists());
}
