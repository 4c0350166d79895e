use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const MANIFEST: &str = "apiVersion: v1
kind: Task
metadata:
  name: plan
spec:
  containerImage: alpine:3.19
  workdir: app
  mountDir: .
  commandsSpec:
    - binary: terraform
      commands: [\"init\", \"plan\"]
";

fn workspace() -> TempDir {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join("app")).unwrap();
    std::fs::write(temp.path().join("app").join("main.tf"), "").unwrap();
    std::fs::write(temp.path().join("task.yml"), MANIFEST).unwrap();
    temp
}

fn stiletto(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("stiletto").unwrap();
    cmd.current_dir(dir.path()).env_remove("STILETTO_LOG_LEVEL").env_remove("STILETTO_LOG_FORMAT");
    cmd
}

#[test]
fn help_prints() {
    Command::cargo_bin("stiletto").unwrap().arg("--help").assert().success();
}

#[test]
fn job_dagger_help() {
    Command::cargo_bin("stiletto")
        .unwrap()
        .args(["job", "dagger", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--task-files"));
}

#[test]
fn manifest_validate_ok() {
    let dir = workspace();
    stiletto(&dir)
        .args(["manifest", "validate", "task.yml", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"plan\""));
}

#[test]
fn manifest_validate_missing_file_fails() {
    let dir = workspace();
    stiletto(&dir)
        .args(["manifest", "validate", "missing.yml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("missing.yml"));
}

#[test]
fn manifest_validate_rejects_absolute_workdir() {
    let dir = workspace();
    std::fs::write(dir.path().join("bad.yml"), MANIFEST.replace("workdir: app", "workdir: /app")).unwrap();
    stiletto(&dir).args(["manifest", "validate", "bad.yml"]).assert().failure();
}

#[test]
fn job_dagger_dry_run_reports_commands() {
    let dir = workspace();
    stiletto(&dir)
        .args(["job", "dagger", "--task-files", "task.yml", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Job job-task-plan"))
        .stdout(predicate::str::contains("[exit 0] terraform plan"))
        .stdout(predicate::str::contains("2 command(s) executed"));
}

#[test]
fn job_dagger_dry_run_json() {
    let dir = workspace();
    let output = stiletto(&dir)
        .args(["--json", "job", "dagger", "--task-files", "task.yml", "--dry-run"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["commands_executed"], 2);
    assert_eq!(report["jobs"][0]["tasks"][0]["workdir"], "/mnt/app");
}

#[test]
fn job_dagger_missing_task_file_fails() {
    let dir = workspace();
    stiletto(&dir)
        .args(["job", "dagger", "--task-files", "nope.yml", "--dry-run"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("nope.yml"));
}

#[test]
fn job_dagger_requires_task_files() {
    let dir = workspace();
    stiletto(&dir).args(["job", "dagger"]).assert().failure();
}
