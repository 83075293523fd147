use std::path::Path;
use std::process::{Command, Output};

fn cli() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_my-package"));
    cmd.args(["--config", "tests/fixtures/does-not-exist.toml"]);
    cmd
}

fn run(args: &[&str]) -> Output {
    cli().args(args).output().unwrap()
}

fn path_arg(p: &Path) -> &str {
    p.to_str().unwrap()
}

#[test]
fn validate_changeset_fails_on_commented_out_fragment() {
    let out = run(&["validate-changeset", "--dir", "tests/fixtures/changelog/invalid"]);
    assert!(!out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("[FAIL] 20240310_090000_dev_wip.md"), "stdout: {stdout}");
}

#[test]
fn validate_changeset_passes_on_valid_dir() {
    let out = run(&["validate-changeset", "--dir", "tests/fixtures/changelog/valid"]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("Found 1 changelog fragment(s)"));
}

#[test]
fn validate_changeset_without_fragments_only_warns() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(&["validate-changeset", "--dir", path_arg(dir.path())]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("WARNING"));
}

#[test]
fn bump_fails_when_manifest_missing() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("Cargo.toml");
    let out = run(&["bump", "patch", "--manifest", path_arg(&manifest)]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Not found"));
}

#[test]
fn bump_rewrites_manifest_and_changelog() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("Cargo.toml");
    let changelog = dir.path().join("CHANGELOG.md");
    std::fs::write(&manifest, "[package]\nname = \"demo\"\nversion = \"0.4.2\"\n").unwrap();
    std::fs::write(&changelog, "# Changelog\n\n## 0.4.2 - 2024-01-01\n\n- old\n").unwrap();

    let out = run(&[
        "bump",
        "minor",
        "-d",
        "Add export command",
        "--manifest",
        path_arg(&manifest),
        "--changelog",
        path_arg(&changelog),
    ]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert!(String::from_utf8_lossy(&out.stdout).contains("0.4.2 -> 0.5.0"));

    let manifest = std::fs::read_to_string(&manifest).unwrap();
    assert!(manifest.contains("version = \"0.5.0\""));
    let log = std::fs::read_to_string(&changelog).unwrap();
    assert!(log.find("## 0.5.0").unwrap() < log.find("## 0.4.2").unwrap());
    assert!(log.contains("- Add export command"));
}

#[test]
fn bump_reports_overflowing_version_as_error() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("Cargo.toml");
    std::fs::write(&manifest, "version = \"18446744073709551615.0.0\"\n").unwrap();
    let out = run(&["bump", "major", "--manifest", path_arg(&manifest)]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Invalid version format"));
    assert!(!String::from_utf8_lossy(&out.stderr).contains("panicked"));
}

#[test]
fn new_fragment_writes_a_valid_fragment() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("changelog.d");
    let out = run(&[
        "new-fragment",
        "patch",
        "-d",
        "Fix crash on empty input",
        "--dir",
        path_arg(&target),
    ]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let files = my_package::changeset::fragment_files(&target).unwrap();
    assert_eq!(files.len(), 1);
    let content = std::fs::read_to_string(&files[0]).unwrap();
    assert_eq!(content, "### Fixed\n\n- Fix crash on empty input\n");

    let check = run(&["validate-changeset", "--dir", path_arg(&target)]);
    assert!(check.status.success());
}

#[test]
fn invalid_config_is_rejected_before_any_command_runs() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("my-package.toml");
    std::fs::write(&config, "[size_check]\nmax_lines = 0\n").unwrap();
    let out = Command::new(env!("CARGO_BIN_EXE_my-package"))
        .args(["--config", path_arg(&config)])
        .args(["validate-changeset", "--dir", "tests/fixtures/changelog/valid"])
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("max_lines must be at least 1"));
}
