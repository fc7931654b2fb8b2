// tests/cli_test.rs
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn bin(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_git-version-bump"))
        .args(args)
        .current_dir(dir)
        .env_remove("GIT_VERSION_BUMP_LOG")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn git_project(version: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let repo = git2::Repository::init(dir.path()).unwrap();
    fs::write(
        dir.path().join(".versioning.toml"),
        format!("version = \"{}\"\n", version),
    )
    .unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new(".versioning.toml")).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let signature = git2::Signature::now("Test User", "test@example.com").unwrap();
    repo.commit(Some("HEAD"), &signature, &signature, "feat: initial", &tree, &[])
        .unwrap();
    dir
}

#[test]
fn test_help_lists_subcommands() {
    let dir = tempfile::tempdir().unwrap();
    let output = bin(dir.path(), &["--help"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("bump"));
    assert!(text.contains("info"));
    assert!(text.contains("changelog"));
}

#[test]
fn test_info_prints_version() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("versioning.toml"), "version = \"2.0.0b3\"\n").unwrap();

    let output = bin(dir.path(), &["info"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "2.0.0b3");

    let output = bin(dir.path(), &["view", "--release"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "2.0.0");
}

#[test]
fn test_explicit_config_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("release.toml");
    fs::write(&path, "version = \"0.3.1\"\n").unwrap();

    let output = bin(dir.path(), &["-c", path.to_str().unwrap(), "info"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "0.3.1");
}

#[test]
fn test_missing_config_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    let output = bin(dir.path(), &["info"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("ERROR"));
}

#[test]
fn test_bump_dry_run_changes_nothing() {
    let dir = git_project("1.2.3");
    let output = bin(
        dir.path(),
        &["bump", "--dry-run", "--commit", "--tag", "-m", "feat: add option"],
    );
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("1.3.0"));
    assert!(text.contains("Would tag: 1.3.0"));
    assert_eq!(
        fs::read_to_string(dir.path().join(".versioning.toml")).unwrap(),
        "version = \"1.2.3\"\n"
    );
}

#[test]
fn test_bump_uses_head_commit() {
    let dir = git_project("1.2.3");
    let output = bin(dir.path(), &["bump"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(
        fs::read_to_string(dir.path().join(".versioning.toml")).unwrap(),
        "version = \"1.3.0\"\n"
    );
}

#[test]
fn test_bump_unsupported_type_fails() {
    let dir = git_project("1.2.3");
    let output = bin(dir.path(), &["bump", "--dry-run", "-m", "wip: halfway"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Unsupported commit type"));
}

#[test]
fn test_bump_rejects_unknown_segment() {
    let dir = git_project("1.2.3");
    let output = bin(dir.path(), &["bump", "--release", "--segment", "huge"]);
    assert!(!output.status.success());
}

#[test]
fn test_changelog_dry_run_prints_block() {
    let dir = git_project("1.2.3");
    let output = bin(dir.path(), &["changelog", "--dry-run"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.starts_with("## 1.2.3 ("));
    assert!(text.contains("### Added"));
    assert!(text.contains("- initial"));
    assert!(stderr(&output).contains("Tag '1.2.3' not found"));
    assert!(!dir.path().join("CHANGELOG.md").exists());
}

#[test]
fn test_changelog_writes_file() {
    let dir = git_project("1.2.3");
    let output = bin(dir.path(), &["changelog"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let written = fs::read_to_string(dir.path().join("CHANGELOG.md")).unwrap();
    assert!(written.starts_with("# Changelog\n\n## 1.2.3 ("));
}
