//! Pure formatting functions for UI output.
//!
//! This module contains all display/formatting logic. `format_*` functions
//! return plain strings and are testable; `display_*` functions print them
//! with `console` styling.

use crate::boundary::BoundaryWarning;
use crate::controller::BumpOutcome;
use crate::domain::Version;
use crate::template::FileDiff;
use console::style;
use std::path::{Path, PathBuf};

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display a boundary warning to the user.
pub fn display_boundary_warning(warning: &BoundaryWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// Display a version change.
pub fn display_version_change(previous: &Version, next: &Version) {
    println!("\n{}", style("Version Change:").bold());
    println!("  From: {}", style(previous).red());
    println!("  To:   {}", style(next).green());
}

/// Unified-style lines for a file diff, without styling
///
/// Paths are shown relative to `root` when they live under it.
pub fn format_diff(diff: &FileDiff, root: &Path) -> Vec<String> {
    let path = diff.path.strip_prefix(root).unwrap_or(&diff.path);
    let mut lines = vec![format!("--- {}", path.display()), format!("+++ {}", path.display())];
    for (number, old, new) in diff.changed_lines() {
        lines.push(format!("@@ line {} @@", number));
        lines.push(format!("-{}", old));
        lines.push(format!("+{}", new));
    }
    lines
}

/// Display a file diff with removed lines red and added lines green.
pub fn display_diff(diff: &FileDiff, root: &Path) {
    for line in format_diff(diff, root) {
        if line.starts_with("---") || line.starts_with("+++") {
            println!("{}", style(line).bold());
        } else if line.starts_with('-') {
            println!("{}", style(line).red());
        } else if line.starts_with('+') {
            println!("{}", style(line).green());
        } else {
            println!("{}", style(line).cyan());
        }
    }
}

/// Summary lines for a finished bump
pub fn format_outcome(outcome: &BumpOutcome, dry_run: bool) -> Vec<String> {
    let prefix = if dry_run { "Would " } else { "" };
    let mut lines = Vec::new();

    let changed = outcome.diffs.iter().filter(|d| d.is_changed()).count();
    lines.push(format!(
        "{}{} {} file(s)",
        prefix,
        if dry_run { "update" } else { "Updated" },
        changed
    ));
    if let Some(commit) = &outcome.commit {
        match &commit.id {
            Some(id) => lines.push(format!("Committed {}: {}", &id[..id.len().min(7)], commit.message)),
            None => lines.push(format!("{}commit: {}", prefix, commit.message)),
        }
    }
    if let Some(tag) = &outcome.tag {
        match &tag.target {
            Some(_) => lines.push(format!("Tagged {}", tag.name)),
            None => lines.push(format!("{}tag: {}", prefix, tag.name)),
        }
    }
    if outcome.pushed {
        lines.push("Pushed to remote".to_string());
    }
    lines
}

/// Display the result of a bump.
pub fn display_outcome(outcome: &BumpOutcome, root: &Path, dry_run: bool) {
    display_version_change(&outcome.previous, &outcome.version);
    for diff in outcome.diffs.iter().filter(|d| d.is_changed()) {
        println!();
        display_diff(diff, root);
    }
    println!();
    for line in format_outcome(outcome, dry_run) {
        if dry_run {
            display_status(&line);
        } else {
            display_success(&line);
        }
    }
    for warning in &outcome.warnings {
        display_boundary_warning(warning);
    }
}

/// Display the managed files.
pub fn display_filepaths(paths: &[PathBuf], root: &Path) {
    println!("{}", style("Managed files:").bold());
    for path in paths {
        println!("  - {}", path.strip_prefix(root).unwrap_or(path).display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diff() -> FileDiff {
        FileDiff {
            path: PathBuf::from("/repo/pyproject.toml"),
            original: "name = \"x\"\nversion = \"1.0.0\"\n".to_string(),
            updated: "name = \"x\"\nversion = \"1.1.0\"\n".to_string(),
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_format_diff() {
        let lines = format_diff(&diff(), Path::new("/repo"));
        assert_eq!(
            lines,
            vec![
                "--- pyproject.toml",
                "+++ pyproject.toml",
                "@@ line 2 @@",
                "-version = \"1.0.0\"",
                "+version = \"1.1.0\"",
            ]
        );
    }

    #[test]
    fn test_format_outcome_dry_run() {
        let outcome = BumpOutcome {
            previous: Version::parse("1.0.0").unwrap(),
            version: Version::parse("1.1.0").unwrap(),
            diffs: vec![diff()],
            commit: None,
            tag: Some(crate::git::TagRef {
                name: "v1.1.0".to_string(),
                target: None,
            }),
            pushed: false,
            warnings: Vec::new(),
        };
        let lines = format_outcome(&outcome, true);
        assert_eq!(lines, vec!["Would update 1 file(s)", "Would tag: v1.1.0"]);
    }

    #[test]
    fn test_display_error() {
        // Visual verification test - output is printed to stderr
        display_error("test error");
    }

    #[test]
    fn test_display_success() {
        // Visual verification test - output is printed to stdout
        display_success("test success");
    }
}
