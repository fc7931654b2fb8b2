//! Version string substitution in project files

use crate::boundary::BoundaryWarning;
use crate::error::{Result, VersioningError};
use regex::{NoExpand, Regex};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Before/after content of one rewritten file
#[derive(Debug, Clone, PartialEq)]
pub struct FileDiff {
    pub path: PathBuf,
    pub original: String,
    pub updated: String,
    /// Patterns that matched nothing
    pub warnings: Vec<BoundaryWarning>,
}

impl FileDiff {
    pub fn is_changed(&self) -> bool {
        self.original != self.updated
    }

    /// Pairs of (old line, new line) that differ, with 1-based line numbers
    pub fn changed_lines(&self) -> Vec<(usize, &str, &str)> {
        self.original
            .lines()
            .zip(self.updated.lines())
            .enumerate()
            .filter(|(_, (old, new))| old != new)
            .map(|(i, (old, new))| (i + 1, old, new))
            .collect()
    }
}

/// Compile a `{version}` pattern into a regex around `query`
///
/// Literal text in the pattern is escaped; every `{version}` placeholder
/// becomes the version query.
pub fn compile_pattern(pattern: &str, query: &str) -> Result<Regex> {
    if !pattern.contains("{version}") {
        return Err(VersioningError::template(format!(
            "pattern '{}' has no {{version}} placeholder",
            pattern
        )));
    }
    let group = format!("(?:{})", query);
    let expr = pattern
        .split("{version}")
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(group.as_str());
    Ok(Regex::new(&expr)?)
}

/// Read a bound file, reporting failures as template errors
pub fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        VersioningError::template(format!("cannot read {}: {}", path.display(), e))
    })
}

/// Compute the diff of replacing the old version in `original`
///
/// # Arguments
/// * `path` - File the content was read from
/// * `original` - Current file content
/// * `patterns` - Patterns containing a `{version}` placeholder
/// * `old_query` - Regex matching the current version (see `Version::query`)
/// * `new_version` - Rendered replacement version
///
/// Nothing touches the file system; patterns that match nothing are
/// collected as warnings.
pub fn substitute(
    path: &Path,
    original: String,
    patterns: &[&str],
    old_query: &str,
    new_version: &str,
) -> Result<FileDiff> {
    let mut updated = original.clone();
    let mut warnings = Vec::new();
    for pattern in patterns {
        let re = compile_pattern(pattern, old_query)?;
        if !re.is_match(&updated) {
            let warning = BoundaryWarning::PatternNotFound {
                filepath: path.display().to_string(),
                pattern: pattern.to_string(),
            };
            warn!("{}", warning);
            warnings.push(warning);
            continue;
        }
        let replacement = pattern.replace("{version}", new_version);
        updated = re.replace_all(&updated, NoExpand(&replacement)).into_owned();
    }

    Ok(FileDiff {
        path: path.to_path_buf(),
        original,
        updated,
        warnings,
    })
}

/// Write the updated content of a diff, skipping unchanged files
pub fn write(diff: &FileDiff) -> Result<()> {
    if !diff.is_changed() {
        debug!(path = %diff.path.display(), "no changes");
        return Ok(());
    }
    fs::write(&diff.path, &diff.updated)?;
    info!(path = %diff.path.display(), "updated file");
    Ok(())
}
