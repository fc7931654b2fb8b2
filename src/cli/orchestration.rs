//! Main workflow orchestration logic
//!
//! Each subcommand is a function taking an args struct that mirrors the CLI
//! flags without depending on clap, so the workflows can be called
//! programmatically. Functions return data; printing is left to the caller.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::boundary::BoundaryWarning;
use crate::changelog;
use crate::config::{self, Config};
use crate::controller::{BumpOptions, BumpOutcome, ReleaseController};
use crate::domain::Version;
use crate::git::{Git2Repository, Repository};

/// Default changelog file, relative to the work tree
pub const DEFAULT_CHANGELOG: &str = "CHANGELOG.md";

/// Arguments for the bump workflow
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BumpWorkflowArgs {
    /// Path to custom config file
    pub config_path: Option<PathBuf>,

    pub options: BumpOptions,
}

/// Arguments for the info workflow
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InfoWorkflowArgs {
    pub config_path: Option<PathBuf>,

    /// Show the release tuple only
    pub release: bool,

    /// List the managed files as well
    pub filepaths: bool,
}

/// Result of the info workflow
#[derive(Debug, Clone)]
pub struct InfoResult {
    pub version: Version,
    pub root: PathBuf,
    /// Only filled when requested
    pub filepaths: Vec<PathBuf>,
}

/// Arguments for the changelog workflow
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChangelogWorkflowArgs {
    pub config_path: Option<PathBuf>,

    /// Tag to start from, the current version's tag when `None`
    pub since: Option<String>,

    /// Output file, `CHANGELOG.md` in the work tree when `None`
    pub output: Option<PathBuf>,

    /// Print instead of writing
    pub dry_run: bool,
}

/// Result of the changelog workflow
#[derive(Debug, Clone, PartialEq)]
pub struct ChangelogResult {
    /// Rendered Markdown block
    pub block: String,

    /// File the block was written to, `None` in a dry run
    pub written: Option<PathBuf>,

    pub warnings: Vec<BoundaryWarning>,
}

/// Directory the repository is discovered from: the config file's directory
fn project_dir(config: &Config) -> PathBuf {
    config
        .source
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn open_controller(config_path: Option<&Path>) -> Result<ReleaseController<Git2Repository>> {
    let config = config::load_config(config_path).context("Failed to load configuration")?;
    let dir = project_dir(&config);
    debug!(dir = %dir.display(), "opening repository");
    let repo = Git2Repository::open(&dir)
        .with_context(|| format!("Failed to open git repository at {}", dir.display()))?;
    Ok(ReleaseController::new(config, repo))
}

/// Bump workflow
///
/// Orchestrates the whole bump:
/// 1. Load configuration (with user defaults merged in)
/// 2. Open the repository the config file lives in
/// 3. Classify the commit and decide the new version
/// 4. Rewrite bound files, then commit, tag and push as requested
///
/// Returns the outcome together with the work tree root for display.
pub fn run_bump(args: &BumpWorkflowArgs) -> Result<(BumpOutcome, PathBuf)> {
    let mut controller = open_controller(args.config_path.as_deref())?;
    let root = controller.repository().working_directory()?;
    let outcome = controller.bump(&args.options)?;
    info!(version = %outcome.version, "bump finished");
    Ok((outcome, root))
}

/// Info workflow: current version and, optionally, the managed files
pub fn run_info(args: &InfoWorkflowArgs) -> Result<InfoResult> {
    if args.filepaths {
        let controller = open_controller(args.config_path.as_deref())?;
        let version = controller.current_version()?;
        return Ok(InfoResult {
            version: if args.release { version.release_only() } else { version },
            root: controller.repository().working_directory()?,
            filepaths: controller.bound_files()?,
        });
    }

    let config =
        config::load_config(args.config_path.as_deref()).context("Failed to load configuration")?;
    let version = config.current_version()?;
    Ok(InfoResult {
        version: if args.release { version.release_only() } else { version },
        root: project_dir(&config),
        filepaths: Vec::new(),
    })
}

/// Changelog workflow: group commits since a tag and prepend them to a file
pub fn run_changelog(args: &ChangelogWorkflowArgs) -> Result<ChangelogResult> {
    let controller = open_controller(args.config_path.as_deref())?;
    let report = controller.changelog(args.since.as_deref())?;
    let version = controller.current_version()?;
    let block = report
        .changelog
        .render(&version.to_string(), chrono::Local::now().date_naive());

    if args.dry_run {
        return Ok(ChangelogResult {
            block,
            written: None,
            warnings: report.warnings,
        });
    }

    let root = controller.repository().working_directory()?;
    let output = match &args.output {
        Some(path) => crate::git::resolve_path(&root, path),
        None => root.join(DEFAULT_CHANGELOG),
    };
    changelog::write(&output, &block)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    Ok(ChangelogResult {
        block,
        written: Some(output),
        warnings: report.warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_dir_from_source() {
        let mut config = Config::from_toml("version = \"1.0.0\"").unwrap();
        assert_eq!(project_dir(&config), PathBuf::from("."));

        config.source = Some(PathBuf::from("/work/app/.versioning.toml"));
        assert_eq!(project_dir(&config), PathBuf::from("/work/app"));
    }

    #[test]
    fn test_workflow_args_defaults() {
        let args = BumpWorkflowArgs::default();
        assert_eq!(args.config_path, None);
        assert_eq!(args.options.remote, "origin");
        assert!(!args.options.dry_run);

        let args = ChangelogWorkflowArgs::default();
        assert_eq!(args.since, None);
        assert!(!args.dry_run);
    }

    #[test]
    fn test_info_without_filepaths_needs_no_repository() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("versioning.toml");
        std::fs::write(&path, "version = \"2.1.0rc1\"\n").unwrap();

        let result = run_info(&InfoWorkflowArgs {
            config_path: Some(path),
            release: true,
            filepaths: false,
        })
        .unwrap();
        assert_eq!(result.version.to_string(), "2.1.0");
        assert!(result.filepaths.is_empty());
    }
}
