use crate::boundary::BoundaryWarning;
use crate::changelog::Changelog;
use crate::config::Config;
use crate::controller::decision::{decide_bump, BumpPolicy};
use crate::domain::{CommitClassification, CommitParser, Segment, TagPattern, Version};
use crate::error::{Result, VersioningError};
use crate::git::{CommitRef, Repository, TagRef};
use crate::template::{self, FileDiff};
use std::path::PathBuf;
use tracing::{debug, info};

/// Options for one bump run
///
/// Mirrors the CLI flags but is independent of clap so the workflow can be
/// driven programmatically.
#[derive(Debug, Clone, PartialEq)]
pub struct BumpOptions {
    /// Commit message to classify, HEAD's message when `None`
    pub message: Option<String>,
    pub commit: bool,
    pub tag: bool,
    /// Explicit tag name, overriding `tag_format`
    pub tag_name: Option<String>,
    pub build: Option<String>,
    pub release: bool,
    pub segment: Option<Segment>,
    pub push: bool,
    pub remote: String,
    /// Compute everything, write nothing
    pub dry_run: bool,
}

impl Default for BumpOptions {
    fn default() -> Self {
        BumpOptions {
            message: None,
            commit: false,
            tag: false,
            tag_name: None,
            build: None,
            release: false,
            segment: None,
            push: false,
            remote: "origin".to_string(),
            dry_run: false,
        }
    }
}

/// What a bump did (or would do, in a dry run)
#[derive(Debug, Clone)]
pub struct BumpOutcome {
    pub previous: Version,
    pub version: Version,
    pub diffs: Vec<FileDiff>,
    pub commit: Option<CommitRef>,
    pub tag: Option<TagRef>,
    pub pushed: bool,
    pub warnings: Vec<BoundaryWarning>,
}

/// Commits since a tag, grouped for release notes
#[derive(Debug, Clone)]
pub struct ChangelogReport {
    pub since: String,
    pub changelog: Changelog,
    pub warnings: Vec<BoundaryWarning>,
}

/// Runs version bumps for one project
///
/// Owns the loaded configuration and the repository handle. The version in
/// the configuration is only replaced once every side effect succeeded.
pub struct ReleaseController<R: Repository> {
    config: Config,
    repo: R,
}

impl<R: Repository> ReleaseController<R> {
    pub fn new(config: Config, repo: R) -> Self {
        ReleaseController { config, repo }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn current_version(&self) -> Result<Version> {
        self.config.current_version()
    }

    pub fn parser(&self) -> CommitParser {
        CommitParser::from_config(&self.config.parser)
    }

    /// Classify `message`, or the HEAD commit message when `None`
    pub fn classify(&self, message: Option<&str>) -> Result<CommitClassification> {
        let message = match message {
            Some(m) => m.to_string(),
            None => self.repo.head_message()?,
        };
        self.parser().parse(&message)
    }

    /// Files whose version strings are managed, resolved against the work tree
    pub fn bound_files(&self) -> Result<Vec<PathBuf>> {
        let root = self.repo.working_directory()?;
        Ok(self
            .config
            .bindings(&root)
            .into_iter()
            .map(|b| b.filepath)
            .collect())
    }

    /// Run the bump workflow
    ///
    /// classify -> decide -> clean check -> rewrite files -> commit -> tag ->
    /// push. Nothing is written before the decision is complete, and a dry
    /// run writes nothing at all.
    pub fn bump(&mut self, options: &BumpOptions) -> Result<BumpOutcome> {
        let mut warnings = self.config.boundary_warnings();

        let classification = self.classify(options.message.as_deref())?;
        if classification.commit_type().is_none() {
            warnings.push(BoundaryWarning::FreeFormCommit {
                title: classification.title.description.clone(),
            });
        }

        let previous = self.current_version()?;
        let policy = BumpPolicy::from_config(&self.config.parser)
            .release(options.release)
            .segment(options.segment)
            .build(options.build.clone());
        let version = decide_bump(&classification, &previous, &policy)?;
        info!(from = %previous, to = %version, dry_run = options.dry_run, "bumping version");

        if !options.dry_run && !self.repo.is_clean()? {
            return Err(VersioningError::DirtyRepository);
        }

        let diffs = self.rewrite_files(&previous, &version, options.dry_run)?;
        for diff in &diffs {
            warnings.extend(diff.warnings.iter().cloned());
        }

        let rendered = version.to_string();

        let commit = if options.commit {
            let paths: Vec<PathBuf> = diffs
                .iter()
                .filter(|d| d.is_changed())
                .map(|d| d.path.clone())
                .collect();
            let message = self.config.commit_message_for(&rendered);
            Some(self.repo.commit(&paths, &message, options.dry_run)?)
        } else {
            None
        };

        let tag = if options.tag {
            let name = match &options.tag_name {
                Some(name) => name.clone(),
                None => TagPattern::new(self.config.tag_format.as_str()).format(&rendered)?,
            };
            Some(self.repo.tag(&name, None, None, options.dry_run)?)
        } else {
            None
        };

        let mut pushed = false;
        if options.push && (commit.is_some() || tag.is_some()) {
            if options.dry_run {
                debug!(remote = %options.remote, "dry run, skipping push");
            } else {
                let tags: Vec<String> = tag.iter().map(|t| t.name.clone()).collect();
                self.repo.push(&options.remote, commit.is_some(), &tags)?;
                pushed = true;
            }
        }

        if !options.dry_run {
            self.config.version = rendered;
        }

        Ok(BumpOutcome {
            previous,
            version,
            diffs,
            commit,
            tag,
            pushed,
            warnings,
        })
    }

    /// Compute every file rewrite, then write them
    ///
    /// A binding that fails to read or compile aborts the bump before any file
    /// is touched. Bindings sharing a file are applied in order to one diff.
    fn rewrite_files(
        &self,
        previous: &Version,
        version: &Version,
        dry_run: bool,
    ) -> Result<Vec<FileDiff>> {
        let root = self.repo.working_directory()?;
        let mut diffs: Vec<FileDiff> = Vec::new();
        for binding in self.config.bindings(&root) {
            let compat = binding.compat.unwrap_or(self.config.compat);
            let (old, new) = if binding.release_only {
                (previous.release_only(), version.release_only())
            } else {
                (previous.clone(), version.clone())
            };
            let patterns = binding.patterns();
            let (query, rendered) = (old.query(), new.render(compat));

            if let Some(pending) = diffs.iter_mut().find(|d| d.path == binding.filepath) {
                let next = template::substitute(
                    &binding.filepath,
                    pending.updated.clone(),
                    &patterns,
                    &query,
                    &rendered,
                )?;
                pending.updated = next.updated;
                pending.warnings.extend(next.warnings);
                continue;
            }

            let original = template::read(&binding.filepath)?;
            diffs.push(template::substitute(
                &binding.filepath,
                original,
                &patterns,
                &query,
                &rendered,
            )?);
        }

        if dry_run {
            debug!(files = diffs.len(), "dry run, not writing");
        } else {
            for diff in &diffs {
                template::write(diff)?;
            }
        }
        Ok(diffs)
    }

    /// Group the commits since `since` (default: the tag of the current version)
    pub fn changelog(&self, since: Option<&str>) -> Result<ChangelogReport> {
        let mut warnings = Vec::new();
        let since = match since {
            Some(tag) => tag.to_string(),
            None => TagPattern::new(self.config.tag_format.as_str())
                .format(&self.current_version()?.to_string())?,
        };

        let oid = self.repo.find_tag_oid(&since)?;
        if oid.is_none() {
            warnings.push(BoundaryWarning::ChangelogTagMissing { tag: since.clone() });
        }

        let commits = self.repo.commits_since(oid)?;
        if commits.is_empty() {
            warnings.push(BoundaryWarning::NoNewCommits { since: since.clone() });
        }
        debug!(since = %since, commits = commits.len(), "collected changelog commits");

        Ok(ChangelogReport {
            since,
            changelog: Changelog::build(&commits, &self.parser()),
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockRepository;
    use std::fs;

    fn setup(version: &str) -> (tempfile::TempDir, ReleaseController<MockRepository>) {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join(".versioning.toml");
        fs::write(&source, format!("version = \"{}\"\n", version)).unwrap();
        let mut config = Config::from_toml(&fs::read_to_string(&source).unwrap()).unwrap();
        config.source = Some(source);
        let repo = MockRepository::new(dir.path());
        (dir, ReleaseController::new(config, repo))
    }

    fn setup_with_files(
        files: &str,
    ) -> (tempfile::TempDir, String, ReleaseController<MockRepository>) {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join(".versioning.toml");
        let toml = format!("version = \"1.2.3\"\n{}", files);
        fs::write(&source, &toml).unwrap();
        let mut config = Config::from_toml(&toml).unwrap();
        config.source = Some(source);
        let repo = MockRepository::new(dir.path());
        (dir, toml, ReleaseController::new(config, repo))
    }

    fn fix_message() -> BumpOptions {
        BumpOptions {
            message: Some("fix: repair bug".to_string()),
            ..BumpOptions::default()
        }
    }

    #[test]
    fn test_unreadable_binding_leaves_every_file_untouched() {
        let (dir, toml, mut controller) = setup_with_files(
            "\n[[files]]\nfilepath = \"a.txt\"\npattern = \"v{version}\"\n\n[[files]]\nfilepath = \"missing.txt\"\npattern = \"v{version}\"\n",
        );
        fs::write(dir.path().join("a.txt"), "v1.2.3\n").unwrap();

        let err = controller.bump(&fix_message()).unwrap_err();
        assert!(matches!(err, VersioningError::Template(_)));
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "v1.2.3\n");
        assert_eq!(
            fs::read_to_string(dir.path().join(".versioning.toml")).unwrap(),
            toml
        );
        assert_eq!(controller.config().version, "1.2.3");
    }

    #[test]
    fn test_bindings_sharing_a_file_merge_into_one_diff() {
        let (dir, _toml, mut controller) = setup_with_files(
            "\n[[files]]\nfilepath = \"a.txt\"\npattern = \"v{version}\"\n\n[[files]]\nfilepath = \"a.txt\"\npattern = \"release {version}\"\n",
        );
        fs::write(dir.path().join("a.txt"), "v1.2.3\nrelease 1.2.3\n").unwrap();

        let outcome = controller.bump(&fix_message()).unwrap();
        assert_eq!(outcome.diffs.len(), 2);
        assert_eq!(
            fs::read_to_string(dir.path().join("a.txt")).unwrap(),
            "v1.2.4\nrelease 1.2.4\n"
        );
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_bump_rewrites_config_source() {
        let (dir, mut controller) = setup("1.2.3");
        let outcome = controller
            .bump(&BumpOptions {
                message: Some("fix: repair bug".to_string()),
                ..BumpOptions::default()
            })
            .unwrap();

        assert_eq!(outcome.version.to_string(), "1.2.4");
        assert_eq!(controller.config().version, "1.2.4");
        let written = fs::read_to_string(dir.path().join(".versioning.toml")).unwrap();
        assert_eq!(written, "version = \"1.2.4\"\n");
    }

    #[test]
    fn test_bump_uses_head_message() {
        let (_dir, mut controller) = setup("1.2.3");
        controller.repository().add_commit("feat: from head");
        let outcome = controller.bump(&BumpOptions::default()).unwrap();
        assert_eq!(outcome.version.to_string(), "1.3.0");
    }

    #[test]
    fn test_dry_run_keeps_everything() {
        let (dir, mut controller) = setup("1.2.3");
        controller.repository().add_commit("feat: x");
        let outcome = controller
            .bump(&BumpOptions {
                commit: true,
                tag: true,
                push: true,
                dry_run: true,
                ..BumpOptions::default()
            })
            .unwrap();

        assert_eq!(outcome.version.to_string(), "1.3.0");
        assert!(outcome.diffs[0].is_changed());
        assert_eq!(outcome.commit.unwrap().id, None);
        assert!(!outcome.pushed);
        assert_eq!(controller.config().version, "1.2.3");
        assert!(controller.repository().recorded_commits().is_empty());
        assert!(controller.repository().tag_names().is_empty());
        let written = fs::read_to_string(dir.path().join(".versioning.toml")).unwrap();
        assert_eq!(written, "version = \"1.2.3\"\n");
    }

    #[test]
    fn test_dirty_repository_refused() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::from_toml("version = \"1.0.0\"").unwrap();
        let repo = MockRepository::new(dir.path()).with_clean(false);
        let mut controller = ReleaseController::new(config, repo);
        let err = controller
            .bump(&BumpOptions {
                message: Some("fix: x".to_string()),
                ..BumpOptions::default()
            })
            .unwrap_err();
        assert!(matches!(err, VersioningError::DirtyRepository));
    }

    #[test]
    fn test_free_form_commit_warns_then_fails() {
        let (_dir, mut controller) = setup("1.0.0");
        let err = controller
            .bump(&BumpOptions {
                message: Some("Merge branch 'x'".to_string()),
                ..BumpOptions::default()
            })
            .unwrap_err();
        assert!(matches!(err, VersioningError::UnsupportedCommitType(_)));
    }

    #[test]
    fn test_changelog_since_missing_tag() {
        let (_dir, controller) = setup("1.0.0");
        controller.repository().add_commit("feat: one");
        let report = controller.changelog(None).unwrap();
        assert_eq!(report.since, "1.0.0");
        assert!(report
            .warnings
            .contains(&BoundaryWarning::ChangelogTagMissing {
                tag: "1.0.0".to_string()
            }));
    }
}
