//! Git operations abstraction layer
//!
//! This module provides a trait-based abstraction over the git operations a
//! version bump needs, allowing for a real repository implementation and a
//! mock implementation for testing.
//!
//! # Overview
//!
//! The primary abstraction is the [Repository] trait. The concrete
//! implementations include:
//!
//! - [repository::Git2Repository]: A real implementation using the `git2` crate
//! - [mock::MockRepository]: An in-memory implementation for testing
//!
//! # Usage
//!
//! The release controller is generic over [Repository]; the entry point opens
//! the repository once and hands it over.
//!
//! ```rust
//! # use git_version_bump::git::Repository;
//! # fn example<R: Repository>(repo: &R) -> git_version_bump::error::Result<()> {
//! if repo.is_clean()? {
//!     println!("HEAD: {}", repo.head_message()?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::{MockRepository, RecordedPush};
pub use repository::Git2Repository;

use crate::error::Result;
use git2::Oid;
use std::path::{Path, PathBuf};

/// Commit information for changelog generation
#[derive(Debug, Clone, PartialEq)]
pub struct CommitInfo {
    /// The full commit hash
    pub hash: String,
    /// The commit message
    pub message: String,
    /// The commit author
    pub author: String,
}

impl CommitInfo {
    pub fn short_hash(&self) -> &str {
        if self.hash.len() > 7 {
            &self.hash[..7]
        } else {
            &self.hash
        }
    }
}

/// Result of a (possibly dry-run) commit
#[derive(Debug, Clone, PartialEq)]
pub struct CommitRef {
    /// Commit id, `None` when nothing was written
    pub id: Option<String>,
    pub message: String,
}

/// Result of a (possibly dry-run) tag
#[derive(Debug, Clone, PartialEq)]
pub struct TagRef {
    pub name: String,
    /// Tagged commit id, `None` when nothing was written
    pub target: Option<String>,
}

/// Common git operation trait for abstraction
///
/// ## Error Handling
///
/// All methods return [crate::error::Result<T>]. Implementations map
/// underlying errors (like `git2::Error`) to the matching
/// [crate::error::VersioningError] variants.
///
/// ## Dry runs
///
/// Mutating methods take a `dry_run` flag. With it set they validate their
/// inputs and return a ref with no id, writing nothing.
pub trait Repository {
    /// Message of the commit at HEAD
    fn head_message(&self) -> Result<String>;

    /// Root of the working tree
    fn working_directory(&self) -> Result<PathBuf>;

    /// Whether tracked files have no staged or unstaged changes
    ///
    /// Untracked files are ignored.
    fn is_clean(&self) -> Result<bool>;

    /// Stage `paths` and commit them on HEAD
    ///
    /// # Arguments
    /// * `paths` - Files to stage, absolute or relative to the working directory
    /// * `message` - Commit message
    /// * `dry_run` - Validate only
    fn commit(&self, paths: &[PathBuf], message: &str, dry_run: bool) -> Result<CommitRef>;

    /// Create an annotated tag
    ///
    /// # Arguments
    /// * `name` - Name for the new tag
    /// * `target` - Revision to tag, HEAD when `None`
    /// * `message` - Tag message, `ci: <name>` when `None`
    /// * `dry_run` - Validate only
    ///
    /// # Returns
    /// * `Err` - If the tag already exists or the target cannot be resolved
    fn tag(
        &self,
        name: &str,
        target: Option<&str>,
        message: Option<&str>,
        dry_run: bool,
    ) -> Result<TagRef>;

    /// Push the current branch and/or tags to a remote
    ///
    /// # Arguments
    /// * `remote` - Name of the remote (e.g., "origin")
    /// * `include_head` - Push the branch HEAD points at
    /// * `tags` - Tag names to push
    fn push(&self, remote: &str, include_head: bool, tags: &[String]) -> Result<()>;

    /// Find a tag by name and get the OID of the commit it points at
    ///
    /// Handles both lightweight and annotated tags.
    ///
    /// # Returns
    /// * `Ok(Some(Oid))` - Commit the tag resolves to
    /// * `Ok(None)` - If the tag doesn't exist
    fn find_tag_oid(&self, tag_name: &str) -> Result<Option<Oid>>;

    /// Commits reachable from HEAD, excluding those reachable from `since`
    ///
    /// Returned oldest first.
    fn commits_since(&self, since: Option<Oid>) -> Result<Vec<CommitInfo>>;
}

/// Resolve `path` against `root` unless it is already absolute
pub fn resolve_path(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
