use crate::error::{Result, VersioningError};
use crate::git::{CommitInfo, CommitRef, Repository, TagRef};
use git2::Oid;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;

/// A commit recorded by [MockRepository::commit]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCommit {
    pub paths: Vec<PathBuf>,
    pub message: String,
}

/// A push recorded by [MockRepository::push]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPush {
    pub remote: String,
    pub include_head: bool,
    pub tags: Vec<String>,
}

/// Mock repository for testing without actual git operations
///
/// History is a linear list of commits; HEAD is the last one. Commits, tags
/// and pushes made through the trait are recorded for inspection.
pub struct MockRepository {
    workdir: PathBuf,
    clean: bool,
    history: RefCell<Vec<(Oid, CommitInfo)>>,
    tags: RefCell<HashMap<String, Oid>>,
    commits: RefCell<Vec<RecordedCommit>>,
    pushes: RefCell<Vec<RecordedPush>>,
}

impl MockRepository {
    /// Create a new empty mock repository rooted at `workdir`
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        MockRepository {
            workdir: workdir.into(),
            clean: true,
            history: RefCell::new(Vec::new()),
            tags: RefCell::new(HashMap::new()),
            commits: RefCell::new(Vec::new()),
            pushes: RefCell::new(Vec::new()),
        }
    }

    /// Mark the working tree dirty or clean
    pub fn with_clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    /// Append a commit to the history, returning its OID
    pub fn add_commit(&self, message: impl Into<String>) -> Oid {
        let mut history = self.history.borrow_mut();
        let index = history.len() + 1;
        let mut bytes = [0u8; 20];
        bytes[12..].copy_from_slice(&(index as u64).to_be_bytes());
        let oid = Oid::from_bytes(&bytes).unwrap_or_else(|_| Oid::zero());
        history.push((
            oid,
            CommitInfo {
                hash: oid.to_string(),
                message: message.into(),
                author: "Mock Author".to_string(),
            },
        ));
        oid
    }

    /// Add a tag pointing to an OID
    pub fn add_tag(&self, name: impl Into<String>, oid: Oid) {
        self.tags.borrow_mut().insert(name.into(), oid);
    }

    pub fn recorded_commits(&self) -> Vec<RecordedCommit> {
        self.commits.borrow().clone()
    }

    pub fn recorded_pushes(&self) -> Vec<RecordedPush> {
        self.pushes.borrow().clone()
    }

    pub fn tag_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tags.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    fn head(&self) -> Option<Oid> {
        self.history.borrow().last().map(|(oid, _)| *oid)
    }
}

impl Repository for MockRepository {
    fn head_message(&self) -> Result<String> {
        self.history
            .borrow()
            .last()
            .map(|(_, info)| info.message.clone())
            .ok_or_else(|| VersioningError::grammar("repository has no commits"))
    }

    fn working_directory(&self) -> Result<PathBuf> {
        Ok(self.workdir.clone())
    }

    fn is_clean(&self) -> Result<bool> {
        Ok(self.clean)
    }

    fn commit(&self, paths: &[PathBuf], message: &str, dry_run: bool) -> Result<CommitRef> {
        if dry_run {
            return Ok(CommitRef {
                id: None,
                message: message.to_string(),
            });
        }
        self.commits.borrow_mut().push(RecordedCommit {
            paths: paths.to_vec(),
            message: message.to_string(),
        });
        let oid = self.add_commit(message);
        Ok(CommitRef {
            id: Some(oid.to_string()),
            message: message.to_string(),
        })
    }

    fn tag(
        &self,
        name: &str,
        target: Option<&str>,
        _message: Option<&str>,
        dry_run: bool,
    ) -> Result<TagRef> {
        if self.tags.borrow().contains_key(name) {
            return Err(VersioningError::tag(format!("Tag '{}' already exists", name)));
        }
        let oid = match target {
            Some(rev) => Oid::from_str(rev)
                .map_err(|e| VersioningError::tag(format!("Cannot resolve tag target: {}", e)))?,
            None => self
                .head()
                .ok_or_else(|| VersioningError::tag("Cannot tag an empty repository"))?,
        };
        if dry_run {
            return Ok(TagRef {
                name: name.to_string(),
                target: None,
            });
        }
        self.add_tag(name, oid);
        Ok(TagRef {
            name: name.to_string(),
            target: Some(oid.to_string()),
        })
    }

    fn push(&self, remote: &str, include_head: bool, tags: &[String]) -> Result<()> {
        self.pushes.borrow_mut().push(RecordedPush {
            remote: remote.to_string(),
            include_head,
            tags: tags.to_vec(),
        });
        Ok(())
    }

    fn find_tag_oid(&self, tag_name: &str) -> Result<Option<Oid>> {
        Ok(self.tags.borrow().get(tag_name).copied())
    }

    fn commits_since(&self, since: Option<Oid>) -> Result<Vec<CommitInfo>> {
        let history = self.history.borrow();
        let start = match since {
            Some(oid) => history
                .iter()
                .position(|(id, _)| *id == oid)
                .map_or(0, |i| i + 1),
            None => 0,
        };
        Ok(history[start..].iter().map(|(_, info)| info.clone()).collect())
    }
}
