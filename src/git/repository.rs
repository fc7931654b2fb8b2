use crate::error::{Result, VersioningError};
use crate::git::{CommitInfo, CommitRef, TagRef};
use git2::{Oid, Repository as Git2Repo};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Git2Repository { repo })
    }

    fn head_commit(&self) -> Result<Option<git2::Commit<'_>>> {
        match self.repo.head() {
            Ok(head) => Ok(Some(head.peel_to_commit()?)),
            Err(e)
                if e.code() == git2::ErrorCode::UnbornBranch
                    || e.code() == git2::ErrorCode::NotFound =>
            {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Credentials for remote operations: SSH keys from ~/.ssh, then the SSH agent,
/// then git's default credentials
fn remote_callbacks<'a>() -> git2::RemoteCallbacks<'a> {
    let mut callbacks = git2::RemoteCallbacks::new();
    callbacks.credentials(|_url, username_from_url, allowed_types| {
        let username = username_from_url.unwrap_or("git");
        if allowed_types.contains(git2::CredentialType::SSH_KEY) {
            if let Some(home) = dirs::home_dir() {
                for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                    let path = home.join(".ssh").join(key);
                    if path.exists() {
                        if let Ok(cred) = git2::Cred::ssh_key(username, None, &path, None) {
                            return Ok(cred);
                        }
                    }
                }
            }

            if let Ok(cred) = git2::Cred::ssh_key_from_agent(username) {
                return Ok(cred);
            }
        }

        git2::Cred::default()
    });

    callbacks.push_update_reference(|refname, status| match status {
        Some(status) => {
            warn!(refname, status, "remote rejected reference");
            Err(git2::Error::from_str(&format!("Push failed for {}", refname)))
        }
        None => Ok(()),
    });
    callbacks
}

impl super::Repository for Git2Repository {
    fn head_message(&self) -> Result<String> {
        let commit = self
            .head_commit()?
            .ok_or_else(|| VersioningError::grammar("repository has no commits"))?;
        Ok(commit.message().unwrap_or_default().to_string())
    }

    fn working_directory(&self) -> Result<PathBuf> {
        let workdir = self
            .repo
            .workdir()
            .ok_or_else(|| VersioningError::config("repository is bare"))?;
        Ok(workdir.canonicalize()?)
    }

    fn is_clean(&self) -> Result<bool> {
        let mut options = git2::StatusOptions::new();
        options.include_untracked(false).include_ignored(false);
        let statuses = self.repo.statuses(Some(&mut options))?;
        Ok(statuses.is_empty())
    }

    fn commit(&self, paths: &[PathBuf], message: &str, dry_run: bool) -> Result<CommitRef> {
        let workdir = self.working_directory()?;
        let mut relative = Vec::with_capacity(paths.len());
        for path in paths {
            let path = super::resolve_path(&workdir, path);
            let rel = path.strip_prefix(&workdir).map_err(|_| {
                VersioningError::config(format!(
                    "{} is outside the working tree",
                    path.display()
                ))
            })?;
            relative.push(rel.to_path_buf());
        }

        if dry_run {
            debug!(files = relative.len(), "dry run, skipping commit");
            return Ok(CommitRef {
                id: None,
                message: message.to_string(),
            });
        }

        let mut index = self.repo.index()?;
        for path in &relative {
            index.add_path(path)?;
        }
        index.write()?;

        let tree = self.repo.find_tree(index.write_tree()?)?;
        let signature = self.repo.signature()?;
        let parent = self.head_commit()?;
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        let oid = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
        info!(commit = %oid, "created commit");

        Ok(CommitRef {
            id: Some(oid.to_string()),
            message: message.to_string(),
        })
    }

    fn tag(
        &self,
        name: &str,
        target: Option<&str>,
        message: Option<&str>,
        dry_run: bool,
    ) -> Result<TagRef> {
        if self.find_tag_oid(name)?.is_some() {
            return Err(VersioningError::tag(format!("Tag '{}' already exists", name)));
        }

        let object = self
            .repo
            .revparse_single(target.unwrap_or("HEAD"))
            .and_then(|obj| obj.peel(git2::ObjectType::Commit))
            .map_err(|e| VersioningError::tag(format!("Cannot resolve tag target: {}", e)))?;

        if dry_run {
            debug!(tag = name, "dry run, skipping tag");
            return Ok(TagRef {
                name: name.to_string(),
                target: None,
            });
        }

        let message = message
            .map(|m| m.to_string())
            .unwrap_or_else(|| format!("ci: {}", name));
        let signature = self.repo.signature()?;
        self.repo
            .tag(name, &object, &signature, &message, false)
            .map_err(|e| VersioningError::tag(format!("Cannot create tag: {}", e)))?;
        info!(tag = name, target = %object.id(), "created tag");

        Ok(TagRef {
            name: name.to_string(),
            target: Some(object.id().to_string()),
        })
    }

    fn push(&self, remote: &str, include_head: bool, tags: &[String]) -> Result<()> {
        let mut refspecs: Vec<String> = Vec::new();
        if include_head {
            let head = self.repo.head()?;
            let name = head
                .name()
                .ok_or_else(|| VersioningError::remote("HEAD is not a valid reference name"))?;
            refspecs.push(format!("{}:{}", name, name));
        }
        refspecs.extend(
            tags.iter()
                .map(|tag| format!("refs/tags/{}:refs/tags/{}", tag, tag)),
        );
        if refspecs.is_empty() {
            return Ok(());
        }

        let mut remote_handle = self
            .repo
            .find_remote(remote)
            .map_err(|e| VersioningError::remote(format!("Cannot find remote: {}", e)))?;

        let mut push_options = git2::PushOptions::new();
        push_options.remote_callbacks(remote_callbacks());

        let refspec_strs: Vec<&str> = refspecs.iter().map(|s| s.as_str()).collect();
        remote_handle
            .push(&refspec_strs, Some(&mut push_options))
            .map_err(|e| match e.class() {
                git2::ErrorClass::Net => {
                    VersioningError::remote(format!("Network error during push: {}", e))
                }
                _ => VersioningError::remote(format!("Push to '{}' failed: {}", remote, e)),
            })?;
        info!(remote, refs = refspecs.len(), "pushed");

        Ok(())
    }

    fn find_tag_oid(&self, tag_name: &str) -> Result<Option<Oid>> {
        let reference_name = format!("refs/tags/{}", tag_name);

        match self.repo.find_reference(&reference_name) {
            Ok(reference) => {
                let oid = reference
                    .peel(git2::ObjectType::Commit)
                    .map_err(|e| VersioningError::tag(format!("Cannot peel tag: {}", e)))?
                    .id();

                Ok(Some(oid))
            }
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(VersioningError::tag(format!(
                "Cannot find tag '{}': {}",
                tag_name, e
            ))),
        }
    }

    fn commits_since(&self, since: Option<Oid>) -> Result<Vec<CommitInfo>> {
        if self.head_commit()?.is_none() {
            return Ok(Vec::new());
        }

        let mut revwalk = self.repo.revwalk()?;
        revwalk.push_head()?;
        if let Some(oid) = since {
            revwalk.hide(oid)?;
        }

        let mut commits = Vec::new();
        for oid_result in revwalk {
            let oid = oid_result?;
            let commit = self.repo.find_commit(oid)?;

            commits.push(CommitInfo {
                hash: oid.to_string(),
                message: commit.message().unwrap_or("(empty message)").to_string(),
                author: commit.author().name().unwrap_or("unknown").to_string(),
            });
        }

        commits.reverse();
        Ok(commits)
    }
}
