use std::fmt;

/// Non-fatal conditions met while bumping or building a changelog.
/// These are reported to the user but never abort the workflow.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// A configured pattern matched nothing in its file
    PatternNotFound { filepath: String, pattern: String },
    /// Commit title is not a conventional commit and was parsed as plain text
    FreeFormCommit { title: String },
    /// The version flavor cannot express dev/pre/post releases
    ReleaseClassesDisabled { compat: String },
    /// The tag a changelog starts from does not exist
    ChangelogTagMissing { tag: String },
    /// No commits between the changelog start and HEAD
    NoNewCommits { since: String },
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::PatternNotFound { filepath, pattern } => {
                write!(f, "Pattern '{}' matched nothing in {}", pattern, filepath)
            }
            BoundaryWarning::FreeFormCommit { title } => {
                let short = if title.chars().count() > 50 {
                    format!("{}...", title.chars().take(47).collect::<String>())
                } else {
                    title.clone()
                };
                write!(f, "Commit '{}' is not a conventional commit", short)
            }
            BoundaryWarning::ReleaseClassesDisabled { compat } => {
                write!(
                    f,
                    "Dev, pre and post releases are disabled for '{}' versions",
                    compat
                )
            }
            BoundaryWarning::ChangelogTagMissing { tag } => {
                write!(f, "Tag '{}' not found, using full history", tag)
            }
            BoundaryWarning::NoNewCommits { since } => {
                write!(f, "No new commits since '{}'", since)
            }
        }
    }
}
