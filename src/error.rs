use thiserror::Error;

/// Unified error type for version bump operations
#[derive(Error, Debug)]
pub enum VersioningError {
    #[error("Version parsing error: {0}")]
    VersionParse(String),

    #[error("Version state invariant violated: {0}")]
    Invariant(String),

    #[error("Commit grammar error: {0}")]
    Grammar(String),

    #[error("Unrecognized commit type: '{0}'")]
    UnrecognizedType(String),

    #[error("Unrecognized commit scope: '{0}'")]
    UnrecognizedScope(String),

    #[error("Unsupported commit type: {0}")]
    UnsupportedCommitType(String),

    #[error("No version change: {0}")]
    NoVersionChange(String),

    #[error("Repository has uncommitted changes")]
    DirtyRepository,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Tag error: {0}")]
    Tag(String),

    #[error("Remote operation failed: {0}")]
    Remote(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, VersioningError>;

impl VersioningError {
    /// Create a version parse error with context
    pub fn version(msg: impl Into<String>) -> Self {
        VersioningError::VersionParse(msg.into())
    }

    /// Create an invariant error with context
    pub fn invariant(msg: impl Into<String>) -> Self {
        VersioningError::Invariant(msg.into())
    }

    /// Create a grammar error with context
    pub fn grammar(msg: impl Into<String>) -> Self {
        VersioningError::Grammar(msg.into())
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        VersioningError::Config(msg.into())
    }

    /// Create a template error with context
    pub fn template(msg: impl Into<String>) -> Self {
        VersioningError::Template(msg.into())
    }

    /// Create a tag error with context
    pub fn tag(msg: impl Into<String>) -> Self {
        VersioningError::Tag(msg.into())
    }

    /// Create a remote error with context
    pub fn remote(msg: impl Into<String>) -> Self {
        VersioningError::Remote(msg.into())
    }
}

impl From<toml::de::Error> for VersioningError {
    fn from(err: toml::de::Error) -> Self {
        VersioningError::Config(err.to_string())
    }
}

impl From<regex::Error> for VersioningError {
    fn from(err: regex::Error) -> Self {
        VersioningError::Template(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VersioningError::config("missing version");
        assert_eq!(err.to_string(), "Configuration error: missing version");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: VersioningError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_error_from_toml() {
        let toml_err = toml::from_str::<toml::Value>("version = ").unwrap_err();
        let err: VersioningError = toml_err.into();
        assert!(matches!(err, VersioningError::Config(_)));
    }

    #[test]
    fn test_error_from_regex() {
        let regex_err = regex::Regex::new("(").unwrap_err();
        let err: VersioningError = regex_err.into();
        assert!(err.to_string().starts_with("Template error"));
    }

    #[test]
    fn test_error_messages_are_descriptive() {
        let error_pairs = vec![
            (VersioningError::version("x"), "Version parsing error"),
            (VersioningError::invariant("x"), "Version state invariant violated"),
            (VersioningError::grammar("x"), "Commit grammar error"),
            (
                VersioningError::UnsupportedCommitType("x".to_string()),
                "Unsupported commit type",
            ),
            (
                VersioningError::NoVersionChange("x".to_string()),
                "No version change",
            ),
            (VersioningError::config("x"), "Configuration error"),
            (VersioningError::template("x"), "Template error"),
            (VersioningError::tag("x"), "Tag error"),
            (VersioningError::remote("x"), "Remote operation failed"),
        ];

        for (err, expected_prefix) in error_pairs {
            let msg = err.to_string();
            assert!(
                msg.starts_with(expected_prefix),
                "Error message should start with '{}', but got '{}'",
                expected_prefix,
                msg
            );
        }
    }

    #[test]
    fn test_dirty_repository_message() {
        assert_eq!(
            VersioningError::DirtyRepository.to_string(),
            "Repository has uncommitted changes"
        );
    }
}
