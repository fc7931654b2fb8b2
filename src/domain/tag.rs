use crate::error::{Result, VersioningError};

/// Tag naming pattern (e.g., "v{version}", "release-{version}")
#[derive(Debug, Clone)]
pub struct TagPattern {
    pub pattern: String,
}

impl TagPattern {
    /// Create a new tag pattern
    pub fn new(pattern: impl Into<String>) -> Self {
        TagPattern {
            pattern: pattern.into(),
        }
    }

    /// Check that the pattern can carry a version
    pub fn validate(&self) -> Result<()> {
        if !self.pattern.contains("{version}") {
            return Err(VersioningError::tag(format!(
                "Pattern '{}' must contain {{version}} placeholder",
                self.pattern
            )));
        }
        Ok(())
    }

    /// Format a version according to pattern
    /// Example: pattern="v{version}", version="1.2.3" -> "v1.2.3"
    pub fn format(&self, version: &str) -> Result<String> {
        self.validate()?;
        Ok(self.pattern.replace("{version}", version))
    }
}
