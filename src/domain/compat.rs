//! Version string flavors
//!
//! A flavor only controls how pre/post/dev segments are spelled when a version
//! is rendered. Parsing accepts every flavor regardless of the active one.

use crate::error::{Result, VersioningError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rendering flavor for version strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compat {
    /// PEP 440 spelling: `1.0.0rc1.post2.dev3`
    #[default]
    #[serde(alias = "pep-440", alias = "python")]
    Pep440,
    /// SemVer spelling: `1.0.0-rc.1.post.2.dev.3`
    Semver,
    /// Release numbers only: `1.0.0`
    Numeric,
}

impl Compat {
    /// Whether pre/post/dev segments can be expressed at all
    pub fn allows_release_classes(&self) -> bool {
        !matches!(self, Compat::Numeric)
    }
}

impl FromStr for Compat {
    type Err = VersioningError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pep440" | "pep-440" | "python" => Ok(Compat::Pep440),
            "semver" => Ok(Compat::Semver),
            "numeric" => Ok(Compat::Numeric),
            other => Err(VersioningError::config(format!(
                "Unknown compat flavor: '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Compat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compat::Pep440 => write!(f, "pep440"),
            Compat::Semver => write!(f, "semver"),
            Compat::Numeric => write!(f, "numeric"),
        }
    }
}
