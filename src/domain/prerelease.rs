//! Pre-release phases (alpha, beta, candidate) and their sequence numbers

use crate::domain::compat::Compat;
use crate::error::{Result, VersioningError};
use std::fmt;
use std::str::FromStr;

/// Pre-release phase, ordered alpha < beta < candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Alpha pre-release
    Alpha,
    /// Beta pre-release
    Beta,
    /// Release candidate
    Candidate,
}

impl Phase {
    /// Parse a phase from any accepted spelling
    ///
    /// Accepts: "a", "alpha", "b", "beta", "c", "rc", "pre", "preview" (case-insensitive)
    pub fn parse(s: &str) -> Result<Self> {
        s.parse()
    }

    /// Tag used when rendering in the given flavor
    pub fn tag(&self, compat: Compat) -> &'static str {
        match (self, compat) {
            (Phase::Alpha, Compat::Semver) => "alpha",
            (Phase::Beta, Compat::Semver) => "beta",
            (Phase::Alpha, _) => "a",
            (Phase::Beta, _) => "b",
            (Phase::Candidate, _) => "rc",
        }
    }

    /// Regex alternation matching every spelling of this phase, longest first
    pub fn spellings(&self) -> &'static str {
        match self {
            Phase::Alpha => "alpha|a",
            Phase::Beta => "beta|b",
            Phase::Candidate => "preview|pre|rc|c",
        }
    }
}

impl FromStr for Phase {
    type Err = VersioningError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "a" | "alpha" => Ok(Phase::Alpha),
            "b" | "beta" => Ok(Phase::Beta),
            "c" | "rc" | "pre" | "preview" => Ok(Phase::Candidate),
            _ => Err(VersioningError::version(format!(
                "Invalid pre-release identifier: '{}'",
                s
            ))),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Alpha => write!(f, "alpha"),
            Phase::Beta => write!(f, "beta"),
            Phase::Candidate => write!(f, "candidate"),
        }
    }
}

/// Pre-release segment: a phase plus its sequence number
///
/// Ordering compares the phase first and the number second, so
/// `a9 < b0 < rc0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PreRelease {
    pub phase: Phase,
    pub number: u64,
}

impl PreRelease {
    /// Create a new pre-release segment
    pub fn new(phase: Phase, number: u64) -> Self {
        PreRelease { phase, number }
    }

    /// First pre-release of a phase (`a0`, `b0`, `rc0`)
    pub fn start(phase: Phase) -> Self {
        PreRelease { phase, number: 0 }
    }

    /// Same phase, next sequence number; `None` once the number is exhausted
    pub fn increment(&self) -> Option<Self> {
        Some(PreRelease {
            phase: self.phase,
            number: self.number.checked_add(1)?,
        })
    }
}
