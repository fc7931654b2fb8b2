use crate::config::ParserConfig;
use crate::domain::{CommitClassification, Segment, Version};
use crate::error::{Result, VersioningError};
use tracing::debug;

/// Inputs to a bump decision besides the commit itself
#[derive(Debug, Clone, Default)]
pub struct BumpPolicy {
    /// Types that increment the active phase counter
    pub release_types: Vec<String>,
    /// Caller asked to advance the release phase
    pub release: bool,
    /// Segment bumped when a new release cycle starts
    pub segment: Option<Segment>,
    /// Build identifier attached as the local segment
    pub build: Option<String>,
}

impl BumpPolicy {
    pub fn from_config(parser: &ParserConfig) -> Self {
        BumpPolicy {
            release_types: parser.types.clone(),
            ..BumpPolicy::default()
        }
    }

    pub fn release(mut self, release: bool) -> Self {
        self.release = release;
        self
    }

    pub fn segment(mut self, segment: Option<Segment>) -> Self {
        self.segment = segment;
        self
    }

    pub fn build(mut self, build: Option<String>) -> Self {
        self.build = build;
        self
    }

    fn is_release_type(&self, commit_type: &str) -> bool {
        self.release_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(commit_type))
    }
}

/// Decide the next version for a classified commit
///
/// Precedence, highest first:
/// 1. breaking marker or breaking-change footer: major bump
/// 2. release intent (`policy.release` or type `release`): next release phase
/// 3. `feat`: minor bump, `fix`: micro bump
/// 4. a configured release type: in-phase counter bump
///
/// `current` is never touched; the decision works on a copy.
pub fn decide_bump(
    classification: &CommitClassification,
    current: &Version,
    policy: &BumpPolicy,
) -> Result<Version> {
    let mut next = current.clone();
    let commit_type = classification.commit_type().map(|t| t.to_ascii_lowercase());

    match commit_type.as_deref() {
        _ if classification.is_breaking() => next.bump_major()?,
        _ if policy.release => next.start_release(policy.segment)?,
        Some("release") => next.start_release(policy.segment)?,
        Some("feat") => next.bump_minor()?,
        Some("fix") => next.bump_micro()?,
        Some(t) if policy.is_release_type(t) => next.bump_release()?,
        other => {
            return Err(VersioningError::UnsupportedCommitType(
                other.unwrap_or("(none)").to_string(),
            ))
        }
    }

    if let Some(build) = &policy.build {
        next.set_local(build)?;
    }

    if next.to_string() == current.to_string() {
        return Err(VersioningError::NoVersionChange(format!(
            "{} would stay {}",
            classification.title.description, current
        )));
    }

    debug!(from = %current, to = %next, "bump decided");
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CommitParser, ReleasePolicy};

    fn classify(message: &str) -> CommitClassification {
        CommitParser::default().parse(message).unwrap()
    }

    fn policy() -> BumpPolicy {
        BumpPolicy::from_config(&ParserConfig::default())
    }

    fn decide(message: &str, version: &str) -> Result<Version> {
        decide_bump(&classify(message), &Version::parse(version).unwrap(), &policy())
    }

    #[test]
    fn test_fix_bumps_micro() {
        assert_eq!(decide("fix: repair bug", "1.2.3").unwrap().to_string(), "1.2.4");
    }

    #[test]
    fn test_feat_bumps_minor() {
        assert_eq!(decide("feat: add thing", "1.2.3").unwrap().to_string(), "1.3.0");
    }

    #[test]
    fn test_breaking_footer_bumps_major_regardless_of_type() {
        let message = "docs: rewrite\n\nBREAKING CHANGE: manual pages moved";
        assert_eq!(decide(message, "1.2.3").unwrap().to_string(), "2.0.0");
        assert_eq!(decide("chore!: drop python 2", "1.2.3").unwrap().to_string(), "2.0.0");
    }

    #[test]
    fn test_breaking_paragraph_before_trailers_bumps_major() {
        let message = "feat: x\n\nBREAKING CHANGE: api gone\n\nSigned-off-by: A Dev <a@dev.io>";
        assert_eq!(decide(message, "1.2.3").unwrap().to_string(), "2.0.0");
    }

    #[test]
    fn test_breaking_wins_over_release_intent() {
        let next = decide_bump(
            &classify("feat!: new api"),
            &Version::parse("1.2.3").unwrap(),
            &policy().release(true),
        )
        .unwrap();
        assert_eq!(next.to_string(), "2.0.0");
    }

    #[test]
    fn test_release_intent_wins_over_type() {
        let next = decide_bump(
            &classify("fix: small thing"),
            &Version::parse("1.2.3").unwrap(),
            &policy().release(true),
        )
        .unwrap();
        assert_eq!(next.to_string(), "1.3.0.dev0");

        assert_eq!(decide("release: cut it", "1.3.0.dev4").unwrap().to_string(), "1.3.0a0");
    }

    #[test]
    fn test_release_segment() {
        let next = decide_bump(
            &classify("release: next"),
            &Version::parse("1.2.3").unwrap(),
            &policy().segment(Some(Segment::Major)),
        )
        .unwrap();
        assert_eq!(next.to_string(), "2.0.0.dev0");
    }

    #[test]
    fn test_release_type_bumps_counter() {
        assert_eq!(decide("ci: tweak", "1.2.3").unwrap().to_string(), "1.2.3.post0");
        assert_eq!(decide("refactor: tidy", "1.3.0a1").unwrap().to_string(), "1.3.0a2");
    }

    #[test]
    fn test_unsupported_type() {
        let err = decide("wip: stuff", "1.2.3").unwrap_err();
        assert!(matches!(err, VersioningError::UnsupportedCommitType(t) if t == "wip"));

        let err = decide("Merge branch 'main'", "1.2.3").unwrap_err();
        assert!(matches!(err, VersioningError::UnsupportedCommitType(t) if t == "(none)"));
    }

    #[test]
    fn test_no_version_change() {
        let current = Version::parse_with("1.2.3", ReleasePolicy::final_only()).unwrap();
        let err = decide_bump(&classify("ci: noop"), &current, &policy()).unwrap_err();
        assert!(matches!(err, VersioningError::NoVersionChange(_)));
    }

    #[test]
    fn test_build_attached_after_decision() {
        let next = decide_bump(
            &classify("fix: bug"),
            &Version::parse("1.2.3").unwrap(),
            &policy().build(Some("ci.7".to_string())),
        )
        .unwrap();
        assert_eq!(next.to_string(), "1.2.4+ci.7");
    }

    #[test]
    fn test_build_only_change_counts_as_change() {
        let current = Version::parse_with("1.2.3", ReleasePolicy::final_only()).unwrap();
        let next = decide_bump(
            &classify("ci: rebuild"),
            &current,
            &policy().build(Some("b2".to_string())),
        )
        .unwrap();
        assert_eq!(next.to_string(), "1.2.3+b2");
    }

    #[test]
    fn test_decision_leaves_current_untouched() {
        let current = Version::parse("1.2.3").unwrap();
        let c = classify("feat: x");
        let first = decide_bump(&c, &current, &policy()).unwrap();
        let second = decide_bump(&c, &current, &policy()).unwrap();
        assert_eq!(first.to_string(), second.to_string());
        assert_eq!(current.to_string(), "1.2.3");
    }
}
