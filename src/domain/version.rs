use crate::domain::compat::Compat;
use crate::domain::prerelease::{Phase, PreRelease};
use crate::domain::state::{self, Effect, ReleasePolicy, ReleaseState, Segment, Trigger};
use crate::error::{Result, VersioningError};
use once_cell::sync::OnceCell;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Accepts PEP 440 spellings (with the usual leniency) and the SemVer-like
/// `1.0.0-rc.1.post.2.dev.3` rendering.
const VERSION_PATTERN: &str = r"(?ix)
    ^\s*v?
    (?:(?P<epoch>[0-9]+)!)?
    (?P<release>[0-9]+(?:\.[0-9]+)*)
    (?P<pre>
        [-_.]?(?P<pre_l>alpha|a|beta|b|preview|pre|c|rc)[-_.]?(?P<pre_n>[0-9]+)?
    )?
    (?P<post>
        -(?P<post_n1>[0-9]+)
        |
        [-_.]?(?P<post_l>post|rev|r)[-_.]?(?P<post_n2>[0-9]+)?
    )?
    (?P<dev>
        [-_.]?dev[-_.]?(?P<dev_n>[0-9]+)?
    )?
    (?:\+(?P<local>[a-z0-9]+(?:[-_.][a-z0-9]+)*))?
    \s*$";

const LOCAL_PATTERN: &str = r"^[A-Za-z0-9]+(?:[-_.][A-Za-z0-9]+)*$";

static VERSION_RE: OnceCell<Regex> = OnceCell::new();
static LOCAL_RE: OnceCell<Regex> = OnceCell::new();

fn compiled(cell: &'static OnceCell<Regex>, pattern: &str) -> Result<&'static Regex> {
    cell.get_or_try_init(|| Regex::new(pattern))
        .map_err(|e| VersioningError::version(e.to_string()))
}

fn out_of_range(segment: &str) -> VersioningError {
    VersioningError::version(format!("{} number out of range", segment))
}

/// Next counter value
fn step(n: u64) -> Result<u64> {
    n.checked_add(1).ok_or_else(|| out_of_range("version"))
}

/// Version identifier with its release lifecycle
///
/// Owns the numeric segments plus the state machine position. The state is
/// always recoverable from `(pre, post, dev)`; every transition re-checks this.
#[derive(Debug, Clone)]
pub struct Version {
    epoch: u64,
    release: Vec<u64>,
    pre: Option<PreRelease>,
    post: Option<u64>,
    dev: Option<u64>,
    local: Option<String>,
    state: ReleaseState,
    policy: ReleasePolicy,
}

/// Ordering sentinel for optional segments
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Bound<T> {
    NegInf,
    Value(T),
    PosInf,
}

type CmpKey = (u64, Vec<u64>, Bound<PreRelease>, Bound<u64>, Bound<u64>);

impl Version {
    /// Create a final version `major.minor.micro` with the default policy
    pub fn new(major: u64, minor: u64, micro: u64) -> Self {
        Version {
            epoch: 0,
            release: vec![major, minor, micro],
            pre: None,
            post: None,
            dev: None,
            local: None,
            state: ReleaseState::Final,
            policy: ReleasePolicy::default(),
        }
    }

    /// Parse a version string with the default policy
    pub fn parse(s: &str) -> Result<Self> {
        Self::parse_with(s, ReleasePolicy::default())
    }

    /// Parse a version string under a release policy
    ///
    /// With `numeric` compat the string must not carry pre/post/dev segments.
    pub fn parse_with(s: &str, policy: ReleasePolicy) -> Result<Self> {
        let re = compiled(&VERSION_RE, VERSION_PATTERN)?;
        let caps = re
            .captures(s)
            .ok_or_else(|| VersioningError::version(format!("Invalid version: '{}'", s)))?;

        let number = |name: &str| -> Result<Option<u64>> {
            caps.name(name)
                .map(|m| {
                    m.as_str().parse::<u64>().map_err(|_| {
                        VersioningError::version(format!(
                            "Version number out of range: '{}'",
                            m.as_str()
                        ))
                    })
                })
                .transpose()
        };

        let epoch = number("epoch")?.unwrap_or(0);

        let mut release = Vec::new();
        if let Some(m) = caps.name("release") {
            for part in m.as_str().split('.') {
                let n = part.parse::<u64>().map_err(|_| {
                    VersioningError::version(format!("Invalid release number: '{}'", part))
                })?;
                release.push(n);
            }
        }

        let pre = match caps.name("pre_l") {
            Some(label) => Some(PreRelease::new(
                Phase::parse(label.as_str())?,
                number("pre_n")?.unwrap_or(0),
            )),
            None => None,
        };

        let post = if caps.name("post").is_some() {
            Some(number("post_n1")?.or(number("post_n2")?).unwrap_or(0))
        } else {
            None
        };

        let dev = if caps.name("dev").is_some() {
            Some(number("dev_n")?.unwrap_or(0))
        } else {
            None
        };

        let local = caps.name("local").map(|m| m.as_str().to_string());

        let version = Version {
            epoch,
            release,
            pre,
            post,
            dev,
            local,
            state: ReleaseState::derive(pre, post, dev),
            policy: ReleasePolicy::default(),
        };
        version.with_policy(policy)
    }

    /// Re-bind the version to another policy
    ///
    /// Release classes are switched off when the policy's compat is numeric,
    /// and a version that already carries such segments is rejected.
    pub fn with_policy(mut self, policy: ReleasePolicy) -> Result<Self> {
        let policy = policy.normalized();
        if !policy.compat.allows_release_classes()
            && (self.pre.is_some() || self.post.is_some() || self.dev.is_some())
        {
            return Err(VersioningError::version(format!(
                "'{}' carries pre/post/dev segments, which numeric versions cannot express",
                self.render(Compat::Pep440)
            )));
        }
        self.policy = policy;
        Ok(self)
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn release(&self) -> &[u64] {
        &self.release
    }

    pub fn major(&self) -> u64 {
        self.release_at(0)
    }

    pub fn minor(&self) -> u64 {
        self.release_at(1)
    }

    pub fn micro(&self) -> u64 {
        self.release_at(2)
    }

    fn release_at(&self, index: usize) -> u64 {
        self.release.get(index).copied().unwrap_or(0)
    }

    pub fn pre(&self) -> Option<PreRelease> {
        self.pre
    }

    pub fn post(&self) -> Option<u64> {
        self.post
    }

    pub fn dev(&self) -> Option<u64> {
        self.dev
    }

    pub fn local(&self) -> Option<&str> {
        self.local.as_deref()
    }

    pub fn state(&self) -> ReleaseState {
        self.state
    }

    pub fn policy(&self) -> &ReleasePolicy {
        &self.policy
    }

    /// First phase a new release cycle enters under this version's policy
    pub fn default_release_type(&self) -> ReleaseState {
        self.policy.default_release_type()
    }

    /// Advance to the next release phase
    ///
    /// From final or post this begins a new cycle, bumping `segment`
    /// (minor when `None`).
    pub fn start_release(&mut self, segment: Option<Segment>) -> Result<()> {
        self.fire(Trigger::StartRelease, segment.unwrap_or_default())
    }

    pub fn finish_release(&mut self) -> Result<()> {
        self.fire(Trigger::FinishRelease, Segment::default())
    }

    pub fn start_postrelease(&mut self) -> Result<()> {
        self.fire(Trigger::StartPostRelease, Segment::default())
    }

    /// Increment the counter of the active phase, or start a post-release
    /// from final
    pub fn bump_release(&mut self) -> Result<()> {
        self.fire(Trigger::BumpRelease, Segment::default())
    }

    pub fn bump_major(&mut self) -> Result<()> {
        self.fire(Trigger::BumpSegment, Segment::Major)
    }

    pub fn bump_minor(&mut self) -> Result<()> {
        self.fire(Trigger::BumpSegment, Segment::Minor)
    }

    pub fn bump_micro(&mut self) -> Result<()> {
        self.fire(Trigger::BumpSegment, Segment::Micro)
    }

    pub fn bump_epoch(&mut self) -> Result<()> {
        self.fire(Trigger::BumpEpoch, Segment::default())
    }

    /// Attach a build identifier as the local segment
    pub fn set_local(&mut self, local: &str) -> Result<()> {
        let re = compiled(&LOCAL_RE, LOCAL_PATTERN)?;
        if !re.is_match(local) {
            return Err(VersioningError::version(format!(
                "Invalid local version label: '{}'",
                local
            )));
        }
        self.local = Some(local.to_string());
        Ok(())
    }

    pub fn clear_local(&mut self) {
        self.local = None;
    }

    fn fire(&mut self, trigger: Trigger, segment: Segment) -> Result<()> {
        let post_development = if self.is_post_development() {
            state::lookup_post_development(trigger)
        } else {
            None
        };
        let Some(transition) =
            post_development.or_else(|| state::lookup(self.state, trigger, &self.policy))
        else {
            debug!(state = %self.state, ?trigger, "no transition matches, ignoring");
            return Ok(());
        };

        let source = self.state;
        let dest = match transition.effect {
            Effect::EnterPhase(phase) => self.entered_pre(phase).phase.into(),
            _ => transition.destination(source, &self.policy),
        };
        self.apply(transition.effect, segment, dest)?;
        if dest != source || transition.effect.resets_release() {
            self.local = None;
        }
        self.state = dest;

        let derived = ReleaseState::derive(self.pre, self.post, self.dev);
        if derived != self.state {
            return Err(VersioningError::invariant(format!(
                "state machine is in '{}' but segments of {} describe '{}'",
                self.state, self, derived
            )));
        }

        debug!(from = %source, to = %dest, ?trigger, version = %self, "transition applied");
        Ok(())
    }

    fn apply(&mut self, effect: Effect, segment: Segment, dest: ReleaseState) -> Result<()> {
        match effect {
            Effect::BeginDevelopment => {
                self.increment_release(segment)?;
                self.pre = None;
                self.post = None;
                self.dev = Some(0);
            }
            Effect::BeginPreRelease => {
                self.increment_release(segment)?;
                self.post = None;
                self.dev = None;
                self.pre = Some(PreRelease::start(Phase::Alpha));
            }
            Effect::EnterPhase(phase) => {
                self.pre = Some(self.entered_pre(phase));
                self.post = None;
                self.dev = None;
            }
            Effect::Finalize => {
                self.pre = None;
                self.post = None;
                self.dev = None;
            }
            Effect::BeginPostRelease => {
                self.pre = None;
                self.dev = None;
                self.post = Some(0);
            }
            Effect::IncrementCounter => match self.state {
                ReleaseState::Development => self.dev = self.dev.map(step).transpose()?,
                ReleaseState::Alpha | ReleaseState::Beta | ReleaseState::Candidate => {
                    self.pre = self
                        .pre
                        .map(|pre| pre.increment().ok_or_else(|| out_of_range("pre-release")))
                        .transpose()?
                }
                ReleaseState::Post => self.post = self.post.map(step).transpose()?,
                ReleaseState::Final => {}
            },
            Effect::BumpSegment => {
                self.increment_release(segment)?;
                self.pre = None;
                self.post = None;
                self.dev = None;
                match dest {
                    ReleaseState::Development => self.dev = Some(0),
                    ReleaseState::Alpha => self.pre = Some(PreRelease::start(Phase::Alpha)),
                    _ => {}
                }
            }
            Effect::BumpEpoch => {
                self.epoch = step(self.epoch)?;
                self.pre = None;
                self.post = None;
                self.dev = None;
            }
            Effect::CompleteDevelopment => self.dev = None,
        }
        Ok(())
    }

    fn is_post_development(&self) -> bool {
        self.post.is_some() && self.pre.is_none() && self.dev.is_some()
    }

    /// Pre-release reached when entering `phase`
    ///
    /// A dev release of a pre-release leads up to that same pre-release.
    fn entered_pre(&self, phase: Phase) -> PreRelease {
        match self.pre {
            Some(pre) if pre.phase >= phase && self.dev.is_some() => pre,
            _ => PreRelease::start(phase),
        }
    }

    /// Increment a release segment, zeroing the ones below it
    ///
    /// Fails without touching the tuple when the segment is already `u64::MAX`.
    fn increment_release(&mut self, segment: Segment) -> Result<()> {
        let index = match segment {
            Segment::Major => 0,
            Segment::Minor => 1,
            Segment::Micro => 2,
        };
        let current = self.release.get(index).copied().unwrap_or(0);
        let next = step(current)?;
        self.release.resize(3, 0);
        self.release[index] = next;
        for part in &mut self.release[index + 1..3] {
            *part = 0;
        }
        Ok(())
    }

    /// Copy carrying only the release tuple
    pub fn release_only(&self) -> Self {
        Version {
            epoch: 0,
            release: self.release.clone(),
            pre: None,
            post: None,
            dev: None,
            local: None,
            state: ReleaseState::Final,
            policy: self.policy,
        }
    }

    /// Render in a given flavor, independent of the policy's own compat
    pub fn render(&self, compat: Compat) -> String {
        let mut out = String::new();
        if self.epoch != 0 {
            out.push_str(&format!("{}!", self.epoch));
        }
        out.push_str(
            &self
                .release
                .iter()
                .map(|n| n.to_string())
                .collect::<Vec<_>>()
                .join("."),
        );

        match compat {
            Compat::Pep440 => {
                if let Some(pre) = self.pre {
                    out.push_str(&format!("{}{}", pre.phase.tag(compat), pre.number));
                }
                if let Some(post) = self.post {
                    out.push_str(&format!(".post{}", post));
                }
                if let Some(dev) = self.dev {
                    out.push_str(&format!(".dev{}", dev));
                }
            }
            Compat::Semver => {
                let identifiers = self.semver_identifiers();
                if !identifiers.is_empty() {
                    out.push('-');
                    out.push_str(&identifiers.join("."));
                }
            }
            Compat::Numeric => {}
        }

        if let Some(local) = &self.local {
            out.push('+');
            out.push_str(local);
        }
        out
    }

    fn semver_identifiers(&self) -> Vec<String> {
        let mut ids = Vec::new();
        if let Some(pre) = self.pre {
            ids.push(pre.phase.tag(Compat::Semver).to_string());
            ids.push(pre.number.to_string());
        }
        if let Some(post) = self.post {
            ids.push("post".to_string());
            ids.push(post.to_string());
        }
        if let Some(dev) = self.dev {
            ids.push("dev".to_string());
            ids.push(dev.to_string());
        }
        ids
    }

    /// Convert to a `semver::Version`
    pub fn to_semver(&self) -> Result<semver::Version> {
        if self.epoch != 0 {
            return Err(VersioningError::version(format!(
                "'{}' has an epoch, which SemVer cannot express",
                self
            )));
        }
        let mut version = semver::Version::new(self.major(), self.minor(), self.micro());
        let ids = self.semver_identifiers();
        if !ids.is_empty() {
            version.pre = semver::Prerelease::new(&ids.join("."))
                .map_err(|e| VersioningError::version(e.to_string()))?;
        }
        if let Some(local) = &self.local {
            version.build = semver::BuildMetadata::new(local)
                .map_err(|e| VersioningError::version(e.to_string()))?;
        }
        Ok(version)
    }

    /// Regex matching any textual spelling of this version
    pub fn query(&self) -> String {
        fn num(n: u64) -> String {
            if n == 0 {
                "0?".to_string()
            } else {
                n.to_string()
            }
        }

        let mut q = String::new();
        if self.epoch == 0 {
            q.push_str("(?:0!)?");
        } else {
            q.push_str(&format!("{}!", self.epoch));
        }
        q.push_str(
            &self
                .release
                .iter()
                .map(|n| n.to_string())
                .collect::<Vec<_>>()
                .join(r"\."),
        );
        if let Some(pre) = self.pre {
            q.push_str(&format!(
                r"[-_\.]?(?i:{})[-_\.]?{}",
                pre.phase.spellings(),
                num(pre.number)
            ));
        }
        if let Some(post) = self.post {
            q.push_str(&format!(
                r"(?:[-_\.]?(?i:post|rev|r)[-_\.]?{}|-{})",
                num(post),
                post
            ));
        }
        if let Some(dev) = self.dev {
            q.push_str(&format!(r"[-_\.]?(?i:dev)[-_\.]?{}", num(dev)));
        }
        if let Some(local) = &self.local {
            q.push_str(&format!(r"\+{}", regex::escape(local)));
        }
        q
    }

    fn cmp_key(&self) -> CmpKey {
        let mut release = self.release.clone();
        while release.last() == Some(&0) {
            release.pop();
        }

        let pre = match (self.pre, self.post, self.dev) {
            (None, None, Some(_)) => Bound::NegInf,
            (None, _, _) => Bound::PosInf,
            (Some(pre), _, _) => Bound::Value(pre),
        };
        let post = self.post.map_or(Bound::NegInf, Bound::Value);
        let dev = self.dev.map_or(Bound::PosInf, Bound::Value);

        (self.epoch, release, pre, post, dev)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(self.policy.compat))
    }
}

impl FromStr for Version {
    type Err = VersioningError;

    fn from_str(s: &str) -> Result<Self> {
        Version::parse(s)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp_key() == other.cmp_key()
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_key().cmp(&other.cmp_key())
    }
}
