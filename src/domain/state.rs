//! Release lifecycle state machine
//!
//! The lifecycle runs development -> alpha -> beta -> candidate -> final, with
//! an optional post-release phase after final. Transitions are kept in a flat
//! table keyed by (source state, trigger); the first row whose guard holds for
//! the active [`ReleasePolicy`] wins. A trigger with no matching row is a no-op.

use crate::domain::compat::Compat;
use crate::domain::prerelease::{Phase, PreRelease};
use crate::error::{Result, VersioningError};
use std::fmt;
use std::str::FromStr;

/// Release phase of a version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReleaseState {
    Development,
    Alpha,
    Beta,
    Candidate,
    Final,
    Post,
}

impl ReleaseState {
    /// Derive the state from the optional version segments
    ///
    /// A dev segment wins over everything, then pre, then post.
    pub fn derive(pre: Option<PreRelease>, post: Option<u64>, dev: Option<u64>) -> Self {
        if dev.is_some() {
            return ReleaseState::Development;
        }
        match (pre, post) {
            (Some(pre), _) => pre.phase.into(),
            (None, Some(_)) => ReleaseState::Post,
            (None, None) => ReleaseState::Final,
        }
    }

    pub const ALL: [ReleaseState; 6] = [
        ReleaseState::Development,
        ReleaseState::Alpha,
        ReleaseState::Beta,
        ReleaseState::Candidate,
        ReleaseState::Final,
        ReleaseState::Post,
    ];
}

impl From<Phase> for ReleaseState {
    fn from(phase: Phase) -> Self {
        match phase {
            Phase::Alpha => ReleaseState::Alpha,
            Phase::Beta => ReleaseState::Beta,
            Phase::Candidate => ReleaseState::Candidate,
        }
    }
}

impl fmt::Display for ReleaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReleaseState::Development => "development",
            ReleaseState::Alpha => "alpha",
            ReleaseState::Beta => "beta",
            ReleaseState::Candidate => "candidate",
            ReleaseState::Final => "final",
            ReleaseState::Post => "post",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for ReleaseState {
    type Err = VersioningError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(ReleaseState::Development),
            "alpha" => Ok(ReleaseState::Alpha),
            "beta" => Ok(ReleaseState::Beta),
            "candidate" | "release" | "rc" => Ok(ReleaseState::Candidate),
            "final" => Ok(ReleaseState::Final),
            "post" => Ok(ReleaseState::Post),
            other => Err(VersioningError::version(format!(
                "Unknown release state: '{}'",
                other
            ))),
        }
    }
}

/// Component of the release tuple targeted by a bump
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Segment {
    Major,
    #[default]
    Minor,
    Micro,
}

impl FromStr for Segment {
    type Err = VersioningError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "major" => Ok(Segment::Major),
            "minor" => Ok(Segment::Minor),
            "micro" | "patch" => Ok(Segment::Micro),
            other => Err(VersioningError::version(format!(
                "Unknown release segment: '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Major => write!(f, "major"),
            Segment::Minor => write!(f, "minor"),
            Segment::Micro => write!(f, "micro"),
        }
    }
}

/// Project-level switches that gate the lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleasePolicy {
    pub enable_devreleases: bool,
    pub enable_prereleases: bool,
    pub enable_postreleases: bool,
    /// Enter the default phase after a major/minor/micro bump instead of final
    pub autostart_default_release: bool,
    pub compat: Compat,
}

impl Default for ReleasePolicy {
    fn default() -> Self {
        ReleasePolicy {
            enable_devreleases: true,
            enable_prereleases: true,
            enable_postreleases: true,
            autostart_default_release: false,
            compat: Compat::Pep440,
        }
    }
}

impl ReleasePolicy {
    /// Policy with every release class turned off
    pub fn final_only() -> Self {
        ReleasePolicy {
            enable_devreleases: false,
            enable_prereleases: false,
            enable_postreleases: false,
            ..ReleasePolicy::default()
        }
    }

    /// Apply the flavor constraint: numeric versions carry no release classes
    pub fn normalized(mut self) -> Self {
        if !self.compat.allows_release_classes() {
            self.enable_devreleases = false;
            self.enable_prereleases = false;
            self.enable_postreleases = false;
        }
        self
    }

    /// First phase of a new release cycle
    pub fn default_release_type(&self) -> ReleaseState {
        if self.enable_devreleases {
            ReleaseState::Development
        } else if self.enable_prereleases {
            ReleaseState::Alpha
        } else {
            ReleaseState::Final
        }
    }
}

/// Events that drive the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Advance to the next phase, starting a new cycle from final/post
    StartRelease,
    FinishRelease,
    StartPostRelease,
    /// Increment the counter of the active phase
    BumpRelease,
    BumpSegment,
    BumpEpoch,
}

/// Where a transition lands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// Internal transition, state unchanged
    Stay,
    To(ReleaseState),
    /// The policy's default release type when autostart is on, else final
    DefaultPhase,
}

/// Mutation applied to the version segments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Bump the segment, clear pre/post, set dev=0
    BeginDevelopment,
    /// Bump the segment, clear post/dev, set pre=(alpha, 0)
    BeginPreRelease,
    /// Clear post/dev, set pre=(phase, 0)
    EnterPhase(Phase),
    /// Clear pre/post/dev
    Finalize,
    /// Clear pre/dev, set post=0
    BeginPostRelease,
    IncrementCounter,
    /// Bump the segment and clear every optional segment
    BumpSegment,
    /// Bump the epoch and clear pre/post/dev
    BumpEpoch,
    /// Clear dev, landing on the release it leads up to
    CompleteDevelopment,
}

impl Effect {
    /// Effects that rewrite the release tuple or epoch
    pub fn resets_release(&self) -> bool {
        matches!(
            self,
            Effect::BeginDevelopment
                | Effect::BeginPreRelease
                | Effect::BumpSegment
                | Effect::BumpEpoch
        )
    }
}

type Guard = fn(&ReleasePolicy) -> bool;

/// One row of the transition table
#[derive(Debug, Clone, Copy)]
pub struct Transition {
    pub trigger: Trigger,
    pub source: &'static [ReleaseState],
    pub dest: Destination,
    pub guard: Guard,
    pub effect: Effect,
}

impl Transition {
    /// Resolve the concrete destination for a source state
    pub fn destination(&self, source: ReleaseState, policy: &ReleasePolicy) -> ReleaseState {
        match self.dest {
            Destination::Stay => source,
            Destination::To(state) => state,
            Destination::DefaultPhase if policy.autostart_default_release => {
                policy.default_release_type()
            }
            Destination::DefaultPhase => ReleaseState::Final,
        }
    }
}

const FINAL_OR_POST: &[ReleaseState] = &[ReleaseState::Final, ReleaseState::Post];
const IN_PHASE: &[ReleaseState] = &[
    ReleaseState::Development,
    ReleaseState::Alpha,
    ReleaseState::Beta,
    ReleaseState::Candidate,
    ReleaseState::Post,
];
const ANY: &[ReleaseState] = &ReleaseState::ALL;

fn always(_: &ReleasePolicy) -> bool {
    true
}

fn dev_enabled(p: &ReleasePolicy) -> bool {
    p.enable_devreleases
}

fn pre_enabled(p: &ReleasePolicy) -> bool {
    p.enable_prereleases
}

fn post_enabled(p: &ReleasePolicy) -> bool {
    p.enable_postreleases
}

fn pre_without_dev(p: &ReleasePolicy) -> bool {
    p.enable_prereleases && !p.enable_devreleases
}

fn dev_and_pre(p: &ReleasePolicy) -> bool {
    p.enable_devreleases && p.enable_prereleases
}

fn dev_without_pre(p: &ReleasePolicy) -> bool {
    p.enable_devreleases && !p.enable_prereleases
}

fn post_only(p: &ReleasePolicy) -> bool {
    p.enable_postreleases && !p.enable_devreleases && !p.enable_prereleases
}

/// Transition table, searched top to bottom
pub const TRANSITIONS: &[Transition] = &[
    Transition {
        trigger: Trigger::StartRelease,
        source: FINAL_OR_POST,
        dest: Destination::To(ReleaseState::Development),
        guard: dev_enabled,
        effect: Effect::BeginDevelopment,
    },
    Transition {
        trigger: Trigger::StartRelease,
        source: FINAL_OR_POST,
        dest: Destination::To(ReleaseState::Alpha),
        guard: pre_without_dev,
        effect: Effect::BeginPreRelease,
    },
    Transition {
        trigger: Trigger::StartRelease,
        source: &[ReleaseState::Development],
        dest: Destination::To(ReleaseState::Alpha),
        guard: dev_and_pre,
        effect: Effect::EnterPhase(Phase::Alpha),
    },
    Transition {
        trigger: Trigger::StartRelease,
        source: &[ReleaseState::Development],
        dest: Destination::To(ReleaseState::Final),
        guard: dev_without_pre,
        effect: Effect::Finalize,
    },
    Transition {
        trigger: Trigger::StartRelease,
        source: &[ReleaseState::Alpha],
        dest: Destination::To(ReleaseState::Beta),
        guard: pre_enabled,
        effect: Effect::EnterPhase(Phase::Beta),
    },
    Transition {
        trigger: Trigger::StartRelease,
        source: &[ReleaseState::Beta],
        dest: Destination::To(ReleaseState::Candidate),
        guard: pre_enabled,
        effect: Effect::EnterPhase(Phase::Candidate),
    },
    Transition {
        trigger: Trigger::StartRelease,
        source: &[ReleaseState::Candidate],
        dest: Destination::To(ReleaseState::Final),
        guard: pre_enabled,
        effect: Effect::Finalize,
    },
    Transition {
        trigger: Trigger::FinishRelease,
        source: &[ReleaseState::Development],
        dest: Destination::To(ReleaseState::Final),
        guard: dev_without_pre,
        effect: Effect::Finalize,
    },
    Transition {
        trigger: Trigger::FinishRelease,
        source: &[ReleaseState::Candidate],
        dest: Destination::To(ReleaseState::Final),
        guard: pre_enabled,
        effect: Effect::Finalize,
    },
    Transition {
        trigger: Trigger::FinishRelease,
        source: &[ReleaseState::Post],
        dest: Destination::To(ReleaseState::Final),
        guard: post_only,
        effect: Effect::Finalize,
    },
    Transition {
        trigger: Trigger::StartPostRelease,
        source: &[ReleaseState::Final],
        dest: Destination::To(ReleaseState::Post),
        guard: post_enabled,
        effect: Effect::BeginPostRelease,
    },
    Transition {
        trigger: Trigger::BumpRelease,
        source: IN_PHASE,
        dest: Destination::Stay,
        guard: always,
        effect: Effect::IncrementCounter,
    },
    Transition {
        trigger: Trigger::BumpRelease,
        source: &[ReleaseState::Final],
        dest: Destination::To(ReleaseState::Post),
        guard: post_enabled,
        effect: Effect::BeginPostRelease,
    },
    Transition {
        trigger: Trigger::BumpSegment,
        source: ANY,
        dest: Destination::DefaultPhase,
        guard: always,
        effect: Effect::BumpSegment,
    },
    Transition {
        trigger: Trigger::BumpEpoch,
        source: ANY,
        dest: Destination::To(ReleaseState::Final),
        guard: always,
        effect: Effect::BumpEpoch,
    },
];

/// Rows for a dev release of a post-release (`1.0.0.post0.dev1`)
///
/// Both triggers land on the post-release itself, the next version above it.
pub const POST_DEVELOPMENT: &[Transition] = &[
    Transition {
        trigger: Trigger::StartRelease,
        source: &[ReleaseState::Development],
        dest: Destination::To(ReleaseState::Post),
        guard: always,
        effect: Effect::CompleteDevelopment,
    },
    Transition {
        trigger: Trigger::FinishRelease,
        source: &[ReleaseState::Development],
        dest: Destination::To(ReleaseState::Post),
        guard: always,
        effect: Effect::CompleteDevelopment,
    },
];

/// Find the post-development transition for a trigger, if it has one
pub fn lookup_post_development(trigger: Trigger) -> Option<&'static Transition> {
    POST_DEVELOPMENT.iter().find(|t| t.trigger == trigger)
}

/// Find the transition for a trigger fired from `state`
pub fn lookup(
    state: ReleaseState,
    trigger: Trigger,
    policy: &ReleasePolicy,
) -> Option<&'static Transition> {
    TRANSITIONS.iter().find(|t| {
        t.trigger == trigger && t.source.contains(&state) && (t.guard)(policy)
    })
}
