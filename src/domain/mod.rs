//! Domain logic - pure versioning rules independent of git and file I/O

pub mod commit;
pub mod compat;
pub mod prerelease;
pub mod state;
pub mod tag;
pub mod version;

pub use commit::{CommitClassification, CommitParser, Footer, IssueRef, Title, Trailer};
pub use compat::Compat;
pub use prerelease::{Phase, PreRelease};
pub use state::{ReleasePolicy, ReleaseState, Segment};
pub use tag::TagPattern;
pub use version::Version;
