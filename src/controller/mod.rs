//! Release controller: turns a classified commit into a new version and
//! drives the file, commit and tag collaborators

pub mod decision;
pub mod release_controller;

pub use decision::{decide_bump, BumpPolicy};
pub use release_controller::{BumpOptions, BumpOutcome, ChangelogReport, ReleaseController};
