pub mod boundary;
pub mod changelog;
pub mod cli;
pub mod config;
pub mod controller;
pub mod domain;
pub mod error;
pub mod git;
pub mod template;
pub mod ui;

pub use error::{Result, VersioningError};
