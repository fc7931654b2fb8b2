pub mod orchestration;

pub use orchestration::{
    run_bump, run_changelog, run_info, BumpWorkflowArgs, ChangelogResult, ChangelogWorkflowArgs,
    InfoResult, InfoWorkflowArgs,
};
