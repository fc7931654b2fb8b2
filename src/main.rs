use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use git_version_bump::cli::{self, BumpWorkflowArgs, ChangelogWorkflowArgs, InfoWorkflowArgs};
use git_version_bump::controller::BumpOptions;
use git_version_bump::domain::Segment;
use git_version_bump::ui;

/// Environment variable overriding the log filter
const LOG_ENV: &str = "GIT_VERSION_BUMP_LOG";

#[derive(Parser)]
#[command(
    name = "git-version-bump",
    version,
    about = "Bump project versions from conventional commit messages"
)]
struct Args {
    #[arg(short, long, global = true, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(short, long, global = true, action = clap::ArgAction::Count, help = "Increase log verbosity")]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Bump the version according to a commit message
    Bump {
        #[arg(long, help = "Commit the updated files")]
        commit: bool,

        #[arg(long, help = "Create an annotated tag for the new version")]
        tag: bool,

        #[arg(long, value_name = "NAME", help = "Tag name, overriding tag_format")]
        tag_name: Option<String>,

        #[arg(short, long, help = "Commit message to classify instead of HEAD's")]
        message: Option<String>,

        #[arg(long, help = "Build identifier attached as local version segment")]
        build: Option<String>,

        #[arg(long, help = "Advance to the next release phase")]
        release: bool,

        #[arg(long, help = "Segment bumped when a new release starts (major, minor, micro)")]
        segment: Option<Segment>,

        #[arg(long, help = "Push the commit and tag to the remote")]
        push: bool,

        #[arg(long, default_value = "origin", help = "Remote to push to")]
        remote: String,

        #[arg(long, help = "Preview what would happen without making changes")]
        dry_run: bool,
    },

    /// Show the current version
    #[command(visible_alias = "view")]
    Info {
        #[arg(long, help = "Show the release tuple only")]
        release: bool,

        #[arg(long, help = "List the files whose version is managed")]
        filepaths: bool,
    },

    /// Prepend release notes for the commits since a tag
    Changelog {
        #[arg(long, value_name = "TAG", help = "Tag to start from (default: current version's tag)")]
        since: Option<String>,

        #[arg(short, long, help = "Changelog file (default: CHANGELOG.md)")]
        output: Option<PathBuf>,

        #[arg(long, help = "Print the release notes instead of writing them")]
        dry_run: bool,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(args: Args) -> Result<()> {
    match args.command {
        Command::Bump {
            commit,
            tag,
            tag_name,
            message,
            build,
            release,
            segment,
            push,
            remote,
            dry_run,
        } => {
            let workflow = BumpWorkflowArgs {
                config_path: args.config,
                options: BumpOptions {
                    message,
                    commit,
                    tag,
                    tag_name,
                    build,
                    release,
                    segment,
                    push,
                    remote,
                    dry_run,
                },
            };
            if dry_run {
                ui::display_status("Dry run, no changes will be made");
            }
            let (outcome, root) = cli::run_bump(&workflow)?;
            ui::display_outcome(&outcome, &root, dry_run);
        }

        Command::Info { release, filepaths } => {
            let result = cli::run_info(&InfoWorkflowArgs {
                config_path: args.config,
                release,
                filepaths,
            })?;
            println!("{}", result.version);
            if filepaths {
                ui::display_filepaths(&result.filepaths, &result.root);
            }
        }

        Command::Changelog {
            since,
            output,
            dry_run,
        } => {
            let result = cli::run_changelog(&ChangelogWorkflowArgs {
                config_path: args.config,
                since,
                output,
                dry_run,
            })?;
            for warning in &result.warnings {
                ui::display_boundary_warning(warning);
            }
            match &result.written {
                Some(path) => ui::display_success(&format!("Updated {}", path.display())),
                None => print!("{}", result.block),
            }
        }
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args) {
        ui::display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
