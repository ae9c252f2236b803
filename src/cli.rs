//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// svn2git-batch - Convert Subversion packages into git repositories in bulk
#[derive(Parser, Debug)]
#[command(name = "svn2git-batch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert packages from Subversion to git
    Convert(commands::convert::ConvertArgs),

    /// Fetch and push a list of git mirrors
    Mirror(commands::mirror::MirrorArgs),

    /// Move the current tree under a package prefix (run by git filter-branch)
    TreeFilter(commands::tree_filter::TreeFilterArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        match self.command {
            Commands::Convert(args) => commands::convert::execute(args, &self.color),
            Commands::Mirror(args) => commands::mirror::execute(args, &self.color),
            Commands::TreeFilter(args) => commands::tree_filter::execute(args),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    // A second initialisation (e.g. from tests) keeps the first logger.
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_secs()
        .format_target(false)
        .try_init();
}
