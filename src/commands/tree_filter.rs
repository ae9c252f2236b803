//! Tree-filter command implementation
//!
//! Run by `git filter-branch --tree-filter` at every commit of a package's
//! history: moves the checked-out tree under the package prefix. The
//! command is silent on success because filter-branch runs it thousands of
//! times.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use svn2git_batch::relocate::{relocate, Relocation};

/// Arguments for the tree-filter command
#[derive(Args, Debug)]
pub struct TreeFilterArgs {
    /// Directory the files are moved under (e.g. Control/AthenaKernel)
    #[arg(value_name = "PREFIX")]
    pub prefix: PathBuf,

    /// Working tree to relocate (defaults to current directory)
    #[arg(short, long, value_name = "PATH")]
    pub dir: Option<PathBuf>,
}

/// Execute the tree-filter command
pub fn execute(args: TreeFilterArgs) -> Result<()> {
    let workdir = match args.dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("could not get current directory")?,
    };

    match relocate(&workdir, &args.prefix)? {
        Relocation::Moved(count) => log::debug!(
            "moved {} entries under [{}]",
            count,
            args.prefix.display()
        ),
        Relocation::Empty => log::debug!("[{}] has nothing to relocate", workdir.display()),
    }
    Ok(())
}
