//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `svn2git-batch` command-line tool. Each subcommand is defined in its own
//! file.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic by calling into the `svn2git_batch` library.

pub mod completions;
pub mod convert;
pub mod mirror;
pub mod tree_filter;

use anyhow::{bail, Result};

/// Turns a `--jobs` value into a concurrency limit.
///
/// Zero and negative values are configuration errors, reported before any
/// work is dispatched.
pub(crate) fn concurrency_limit(jobs: i64) -> Result<usize> {
    if jobs <= 0 {
        bail!("invalid number of workers ({})", jobs);
    }
    Ok(usize::try_from(jobs)?)
}
