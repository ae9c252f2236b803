//! # svn2git-batch
//!
//! Batch conversion of Subversion packages into individual git repositories.
//! The library holds the conversion pipeline; the `svn2git-batch` binary is a
//! thin command-line wrapper around it.
//!
//! ## Quick Example
//!
//! ```
//! use svn2git_batch::config::RunConfig;
//! use svn2git_batch::package::parse_package_list;
//!
//! let packages = parse_package_list("# core\nControl/AthenaKernel/trunk\n").unwrap();
//! assert_eq!(packages[0].as_str(), "Control/AthenaKernel");
//!
//! let config = RunConfig::default();
//! assert_eq!(
//!     config.log_path(&packages[0]).to_str(),
//!     Some("logs/atlasoff-git-Control-AthenaKernel.log.txt")
//! );
//! ```
//!
//! ## Core Concepts
//!
//! - **Packages (`package`)**: identifiers read from a package list.
//! - **Configuration (`config`)**: one `RunConfig` value per run, passed
//!   down explicitly; it derives every per-package path.
//! - **Scheduling (`scheduler`, `gate`, `aggregate`)**: one unit of work per
//!   package on a bounded pool, an admission gate that caps concurrent jobs,
//!   and an aggregator that waits for exactly one result per package.
//! - **Jobs (`job`, `mirror`)**: the per-package conversion procedure and
//!   the mirror synchronisation, both implementations of
//!   `scheduler::Worker`.
//! - **Tools (`vcs`, `git`, `logsink`)**: the external importer and git,
//!   behind a mockable trait, with output captured per job.
//! - **History rewriting (`rewrite`, `relocate`)**: per-ref filter-branch
//!   runs and the per-commit tree relocation they invoke.
//!
//! ## Execution Flow
//!
//! 1. **Input**: read the package list and build the `RunConfig`.
//! 2. **Dispatch**: the scheduler spawns one unit per package; each unit
//!    waits for an admission token before doing anything visible.
//! 3. **Convert**: each job skips already-converted packages, imports,
//!    lists refs, rewrites each ref and writes the status file.
//! 4. **Aggregate**: results are collected, failures re-reported, and the
//!    exit status decided.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod gate;
pub mod git;
pub mod job;
pub mod logsink;
pub mod mirror;
pub mod output;
pub mod package;
pub mod relocate;
pub mod rewrite;
pub mod scheduler;
pub mod vcs;
