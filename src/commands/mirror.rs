//! Mirror command implementation
//!
//! Synchronises a list of git mirrors: each local clone fetches all of its
//! remotes and tags, then pushes everything to its mirror URL.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use svn2git_batch::aggregate;
use svn2git_batch::mirror::{read_mirror_list, MirrorJob};
use svn2git_batch::output::{Reporter, Status};
use svn2git_batch::scheduler::Scheduler;

/// Arguments for the mirror command
#[derive(Args, Debug)]
pub struct MirrorArgs {
    /// Path to JSON file containing the list of mirrors to sync
    #[arg(short, long, value_name = "PATH", default_value = "mirrors.json")]
    pub file: PathBuf,

    /// Maximum number of mirrors synchronised at the same time
    #[arg(
        short,
        long,
        value_name = "N",
        default_value_t = 4,
        allow_negative_numbers = true
    )]
    pub jobs: i64,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the mirror command
pub fn execute(args: MirrorArgs, color_flag: &str) -> Result<()> {
    let start_time = Instant::now();
    let out = Reporter::new(color_flag, args.quiet);

    let scheduler = Scheduler::new(super::concurrency_limit(args.jobs)?)?;
    let mirrors = read_mirror_list(&args.file)?;
    let total = mirrors.len();

    out.status(
        Status::Start,
        &format!(
            "Syncing {} mirror(s) with {} worker(s)",
            total,
            scheduler.limit()
        ),
    );

    // Git output is echoed to the console, which a progress bar would garble.
    let progress = out.progress_bar(total, true);
    let dispatch = scheduler.dispatch(Arc::new(MirrorJob::new()), mirrors);
    let summary = aggregate::collect(dispatch, &progress);
    progress.finish_and_clear();

    if !summary.succeeded() {
        summary.report_failures();
        anyhow::bail!(
            "{} of {} mirror(s) failed ({:.2?})",
            summary.failures().count() + summary.missing(),
            total,
            start_time.elapsed()
        );
    }

    out.status(
        Status::Done,
        &format!("Synced {} mirror(s) ({:.2?})", total, start_time.elapsed()),
    );
    Ok(())
}
