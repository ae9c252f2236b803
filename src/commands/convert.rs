//! Convert command implementation
//!
//! Converts a batch of Subversion packages into git repositories. Packages
//! come from a list file (`-f`) or from the command line. Each package is a
//! unit of work run by the bounded scheduler; packages whose status file
//! exists are skipped, so an interrupted run can simply be restarted.

use anyhow::Result;
use clap::{Args, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use svn2git_batch::aggregate;
use svn2git_batch::config::{Bucket, RunConfig};
use svn2git_batch::job::ConvertJob;
use svn2git_batch::output::{Reporter, Status};
use svn2git_batch::package::{dedup_packages, read_package_list, PackageSpec};
use svn2git_batch::scheduler::Scheduler;

/// Layout of the package directories in rewritten history
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BucketArg {
    /// Files live under the package path
    None,
    /// Files live under Dir<outer>/Dir<inner>/<package path>
    Indexed,
}

impl From<BucketArg> for Bucket {
    fn from(bucket: BucketArg) -> Self {
        match bucket {
            BucketArg::None => Bucket::None,
            BucketArg::Indexed => Bucket::Indexed,
        }
    }
}

/// Arguments for the convert command
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Packages to convert (ignored when --file is given)
    #[arg(value_name = "PACKAGE")]
    pub packages: Vec<String>,

    /// Path to file containing packages to convert
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, value_name = "PATH", env = "SVN2GIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Maximum number of packages converted at the same time [default: 4]
    #[arg(
        short,
        long,
        value_name = "N",
        env = "SVN2GIT_JOBS",
        allow_negative_numbers = true
    )]
    pub jobs: Option<i64>,

    /// Base URL of the Subversion repository
    #[arg(long, value_name = "URL", env = "SVN2GIT_UPSTREAM")]
    pub upstream: Option<String>,

    /// Directory receiving the converted repositories
    #[arg(long, value_name = "PATH")]
    pub dest_root: Option<PathBuf>,

    /// Directory receiving per-package logs and status files
    #[arg(long, value_name = "PATH")]
    pub logs_dir: Option<PathBuf>,

    /// Directory layout of the rewritten history
    #[arg(long, value_enum, value_name = "SCHEME")]
    pub bucket: Option<BucketArg>,

    /// Echo importer and git output to the console
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl ConvertArgs {
    /// Builds the run configuration: config file first, then flags.
    fn run_config(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_file(path)?,
            None => RunConfig::default(),
        };
        if let Some(jobs) = self.jobs {
            config.jobs = super::concurrency_limit(jobs)?;
        }
        if let Some(upstream) = &self.upstream {
            config.upstream = upstream.clone();
        }
        if let Some(dest_root) = &self.dest_root {
            config.dest_root = dest_root.clone();
        }
        if let Some(logs_dir) = &self.logs_dir {
            config.logs_dir = logs_dir.clone();
        }
        if let Some(bucket) = self.bucket {
            config.bucket = bucket.into();
        }
        config.verbose |= self.verbose;
        config.validate()?;
        Ok(config)
    }

    fn package_list(&self) -> Result<Vec<PackageSpec>> {
        if let Some(path) = &self.file {
            return Ok(read_package_list(path)?);
        }
        let packages = self
            .packages
            .iter()
            .map(|raw| PackageSpec::new(raw))
            .collect::<svn2git_batch::error::Result<Vec<_>>>()?;
        Ok(dedup_packages(packages))
    }
}

/// Execute the convert command
pub fn execute(args: ConvertArgs, color_flag: &str) -> Result<()> {
    let start_time = Instant::now();
    let out = Reporter::new(color_flag, args.quiet);

    let config = args.run_config()?;
    let packages = args.package_list()?;
    let total = packages.len();
    let scheduler = Scheduler::new(config.jobs)?;

    out.status(
        Status::Start,
        &format!(
            "Converting {} package(s) with {} worker(s)",
            total,
            scheduler.limit()
        ),
    );
    log::debug!("packages: {:?}", packages);

    let job = ConvertJob::new(config)?;
    job.prepare_run()?;

    let progress = out.progress_bar(total, job.config().verbose);
    let dispatch = scheduler.dispatch(Arc::new(job), packages);
    let summary = aggregate::collect(dispatch, &progress);
    progress.finish_and_clear();

    let reports: Vec<_> = summary
        .results()
        .iter()
        .filter_map(|result| result.outcome.as_ref().ok())
        .collect();
    let skipped = reports.iter().filter(|report| report.skipped).count();
    let converted = reports.len() - skipped;
    let partial: Vec<_> = summary
        .results()
        .iter()
        .filter_map(|result| match &result.outcome {
            Ok(report) if !report.failed_refs.is_empty() => {
                Some((&result.item, &report.failed_refs))
            }
            _ => None,
        })
        .collect();

    for (package, refs) in &partial {
        log::warn!(
            "[{}]: history rewrite failed for {} ref(s): {}",
            package,
            refs.len(),
            refs.join(", ")
        );
    }

    if !summary.succeeded() {
        summary.report_failures();
        anyhow::bail!(
            "{} of {} package(s) failed ({:.2?})",
            total - reports.len(),
            total,
            start_time.elapsed()
        );
    }

    out.status(
        Status::Done,
        &format!(
            "Converted {} package(s), skipped {} already converted ({:.2?})",
            converted,
            skipped,
            start_time.elapsed()
        ),
    );
    if !partial.is_empty() {
        out.status(
            Status::Warn,
            &format!(
                "{} package(s) have refs that could not be rewritten, see their logs",
                partial.len()
            ),
        );
    }

    Ok(())
}
