//! # Package Conversion Job
//!
//! `ConvertJob` converts one package per call, running these phases in
//! order. A failing phase ends the job with an error unless noted.
//!
//! 1. **Skip check**: a package whose status file exists is already
//!    converted and is reported as skipped without touching anything.
//! 2. **Workspace**: any stale package directory is removed and a fresh,
//!    empty one created.
//! 3. **Log file**: all later process output is captured in the package's
//!    log file (and echoed to the console in verbose mode).
//! 4. **Import**: the importer pulls the package's full history.
//! 5. **Refs**: branches, then tags, are listed from the new clone.
//! 6. **Rewrite**: each branch, then each tag, is rewritten so the package's
//!    files live under its prefix. Tags already reachable from a rewritten
//!    branch were moved along with it and are skipped. A failing ref is
//!    logged and recorded in the report but does not fail the job.
//! 7. **Mark**: the status file is written.

use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use log::{error, info};

use crate::config::RunConfig;
use crate::error::{Error, Result};
use crate::logsink::LogSink;
use crate::package::PackageSpec;
use crate::rewrite::{package_prefix, HistoryRewriter};
use crate::scheduler::Worker;
use crate::vcs::{GitOperations, VcsOperations};

/// Content of a status file. Only the file's existence is checked.
pub const MARKER_CONTENT: &str = "ok\n";

/// What a successful job did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobReport {
    /// The package was already converted by an earlier run.
    pub skipped: bool,
    pub branches: usize,
    pub tags: usize,
    /// Tags left alone because `--tag-name-filter cat` already moved them
    /// along with a rewritten branch.
    pub carried_tags: Vec<String>,
    /// Full names of the refs whose history rewrite failed.
    pub failed_refs: Vec<String>,
    pub elapsed: Duration,
}

/// Converts packages according to a `RunConfig`.
pub struct ConvertJob {
    config: RunConfig,
    tree_filter: Vec<String>,
    vcs: Box<dyn VcsOperations>,
}

impl ConvertJob {
    /// Creates a job runner that uses the system `git` and importer.
    pub fn new(config: RunConfig) -> Result<Self> {
        Self::with_operations(config, Box::new(GitOperations))
    }

    /// Creates a job runner with custom repository operations.
    pub fn with_operations(config: RunConfig, vcs: Box<dyn VcsOperations>) -> Result<Self> {
        config.validate()?;
        let tree_filter = config.tree_filter_argv()?;
        Ok(Self {
            config,
            tree_filter,
            vcs,
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Creates the directories shared by all jobs of a run.
    pub fn prepare_run(&self) -> Result<()> {
        for dir in [&self.config.logs_dir, &self.config.dest_root] {
            fs::create_dir_all(dir).map_err(|e| Error::Config {
                message: format!("could not create directory [{}]: {}", dir.display(), e),
                hint: None,
            })?;
        }
        Ok(())
    }

    /// Whether the package's status file exists.
    pub fn is_done(&self, spec: &PackageSpec) -> bool {
        self.config.marker_path(spec).is_file()
    }

    fn prepare_workspace(&self, dir: &Path) -> Result<()> {
        let workspace_error = |source| Error::Workspace {
            path: dir.to_path_buf(),
            source,
        };
        if dir.exists() {
            fs::remove_dir_all(dir).map_err(workspace_error)?;
        }
        fs::create_dir_all(dir).map_err(workspace_error)
    }

    fn list_refs(
        &self,
        spec: &PackageSpec,
        dir: &Path,
        sink: &LogSink,
    ) -> Result<(Vec<String>, Vec<String>)> {
        let log = self.config.log_path(spec);
        let listing_error = |kind: &str, e: Error| Error::RefListing {
            package: spec.to_string(),
            kind: kind.to_string(),
            log: log.clone(),
            message: e.to_string(),
        };
        let branches = self
            .vcs
            .list_branches(dir, sink)
            .map_err(|e| listing_error("branches", e))?;
        let tags = self
            .vcs
            .list_tags(dir, sink)
            .map_err(|e| listing_error("tags", e))?;
        Ok((branches, tags))
    }

    /// The first rewritten branch whose history contains `tag`.
    ///
    /// Rewriting a branch also rewrites the tags pointing into it; running
    /// the tree filter over such a tag again would relocate it twice.
    fn carrying_branch<'b>(
        &self,
        dir: &Path,
        tag: &str,
        rewritten_branches: &[&'b str],
        sink: &LogSink,
    ) -> Result<Option<&'b str>> {
        for branch in rewritten_branches {
            if self.vcs.is_ancestor(dir, tag, branch, sink)? {
                return Ok(Some(*branch));
            }
        }
        Ok(None)
    }

    fn write_marker(&self, spec: &PackageSpec) -> Result<()> {
        let path = self.config.marker_path(spec);
        fs::write(&path, MARKER_CONTENT).map_err(|source| Error::Marker { path, source })
    }
}

fn ref_failed(
    spec: &PackageSpec,
    reference: &str,
    error: &Error,
    sink: &LogSink,
    failed_refs: &mut Vec<String>,
) {
    error!(
        "could not run tree-filter for package [{}] and ref [{}]: {}",
        spec, reference, error
    );
    sink.note(&format!("**error**: {}", error));
    failed_refs.push(reference.to_string());
}

impl Worker for ConvertJob {
    type Item = PackageSpec;
    type Output = JobReport;

    fn execute(&self, spec: &PackageSpec, index: usize, total: usize) -> Result<JobReport> {
        let start = Instant::now();
        info!("[{:04}/{:04}] converting [{}]...", index, total, spec);

        if self.is_done(spec) {
            info!(
                "[{:04}/{:04}] converting [{}]... already done ({:?})",
                index,
                total,
                spec,
                start.elapsed()
            );
            return Ok(JobReport {
                skipped: true,
                elapsed: start.elapsed(),
                ..JobReport::default()
            });
        }

        let dir = self.config.package_dir(spec);
        self.prepare_workspace(&dir).inspect_err(|e| {
            error!("could not create directory [{}]: {}", dir.display(), e);
        })?;

        let log = self.config.log_path(spec);
        let sink = LogSink::create(&log, self.config.verbose).inspect_err(|e| {
            error!("could not create log-file [{}]: {}", log.display(), e);
        })?;

        self.vcs
            .import(&self.config.import_argv(spec), &dir, &sink)
            .map_err(|e| {
                error!("could not import package [{}]: {}", spec, e);
                Error::Import {
                    package: spec.to_string(),
                    log: log.clone(),
                    message: e.to_string(),
                }
            })?;

        let (branches, tags) = self.list_refs(spec, &dir, &sink).inspect_err(|e| {
            error!("{}", e);
        })?;

        let prefix = package_prefix(&self.config, spec, index);
        let rewriter = HistoryRewriter::new(self.vcs.as_ref(), &self.tree_filter);
        let mut failed_refs = Vec::new();
        let mut rewritten_branches = Vec::new();
        for branch in &branches {
            match rewriter.rewrite(&dir, branch, &prefix, &sink) {
                Ok(()) => rewritten_branches.push(branch.as_str()),
                Err(e) => ref_failed(spec, branch, &e, &sink, &mut failed_refs),
            }
        }

        let mut carried_tags = Vec::new();
        for tag in &tags {
            match self.carrying_branch(&dir, tag, &rewritten_branches, &sink) {
                Ok(Some(branch)) => {
                    sink.note(&format!("### [{}] already rewritten with [{}]", tag, branch));
                    carried_tags.push(tag.clone());
                }
                Ok(None) => {
                    if let Err(e) = rewriter.rewrite(&dir, tag, &prefix, &sink) {
                        ref_failed(spec, tag, &e, &sink, &mut failed_refs);
                    }
                }
                Err(e) => ref_failed(spec, tag, &e, &sink, &mut failed_refs),
            }
        }

        self.write_marker(spec).inspect_err(|e| {
            error!("{}", e);
        })?;

        let elapsed = start.elapsed();
        info!(
            "[{:04}/{:04}] converting [{}]... ({:?})",
            index, total, spec, elapsed
        );
        Ok(JobReport {
            skipped: false,
            branches: branches.len(),
            tags: tags.len(),
            carried_tags,
            failed_refs,
            elapsed,
        })
    }
}
