//! # External Tool Seam
//!
//! Jobs never spawn processes directly; they go through the `VcsOperations`
//! trait. `GitOperations`, the default implementation, wraps the functions
//! in [`crate::git`]. Tests substitute mock implementations to simulate
//! importer failures, ref lists and rewrite failures without touching git.

use std::path::Path;

use crate::error::Result;
use crate::logsink::LogSink;

/// Operations a conversion or mirror job performs on a repository.
pub trait VcsOperations: Send + Sync {
    /// Imports the full upstream history into `dir` by running `argv`.
    fn import(&self, argv: &[String], dir: &Path, sink: &LogSink) -> Result<()>;

    /// Local branches as full ref names (`refs/heads/...`).
    fn list_branches(&self, dir: &Path, sink: &LogSink) -> Result<Vec<String>>;

    /// Tags as full ref names (`refs/tags/...`).
    fn list_tags(&self, dir: &Path, sink: &LogSink) -> Result<Vec<String>>;

    /// Whether the commit `ancestor` points to is reachable from `descendant`.
    fn is_ancestor(&self, dir: &Path, ancestor: &str, descendant: &str, sink: &LogSink)
        -> Result<bool>;

    /// Rewrites the history reachable from `reference`, running the shell
    /// command `tree_filter` at every commit.
    fn rewrite(&self, dir: &Path, reference: &str, tree_filter: &str, sink: &LogSink)
        -> Result<()>;

    /// Fetches every remote and tag.
    fn fetch_all(&self, dir: &Path, sink: &LogSink) -> Result<()>;

    /// Pushes all refs to `url`, deleting what `url` has that `dir` lacks.
    fn push_mirror(&self, dir: &Path, url: &str, sink: &LogSink) -> Result<()>;
}

/// `VcsOperations` backed by the system `git` and the configured importer.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitOperations;

impl VcsOperations for GitOperations {
    fn import(&self, argv: &[String], dir: &Path, sink: &LogSink) -> Result<()> {
        crate::git::run_import(argv, dir, sink)
    }

    fn list_branches(&self, dir: &Path, sink: &LogSink) -> Result<Vec<String>> {
        crate::git::list_branches(dir, sink)
    }

    fn list_tags(&self, dir: &Path, sink: &LogSink) -> Result<Vec<String>> {
        crate::git::list_tags(dir, sink)
    }

    fn is_ancestor(
        &self,
        dir: &Path,
        ancestor: &str,
        descendant: &str,
        sink: &LogSink,
    ) -> Result<bool> {
        crate::git::is_ancestor(dir, ancestor, descendant, sink)
    }

    fn rewrite(
        &self,
        dir: &Path,
        reference: &str,
        tree_filter: &str,
        sink: &LogSink,
    ) -> Result<()> {
        crate::git::filter_branch(dir, reference, tree_filter, sink)
    }

    fn fetch_all(&self, dir: &Path, sink: &LogSink) -> Result<()> {
        crate::git::fetch_all(dir, sink)
    }

    fn push_mirror(&self, dir: &Path, url: &str, sink: &LogSink) -> Result<()> {
        crate::git::push_mirror(dir, url, sink)
    }
}
