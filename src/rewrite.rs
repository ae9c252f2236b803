//! # History Rewriting
//!
//! Relocates a package's files in the history of one ref. The rewrite runs
//! `git filter-branch --tree-filter`, which checks out every commit reachable
//! from the ref and runs the tree filter (by default this program's
//! `tree-filter` subcommand, see [`crate::relocate`]) with the package
//! prefix as its argument. Commit metadata and ref names are kept; tags are
//! carried over with `--tag-name-filter cat`.
//!
//! The prefix is either the package path itself or, with indexed bucketing,
//! `Dir<outer>/Dir<inner>/<package>` so that no directory of the combined
//! tree ends up with thousands of entries.

use std::path::{Path, PathBuf};

use crate::config::{Bucket, RunConfig};
use crate::error::{Error, Result};
use crate::git::shell_join;
use crate::logsink::LogSink;
use crate::package::PackageSpec;
use crate::vcs::VcsOperations;

/// Directory bucket for the package at 1-based position `index`.
///
/// Each inner bucket holds `fanout` packages and each outer bucket holds
/// `fanout` inner buckets: with a fanout of 100, packages 1–100 land in
/// `Dir1/Dir01`, 101–200 in `Dir1/Dir02`, and 10001 in `Dir2/Dir01`.
pub fn bucket_dir(index: usize, fanout: usize) -> PathBuf {
    let fanout = fanout.max(1);
    let group = index.saturating_sub(1) / fanout;
    let outer = group / fanout + 1;
    let inner = group % fanout + 1;
    PathBuf::from(format!("Dir{}", outer)).join(format!("Dir{:02}", inner))
}

/// Path under which the package's files are placed in rewritten history.
pub fn package_prefix(config: &RunConfig, spec: &PackageSpec, index: usize) -> PathBuf {
    let base = match config.bucket {
        Bucket::None => PathBuf::new(),
        Bucket::Indexed => bucket_dir(index, config.bucket_fanout),
    };
    spec.segments().fold(base, |dir, segment| dir.join(segment))
}

/// Rewrites refs of one clone.
pub struct HistoryRewriter<'a> {
    vcs: &'a dyn VcsOperations,
    tree_filter: &'a [String],
}

impl<'a> HistoryRewriter<'a> {
    /// `tree_filter` is the filter argv without the prefix argument.
    pub fn new(vcs: &'a dyn VcsOperations, tree_filter: &'a [String]) -> Self {
        Self { vcs, tree_filter }
    }

    /// The shell command filter-branch runs at each commit.
    pub fn filter_command(&self, prefix: &Path) -> String {
        let mut argv: Vec<String> = self.tree_filter.to_vec();
        argv.push(prefix.to_string_lossy().into_owned());
        shell_join(&argv)
    }

    /// Rewrites every commit reachable from `reference` so its files live
    /// under `prefix`.
    pub fn rewrite(
        &self,
        clone: &Path,
        reference: &str,
        prefix: &Path,
        sink: &LogSink,
    ) -> Result<()> {
        sink.note(&format!(
            "### relocating [{}] under [{}]...",
            reference,
            prefix.display()
        ));
        self.vcs
            .rewrite(clone, reference, &self.filter_command(prefix), sink)
            .map_err(|e| Error::Rewrite {
                reference: reference.to_string(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_dir_boundaries() {
        assert_eq!(bucket_dir(1, 100), PathBuf::from("Dir1/Dir01"));
        assert_eq!(bucket_dir(100, 100), PathBuf::from("Dir1/Dir01"));
        assert_eq!(bucket_dir(101, 100), PathBuf::from("Dir1/Dir02"));
        assert_eq!(bucket_dir(10_000, 100), PathBuf::from("Dir1/Dir100"));
        assert_eq!(bucket_dir(10_001, 100), PathBuf::from("Dir2/Dir01"));
    }

    #[test]
    fn test_bucket_dir_small_fanout() {
        assert_eq!(bucket_dir(1, 2), PathBuf::from("Dir1/Dir01"));
        assert_eq!(bucket_dir(3, 2), PathBuf::from("Dir1/Dir02"));
        assert_eq!(bucket_dir(5, 2), PathBuf::from("Dir2/Dir01"));
        // A zero fanout is treated as one package per bucket.
        assert_eq!(bucket_dir(2, 0), PathBuf::from("Dir2/Dir01"));
    }

    #[test]
    fn test_package_prefix() {
        let spec = PackageSpec::new("Control/AthenaKernel").unwrap();
        let plain = RunConfig::default();
        assert_eq!(
            package_prefix(&plain, &spec, 7),
            PathBuf::from("Control/AthenaKernel")
        );

        let indexed = RunConfig {
            bucket: Bucket::Indexed,
            ..RunConfig::default()
        };
        assert_eq!(
            package_prefix(&indexed, &spec, 7),
            PathBuf::from("Dir1/Dir01/Control/AthenaKernel")
        );
    }

    #[test]
    fn test_filter_command_quotes_arguments() {
        let filter = vec!["/opt/svn tools/svn2git-batch".to_string(), "tree-filter".to_string()];
        let vcs = crate::vcs::GitOperations;
        let rewriter = HistoryRewriter::new(&vcs, &filter);
        assert_eq!(
            rewriter.filter_command(Path::new("Control/AthenaKernel")),
            "'/opt/svn tools/svn2git-batch' tree-filter Control/AthenaKernel"
        );
    }
}
