//! # Run Configuration
//!
//! `RunConfig` holds every setting a conversion run needs: where the upstream
//! Subversion repository lives, where package clones, logs and status files
//! go, how many conversions may run at once, and which external commands to
//! invoke. It is built once by the command-line layer (optionally from a YAML
//! file, then overridden by flags) and passed by reference into the scheduler
//! and every job. There is no process-wide configuration state.
//!
//! ## Example file
//!
//! ```yaml
//! upstream: file:///data/svn/atlasoff
//! dest_root: atlasoff-git
//! logs_dir: logs
//! jobs: 8
//! bucket: indexed
//! import_command: ["go-svn2git", "-verbose", "-revision", "1", "{url}"]
//! ```
//!
//! ## Derived paths
//!
//! For a package `Control/AthenaKernel` and the defaults above:
//!
//! - clone: `atlasoff-git/Control/AthenaKernel`
//! - log: `logs/atlasoff-git-Control-AthenaKernel.log.txt`
//! - status marker: `logs/atlasoff-git-Control-AthenaKernel.status`

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::package::PackageSpec;

/// Placeholder replaced by the package source URL in `import_command`.
pub const URL_PLACEHOLDER: &str = "{url}";

/// Layout used to place a package's files inside its rewritten history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    /// Files go directly under the package path.
    #[default]
    None,
    /// Files go under `Dir<outer>/Dir<inner>/<package>`, derived from the
    /// package's position in the input list.
    Indexed,
}

/// Settings for one conversion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Base URL of the upstream Subversion repository.
    pub upstream: String,
    /// Directory that receives one git clone per package.
    pub dest_root: PathBuf,
    /// Directory for per-package log and status files.
    pub logs_dir: PathBuf,
    /// Maximum number of conversions running at once.
    pub jobs: usize,
    /// Copy external tool output to the console as well as the log files.
    pub verbose: bool,
    /// Importer argv; `{url}` is replaced by the package source URL.
    pub import_command: Vec<String>,
    /// Command run by `git filter-branch --tree-filter`, before the prefix
    /// argument. Defaults to this executable's `tree-filter` subcommand.
    pub tree_filter: Option<Vec<String>>,
    /// Directory bucketing scheme for rewritten history.
    pub bucket: Bucket,
    /// Entries per bucket level when `bucket` is `indexed`.
    pub bucket_fanout: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            upstream: "file:///data/svn".to_string(),
            dest_root: PathBuf::from("atlasoff-git"),
            logs_dir: PathBuf::from("logs"),
            jobs: 4,
            verbose: false,
            import_command: vec![
                "go-svn2git".to_string(),
                "-verbose".to_string(),
                "-revision".to_string(),
                "1".to_string(),
                URL_PLACEHOLDER.to_string(),
            ],
            tree_filter: None,
            bucket: Bucket::None,
            bucket_fanout: 100,
        }
    }
}

impl RunConfig {
    /// Loads a configuration file; missing keys take their default values.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("could not read configuration [{}]: {}", path.display(), e),
            hint: None,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Rejects settings that would make every job fail or never start.
    pub fn validate(&self) -> Result<()> {
        if self.jobs == 0 {
            return Err(Error::Config {
                message: format!("invalid number of workers ({})", self.jobs),
                hint: Some("use --jobs with a value of at least 1".to_string()),
            });
        }
        if self.import_command.is_empty() {
            return Err(Error::Config {
                message: "import_command is empty".to_string(),
                hint: None,
            });
        }
        if self.bucket == Bucket::Indexed && self.bucket_fanout == 0 {
            return Err(Error::config("bucket_fanout must be at least 1"));
        }
        if let Some(filter) = &self.tree_filter {
            if filter.is_empty() {
                return Err(Error::config("tree_filter is empty"));
            }
        }
        Ok(())
    }

    /// Working directory of the package clone.
    pub fn package_dir(&self, spec: &PackageSpec) -> PathBuf {
        spec.segments()
            .fold(self.dest_root.clone(), |dir, segment| dir.join(segment))
    }

    /// Per-package log file.
    pub fn log_path(&self, spec: &PackageSpec) -> PathBuf {
        self.logs_dir
            .join(format!("{}.log.txt", self.flat_package_name(spec)))
    }

    /// Completion marker; its existence means the package is converted.
    pub fn marker_path(&self, spec: &PackageSpec) -> PathBuf {
        self.logs_dir
            .join(format!("{}.status", self.flat_package_name(spec)))
    }

    /// Upstream location the importer reads the package from.
    pub fn source_url(&self, spec: &PackageSpec) -> String {
        format!("{}/{}", self.upstream.trim_end_matches('/'), spec)
    }

    /// The importer argv with the source URL substituted.
    pub fn import_argv(&self, spec: &PackageSpec) -> Vec<String> {
        let url = self.source_url(spec);
        self.import_command
            .iter()
            .map(|arg| arg.replace(URL_PLACEHOLDER, &url))
            .collect()
    }

    /// The tree-filter argv, resolving the default to the running executable.
    pub fn tree_filter_argv(&self) -> Result<Vec<String>> {
        if let Some(filter) = &self.tree_filter {
            return Ok(filter.clone());
        }
        let exe = std::env::current_exe().map_err(|e| Error::Config {
            message: format!("could not locate the running executable: {}", e),
            hint: Some("set tree_filter in the configuration file".to_string()),
        })?;
        Ok(vec![
            exe.to_string_lossy().into_owned(),
            "tree-filter".to_string(),
        ])
    }

    fn flat_package_name(&self, spec: &PackageSpec) -> String {
        match self.dest_root.file_name() {
            Some(root) => format!("{}-{}", root.to_string_lossy(), spec.flat_name()),
            None => spec.flat_name(),
        }
    }
}
