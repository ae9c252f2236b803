//! # Mirror Synchronisation
//!
//! Keeps git mirrors up to date: for each entry of a JSON list, fetch every
//! remote and tag into the local clone, then `push --mirror` it to the
//! mirror URL. Entries run through the same scheduler as conversions.
//!
//! ```json
//! [
//!   {"url": "https://git.example.org/mirrors/gaudi", "dir": "/srv/repos/gaudi.git"},
//!   {"url": "https://git.example.org/mirrors/lcg", "dir": "/srv/repos/lcg.git"}
//! ]
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::logsink::LogSink;
use crate::scheduler::Worker;
use crate::vcs::{GitOperations, VcsOperations};

/// One mirror to synchronise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorRequest {
    /// Git URL of the mirror.
    #[serde(alias = "Url")]
    pub url: String,
    /// Local clone of the origin.
    #[serde(alias = "Dir")]
    pub dir: PathBuf,
}

impl fmt::Display for MirrorRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Parses a JSON mirror list.
pub fn parse_mirror_list(text: &str) -> Result<Vec<MirrorRequest>> {
    Ok(serde_json::from_str(text)?)
}

/// Reads a JSON mirror list file.
pub fn read_mirror_list(path: &Path) -> Result<Vec<MirrorRequest>> {
    let text = fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("problem opening file [{}]: {}", path.display(), e),
        hint: None,
    })?;
    parse_mirror_list(&text)
}

/// Fetches and pushes one mirror.
pub struct MirrorJob {
    vcs: Box<dyn VcsOperations>,
}

impl MirrorJob {
    pub fn new() -> Self {
        Self::with_operations(Box::new(GitOperations))
    }

    pub fn with_operations(vcs: Box<dyn VcsOperations>) -> Self {
        Self { vcs }
    }
}

impl Default for MirrorJob {
    fn default() -> Self {
        Self::new()
    }
}

impl Worker for MirrorJob {
    type Item = MirrorRequest;
    type Output = ();

    fn execute(&self, request: &MirrorRequest, index: usize, total: usize) -> Result<()> {
        info!("[{:04}/{:04}] ==> [{}]...", index, total, request.url);
        let sink = LogSink::console();
        self.vcs.fetch_all(&request.dir, &sink)?;
        self.vcs.push_mirror(&request.dir, &request.url, &sink)
    }
}
