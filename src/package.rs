//! # Package Identifiers
//!
//! A `PackageSpec` names one Subversion package (for example
//! `Control/AthenaKernel`). Package lists are plain text, one identifier per
//! line, with `#` comments and blank lines ignored. A trailing `/trunk`
//! (the unversioned head of the package) is stripped so that
//! `Control/AthenaKernel/trunk` and `Control/AthenaKernel` name the same
//! package.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

use log::warn;

use crate::error::{Error, Result};

const TRUNK_SUFFIXES: [&str; 2] = ["/trunk/", "/trunk"];

/// An immutable package identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageSpec(String);

impl PackageSpec {
    /// Builds a spec from raw input, trimming whitespace and the trunk suffix.
    pub fn new(raw: &str) -> Result<Self> {
        let mut name = raw.trim();
        for suffix in TRUNK_SUFFIXES {
            if let Some(stripped) = name.strip_suffix(suffix) {
                name = stripped;
                break;
            }
        }
        let name = name.trim_matches('/');
        if name.is_empty() {
            return Err(Error::config(format!("invalid package identifier [{}]", raw)));
        }
        // The identifier becomes a directory under the destination root, which
        // is wiped before each import: it must not be able to name anything else.
        if let Some(segment) = name.split('/').find(|s| !is_plain_segment(s)) {
            return Err(Error::Config {
                message: format!(
                    "invalid package identifier [{}]: bad path segment [{}]",
                    raw, segment
                ),
                hint: Some(
                    "package identifiers are relative paths like Control/AthenaKernel".to_string(),
                ),
            });
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hierarchical path components, e.g. `["Control", "AthenaKernel"]`.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// The identifier flattened into a single filename component.
    pub fn flat_name(&self) -> String {
        self.0.replace('/', "-")
    }
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_plain_segment(segment: &str) -> bool {
    !segment.is_empty() && segment != "." && segment != ".." && !segment.contains('\\')
}

/// Parses a package list.
pub fn parse_package_list(text: &str) -> Result<Vec<PackageSpec>> {
    let specs = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(PackageSpec::new)
        .collect::<Result<Vec<_>>>()?;
    Ok(dedup_packages(specs))
}

/// Drops repeated packages, keeping the first occurrence.
///
/// Two jobs for one package would share its clone, log and status file.
pub fn dedup_packages(specs: Vec<PackageSpec>) -> Vec<PackageSpec> {
    let mut seen = HashSet::new();
    specs
        .into_iter()
        .filter(|spec| {
            let first = seen.insert(spec.clone());
            if !first {
                warn!("package [{}] listed more than once, converting it once", spec);
            }
            first
        })
        .collect()
}

/// Reads and parses a package list file.
pub fn read_package_list(path: &Path) -> Result<Vec<PackageSpec>> {
    let text = fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("could not open package list file [{}]: {}", path.display(), e),
        hint: None,
    })?;
    parse_package_list(&text)
}
