//! # Tree Relocation
//!
//! The per-commit transform used while rewriting history: every top-level
//! entry of a working tree (except git metadata such as `.git`,
//! `.gitignore`, `.gitattributes`) is moved under a package prefix.
//!
//! ```text
//! before:                 after (prefix Control/AthenaKernel):
//!   ChangeLog               Control/
//!   cmt/                      AthenaKernel/
//!   src/                        ChangeLog
//!                               cmt/
//!                               src/
//! ```
//!
//! Entries are first moved into a staging directory and then lifted back to
//! the top level, so a package containing an entry with the same name as the
//! first prefix segment (`Control/` above) is handled correctly.
//!
//! The transform always moves everything: applied twice, it nests the tree
//! twice. Callers must not run it over history that was already rewritten
//! (see the carried-tag check in [`crate::job`]).

use std::fs;
use std::path::{Component, Path};

use crate::error::{Error, Result};

/// Temporary directory used while moving entries.
pub const STAGING_DIR: &str = "__@@RELOCATE@@__";

/// What `relocate` did to a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relocation {
    /// This many top-level entries were moved under the prefix.
    Moved(usize),
    /// Nothing besides git metadata to move.
    Empty,
}

fn tree_error(message: String) -> Error {
    Error::TreeFilter { message }
}

fn first_component(prefix: &Path) -> Result<String> {
    let mut components = prefix.components();
    let first = match components.next() {
        Some(Component::Normal(first)) => first.to_string_lossy().into_owned(),
        _ => {
            return Err(tree_error(format!(
                "invalid prefix [{}]: must be a relative path",
                prefix.display()
            )))
        }
    };
    if components.any(|c| !matches!(c, Component::Normal(_))) {
        return Err(tree_error(format!(
            "invalid prefix [{}]: must not contain '..' or '.'",
            prefix.display()
        )));
    }
    if first.starts_with(".git") || first == STAGING_DIR {
        return Err(tree_error(format!(
            "invalid prefix [{}]: reserved name [{}]",
            prefix.display(),
            first
        )));
    }
    Ok(first)
}

fn is_git_metadata(name: &str) -> bool {
    name.starts_with(".git")
}

/// Moves the contents of `workdir` under `prefix`.
pub fn relocate(workdir: &Path, prefix: &Path) -> Result<Relocation> {
    let first = first_component(prefix)?;

    let mut entries: Vec<String> = Vec::new();
    for entry in fs::read_dir(workdir)? {
        let name = entry?.file_name().to_string_lossy().into_owned();
        if !is_git_metadata(&name) {
            entries.push(name);
        }
    }
    entries.sort();

    if entries.is_empty() {
        return Ok(Relocation::Empty);
    }
    if entries.iter().any(|name| name == STAGING_DIR) {
        return Err(tree_error(format!(
            "staging directory [{}] already exists in [{}]",
            STAGING_DIR,
            workdir.display()
        )));
    }

    let staging_root = workdir.join(STAGING_DIR);
    let staging = staging_root.join(prefix);
    fs::create_dir_all(&staging).map_err(|e| {
        tree_error(format!("could not create [{}]: {}", staging.display(), e))
    })?;

    for name in &entries {
        move_entry(&workdir.join(name), &staging.join(name))?;
    }
    move_entry(&staging_root.join(&first), &workdir.join(&first))?;
    fs::remove_dir(&staging_root).map_err(|e| {
        tree_error(format!("could not remove [{}]: {}", staging_root.display(), e))
    })?;

    Ok(Relocation::Moved(entries.len()))
}

fn move_entry(from: &Path, to: &Path) -> Result<()> {
    fs::rename(from, to).map_err(|e| {
        tree_error(format!(
            "could not move [{}] to [{}]: {}",
            from.display(),
            to.display(),
            e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn populate(root: &Path, files: &[&str]) {
        for file in files {
            let path = root.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, file.as_bytes()).unwrap();
        }
    }

    #[test]
    fn test_moves_entries_under_prefix() {
        let temp = TempDir::new().unwrap();
        populate(temp.path(), &["ChangeLog", "cmt/requirements", "src/Kernel.cxx"]);

        let outcome = relocate(temp.path(), Path::new("Control/AthenaKernel")).unwrap();

        assert_eq!(outcome, Relocation::Moved(3));
        let base = temp.path().join("Control/AthenaKernel");
        assert!(base.join("ChangeLog").is_file());
        assert!(base.join("cmt/requirements").is_file());
        assert_eq!(
            fs::read_to_string(base.join("src/Kernel.cxx")).unwrap(),
            "src/Kernel.cxx"
        );
        assert!(!temp.path().join("ChangeLog").exists());
        assert!(!temp.path().join(STAGING_DIR).exists());
    }

    #[test]
    fn test_git_metadata_stays_in_place() {
        let temp = TempDir::new().unwrap();
        populate(temp.path(), &[".gitignore", ".git/HEAD", "README"]);

        relocate(temp.path(), Path::new("Pkg")).unwrap();

        assert!(temp.path().join(".gitignore").is_file());
        assert!(temp.path().join(".git/HEAD").is_file());
        assert!(temp.path().join("Pkg/README").is_file());
    }

    #[test]
    fn test_entry_named_like_first_segment() {
        let temp = TempDir::new().unwrap();
        populate(temp.path(), &["Control/inner.h", "Makefile"]);

        relocate(temp.path(), Path::new("Control/AthenaKernel")).unwrap();

        let base = temp.path().join("Control/AthenaKernel");
        assert!(base.join("Control/inner.h").is_file());
        assert!(base.join("Makefile").is_file());
    }

    #[test]
    fn test_single_directory_named_like_package() {
        // Header-only packages often hold nothing but `<Pkg>/<header>`.
        let temp = TempDir::new().unwrap();
        populate(temp.path(), &["AtlasPolicy/Policy.h"]);

        let outcome = relocate(temp.path(), Path::new("AtlasPolicy")).unwrap();

        assert_eq!(outcome, Relocation::Moved(1));
        assert!(temp.path().join("AtlasPolicy/AtlasPolicy/Policy.h").is_file());
        assert!(!temp.path().join("AtlasPolicy/Policy.h").exists());
    }

    #[test]
    fn test_nested_prefix_with_matching_first_segment() {
        let temp = TempDir::new().unwrap();
        populate(temp.path(), &["Dir1/Dir01/PkgA/README"]);

        let outcome = relocate(temp.path(), Path::new("Dir1/Dir01/PkgA")).unwrap();

        assert_eq!(outcome, Relocation::Moved(1));
        assert!(temp
            .path()
            .join("Dir1/Dir01/PkgA/Dir1/Dir01/PkgA/README")
            .is_file());
    }

    #[test]
    fn test_empty_tree() {
        let temp = TempDir::new().unwrap();
        populate(temp.path(), &[".gitattributes"]);
        assert_eq!(
            relocate(temp.path(), Path::new("Pkg")).unwrap(),
            Relocation::Empty
        );
    }

    #[test]
    fn test_invalid_prefixes() {
        let temp = TempDir::new().unwrap();
        for prefix in ["", "/abs/path", "../escape", "a/../b", ".git/x"] {
            assert!(
                matches!(
                    relocate(temp.path(), Path::new(prefix)),
                    Err(Error::TreeFilter { .. })
                ),
                "prefix {:?} should be rejected",
                prefix
            );
        }
    }

    #[test]
    fn test_leftover_staging_dir_is_error() {
        let temp = TempDir::new().unwrap();
        populate(temp.path(), &["README", "__@@RELOCATE@@__/x"]);
        assert!(relocate(temp.path(), Path::new("Pkg")).is_err());
    }
}
