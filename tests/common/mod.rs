//! Shared test utilities for integration and E2E tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_importer(importers::GIT_INIT);
//!     fixture.convert().arg("PkgA").assert().success();
//! }
//! ```

use assert_cmd::Command;
use assert_fs::prelude::*;
use std::path::PathBuf;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::importers;
    pub use super::TestFixture;
}

/// Importer commands (YAML flow sequences) standing in for the real
/// Subversion importer.
#[allow(dead_code)]
pub mod importers {
    /// Creates an empty repository: no branches, no tags.
    pub const GIT_INIT: &str = r#"["git", "init", "-q"]"#;

    /// Always fails.
    pub const FAIL: &str = r#"["false"]"#;

    /// Fails for packages whose name contains "Bad", succeeds otherwise.
    pub const FAIL_BAD: &str =
        r#"["sh", "-c", "case {url} in *Bad*) echo broken upstream; exit 1;; esac; git init -q"]"#;

    /// Prints the source URL before creating an empty repository.
    pub const ECHO_URL: &str = r#"["sh", "-c", "echo importing {url} && git init -q"]"#;

    /// Creates a repository with one commit on the default branch and a tag.
    pub const WITH_HISTORY: &str = r#"["sh", "-c", "git init -q && mkdir src && echo hello > README && echo 'int x;' > src/a.cxx && git add -A && git -c user.name=svn2git -c user.email=svn2git@example.org commit -q -m r1 && git tag v1"]"#;

    /// One directory named like the package on the branches, a branch and a
    /// tag both called `v1`, and the tag on a commit off any branch.
    pub const SAME_NAME_REFS: &str = r#"["sh", "-c", "git init -q && mkdir AtlasPolicy && echo x > AtlasPolicy/Policy.h && git add -A && git -c user.name=svn2git -c user.email=svn2git@example.org commit -q -m r1 && git branch v1 && git checkout -q --orphan side && echo y > extra && git add -A && git -c user.name=svn2git -c user.email=svn2git@example.org commit -q -m r2 && git tag v1 && git checkout -q - && git branch -q -D side"]"#;
}

/// A temporary run directory with a configuration file.
pub struct TestFixture {
    pub temp: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    pub fn new() -> Self {
        Self {
            temp: assert_fs::TempDir::new().unwrap(),
        }
    }

    /// Writes `svn2git.yaml` using `importer` as the import command.
    pub fn with_importer(self, importer: &str) -> Self {
        self.with_config(&format!("jobs: 2\nimport_command: {}\n", importer))
    }

    pub fn with_config(self, yaml: &str) -> Self {
        self.temp.child("svn2git.yaml").write_str(yaml).unwrap();
        self
    }

    pub fn with_package_list(self, lines: &str) -> Self {
        self.temp.child("packages.txt").write_str(lines).unwrap();
        self
    }

    /// Pre-creates the status file of `package`, as an earlier run would.
    pub fn with_marker(self, package: &str) -> Self {
        self.marker(package).write_str("ok\n").unwrap();
        self
    }

    /// `svn2git-batch convert --config svn2git.yaml`, run inside the fixture.
    pub fn convert(&self) -> Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("svn2git-batch");
        cmd.current_dir(self.temp.path())
            .env_remove("SVN2GIT_CONFIG")
            .env_remove("SVN2GIT_JOBS")
            .env_remove("SVN2GIT_UPSTREAM")
            .env_remove("RUST_LOG")
            .arg("convert")
            .arg("--config")
            .arg("svn2git.yaml");
        cmd
    }

    pub fn marker(&self, package: &str) -> assert_fs::fixture::ChildPath {
        self.temp.child(format!("logs/atlasoff-git-{}.status", flat(package)))
    }

    pub fn log(&self, package: &str) -> assert_fs::fixture::ChildPath {
        self.temp.child(format!("logs/atlasoff-git-{}.log.txt", flat(package)))
    }

    pub fn clone_dir(&self, package: &str) -> PathBuf {
        self.temp.path().join("atlasoff-git").join(package)
    }
}

fn flat(package: &str) -> String {
    package.replace('/', "-")
}
