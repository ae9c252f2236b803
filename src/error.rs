//! # Error Handling
//!
//! This module defines the centralized error type for `svn2git-batch`. It uses
//! `thiserror` to build an `Error` enum whose variants follow the failure
//! classes of a conversion run:
//!
//! - **Configuration errors** (`Config`): bad concurrency limit, missing input
//!   file. These are reported once, before any job is dispatched.
//! - **Workspace errors** (`Workspace`, `LogFile`): a package directory or its
//!   log file could not be prepared. Fatal to one job.
//! - **External-tool errors** (`Import`, `RefListing`, `GitCommand`): an
//!   importer or git invocation failed. Fatal to one job; the variants carry
//!   the job's log path so the operator can inspect it without re-running.
//! - **Per-ref rewrite errors** (`Rewrite`): logged by the job, never fatal.
//! - **Completion-marking errors** (`Marker`): fatal to one job.
//!
//! Job-fatal errors never cross the scheduler boundary as panics; they travel
//! as values inside a `JobResult`.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for svn2git-batch operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration, detected before any work starts.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Config {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// A package working directory could not be removed or created.
    #[error("Workspace error at {}: {source}", path.display())]
    Workspace {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The per-package log file could not be created.
    #[error("Could not create log file {}: {source}", path.display())]
    LogFile {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The history importer failed for a package.
    #[error("Import failed for [{package}]: {message} (logfile: {})", log.display())]
    Import {
        package: String,
        log: PathBuf,
        message: String,
    },

    /// Branches or tags could not be enumerated from an imported clone.
    #[error("Could not list {kind} for [{package}]: {message} (logfile: {})", log.display())]
    RefListing {
        package: String,
        kind: String,
        log: PathBuf,
        message: String,
    },

    /// The history rewrite of a single branch or tag failed.
    #[error("History rewrite failed for ref [{reference}]: {message}")]
    Rewrite { reference: String, message: String },

    /// The completion marker could not be written.
    #[error("Could not write status file {}: {source}", path.display())]
    Marker {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A git command exited unsuccessfully.
    #[error("Git command failed in {}: {command} - {stderr}", dir.display())]
    GitCommand {
        command: String,
        dir: PathBuf,
        stderr: String,
    },

    /// The working-tree relocation performed at each historical commit failed.
    #[error("Tree filter error: {message}")]
    TreeFilter { message: String },

    /// A worker panicked while processing an item.
    #[error("Job for [{item}] panicked: {message}")]
    JobPanicked { item: String, message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON parsing error, wrapped from `serde_json::Error`.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a configuration error without a hint.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            hint: None,
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_config() {
        let error = Error::config("invalid number of workers (0)");
        let display = format!("{}", error);
        assert!(display.contains("Configuration error"));
        assert!(display.contains("invalid number of workers (0)"));
        assert!(!display.contains("hint:"));
    }

    #[test]
    fn test_error_display_config_with_hint() {
        let error = Error::Config {
            message: "empty import command".to_string(),
            hint: Some("set import_command in svn2git.yaml".to_string()),
        };
        let display = format!("{}", error);
        assert!(display.contains("hint:"));
        assert!(display.contains("svn2git.yaml"));
    }

    #[test]
    fn test_error_display_import_carries_log_path() {
        let error = Error::Import {
            package: "Control/AthenaKernel".to_string(),
            log: PathBuf::from("logs/atlasoff-git-Control-AthenaKernel.log.txt"),
            message: "exit status: 1".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("Control/AthenaKernel"));
        assert!(display.contains("logs/atlasoff-git-Control-AthenaKernel.log.txt"));
        assert!(display.contains("exit status: 1"));
    }

    #[test]
    fn test_error_display_ref_listing() {
        let error = Error::RefListing {
            package: "PkgA".to_string(),
            kind: "tags".to_string(),
            log: PathBuf::from("logs/x.log.txt"),
            message: "not a git repository".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("Could not list tags for [PkgA]"));
        assert!(display.contains("logs/x.log.txt"));
    }

    #[test]
    fn test_error_display_workspace() {
        let error = Error::Workspace {
            path: PathBuf::from("atlasoff-git/PkgA"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let display = format!("{}", error);
        assert!(display.contains("atlasoff-git/PkgA"));
        assert!(display.contains("denied"));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let error: Error = io_error.into();
        let display = format!("{}", error);
        assert!(display.contains("I/O error"));
        assert!(display.contains("File not found"));
    }

    #[test]
    fn test_error_from_json_error() {
        let json_error = serde_json::from_str::<serde_json::Value>("[unclosed").unwrap_err();
        let error: Error = json_error.into();
        assert!(format!("{}", error).contains("JSON parsing error"));
    }
}
