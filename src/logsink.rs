//! # Per-Job Log Capture
//!
//! Each conversion job writes everything its external tools print into one
//! log file. With `verbose` set, the same output is also copied to the
//! operator's console. The mirror command uses a console-only sink instead.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{Command, ExitStatus, Output, Stdio};
use std::sync::{Mutex, PoisonError};
use std::thread;

use log::warn;

use crate::error::{Error, Result};

enum Target {
    File { file: Mutex<File> },
    Console,
}

/// Destination for the output of a job's external processes.
pub struct LogSink {
    target: Target,
    verbose: bool,
}

impl LogSink {
    /// Creates (or truncates) the log file at `path`.
    pub fn create(path: &Path, verbose: bool) -> Result<Self> {
        let file = File::create(path).map_err(|source| Error::LogFile {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            target: Target::File {
                file: Mutex::new(file),
            },
            verbose,
        })
    }

    /// A sink that lets processes write straight to the console.
    pub fn console() -> Self {
        Self {
            target: Target::Console,
            verbose: true,
        }
    }

    /// Appends one line to the log.
    pub fn note(&self, line: &str) {
        match &self.target {
            Target::File { file } => {
                let mut file = file.lock().unwrap_or_else(PoisonError::into_inner);
                if let Err(e) = writeln!(file, "{}", line) {
                    warn!("could not write to job log: {}", e);
                }
                if self.verbose {
                    println!("{}", line);
                }
            }
            Target::Console => println!("{}", line),
        }
    }

    /// Runs `command` to completion with stdout and stderr sent to the sink.
    pub fn run(&self, command: &mut Command) -> io::Result<ExitStatus> {
        command.stdin(Stdio::null());
        match &self.target {
            Target::Console => command.status(),
            Target::File { .. } if !self.verbose => command
                .stdout(self.file_stdio()?)
                .stderr(self.file_stdio()?)
                .status(),
            Target::File { .. } => {
                let mut child = command
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped())
                    .spawn()?;
                let stdout = child.stdout.take();
                let stderr = child.stderr.take();
                thread::scope(|scope| {
                    if let Some(stdout) = stdout {
                        scope.spawn(move || self.tee(stdout));
                    }
                    if let Some(stderr) = stderr {
                        scope.spawn(move || self.tee(stderr));
                    }
                });
                child.wait()
            }
        }
    }

    /// Runs `command` capturing its stdout; stderr goes to the sink.
    pub fn output(&self, command: &mut Command) -> io::Result<Output> {
        command.stdin(Stdio::null()).stdout(Stdio::piped());
        match &self.target {
            Target::Console => command.stderr(Stdio::inherit()).output(),
            Target::File { .. } => command.stderr(self.file_stdio()?).output(),
        }
    }

    fn file_stdio(&self) -> io::Result<Stdio> {
        match &self.target {
            Target::File { file } => {
                let file = file.lock().unwrap_or_else(PoisonError::into_inner);
                Ok(Stdio::from(file.try_clone()?))
            }
            Target::Console => Ok(Stdio::inherit()),
        }
    }

    fn tee(&self, mut reader: impl Read) {
        let Target::File { file } = &self.target else {
            return;
        };
        let mut buf = [0u8; 8192];
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!("could not read process output: {}", e);
                    break;
                }
            };
            {
                let mut file = file.lock().unwrap_or_else(PoisonError::into_inner);
                if let Err(e) = file.write_all(&buf[..n]) {
                    warn!("could not write to job log: {}", e);
                }
            }
            let mut stdout = io::stdout().lock();
            let _ = stdout.write_all(&buf[..n]);
            let _ = stdout.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_create_in_missing_directory_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("no-such-dir").join("job.log.txt");
        let err = LogSink::create(&path, false).err().unwrap();
        assert!(matches!(err, Error::LogFile { .. }));
    }

    #[test]
    fn test_note_writes_line() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("job.log.txt");
        let sink = LogSink::create(&path, false).unwrap();
        sink.note("### get list of tags for [PkgA]...");
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "### get list of tags for [PkgA]...\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_run_captures_stdout_and_stderr() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("job.log.txt");
        let sink = LogSink::create(&path, false).unwrap();
        let status = sink
            .run(Command::new("sh").args(["-c", "echo to-out; echo to-err >&2"]))
            .unwrap();
        assert!(status.success());
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("to-out"));
        assert!(content.contains("to-err"));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_verbose_still_writes_log() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("job.log.txt");
        let sink = LogSink::create(&path, true).unwrap();
        let status = sink
            .run(Command::new("sh").args(["-c", "echo loud; exit 3"]))
            .unwrap();
        assert_eq!(status.code(), Some(3));
        assert!(fs::read_to_string(&path).unwrap().contains("loud"));
    }

    #[cfg(unix)]
    #[test]
    fn test_output_keeps_stdout_out_of_log() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("job.log.txt");
        let sink = LogSink::create(&path, false).unwrap();
        let output = sink
            .output(Command::new("sh").args(["-c", "echo listing; echo warning >&2"]))
            .unwrap();
        assert_eq!(String::from_utf8_lossy(&output.stdout), "listing\n");
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("warning"));
        assert!(!content.contains("listing"));
    }
}
