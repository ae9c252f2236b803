//! Thin wrappers around the external tools a conversion runs: the history
//! importer and the `git` command line. Every process writes its output to
//! the job's [`LogSink`].

use std::path::Path;
use std::process::{Command, ExitStatus};

use crate::error::{Error, Result};
use crate::logsink::LogSink;

/// Environment variable that silences filter-branch's interactive warning
/// and the pause that comes with it.
const FILTER_BRANCH_SQUELCH: &str = "FILTER_BRANCH_SQUELCH_WARNING";

fn command_error(command: &str, dir: &Path, stderr: String) -> Error {
    Error::GitCommand {
        command: command.to_string(),
        dir: dir.to_path_buf(),
        stderr,
    }
}

fn check_status(command: &str, dir: &Path, status: ExitStatus) -> Result<()> {
    if status.success() {
        Ok(())
    } else {
        Err(command_error(command, dir, status.to_string()))
    }
}

/// Runs `git <args>` in `dir`, sending all output to the sink.
fn run_git(dir: &Path, args: &[&str], sink: &LogSink) -> Result<()> {
    let command = format!("git {}", args.join(" "));
    let status = sink
        .run(Command::new("git").args(args).current_dir(dir))
        .map_err(|e| command_error(&command, dir, e.to_string()))?;
    check_status(&command, dir, status)
}

/// Runs `git <args>` in `dir` and returns its stdout.
fn git_stdout(dir: &Path, args: &[&str], sink: &LogSink) -> Result<String> {
    let command = format!("git {}", args.join(" "));
    let output = sink
        .output(Command::new("git").args(args).current_dir(dir))
        .map_err(|e| command_error(&command, dir, e.to_string()))?;
    check_status(&command, dir, output.status)?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Runs the history importer `argv` inside the (empty) package directory.
pub fn run_import(argv: &[String], dir: &Path, sink: &LogSink) -> Result<()> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| Error::config("import_command is empty"))?;
    let command = argv.join(" ");
    let status = sink
        .run(Command::new(program).args(args).current_dir(dir))
        .map_err(|e| command_error(&command, dir, e.to_string()))?;
    check_status(&command, dir, status)
}

/// Lists local branches as full ref names (`refs/heads/<name>`).
pub fn list_branches(dir: &Path, sink: &LogSink) -> Result<Vec<String>> {
    sink.note(&format!("### get list of branches for [{}]...", dir.display()));
    list_refs(dir, "refs/heads", sink)
}

/// Lists tags as full ref names (`refs/tags/<name>`).
pub fn list_tags(dir: &Path, sink: &LogSink) -> Result<Vec<String>> {
    sink.note(&format!("### get list of tags for [{}]...", dir.display()));
    list_refs(dir, "refs/tags", sink)
}

fn list_refs(dir: &Path, namespace: &str, sink: &LogSink) -> Result<Vec<String>> {
    let stdout = git_stdout(
        dir,
        &["for-each-ref", "--format=%(refname)", namespace],
        sink,
    )?;
    Ok(parse_ref_list(&stdout))
}

/// Parses `git for-each-ref --format=%(refname)` output, one ref per line.
pub fn parse_ref_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether `ancestor` is reachable from `descendant`
/// (`git merge-base --is-ancestor`).
pub fn is_ancestor(dir: &Path, ancestor: &str, descendant: &str, sink: &LogSink) -> Result<bool> {
    let command = format!("git merge-base --is-ancestor {} {}", ancestor, descendant);
    let output = sink
        .output(
            Command::new("git")
                .args(["merge-base", "--is-ancestor", ancestor, descendant])
                .current_dir(dir),
        )
        .map_err(|e| command_error(&command, dir, e.to_string()))?;
    match output.status.code() {
        Some(0) => Ok(true),
        Some(1) => Ok(false),
        _ => Err(command_error(&command, dir, output.status.to_string())),
    }
}

/// Rewrites every commit reachable from `reference` with `tree_filter`,
/// keeping tag names (`--tag-name-filter cat`).
pub fn filter_branch(dir: &Path, reference: &str, tree_filter: &str, sink: &LogSink) -> Result<()> {
    let args = [
        "filter-branch",
        "-f",
        "--tree-filter",
        tree_filter,
        "--tag-name-filter",
        "cat",
        reference,
    ];
    let command = format!("git filter-branch --tree-filter {} {}", tree_filter, reference);
    let status = sink
        .run(
            Command::new("git")
                .args(args)
                .current_dir(dir)
                .env(FILTER_BRANCH_SQUELCH, "1"),
        )
        .map_err(|e| command_error(&command, dir, e.to_string()))?;
    check_status(&command, dir, status)
}

/// `git fetch --all --tags`
pub fn fetch_all(dir: &Path, sink: &LogSink) -> Result<()> {
    run_git(dir, &["fetch", "--all", "--tags"], sink)
}

/// `git push --mirror <url>`
pub fn push_mirror(dir: &Path, url: &str, sink: &LogSink) -> Result<()> {
    run_git(dir, &["push", "--mirror", url], sink)
}

/// Quotes one argument for `sh`, which is how filter-branch runs its filters.
pub fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@+%,".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Joins an argv into a single shell command line.
pub fn shell_join<S: AsRef<str>>(argv: &[S]) -> String {
    argv.iter()
        .map(|arg| shell_quote(arg.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}
