//! # Result Aggregation
//!
//! `collect` blocks until exactly one result has arrived for every
//! dispatched item and folds them into a `Summary`. The summary decides the
//! run's verdict: it fails if any item failed, and it can list every failing
//! item with its error so the operator sees all of them before the process
//! exits.

use std::fmt::Display;

use indicatif::ProgressBar;
use log::error;

use crate::scheduler::{Dispatch, JobResult};

/// All results of one run.
#[derive(Debug)]
pub struct Summary<I, O> {
    results: Vec<JobResult<I, O>>,
    missing: usize,
}

impl<I: Display, O> Summary<I, O> {
    pub fn results(&self) -> &[JobResult<I, O>] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Results whose outcome is an error.
    pub fn failures(&self) -> impl Iterator<Item = &JobResult<I, O>> {
        self.results.iter().filter(|result| !result.is_ok())
    }

    /// Results that were lost because a worker vanished without reporting.
    pub fn missing(&self) -> usize {
        self.missing
    }

    pub fn succeeded(&self) -> bool {
        self.missing == 0 && self.failures().next().is_none()
    }

    /// Process exit status for this run: 0 on success, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.succeeded() {
            0
        } else {
            1
        }
    }

    /// Logs every failing item and its error.
    pub fn report_failures(&self) {
        for result in self.failures() {
            if let Err(e) = &result.outcome {
                error!("[{}]: {}", result.item, e);
            }
        }
        if self.missing > 0 {
            error!("{} job(s) ended without reporting a result", self.missing);
        }
    }
}

/// Receives exactly `dispatch.pending()` results.
pub fn collect<I: Display, O>(dispatch: Dispatch<I, O>, progress: &ProgressBar) -> Summary<I, O> {
    let pending = dispatch.pending;
    let mut results = Vec::with_capacity(pending);

    while results.len() < pending {
        match dispatch.receiver.recv() {
            Ok(result) => {
                progress.set_message(result.item.to_string());
                progress.inc(1);
                results.push(result);
            }
            // Every sender is gone: no more results can arrive.
            Err(_) => break,
        }
    }

    let missing = pending - results.len();
    Summary { results, missing }
}
