//! # Bounded-Concurrency Scheduler
//!
//! The scheduler dispatches one unit of work per input item onto a rayon
//! thread pool and streams one `JobResult` per item back over a channel.
//!
//! ## Guarantees
//!
//! - Every item is dispatched exactly once, in input order, with a 1-based
//!   index and the total count for progress reporting.
//! - Dispatch never blocks. Each unit acquires an admission token from the
//!   shared [`AdmissionGate`] *inside* the unit, before calling the worker,
//!   so at most `limit` workers run at once.
//! - Every dispatched unit sends exactly one result, even if the worker
//!   panics: the panic is caught and turned into an error result, and the
//!   admission token is released when the permit drops.
//! - No ordering is guaranteed among completions.
//!
//! The [`Worker`] trait is the seam between the scheduler and what it runs:
//! package conversion (`job`) and mirror synchronisation (`mirror`) both
//! implement it.

use std::any::Any;
use std::fmt::Display;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;

use log::debug;

use crate::error::{Error, Result};
use crate::gate::AdmissionGate;

/// Work executed once per dispatched item.
pub trait Worker: Send + Sync + 'static {
    type Item: Clone + Display + Send + 'static;
    type Output: Send + 'static;

    /// Runs the work for one item. `index` is 1-based, `total` is the number
    /// of dispatched items.
    fn execute(&self, item: &Self::Item, index: usize, total: usize) -> Result<Self::Output>;
}

/// The outcome of one dispatched item.
#[derive(Debug)]
pub struct JobResult<I, O> {
    pub item: I,
    pub index: usize,
    pub outcome: Result<O>,
}

impl<I, O> JobResult<I, O> {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Results still in flight for one call to [`Scheduler::dispatch`].
pub struct Dispatch<I, O> {
    pub(crate) receiver: Receiver<JobResult<I, O>>,
    pub(crate) pending: usize,
}

impl<I, O> Dispatch<I, O> {
    /// Number of results the aggregator must receive.
    pub fn pending(&self) -> usize {
        self.pending
    }
}

/// Dispatches items under a fixed concurrency ceiling.
pub struct Scheduler {
    pool: rayon::ThreadPool,
    gate: Arc<AdmissionGate>,
}

impl Scheduler {
    /// Creates a scheduler; a limit of 0 is a configuration error.
    pub fn new(limit: usize) -> Result<Self> {
        let limit = NonZeroUsize::new(limit).ok_or_else(|| Error::Config {
            message: format!("invalid number of workers ({})", limit),
            hint: Some("use --jobs with a value of at least 1".to_string()),
        })?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(limit.get())
            .thread_name(|i| format!("svn2git-worker-{}", i))
            .build()
            .map_err(|e| Error::config(format!("could not start worker pool: {}", e)))?;
        Ok(Self {
            pool,
            gate: Arc::new(AdmissionGate::new(limit)),
        })
    }

    pub fn limit(&self) -> usize {
        self.gate.limit()
    }

    /// The admission gate shared by all dispatched units.
    pub fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    /// Spawns one unit per item and returns immediately.
    pub fn dispatch<W: Worker>(
        &self,
        worker: Arc<W>,
        items: Vec<W::Item>,
    ) -> Dispatch<W::Item, W::Output> {
        let (sender, receiver) = mpsc::channel();
        let total = items.len();

        for (i, item) in items.into_iter().enumerate() {
            let index = i + 1;
            let sender = sender.clone();
            let worker = Arc::clone(&worker);
            let gate = Arc::clone(&self.gate);

            self.pool.spawn(move || {
                // The token is back in the gate before the result is reported.
                let outcome = {
                    let _permit = gate.acquire();
                    debug!("[{:04}/{:04}] admitted [{}]", index, total, item);
                    panic::catch_unwind(AssertUnwindSafe(|| worker.execute(&item, index, total)))
                        .unwrap_or_else(|payload| {
                            Err(Error::JobPanicked {
                                item: item.to_string(),
                                message: panic_message(payload.as_ref()),
                            })
                        })
                };

                // The aggregator may have gone away; the result has nowhere to go then.
                let _ = sender.send(JobResult {
                    item,
                    index,
                    outcome,
                });
            });
        }

        Dispatch {
            receiver,
            pending: total,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
