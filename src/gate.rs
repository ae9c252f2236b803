//! # Admission Gate
//!
//! A counting semaphore that bounds how many jobs may do external work at
//! the same time. A worker calls `acquire()` before its first
//! externally-visible action and holds the returned `Permit` until it is
//! done; dropping the permit (on return, error or unwind) frees the token.
//!
//! The gate also records the highest number of tokens ever held at once, so
//! tests can check that the configured limit was never exceeded.

use std::num::NonZeroUsize;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Tokens {
    in_use: usize,
    peak: usize,
}

/// Counting admission gate sized to the concurrency limit.
#[derive(Debug)]
pub struct AdmissionGate {
    limit: usize,
    tokens: Mutex<Tokens>,
    freed: Condvar,
}

impl AdmissionGate {
    pub fn new(limit: NonZeroUsize) -> Self {
        Self {
            limit: limit.get(),
            tokens: Mutex::new(Tokens::default()),
            freed: Condvar::new(),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Blocks until a token is free, then takes it.
    pub fn acquire(&self) -> Permit<'_> {
        let mut tokens = self.lock();
        while tokens.in_use >= self.limit {
            tokens = self
                .freed
                .wait(tokens)
                .unwrap_or_else(PoisonError::into_inner);
        }
        tokens.in_use += 1;
        tokens.peak = tokens.peak.max(tokens.in_use);
        Permit { gate: self }
    }

    /// Number of tokens currently held.
    pub fn in_use(&self) -> usize {
        self.lock().in_use
    }

    /// Highest number of tokens held at once since the gate was created.
    pub fn peak(&self) -> usize {
        self.lock().peak
    }

    fn release(&self) {
        let mut tokens = self.lock();
        tokens.in_use -= 1;
        drop(tokens);
        self.freed.notify_one();
    }

    // The counters stay consistent even if a holder panicked, so a poisoned
    // lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, Tokens> {
        self.tokens.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One admission token. Released when dropped.
#[derive(Debug)]
#[must_use = "the token is released as soon as the permit is dropped"]
pub struct Permit<'a> {
    gate: &'a AdmissionGate,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.gate.release();
    }
}
