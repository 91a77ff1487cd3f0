// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Failover state machine wrapping a real sink and a durable buffer
//!
//! Active mode forwards records straight to the real sink; passive mode
//! appends them to the disk buffer. Transitions are serialized by a
//! single transition lock, and while a recovery pass replays the backlog,
//! concurrent pushes park in a transient cache so replay order and live
//! order never interleave: backlog first, then the cache, in arrival
//! order.

use crate::buffer::DurableBuffer;
use crate::cache::TransientCache;
use logjam_core::{LogLevel, Record, Sink, SinkError};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Classifies sink failures: `true` means transient, worth buffering and
/// retrying later; `false` means permanent, surfaced to the caller
pub type RetryPredicate = Arc<dyn Fn(&SinkError) -> bool + Send + Sync>;

/// Where `push` currently sends records
#[derive(Clone)]
enum Target {
    Real,
    Buffer,
    Cache(Arc<TransientCache>),
}

/// Mode-switching wrapper around a real sink and a durable buffer
pub struct FailoverController {
    real: Arc<dyn Sink>,
    buffer: Arc<DurableBuffer>,
    is_retryable: RetryPredicate,
    active: AtomicBool,
    target: Mutex<Target>,
    // One mode change at a time; never held across a plain push
    transition: Mutex<()>,
}

impl FailoverController {
    /// Wrap a real sink, buffering to `buffer_dir` while passive
    ///
    /// Starts passive; call [`set_active`](Self::set_active) once the real
    /// sink is believed reachable.
    pub fn new(
        real: Arc<dyn Sink>,
        buffer_dir: &Path,
        is_retryable: RetryPredicate,
    ) -> std::io::Result<Self> {
        let buffer = Arc::new(DurableBuffer::open(buffer_dir)?);
        Ok(Self {
            real,
            buffer,
            is_retryable,
            active: AtomicBool::new(false),
            target: Mutex::new(Target::Buffer),
            transition: Mutex::new(()),
        })
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn buffer(&self) -> &DurableBuffer {
        &self.buffer
    }

    /// Deliver one record to whichever destination the current mode
    /// designates
    ///
    /// In active mode a retryable failure triggers synchronous failover:
    /// the controller drops to passive and the record lands in the disk
    /// buffer instead, so callers never see a transient outage as an
    /// error. Permanent failures and local disk errors surface.
    pub fn push(&self, level: LogLevel, record: &Record) -> Result<(), SinkError> {
        let target = self.snapshot_target();
        match self.push_to(&target, level, record) {
            Ok(()) => Ok(()),
            Err(e) if self.is_active() && (self.is_retryable)(&e) => {
                tracing::warn!(error = %e, "delivery failed, failing over to disk buffer");
                self.set_active(false)?;
                self.buffer.push(level, record)
            }
            Err(e) => Err(e),
        }
    }

    /// Request a mode change; returns the mode in effect afterwards
    ///
    /// Activation replays the entire backlog into the real sink first and
    /// only becomes active if the buffer fully drained; a retryable
    /// failure mid-replay leaves the controller passive with all
    /// undelivered records intact. Concurrent calls serialize; a call
    /// requesting the current mode is a no-op.
    pub fn set_active(&self, active: bool) -> Result<bool, SinkError> {
        let _guard = self.transition.lock().unwrap_or_else(|e| e.into_inner());
        if self
            .active
            .compare_exchange(!active, active, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(self.is_active());
        }

        // Park concurrent pushes in memory while the destination is in flux
        let cache = Arc::new(TransientCache::new());
        self.set_target(Target::Cache(Arc::clone(&cache)));

        if active {
            let fully_recovered = match self
                .buffer
                .recover(self.real.as_ref(), |e| (self.is_retryable)(e))
            {
                Ok(done) => done,
                Err(e) => {
                    // Local replay failure: stay passive, data stays on disk
                    tracing::warn!(error = %e, "recovery pass failed");
                    false
                }
            };
            if fully_recovered {
                tracing::debug!("backlog drained, going active");
                self.set_target(Target::Real);
            } else {
                tracing::debug!("backlog not drained, staying passive");
                self.active.store(false, Ordering::SeqCst);
                self.set_target(Target::Buffer);
            }
        } else {
            self.set_target(Target::Buffer);
        }

        self.drain_cache(&cache)?;
        Ok(self.is_active())
    }

    /// Empty the transition cache into the designated target, in FIFO
    /// order; a retryable failure mid-drain forces passive and redirects
    /// the failed record and the rest of the cache to the buffer
    fn drain_cache(&self, cache: &TransientCache) -> Result<(), SinkError> {
        for (level, record) in cache.drain() {
            let target = self.snapshot_target();
            if let Err(e) = self.push_to(&target, level, &record) {
                if (self.is_retryable)(&e) {
                    tracing::warn!(error = %e, "cache drain failed, forcing passive");
                    self.active.store(false, Ordering::SeqCst);
                    self.set_target(Target::Buffer);
                    self.buffer.push(level, &record)?;
                } else {
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    fn snapshot_target(&self) -> Target {
        self.target.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn set_target(&self, target: Target) {
        *self.target.lock().unwrap_or_else(|e| e.into_inner()) = target;
    }

    fn push_to(&self, target: &Target, level: LogLevel, record: &Record) -> Result<(), SinkError> {
        match target {
            Target::Real => self.real.push(level, record),
            Target::Buffer => self.buffer.push(level, record),
            Target::Cache(cache) => cache.push(level, record),
        }
    }
}

impl Sink for FailoverController {
    fn push(&self, level: LogLevel, record: &Record) -> Result<(), SinkError> {
        FailoverController::push(self, level, record)
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
