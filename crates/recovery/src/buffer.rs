// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable on-disk buffer with ordered replay
//!
//! Owns the currently-open appender, rotating to a new pair when replay
//! catches up to the live write file, and drives the replay sequencer to
//! deliver buffered records to a destination sink. The checkpoint for a
//! record advances only after the sink accepts it, so a recovery pass can
//! be aborted and retried without loss.

use crate::appender::{BufferPool, FileAppender};
use crate::pairs::{FilePair, NameError, PairDir};
use crate::sequencer::ReplaySequencer;
use logjam_core::{Record, Sink, SinkError};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

/// Bounded politeness when replay and the live writer meet on one file:
/// wait for the reader to get ahead, then proceed regardless
const COLLISION_RETRIES: u32 = 10;
const COLLISION_BACKOFF: Duration = Duration::from_millis(25);

/// Errors from durable buffer operations
#[derive(Debug, Error)]
pub enum BufferError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("name error: {0}")]
    Name(#[from] NameError),
}

impl From<BufferError> for SinkError {
    fn from(e: BufferError) -> Self {
        match e {
            BufferError::Io(e) => SinkError::Io(e),
            BufferError::Json(e) => SinkError::Json(e),
            BufferError::Name(e) => SinkError::Other(Box::new(e)),
        }
    }
}

struct WriterSlot {
    appender: Option<FileAppender>,
    // Successor pair queued by a rotation; a fresh-timestamp pair is used
    // when empty
    next_pair: Option<FilePair>,
}

/// Write-ahead buffer of JSON records across rotating file pairs
pub struct DurableBuffer {
    dir: PairDir,
    writer: Mutex<WriterSlot>,
    rotate_after_write: AtomicBool,
}

impl DurableBuffer {
    /// Open a buffer over the given directory, creating it if needed
    pub fn open(dir: &Path) -> std::io::Result<Self> {
        Ok(Self {
            dir: PairDir::open(dir)?,
            writer: Mutex::new(WriterSlot {
                appender: None,
                next_pair: None,
            }),
            rotate_after_write: AtomicBool::new(false),
        })
    }

    pub fn dir(&self) -> &PairDir {
        &self.dir
    }

    /// Persist one record to the current pair, rotating afterwards if a
    /// replay reader asked the writer to get out of its way
    pub fn write(&self, record: &Record) -> Result<(), BufferError> {
        let mut buf = BufferPool::global().checkout();
        serde_json::to_writer(&mut *buf, record)?;

        let mut slot = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        // A fully-drained recovery pass deletes the pair the writer has
        // open; appending to that orphaned inode would be unrecoverable,
        // so rotate before the append, not after
        let stale = slot
            .appender
            .as_ref()
            .map(|a| !a.pair().log_path.exists())
            .unwrap_or(false);
        if stale {
            if let Some(appender) = slot.appender.take() {
                slot.next_pair = Some(appender.pair().next_in_sequence()?);
                tracing::debug!(pair = %appender.pair(), "pair deleted by replay, rotating");
            }
        }
        if slot.appender.is_none() {
            let pair = match slot.next_pair.take() {
                Some(pair) => pair,
                None => self.dir.fresh_pair(),
            };
            tracing::debug!(pair = %pair, "opening buffer pair");
            slot.appender = Some(FileAppender::open(pair)?);
        }
        if let Some(appender) = slot.appender.as_mut() {
            appender.append(&buf)?;
        }
        if self.rotate_after_write.swap(false, Ordering::SeqCst) {
            if let Some(appender) = slot.appender.take() {
                slot.next_pair = Some(appender.pair().next_in_sequence()?);
                tracing::debug!(pair = %appender.pair(), "rotating away from replayed pair");
            }
        }
        Ok(())
    }

    /// Close the current writer so the next write starts a fresh pair
    pub fn rotate(&self) {
        let mut slot = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        slot.appender = None;
        slot.next_pair = None;
    }

    /// Fsync the current pair, if one is open
    pub fn sync(&self) -> std::io::Result<()> {
        let mut slot = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(appender) = slot.appender.as_mut() {
            appender.flush(true)?;
        }
        Ok(())
    }

    /// Replay every pending record, in order, into `forward_to`
    ///
    /// Returns `true` when the buffer is fully drained. A failure the
    /// predicate classifies as retryable aborts the pass immediately and
    /// returns `false`, leaving everything unconsumed on disk for a later
    /// attempt. A non-retryable failure (or a buffered line that no longer
    /// parses) is logged and skipped: one poison record must not stall the
    /// buffer forever.
    pub fn recover<F>(&self, forward_to: &dyn Sink, is_retryable: F) -> Result<bool, BufferError>
    where
        F: Fn(&SinkError) -> bool,
    {
        let mut sequencer = ReplaySequencer::new(self.dir.clone())?;
        let mut hook = |path: &Path, position: u64| self.on_before_read(path, position);
        loop {
            let Some(line) = sequencer.next_line(&mut hook)? else {
                return Ok(true);
            };
            match Record::from_line(&line) {
                Ok(record) => {
                    if let Err(e) = forward_to.push(record.level(), &record) {
                        if is_retryable(&e) {
                            tracing::debug!(error = %e, "retryable failure, aborting recovery pass");
                            return Ok(false);
                        }
                        tracing::warn!(error = %e, "record permanently rejected, skipping");
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, line, "unparseable buffered record, skipping");
                }
            }
            sequencer.consume()?;
        }
    }

    /// Collision check run before each replay read
    ///
    /// When replay is reading the file the live writer has open, ask the
    /// writer to rotate after its next write; if the reader has also
    /// caught up to the writer's offset, back off briefly so it does not
    /// observe a line mid-write. Best effort only: the reader tolerates a
    /// torn tail either way.
    fn on_before_read(&self, path: &Path, read_position: u64) {
        let writer_position = {
            let slot = self.writer.lock().unwrap_or_else(|e| e.into_inner());
            match slot.appender.as_ref() {
                Some(a) if a.pair().log_path == path => a.position(),
                _ => return,
            }
        };
        self.rotate_after_write.store(true, Ordering::SeqCst);
        if read_position < writer_position {
            return;
        }
        for _ in 0..COLLISION_RETRIES {
            std::thread::sleep(COLLISION_BACKOFF);
            let slot = self.writer.lock().unwrap_or_else(|e| e.into_inner());
            match slot.appender.as_ref() {
                Some(a) if a.pair().log_path == path => {
                    if read_position < a.position() {
                        return;
                    }
                }
                _ => return,
            }
        }
    }
}

impl Sink for DurableBuffer {
    fn push(&self, _level: logjam_core::LogLevel, record: &Record) -> Result<(), SinkError> {
        self.write(record).map_err(SinkError::from)
    }
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
