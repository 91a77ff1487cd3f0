// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpointed replay reader for one file pair
//!
//! Reads newline-delimited records starting from the checkpoint position,
//! advancing the checkpoint only when a line is explicitly consumed, so a
//! crash mid-replay redelivers at most the line in flight. The log file
//! may still be growing under a live writer: a trailing line without its
//! newline is "not yet available", never corrupt.

use crate::checkpoint::Checkpoint;
use crate::pairs::FilePair;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;

/// Collision-avoidance hook invoked with `(log_path, checkpoint_position)`
/// before each physical read
pub type OnBeforeRead<'a> = &'a mut dyn FnMut(&Path, u64);

/// Observable progress of a reader, used to detect stalled pairs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderState {
    pub position: u64,
    pub available: u64,
    pub pending: bool,
}

struct PendingLine {
    text: String,
    // Byte length on disk, including the newline
    bytes: u64,
}

/// Sequential reader bound to one log file and its checkpoint
pub struct PairReader {
    pair: FilePair,
    checkpoint: Checkpoint,
    file: BufReader<File>,
    // Absolute offset of everything pulled off disk so far
    scanned_through: u64,
    // Absolute offset the checkpoint has been advanced to
    consumed_through: u64,
    partial: Vec<u8>,
    pending: Option<PendingLine>,
    closed: bool,
}

impl PairReader {
    /// Open a reader positioned at the pair's checkpoint
    ///
    /// Returns `None` when there is nothing to read: the log file is
    /// missing or empty, or the checkpoint has already caught up.
    pub fn open(pair: FilePair) -> std::io::Result<Option<Self>> {
        let len = match std::fs::metadata(&pair.log_path) {
            Ok(m) => m.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let checkpoint = Checkpoint::open(&pair.checkpoint_path)?;
        let position = checkpoint.position();
        if len == 0 || position >= len {
            checkpoint.close();
            return Ok(None);
        }

        let mut file = File::open(&pair.log_path)?;
        if position > 0 {
            file.seek(SeekFrom::Start(position))?;
        }
        Ok(Some(Self {
            pair,
            checkpoint,
            file: BufReader::new(file),
            scanned_through: position,
            consumed_through: position,
            partial: Vec::new(),
            pending: None,
            closed: false,
        }))
    }

    pub fn pair(&self) -> &FilePair {
        &self.pair
    }

    /// The checkpoint position (bytes durably forwarded)
    pub fn position(&self) -> u64 {
        self.checkpoint.position()
    }

    /// Bytes on disk not yet pulled into the reader
    fn available(&self) -> u64 {
        std::fs::metadata(&self.pair.log_path)
            .map(|m| m.len().saturating_sub(self.scanned_through))
            .unwrap_or(0)
    }

    pub fn state(&self) -> ReaderState {
        ReaderState {
            position: self.checkpoint.position(),
            available: self.available(),
            pending: self.pending.is_some(),
        }
    }

    /// Whether an unconsumed line is held or more bytes may be readable
    pub fn has_next(&self) -> bool {
        self.pending.is_some() || (!self.closed && self.available() > 0)
    }

    /// The next complete line, invoking the collision hook before any
    /// physical read; an already-presented, unconsumed line is returned
    /// again without re-reading
    pub fn next_line(&mut self, on_before_read: OnBeforeRead<'_>) -> std::io::Result<Option<&str>> {
        if self.pending.is_none() {
            on_before_read(&self.pair.log_path, self.checkpoint.position());
            self.fill()?;
        }
        Ok(self.pending.as_ref().map(|p| p.text.as_str()))
    }

    fn fill(&mut self) -> std::io::Result<()> {
        let read = self.file.read_until(b'\n', &mut self.partial)?;
        self.scanned_through += read as u64;
        if self.partial.last() == Some(&b'\n') {
            let bytes = self.partial.len() as u64;
            self.partial.pop();
            let text = String::from_utf8_lossy(&self.partial).into_owned();
            self.partial.clear();
            self.pending = Some(PendingLine { text, bytes });
        }
        // No trailing newline yet: keep the partial tail and report nothing;
        // the writer has not finished the line
        Ok(())
    }

    /// Mark the presented line as durably handed off, advancing the
    /// checkpoint by exactly its byte count; idempotent
    pub fn consume(&mut self) -> std::io::Result<()> {
        if let Some(line) = self.pending.take() {
            self.consumed_through += line.bytes;
            self.checkpoint.update(self.consumed_through)?;
        }
        Ok(())
    }

    /// True once the checkpoint has caught up to the file's current length,
    /// or the file was deleted out from under the reader
    pub fn is_finished(&self) -> bool {
        match std::fs::metadata(&self.pair.log_path) {
            Ok(m) => self.checkpoint.position() >= m.len(),
            Err(_) => true,
        }
    }

    /// Close the checkpoint; with `delete`, also remove both files when
    /// nothing unconsumed remains, otherwise leave the pair for a future
    /// pass
    pub fn close(&mut self, delete: bool) -> std::io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        // A torn tail keeps the checkpoint short of the file length, so
        // requiring both conditions never deletes a pair with bytes a
        // future pass could still deliver
        let done = !self.has_next_inner() && self.is_finished();
        self.checkpoint.close();
        if done && delete {
            self.pair.delete()?;
        }
        Ok(())
    }

    fn has_next_inner(&self) -> bool {
        self.pending.is_some() || self.available() > 0
    }
}

#[cfg(test)]
#[path = "reader_tests.rs"]
mod tests;
