// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only log file writer
//!
//! One appender owns one log file. Appends go through a process-wide pool
//! of reusable byte buffers so the hot write path does not allocate per
//! record, and each record lands in the file as a single `write_all` of
//! `bytes + '\n'`.

use crate::pairs::FilePair;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, OnceLock};

const DEFAULT_BUFFER_CAPACITY: usize = 4096;
const MAX_POOLED_BUFFERS: usize = 16;

/// Process-wide pool of reusable write buffers
///
/// Checkout/return: a checked-out buffer is returned to the pool when the
/// guard drops, up to a bounded count so memory use stays flat under high
/// write concurrency.
pub struct BufferPool {
    buffers: Mutex<Vec<Vec<u8>>>,
    buffer_capacity: usize,
}

impl BufferPool {
    pub fn new(buffer_capacity: usize) -> Self {
        Self {
            buffers: Mutex::new(Vec::new()),
            buffer_capacity,
        }
    }

    /// The shared process-wide pool
    pub fn global() -> &'static BufferPool {
        static POOL: OnceLock<BufferPool> = OnceLock::new();
        POOL.get_or_init(|| BufferPool::new(DEFAULT_BUFFER_CAPACITY))
    }

    /// Check out an empty buffer; it returns to the pool on drop
    pub fn checkout(&self) -> PooledBuf<'_> {
        let buf = self
            .buffers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(self.buffer_capacity));
        PooledBuf { pool: self, buf }
    }

    fn give_back(&self, mut buf: Vec<u8>) {
        buf.clear();
        // Oversized buffers (one huge record) are dropped rather than pinned
        if buf.capacity() > self.buffer_capacity * 4 {
            return;
        }
        let mut buffers = self.buffers.lock().unwrap_or_else(|e| e.into_inner());
        if buffers.len() < MAX_POOLED_BUFFERS {
            buffers.push(buf);
        }
    }

    #[cfg(test)]
    fn pooled_count(&self) -> usize {
        self.buffers.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// A buffer checked out from a [`BufferPool`]
pub struct PooledBuf<'a> {
    pool: &'a BufferPool,
    buf: Vec<u8>,
}

impl Deref for PooledBuf<'_> {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.buf
    }
}

impl DerefMut for PooledBuf<'_> {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }
}

impl Drop for PooledBuf<'_> {
    fn drop(&mut self) {
        self.pool.give_back(std::mem::take(&mut self.buf));
    }
}

/// Append-only writer for one log file
///
/// Not internally locked; the owner serializes access (the durable buffer
/// holds its appender behind a mutex).
pub struct FileAppender {
    pair: FilePair,
    file: File,
    position: u64,
}

impl FileAppender {
    /// Open (creating if needed) the pair's log file for appending,
    /// resuming the byte offset from the current file length
    pub fn open(pair: FilePair) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&pair.log_path)?;
        let position = file.metadata()?.len();
        Ok(Self {
            pair,
            file,
            position,
        })
    }

    pub fn pair(&self) -> &FilePair {
        &self.pair
    }

    /// Byte offset after the last completed append
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Append one record's bytes plus the newline delimiter
    pub fn append(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let mut buf = BufferPool::global().checkout();
        buf.extend_from_slice(bytes);
        buf.push(b'\n');
        self.file.write_all(&buf)?;
        self.position += buf.len() as u64;
        Ok(())
    }

    /// Flush buffered data; with `force`, also fsync to the medium
    pub fn flush(&mut self, force: bool) -> std::io::Result<()> {
        self.file.flush()?;
        if force {
            self.file.sync_data()?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "appender_tests.rs"]
mod tests;
