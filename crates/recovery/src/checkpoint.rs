// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted replay position for one log file
//!
//! A checkpoint is a single u64 byte offset stored big-endian in its own
//! 8-byte file. It records how much of the companion log file has been
//! durably forwarded, and survives process restart. The offset is written
//! synchronously before `update` returns, but the record it covers is
//! forwarded first, so a crash between forward and update redelivers that
//! record (at-least-once, never loss).

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Persisted byte offset into one log file
///
/// Internally synchronized; concurrent `update`/`position` calls on one
/// instance are safe. Callers must not open two checkpoints on the same
/// file at once.
pub struct Checkpoint {
    path: PathBuf,
    inner: Mutex<Inner>,
}

struct Inner {
    position: u64,
    // Opened lazily on first update; dropped on close
    file: Option<File>,
}

impl Checkpoint {
    /// Open a checkpoint, reading the stored offset if one exists
    ///
    /// A missing or short (< 8 byte) file means position 0.
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let position = Self::read_stored(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            inner: Mutex::new(Inner {
                position,
                file: None,
            }),
        })
    }

    fn read_stored(path: &Path) -> std::io::Result<u64> {
        let meta = match std::fs::metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };
        if meta.len() < 8 {
            return Ok(0);
        }
        let mut file = File::open(path)?;
        let mut buf = [0u8; 8];
        file.read_exact(&mut buf)?;
        Ok(u64::from_be_bytes(buf))
    }

    /// The current in-memory position
    pub fn position(&self) -> u64 {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).position
    }

    /// Whether the position has caught up to the log file's length
    pub fn is_finished(&self, log_path: &Path) -> std::io::Result<bool> {
        Ok(self.position() >= std::fs::metadata(log_path)?.len())
    }

    /// Persist a new position, replacing the prior content
    ///
    /// The write completes before this returns; only then is the in-memory
    /// value considered official for restart purposes.
    pub fn update(&self, position: u64) -> std::io::Result<()> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.file.is_none() {
            inner.file = Some(
                OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(false)
                    .open(&self.path)?,
            );
        }
        if let Some(file) = inner.file.as_mut() {
            file.seek(SeekFrom::Start(0))?;
            file.write_all(&position.to_be_bytes())?;
        }
        inner.position = position;
        Ok(())
    }

    /// Release the underlying file handle
    ///
    /// A later `update` reopens it; the in-memory position is kept.
    pub fn close(&self) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).file = None;
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
