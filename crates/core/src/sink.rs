// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sink trait and errors
//!
//! A sink is any destination that accepts records: a remote service, the
//! durable disk buffer, an in-memory cache. Sinks either succeed or return
//! an error; callers classify errors as retryable or permanent through
//! their own predicate.

use crate::level::LogLevel;
use crate::record::Record;
use std::io::Write;
use std::sync::Mutex;
use thiserror::Error;

/// Errors a sink can report from `push`
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("destination unavailable: {0}")]
    Unavailable(String),
    #[error("record rejected: {0}")]
    Rejected(String),
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

/// A destination for log records
///
/// Implementations must be thread-safe and must not retain references to
/// the record beyond the call; clone it if it needs to outlive `push`.
pub trait Sink: Send + Sync {
    fn push(&self, level: LogLevel, record: &Record) -> Result<(), SinkError>;
}

/// Writes each record as one JSON line to any `io::Write`
///
/// The simplest real sink: newline-delimited JSON to stdout, a file, or a
/// socket. The mutex keeps concurrent pushes from interleaving lines.
pub struct LineSink<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> LineSink<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    /// Consume the sink and return the underlying writer
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl<W: Write + Send> Sink for LineSink<W> {
    fn push(&self, _level: LogLevel, record: &Record) -> Result<(), SinkError> {
        let line = record.to_line()?;
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        out.write_all(line.as_bytes())?;
        out.write_all(b"\n")?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "sink_tests.rs"]
mod tests;
