// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named logger and explicit record builder
//!
//! `Logger` hands out `Log` builders pre-filled with the standard bunyan
//! fields (`name`, `level`, `time`, `pid`, `v`). A builder accumulates
//! key/value pairs and is finalized by an explicit `build()` or
//! `submit()` call; dropping an unsubmitted builder discards it.

use crate::level::LogLevel;
use crate::record::Record;
use crate::sink::{Sink, SinkError};
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use std::sync::Arc;

/// Bunyan log format version emitted in the `v` field
const FORMAT_VERSION: u8 = 0;

/// A named logger bound to a sink
#[derive(Clone)]
pub struct Logger {
    name: String,
    sink: Arc<dyn Sink>,
    min_level: LogLevel,
    bound: Record,
}

impl Logger {
    pub fn new(name: impl Into<String>, sink: Arc<dyn Sink>) -> Self {
        Self {
            name: name.into(),
            sink,
            min_level: LogLevel::Trace,
            bound: Record::new(),
        }
    }

    /// Drop records below the given level at build time
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// A child logger whose records all carry the given extra fields
    pub fn child(&self, bound: Record) -> Self {
        let mut merged = self.bound.clone();
        for (k, v) in bound.iter() {
            merged.insert(k.clone(), v.clone());
        }
        Self {
            name: self.name.clone(),
            sink: Arc::clone(&self.sink),
            min_level: self.min_level,
            bound: merged,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn trace(&self, msg: &str) -> Log {
        self.log(LogLevel::Trace, msg)
    }

    pub fn debug(&self, msg: &str) -> Log {
        self.log(LogLevel::Debug, msg)
    }

    pub fn info(&self, msg: &str) -> Log {
        self.log(LogLevel::Info, msg)
    }

    pub fn warn(&self, msg: &str) -> Log {
        self.log(LogLevel::Warn, msg)
    }

    pub fn error(&self, msg: &str) -> Log {
        self.log(LogLevel::Error, msg)
    }

    pub fn fatal(&self, msg: &str) -> Log {
        self.log(LogLevel::Fatal, msg)
    }

    /// Start a builder at the given level
    pub fn log(&self, level: LogLevel, msg: &str) -> Log {
        let mut record = Record::new();
        record.insert("name", self.name.clone());
        record.insert("msg", msg);
        record.insert("level", level.value());
        record.insert(
            "time",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        );
        record.insert("pid", std::process::id());
        record.insert("v", FORMAT_VERSION);
        for (k, v) in self.bound.iter() {
            record.insert(k.clone(), v.clone());
        }
        Log {
            sink: Arc::clone(&self.sink),
            level,
            record,
            enabled: level >= self.min_level,
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("min_level", &self.min_level)
            .finish_non_exhaustive()
    }
}

/// An in-progress log record
///
/// Finalize with `submit()` to deliver to the logger's sink, or `build()`
/// to take the record without delivering it.
#[must_use = "a Log does nothing until submit() or build() is called"]
pub struct Log {
    sink: Arc<dyn Sink>,
    level: LogLevel,
    record: Record,
    enabled: bool,
}

impl Log {
    /// Add a field; unserializable values are recorded as an error string
    /// rather than failing the builder
    pub fn add(mut self, key: impl Into<String>, value: impl serde::Serialize) -> Self {
        let value = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(e) => Value::String(format!("<unserializable: {}>", e)),
        };
        self.record.insert(key, value);
        self
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Finalize without delivering
    pub fn build(self) -> Record {
        self.record
    }

    /// Deliver to the sink; below-threshold records are silently dropped
    pub fn submit(self) -> Result<(), SinkError> {
        if !self.enabled {
            return Ok(());
        }
        self.sink.push(self.level, &self.record)
    }
}

#[cfg(test)]
#[path = "logger_tests.rs"]
mod tests;
