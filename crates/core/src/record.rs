// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ordered JSON log records
//!
//! A record is an insertion-ordered mapping of string keys to JSON values,
//! always carrying at least a message and a level. The delivery engine
//! treats records as opaque units; only serialization and the level/message
//! accessors look inside.

use crate::level::LogLevel;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One structured log entry
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self { fields: Map::new() }
    }

    /// Insert a field, replacing any existing value for the key
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The `msg` field, if present and a string
    pub fn message(&self) -> Option<&str> {
        self.fields.get("msg").and_then(Value::as_str)
    }

    /// The level recorded in the `level` field, mapped to the nearest
    /// defined level; defaults to Info when absent or non-numeric
    pub fn level(&self) -> LogLevel {
        self.fields
            .get("level")
            .and_then(Value::as_u64)
            .map(|v| LogLevel::from_value(v.min(u64::from(u8::MAX)) as u8))
            .unwrap_or(LogLevel::Info)
    }

    /// Serialize to a single JSON line (no trailing newline)
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse from a single line of JSON
    pub fn from_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
