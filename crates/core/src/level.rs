// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bunyan-compatible log levels
//!
//! Levels serialize as their bunyan numeric values (trace=10 .. fatal=60)
//! so emitted records are readable by standard bunyan tooling.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Log severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

/// The level table as data: (level, numeric value, name)
const LEVELS: [(LogLevel, u8, &str); 6] = [
    (LogLevel::Trace, 10, "trace"),
    (LogLevel::Debug, 20, "debug"),
    (LogLevel::Info, 30, "info"),
    (LogLevel::Warn, 40, "warn"),
    (LogLevel::Error, 50, "error"),
    (LogLevel::Fatal, 60, "fatal"),
];

impl LogLevel {
    /// Bunyan numeric value for this level
    pub fn value(self) -> u8 {
        match LEVELS.iter().find(|(l, _, _)| *l == self) {
            Some((_, v, _)) => *v,
            None => 30,
        }
    }

    /// Lowercase name for this level
    pub fn name(self) -> &'static str {
        match LEVELS.iter().find(|(l, _, _)| *l == self) {
            Some((_, _, n)) => n,
            None => "info",
        }
    }

    /// Map any numeric value to the nearest defined level
    ///
    /// Foreign frameworks use arbitrary numeric scales; values between two
    /// defined levels round to whichever is closest, ties rounding up.
    pub fn from_value(value: u8) -> Self {
        let mut best = LogLevel::Info;
        let mut best_distance = u8::MAX;
        for (level, v, _) in LEVELS {
            let distance = value.abs_diff(v);
            if distance < best_distance || (distance == best_distance && v > best.value()) {
                best = level;
                best_distance = distance;
            }
        }
        best
    }

    /// Parse a lowercase level name
    pub fn from_name(name: &str) -> Option<Self> {
        LEVELS
            .iter()
            .find(|(_, _, n)| *n == name)
            .map(|(l, _, _)| *l)
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Serialize for LogLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.value())
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u8::deserialize(deserializer)?;
        Ok(LogLevel::from_value(value))
    }
}

#[cfg(test)]
#[path = "level_tests.rs"]
mod tests;
