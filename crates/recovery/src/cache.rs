// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory FIFO sink for the mode-transition window
//!
//! While a recovery pass replays the backlog, concurrent pushes land here
//! instead of interleaving with the replay; the controller drains the
//! cache into the final destination once the transition settles.

use logjam_core::{LogLevel, Record, Sink, SinkError};
use std::collections::VecDeque;
use std::sync::Mutex;

/// FIFO of records held in memory during a mode transition
#[derive(Default)]
pub struct TransientCache {
    records: Mutex<VecDeque<(LogLevel, Record)>>,
}

impl TransientCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything, in arrival order
    pub fn drain(&self) -> Vec<(LogLevel, Record)> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain(..)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Sink for TransientCache {
    fn push(&self, level: LogLevel, record: &Record) -> Result<(), SinkError> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back((level, record.clone()));
        Ok(())
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
