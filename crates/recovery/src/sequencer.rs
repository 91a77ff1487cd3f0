// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ordered replay across all of a directory's file pairs
//!
//! Presents one logical stream of not-yet-consumed lines spanning
//! arbitrarily many rotated pairs, oldest first. Because the writer side
//! is live while replay runs, the sequencer re-scans the directory for
//! newly created pairs when it reaches the apparent end of its listing,
//! and caches at most one open reader per pair so repeated visits resume
//! instead of re-opening from scratch.

use crate::pairs::{FilePair, PairDir};
use crate::reader::{OnBeforeRead, PairReader, ReaderState};
use std::collections::{HashMap, HashSet, VecDeque};

/// Iterates pending lines across every pair in a directory, in name order
pub struct ReplaySequencer {
    dir: PairDir,
    // Remainder of the current listing generation, and the full generation
    // it was drawn from (a rescan excludes the previous generation)
    listing: VecDeque<FilePair>,
    generation: Vec<FilePair>,
    known_done: HashSet<FilePair>,
    readers: HashMap<FilePair, PairReader>,
    current: Option<FilePair>,
    last_state: Option<(FilePair, ReaderState)>,
}

impl ReplaySequencer {
    pub fn new(dir: PairDir) -> std::io::Result<Self> {
        let generation = dir.scan()?;
        Ok(Self {
            dir,
            listing: generation.iter().cloned().collect(),
            generation,
            known_done: HashSet::new(),
            readers: HashMap::new(),
            current: None,
            last_state: None,
        })
    }

    /// The next pending line, or `None` when every pair is exhausted
    ///
    /// The returned line stays unconsumed until [`consume`](Self::consume)
    /// is called; an abandoned line is re-presented on the next pass.
    pub fn next_line(&mut self, on_before_read: OnBeforeRead<'_>) -> std::io::Result<Option<String>> {
        let Some(pair) = self.ensure_current()? else {
            return Ok(None);
        };

        // A pair whose observable state did not change between two
        // consecutive visits is stalled or empty, not merely between
        // writes; stop revisiting it after this line
        if let Some(reader) = self.readers.get(&pair) {
            let state = reader.state();
            if self.last_state.as_ref() == Some(&(pair.clone(), state.clone())) {
                self.known_done.insert(pair.clone());
            }
            self.last_state = Some((pair.clone(), state));
        }

        match self.readers.get_mut(&pair) {
            Some(reader) => Ok(reader.next_line(on_before_read)?.map(str::to_string)),
            None => Ok(None),
        }
    }

    /// Mark the line returned by the last `next_line` as delivered,
    /// advancing its pair's checkpoint
    pub fn consume(&mut self) -> std::io::Result<()> {
        let Some(pair) = self.current.clone() else {
            return Ok(());
        };
        if let Some(reader) = self.readers.get_mut(&pair) {
            reader.consume()?;
            if !reader.has_next() {
                self.finish_pair(&pair)?;
                self.current = None;
            }
        }
        Ok(())
    }

    /// Pick (or keep) the oldest pair with pending lines
    fn ensure_current(&mut self) -> std::io::Result<Option<FilePair>> {
        if let Some(pair) = self.current.clone() {
            if self
                .readers
                .get(&pair)
                .map(PairReader::has_next)
                .unwrap_or(false)
            {
                return Ok(Some(pair));
            }
            self.finish_pair(&pair)?;
            self.current = None;
        }

        let mut last: Option<FilePair> = None;
        loop {
            let Some(pair) = self.next_pair()? else {
                return Ok(None);
            };
            if self.known_done.contains(&pair) {
                continue;
            }
            if !self.readers.contains_key(&pair) {
                match PairReader::open(pair.clone())? {
                    Some(reader) => {
                        self.readers.insert(pair.clone(), reader);
                    }
                    None => {
                        // Nothing to read: empty, or the checkpoint has
                        // caught up. Done for this pass; a later pass gets a
                        // fresh view if a live writer appends more
                        self.known_done.insert(pair.clone());
                        if last.as_ref() == Some(&pair) {
                            return Ok(None);
                        }
                        last = Some(pair);
                        continue;
                    }
                }
            }
            let has_next = self
                .readers
                .get(&pair)
                .map(PairReader::has_next)
                .unwrap_or(false);
            if has_next {
                self.current = Some(pair.clone());
                return Ok(Some(pair));
            }
            self.finish_pair(&pair)?;
            if last.as_ref() == Some(&pair) {
                return Ok(None);
            }
            last = Some(pair);
        }
    }

    /// Next pair from the listing, re-scanning the directory once the
    /// current generation is exhausted
    fn next_pair(&mut self) -> std::io::Result<Option<FilePair>> {
        if let Some(pair) = self.listing.pop_front() {
            return Ok(Some(pair));
        }
        let fresh: Vec<FilePair> = self
            .dir
            .scan()?
            .into_iter()
            .filter(|p| !self.generation.contains(p) && !self.known_done.contains(p))
            .collect();
        self.generation = fresh.clone();
        self.listing = fresh.into_iter().collect();
        Ok(self.listing.pop_front())
    }

    /// Close a pair's reader, deleting its files if fully consumed
    fn finish_pair(&mut self, pair: &FilePair) -> std::io::Result<()> {
        if let Some(mut reader) = self.readers.remove(pair) {
            reader.close(true)?;
        }
        self.known_done.insert(pair.clone());
        Ok(())
    }
}

impl Drop for ReplaySequencer {
    fn drop(&mut self) {
        // Best effort: close remaining checkpoints, deleting only pairs
        // that report finished
        for (_, mut reader) in self.readers.drain() {
            let _ = reader.close(true);
        }
    }
}

#[cfg(test)]
#[path = "sequencer_tests.rs"]
mod tests;
