// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File pair naming and directory scanning
//!
//! A buffered log file and its checkpoint share a stem of
//! `<sortable-timestamp>.<4-digit-seq>`, so sorting pairs by file name is
//! sorting them chronologically. The sequence number lets one logical
//! generation rotate across multiple files without colliding names.
//!
//! Files whose names do not match the pattern are never touched; the
//! directory may be shared with unrelated files, and new pairs can appear
//! at any time from the live writer.

use chrono::Utc;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use thiserror::Error;

const LOG_EXT: &str = "log";
const CHECKPOINT_EXT: &str = "checkpoint";

/// Sortable timestamp used as the pair name prefix; no dots, so the stem
/// splits cleanly on '.'
const STAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S-%3f";

/// Errors from pair name handling
#[derive(Debug, Error)]
pub enum NameError {
    #[error("file name does not match <stamp>.<seq>.log: {name}")]
    Malformed { name: String },
}

/// A log file and its companion checkpoint file
///
/// Identity and ordering are the log file name.
#[derive(Debug, Clone)]
pub struct FilePair {
    pub log_path: PathBuf,
    pub checkpoint_path: PathBuf,
}

impl FilePair {
    fn from_parts(dir: &Path, stamp: &str, seq: u32) -> Self {
        let base = format!("{}.{:04}", stamp, seq);
        Self {
            log_path: dir.join(format!("{}.{}", base, LOG_EXT)),
            checkpoint_path: dir.join(format!("{}.{}", base, CHECKPOINT_EXT)),
        }
    }

    /// Build a pair from a log file path, validating the name
    pub fn from_log_path(log_path: &Path) -> Result<Self, NameError> {
        let (stamp, seq) = parse_log_name(log_path)?;
        let dir = log_path.parent().unwrap_or(Path::new(""));
        Ok(Self::from_parts(dir, &stamp, seq))
    }

    /// The pair that continues this one's generation: same timestamp
    /// prefix, sequence incremented
    ///
    /// Four digits sort correctly only up to 9999; past that the name
    /// starts a fresh generation at the current time instead of widening.
    pub fn next_in_sequence(&self) -> Result<Self, NameError> {
        let (stamp, seq) = parse_log_name(&self.log_path)?;
        let dir = self.log_path.parent().unwrap_or(Path::new(""));
        if seq >= 9999 {
            let stamp = Utc::now().format(STAMP_FORMAT).to_string();
            return Ok(Self::from_parts(dir, &stamp, 0));
        }
        Ok(Self::from_parts(dir, &stamp, seq + 1))
    }

    /// The log file name, used as pair identity
    pub fn name(&self) -> &str {
        self.log_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
    }

    /// Delete both files; missing files are not an error
    pub fn delete(&self) -> std::io::Result<()> {
        for path in [&self.checkpoint_path, &self.log_path] {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

impl PartialEq for FilePair {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for FilePair {}

impl Hash for FilePair {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
    }
}

impl PartialOrd for FilePair {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FilePair {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name().cmp(other.name())
    }
}

impl std::fmt::Display for FilePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Split `<stamp>.<seq>.log` into its parts; anything else is malformed
fn parse_log_name(log_path: &Path) -> Result<(String, u32), NameError> {
    let malformed = || NameError::Malformed {
        name: log_path.display().to_string(),
    };
    let name = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(malformed)?;

    let mut parts = name.split('.');
    let stamp = parts.next().ok_or_else(malformed)?;
    let seq = parts.next().ok_or_else(malformed)?;
    let ext = parts.next().ok_or_else(malformed)?;
    if parts.next().is_some() || ext != LOG_EXT {
        return Err(malformed());
    }
    // A stamp starts with a 4-digit year; good enough to reject strays
    // like editor backups without a full date parse
    if stamp.len() < 4 || !stamp.as_bytes()[..4].iter().all(u8::is_ascii_digit) {
        return Err(malformed());
    }
    if seq.is_empty() || !seq.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    let seq = seq.parse::<u32>().map_err(|_| malformed())?;
    Ok((stamp.to_string(), seq))
}

/// A directory of file pairs owned by one writing process
#[derive(Debug, Clone)]
pub struct PairDir {
    dir: PathBuf,
}

impl PairDir {
    /// Open the directory, creating it if needed
    pub fn open(dir: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// A pair named for the current time with sequence 0, bumping the
    /// sequence past any name already on disk
    pub fn fresh_pair(&self) -> FilePair {
        let stamp = Utc::now().format(STAMP_FORMAT).to_string();
        let mut seq = 0;
        loop {
            let pair = FilePair::from_parts(&self.dir, &stamp, seq);
            if !pair.log_path.exists() {
                return pair;
            }
            seq += 1;
        }
    }

    /// All well-formed pairs in the directory, in name (chronological) order
    pub fn scan(&self) -> std::io::Result<Vec<FilePair>> {
        let mut pairs = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(LOG_EXT) {
                continue;
            }
            if let Ok(pair) = FilePair::from_log_path(&path) {
                pairs.push(pair);
            }
        }
        pairs.sort();
        Ok(pairs)
    }
}

#[cfg(test)]
#[path = "pairs_tests.rs"]
mod tests;
