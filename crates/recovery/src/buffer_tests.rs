// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use logjam_core::LogLevel;
use std::sync::Mutex as StdMutex;
use tempfile::TempDir;

fn record(ix: u64) -> Record {
    let mut r = Record::new();
    r.insert("ix", ix);
    r.insert("level", 30);
    r
}

/// Sink that records pushes and fails on chosen indexes
#[derive(Default)]
struct ScriptedSink {
    received: StdMutex<Vec<Record>>,
    fail_at: StdMutex<Vec<(usize, bool)>>, // (push index, retryable)
    pushes: StdMutex<usize>,
}

impl ScriptedSink {
    fn fail_on(&self, index: usize, retryable: bool) {
        self.fail_at
            .lock()
            .unwrap()
            .push((index, retryable));
    }

    fn received(&self) -> Vec<Record> {
        self.received.lock().unwrap().clone()
    }
}

impl Sink for ScriptedSink {
    fn push(&self, _level: LogLevel, record: &Record) -> Result<(), SinkError> {
        let ix = {
            let mut pushes = self.pushes.lock().unwrap();
            let ix = *pushes;
            *pushes += 1;
            ix
        };
        let failure = self
            .fail_at
            .lock()
            .unwrap()
            .iter()
            .find(|(i, _)| *i == ix)
            .copied();
        if let Some((_, retryable)) = failure {
            return if retryable {
                Err(SinkError::Unavailable("scripted outage".into()))
            } else {
                Err(SinkError::Rejected("scripted rejection".into()))
            };
        }
        self.received.lock().unwrap().push(record.clone());
        Ok(())
    }
}

fn retryable(e: &SinkError) -> bool {
    matches!(e, SinkError::Unavailable(_))
}

#[test]
fn write_persists_one_json_line_per_record() {
    let dir = TempDir::new().unwrap();
    let buffer = DurableBuffer::open(dir.path()).unwrap();

    buffer.write(&record(0)).unwrap();
    buffer.write(&record(1)).unwrap();
    buffer.sync().unwrap();

    let pairs = buffer.dir().scan().unwrap();
    assert_eq!(pairs.len(), 1);
    let content = std::fs::read_to_string(&pairs[0].log_path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(Record::from_line(lines[0]).unwrap(), record(0));
    assert_eq!(Record::from_line(lines[1]).unwrap(), record(1));
}

#[test]
fn recover_drains_everything_and_deletes_pairs() {
    let dir = TempDir::new().unwrap();
    let buffer = DurableBuffer::open(dir.path()).unwrap();
    for ix in 0..5 {
        buffer.write(&record(ix)).unwrap();
    }

    let sink = ScriptedSink::default();
    assert!(buffer.recover(&sink, retryable).unwrap());

    let received = sink.received();
    assert_eq!(received.len(), 5);
    for (ix, r) in received.iter().enumerate() {
        assert_eq!(r, &record(ix as u64));
    }
    assert!(buffer.dir().scan().unwrap().is_empty());
}

#[test]
fn retryable_failure_stops_pass_and_keeps_remainder() {
    let dir = TempDir::new().unwrap();
    let buffer = DurableBuffer::open(dir.path()).unwrap();
    for ix in 0..10 {
        buffer.write(&record(ix)).unwrap();
    }

    let sink = ScriptedSink::default();
    sink.fail_on(4, true);
    assert!(!buffer.recover(&sink, retryable).unwrap());

    // 0..=3 delivered; 4..=9 still on disk
    assert_eq!(sink.received().len(), 4);
    let pairs = buffer.dir().scan().unwrap();
    assert_eq!(pairs.len(), 1);

    // A later pass picks up exactly where the checkpoint stopped
    let second = ScriptedSink::default();
    assert!(buffer.recover(&second, retryable).unwrap());
    let received = second.received();
    assert_eq!(received.len(), 6);
    assert_eq!(received[0], record(4));
    assert_eq!(received[5], record(9));
    assert!(buffer.dir().scan().unwrap().is_empty());
}

#[test]
fn non_retryable_failure_skips_the_record() {
    let dir = TempDir::new().unwrap();
    let buffer = DurableBuffer::open(dir.path()).unwrap();
    for ix in 0..3 {
        buffer.write(&record(ix)).unwrap();
    }

    let sink = ScriptedSink::default();
    sink.fail_on(1, false);
    assert!(buffer.recover(&sink, retryable).unwrap());

    // The rejected record is gone by policy; the rest arrive
    let received = sink.received();
    assert_eq!(received, [record(0), record(2)]);
    assert!(buffer.dir().scan().unwrap().is_empty());
}

#[test]
fn unparseable_line_is_skipped_not_fatal() {
    let dir = TempDir::new().unwrap();
    let buffer = DurableBuffer::open(dir.path()).unwrap();
    buffer.write(&record(0)).unwrap();

    // Corrupt a line in place (complete line, broken JSON)
    let pairs = buffer.dir().scan().unwrap();
    let mut content = std::fs::read_to_string(&pairs[0].log_path).unwrap();
    content.push_str("{not json\n");
    std::fs::write(&pairs[0].log_path, content).unwrap();
    buffer.write(&record(2)).unwrap();

    let sink = ScriptedSink::default();
    assert!(buffer.recover(&sink, retryable).unwrap());
    assert_eq!(sink.received(), [record(0), record(2)]);
}

#[test]
fn write_after_full_recovery_lands_in_a_live_pair() {
    let dir = TempDir::new().unwrap();
    let buffer = DurableBuffer::open(dir.path()).unwrap();
    buffer.write(&record(0)).unwrap();

    // The pass drains and deletes the pair the writer still has open
    let sink = ScriptedSink::default();
    assert!(buffer.recover(&sink, retryable).unwrap());
    assert!(buffer.dir().scan().unwrap().is_empty());

    // Later writes must not land in the deleted file's orphaned inode
    buffer.write(&record(1)).unwrap();
    buffer.write(&record(2)).unwrap();
    assert!(!buffer.dir().scan().unwrap().is_empty());

    let second = ScriptedSink::default();
    assert!(buffer.recover(&second, retryable).unwrap());
    assert_eq!(second.received(), [record(1), record(2)]);
}

#[test]
fn writes_during_replay_rotate_and_still_replay() {
    let dir = TempDir::new().unwrap();
    let buffer = std::sync::Arc::new(DurableBuffer::open(dir.path()).unwrap());
    for ix in 0..3 {
        buffer.write(&record(ix)).unwrap();
    }

    /// Sink that feeds new records back into the buffer while replaying,
    /// like live traffic landing during recovery
    struct FeedbackSink<'a> {
        buffer: &'a DurableBuffer,
        received: StdMutex<Vec<Record>>,
        fed: StdMutex<u64>,
    }

    impl Sink for FeedbackSink<'_> {
        fn push(&self, _level: LogLevel, r: &Record) -> Result<(), SinkError> {
            let mut fed = self.fed.lock().unwrap();
            if *fed < 2 {
                let mut extra = Record::new();
                extra.insert("ix", 100 + *fed);
                extra.insert("level", 30);
                self.buffer.write(&extra).map_err(SinkError::from)?;
                *fed += 1;
            }
            self.received.lock().unwrap().push(r.clone());
            Ok(())
        }
    }

    let sink = FeedbackSink {
        buffer: &buffer,
        received: StdMutex::new(Vec::new()),
        fed: StdMutex::new(0),
    };
    assert!(buffer.recover(&sink, retryable).unwrap());

    let got: Vec<u64> = sink
        .received
        .lock()
        .unwrap()
        .iter()
        .map(|r| r.get("ix").and_then(|v| v.as_u64()).unwrap())
        .collect();
    // Original backlog in order, then the records written mid-replay
    assert_eq!(got.len(), 5);
    assert_eq!(&got[..3], [0, 1, 2]);
    let mut tail = got[3..].to_vec();
    tail.sort_unstable();
    assert_eq!(tail, [100, 101]);
    assert!(buffer.dir().scan().unwrap().is_empty());
}
