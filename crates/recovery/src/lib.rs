// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! logjam-recovery: durable failover buffer for log delivery
//!
//! Guarantees records are not lost when the real destination is
//! temporarily unavailable, by buffering them to rotating local file
//! pairs and replaying them, in order, once the destination recovers.
//!
//! ## Architecture
//!
//! ```text
//! push → FailoverController ─ active ──→ real sink
//!                           └ passive ─→ DurableBuffer → FileAppender → <stamp>.<seq>.log
//!                                                                        <stamp>.<seq>.checkpoint
//! set_active(true) → DurableBuffer::recover
//!                      → ReplaySequencer → PairReader → Checkpoint
//!                      → real sink (in file order, checkpoint after delivery)
//! ```
//!
//! ## Delivery guarantees
//!
//! - At-least-once: the checkpoint advances only after the sink has
//!   accepted a record; a crash between forward and checkpoint update
//!   redelivers that one record
//! - Never silent loss: a retryable failure leaves everything unconsumed
//!   on disk; only a record the sink permanently rejects is skipped, and
//!   that is logged
//! - Order: per file, append order; across files, name order (chronological
//!   by construction); across a mode switch, backlog first, then records
//!   buffered during the transition, in arrival order

pub mod appender;
pub mod buffer;
pub mod cache;
pub mod checkpoint;
pub mod controller;
pub mod pairs;
pub mod reader;
pub mod sequencer;

pub use appender::{BufferPool, FileAppender};
pub use buffer::{BufferError, DurableBuffer};
pub use cache::TransientCache;
pub use checkpoint::Checkpoint;
pub use controller::{FailoverController, RetryPredicate};
pub use pairs::{FilePair, NameError, PairDir};
pub use reader::PairReader;
pub use sequencer::ReplaySequencer;
