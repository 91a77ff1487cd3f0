// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! logjam-core: record model and sink seam for bunyan-style logging
//!
//! This crate provides:
//! - Bunyan-compatible numeric log levels
//! - Ordered JSON log records with line (de)serialization
//! - An explicit builder (`Log`) and a named `Logger` that pre-fills
//!   the standard bunyan fields
//! - The `Sink` trait every destination implements

pub mod level;
pub mod logger;
pub mod record;
pub mod sink;

pub use level::LogLevel;
pub use logger::{Log, Logger};
pub use record::Record;
pub use sink::{LineSink, Sink, SinkError};
