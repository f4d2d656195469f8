//! Drives a [`CallTree`](memtree_tree::CallTree) from a live report stream.
//!
//! A [`Session`] owns at most one connection. On every [`Session::tick`] it checks whether the
//! previous cycle finished, publishes the tree to its [`ReportSink`] if it did, and starts
//! reading the next cycle on a background worker. The tree and the stream move into that
//! worker for the duration of the cycle, so a second parse can never start while one is
//! running and nothing can observe a half-applied cycle.
//!
//! Any failure inside a cycle rolls the tree back, is reported through
//! [`ReportSink::fatal`] and tears the connection down.

#![warn(missing_docs)]

pub mod config;
pub mod cycle;
pub mod error;
pub mod session;
pub mod sink;

pub use config::{ConfigError, SessionConfig};
pub use cycle::{CycleOutcome, read_cycle};
pub use error::{Error, Result};
pub use session::{Session, Source, Tick};
pub use sink::ReportSink;
