//! Wire format for streaming call-stack allocation reports.
//!
//! A reporting process periodically re-sends its whole call tree as one line per
//! call-stack node, depth first:
//!
//! ```text
//! level;id;name;total_count;self_count;total_kilobytes;self_kilobytes;self_count_per_frame;calls_per_frame;
//! ```
//!
//! A cycle ends with two consecutive empty lines. This crate provides:
//! * [`Record`]: one decoded line, see [`Record::decode`]
//! * [`ReportReader`]: an async framer turning a line stream into [`Frame`]s
//! * [`ReportWriter`]: the emitting side, used by demo servers and tests
//!
//! Field separators inside names are not escaped by the emitter and are not supported.

#![warn(missing_docs)]

pub mod error;
pub mod reader;
pub mod record;
pub mod write;

pub use error::{DecodeError, Error, Result};
pub use reader::{Frame, ReportReader};
pub use record::{Line, Record, Stats};
pub use write::ReportWriter;
