//! Async framing of a report stream into records and cycle boundaries.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error::{Error, Result};
use crate::record::{Line, Record};

/// One unit read from a report stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
	/// A node record of the current cycle.
	Record(Record),
	/// Two consecutive blank lines: the current cycle is complete.
	EndOfCycle,
}

/// Reads [`Frame`]s from a line-oriented report stream.
///
/// A single blank line is swallowed; only a blank line directly following another blank
/// line ends a cycle.
#[derive(Debug)]
pub struct ReportReader<R> {
	input: R,
	buf: String,
	line: u64,
	pending_blank: bool,
	in_cycle: bool,
}

impl<R> ReportReader<R>
where
	R: AsyncBufRead + Unpin,
{
	/// Wraps a buffered line source.
	pub fn new(input: R) -> Self {
		Self {
			input,
			buf: String::new(),
			line: 0,
			pending_blank: false,
			in_cycle: false,
		}
	}

	/// Reads the next frame.
	///
	/// Returns `Ok(None)` once the stream reaches EOF. Use [`Self::in_cycle`] to tell
	/// whether the EOF cut a cycle short.
	///
	/// # Errors
	///
	/// - `Error::Io` when the underlying stream fails, including invalid UTF-8.
	/// - `Error::Malformed` when a non-blank line does not decode.
	pub async fn next_frame(&mut self) -> Result<Option<Frame>> {
		loop {
			self.buf.clear();
			if self.input.read_line(&mut self.buf).await? == 0 {
				return Ok(None);
			}
			self.line += 1;

			let raw = self.buf.strip_suffix('\n').unwrap_or(&self.buf);
			let decoded = Line::decode(raw).map_err(|source| Error::Malformed {
				line: self.line,
				source,
			})?;

			match decoded {
				Line::Blank if self.pending_blank => {
					self.pending_blank = false;
					self.in_cycle = false;
					tracing::trace!(line = self.line, "report.cycle.end");
					return Ok(Some(Frame::EndOfCycle));
				}
				Line::Blank => self.pending_blank = true,
				Line::Record(record) => {
					self.pending_blank = false;
					self.in_cycle = true;
					return Ok(Some(Frame::Record(record)));
				}
			}
		}
	}

	/// Returns true when at least one record of an unfinished cycle has been consumed.
	pub fn in_cycle(&self) -> bool {
		self.in_cycle
	}

	/// Returns the number of lines consumed so far.
	pub fn line_number(&self) -> u64 {
		self.line
	}

	/// Consumes the reader, returning the line source.
	pub fn into_inner(self) -> R {
		self.input
	}
}
