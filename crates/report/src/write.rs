//! Emitting side of the wire format.

use std::io;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::record::Record;

/// Writes whole report cycles to an async byte sink.
#[derive(Debug)]
pub struct ReportWriter<W> {
	output: W,
	buf: String,
}

impl<W> ReportWriter<W>
where
	W: AsyncWrite + Unpin,
{
	/// Wraps a byte sink.
	pub fn new(output: W) -> Self {
		Self {
			output,
			buf: String::new(),
		}
	}

	/// Writes one cycle, depth first as given, followed by the cycle terminator, and flushes.
	///
	/// # Errors
	///
	/// Returns the underlying I/O error.
	pub async fn write_cycle<'a>(&mut self, records: impl IntoIterator<Item = &'a Record>) -> io::Result<()> {
		self.buf.clear();
		encode_cycle(&mut self.buf, records);
		self.output.write_all(self.buf.as_bytes()).await?;
		self.output.flush().await
	}

	/// Consumes the writer, returning the sink.
	pub fn into_inner(self) -> W {
		self.output
	}
}

/// Appends one encoded cycle to `out`.
pub fn encode_cycle<'a>(out: &mut String, records: impl IntoIterator<Item = &'a Record>) {
	use std::fmt::Write as _;

	for record in records {
		let _ = writeln!(out, "{record}");
	}
	out.push_str("\n\n");
}
