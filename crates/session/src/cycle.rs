//! Pumping one cycle of records from a stream into a tree.

use memtree_report::{Frame, ReportReader};
use memtree_tree::{CallTree, CycleStats};
use memtree_worker::GenerationToken;
use tokio::io::AsyncBufRead;

use crate::error::{Error, Result};

/// How a call to [`read_cycle`] ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
	/// The cycle terminator was read and the cycle committed.
	Completed(CycleStats),
	/// The stream ended cleanly between cycles. The tree is unchanged.
	EndOfStream,
}

/// Reads records up to the next cycle terminator and applies them to `tree`.
///
/// `token` is checked before every line. On any error the partial cycle is rolled back,
/// leaving `tree` as of the last completed cycle.
///
/// # Errors
///
/// - [`Error::Report`] for a malformed line or a failing stream.
/// - [`Error::Tree`] for a record the tree rejects.
/// - [`Error::StreamTerminated`] when the stream ends inside a cycle.
/// - [`Error::Cancelled`] when `token` is cancelled first.
pub async fn read_cycle<R>(tree: &mut CallTree, reader: &mut ReportReader<R>, token: &GenerationToken) -> Result<CycleOutcome>
where
	R: AsyncBufRead + Unpin,
{
	let mut cycle = tree.begin_cycle();
	loop {
		let frame = tokio::select! {
			biased;
			() = token.cancelled() => {
				tracing::debug!(connection = token.generation(), line = reader.line_number(), "session.cycle.cancelled");
				return Err(Error::Cancelled);
			}
			frame = reader.next_frame() => frame?,
		};

		match frame {
			Some(Frame::Record(record)) => {
				cycle.apply(&record).map_err(|source| Error::Tree {
					line: reader.line_number(),
					source,
				})?;
			}
			Some(Frame::EndOfCycle) => return Ok(CycleOutcome::Completed(cycle.finish())),
			None if reader.in_cycle() => {
				return Err(Error::StreamTerminated {
					line: reader.line_number(),
				});
			}
			None => return Ok(CycleOutcome::EndOfStream),
		}
	}
}

#[cfg(test)]
mod tests {
	use std::io::Cursor;

	use memtree_report::{DecodeError, Record};
	use memtree_worker::GenerationClock;
	use pretty_assertions::assert_eq;
	use tokio::io::BufReader;

	use super::*;

	type TextReader = ReportReader<BufReader<Cursor<Vec<u8>>>>;

	fn reader(text: &str) -> TextReader {
		ReportReader::new(BufReader::new(Cursor::new(text.as_bytes().to_vec())))
	}

	fn line(level: u32, id: &str) -> String {
		format!("{}\n", Record::new(level, id, id))
	}

	fn ids(tree: &CallTree) -> Vec<(usize, String)> {
		tree.view()
			.map(|root| root.walk().map(|(depth, node)| (depth, node.id().to_owned())).collect())
			.unwrap_or_default()
	}

	fn owned(shape: &[(usize, &str)]) -> Vec<(usize, String)> {
		shape.iter().map(|&(depth, id)| (depth, id.to_owned())).collect()
	}

	#[tokio::test]
	async fn consecutive_cycles_update_the_tree() {
		let text = [line(0, "r"), line(1, "a"), line(1, "b"), "\n\n".into(), line(0, "r"), line(1, "b"), "\n\n".into()].concat();
		let mut reader = reader(&text);
		let mut tree = CallTree::new();
		let token = GenerationClock::new().issue();

		let first = read_cycle(&mut tree, &mut reader, &token).await.unwrap();
		assert!(matches!(first, CycleOutcome::Completed(stats) if stats.records == 3 && stats.created == 2));
		assert_eq!(ids(&tree), owned(&[(0, "r"), (1, "a"), (1, "b")]));

		let second = read_cycle(&mut tree, &mut reader, &token).await.unwrap();
		assert!(matches!(second, CycleOutcome::Completed(stats) if stats.pruned == 1));
		assert_eq!(ids(&tree), owned(&[(0, "r"), (1, "b")]));

		assert_eq!(read_cycle(&mut tree, &mut reader, &token).await.unwrap(), CycleOutcome::EndOfStream);
		assert_eq!(ids(&tree), owned(&[(0, "r"), (1, "b")]));
	}

	#[tokio::test]
	async fn malformed_line_rolls_back() {
		let text = [line(0, "r"), line(1, "a"), "\n\n".into(), line(0, "r"), line(1, "x"), "1;y;y;0;0;bad;0;0;0\n".into()].concat();
		let mut reader = reader(&text);
		let mut tree = CallTree::new();
		let token = GenerationClock::new().issue();

		read_cycle(&mut tree, &mut reader, &token).await.unwrap();
		let err = read_cycle(&mut tree, &mut reader, &token).await.unwrap_err();
		assert!(matches!(
			err,
			Error::Report(memtree_report::Error::Malformed {
				line: 7,
				source: DecodeError::InvalidKilobytes { .. }
			})
		));
		assert_eq!(ids(&tree), owned(&[(0, "r"), (1, "a")]));
		assert_eq!(tree.completed_cycles(), 1);
	}

	#[tokio::test]
	async fn ascent_past_root_carries_line_number() {
		let text = [line(1, "r"), line(2, "a"), line(0, "z"), "\n\n".into()].concat();
		let mut tree = CallTree::new();
		let token = GenerationClock::new().issue();

		let err = read_cycle(&mut tree, &mut reader(&text), &token).await.unwrap_err();
		assert!(matches!(err, Error::Tree { line: 3, source: memtree_tree::Error::Ascent { .. } }));
		assert!(tree.view().is_none());
	}

	#[tokio::test]
	async fn eof_inside_cycle_is_stream_termination() {
		let text = [line(0, "r"), line(1, "a")].concat();
		let mut tree = CallTree::new();
		let token = GenerationClock::new().issue();

		let err = read_cycle(&mut tree, &mut reader(&text), &token).await.unwrap_err();
		assert!(matches!(err, Error::StreamTerminated { line: 2 }));
		assert!(tree.view().is_none());
	}

	#[tokio::test]
	async fn cancelled_token_stops_before_reading() {
		let text = [line(0, "r"), "\n\n".into()].concat();
		let mut reader = reader(&text);
		let mut tree = CallTree::new();
		let token = GenerationClock::new().issue();
		token.cancel();

		let err = read_cycle(&mut tree, &mut reader, &token).await.unwrap_err();
		assert!(matches!(err, Error::Cancelled));
		assert_eq!(reader.line_number(), 0);
		assert!(tree.view().is_none());
	}
}
