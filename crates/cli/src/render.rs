//! Plain-text table rendering of a published tree.

use std::io::{self, Write};

use memtree_report::record::{MISSING_COUNT, MISSING_RATE};
use memtree_session::{Error, ReportSink};
use memtree_tree::{CycleStats, NodeRef};

const HEADINGS: [&str; 6] = ["TCount", "SCount", "TkBytes", "SkBytes", "SCount/F", "Call/F"];

/// Prints the tree as an indented table after every cycle.
#[derive(Debug)]
pub struct TextRenderer<W> {
	out: W,
	last: Option<CycleStats>,
}

impl<W: Write> TextRenderer<W> {
	pub fn new(out: W) -> Self {
		Self { out, last: None }
	}

	#[cfg(test)]
	pub fn into_inner(self) -> W {
		self.out
	}

	fn render(&mut self, root: Option<NodeRef<'_>>) -> io::Result<()> {
		let Some(root) = root else {
			writeln!(self.out, "-- disconnected --")?;
			return self.out.flush();
		};
		if let Some(stats) = self.last.take() {
			writeln!(
				self.out,
				"-- cycle {}: {} nodes, {} new, {} pruned --",
				stats.generation, stats.records, stats.created, stats.pruned
			)?;
		}
		write_table(&mut self.out, root)?;
		self.out.flush()
	}
}

impl<W: Write> ReportSink for TextRenderer<W> {
	fn publish(&mut self, root: Option<NodeRef<'_>>) {
		if let Err(error) = self.render(root) {
			tracing::warn!(error = %error, "render.write");
		}
	}

	fn cycle_complete(&mut self, stats: &CycleStats) {
		self.last = Some(*stats);
	}

	fn fatal(&mut self, error: &Error) {
		if let Err(write) = writeln!(self.out, "!! {error}") {
			tracing::warn!(error = %write, "render.write");
		}
	}
}

/// Writes `root` and its descendants, one row per node, names indented by depth.
pub fn write_table(out: &mut impl Write, root: NodeRef<'_>) -> io::Result<()> {
	let rows: Vec<_> = root.walk().map(|(depth, node)| (format!("{}{}", "  ".repeat(depth), node.name()), node)).collect();
	let width = rows.iter().map(|(name, _)| name.chars().count()).max().unwrap_or(0).max("Name".len());

	let [tc, sc, tk, sk, spf, cpf] = HEADINGS;
	writeln!(out, "{:<width$}  {tc:>8} {sc:>8} {tk:>10} {sk:>10} {spf:>9} {cpf:>9}", "Name")?;
	for (name, node) in rows {
		writeln!(
			out,
			"{name:<width$}  {:>8} {:>8} {:>10.2} {:>10.2} {:>9} {:>9}",
			count(node.total_count()),
			count(node.self_count()),
			node.total_kilobytes(),
			node.self_kilobytes(),
			rate(node.self_count_per_frame()),
			rate(node.calls_per_frame()),
		)?;
	}
	Ok(())
}

fn count(value: i32) -> String {
	if value == MISSING_COUNT { "-".to_owned() } else { value.to_string() }
}

#[allow(clippy::float_cmp)]
fn rate(value: f64) -> String {
	if value == MISSING_RATE { "-".to_owned() } else { format!("{value:.2}") }
}
