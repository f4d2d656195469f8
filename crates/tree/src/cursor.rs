//! Mapping a flat record level onto the structural ancestor to search under.

use crate::error::{Error, Result};
use crate::node::NodeId;
use crate::tree::CallTree;

impl CallTree {
	/// Returns the ancestor under which a record at `level` must be resolved, starting
	/// from the previously resolved node `from`.
	///
	/// Walks up from `from` while the accumulated level drop has not exceeded
	/// `from.level - level`. Parent and child levels may differ by more than one, so the
	/// drop is accumulated from the actual levels along the way. The walk stops at the
	/// nearest node, `from` included, whose level is below `level`. A record deeper than
	/// `from` therefore becomes its child whatever the gap.
	///
	/// # Errors
	///
	/// [`Error::Ascent`] when the walk would pass the root.
	pub(crate) fn ascend(&self, from: NodeId, id: &str, level: u32) -> Result<NodeId> {
		let cursor_level = self.at(from).level;
		let mut remaining = i64::from(cursor_level) - i64::from(level);
		let mut current = from;
		while remaining > -1 {
			let node = self.at(current);
			let Some(parent) = node.parent else {
				return Err(Error::Ascent {
					id: id.to_owned(),
					level,
					cursor_level,
				});
			};
			remaining -= i64::from(node.level) - i64::from(self.at(parent).level);
			current = parent;
		}
		Ok(current)
	}
}
