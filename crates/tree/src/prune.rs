//! Detaching nodes that a cycle skipped over.

use crate::journal::Undo;
use crate::node::NodeId;
use crate::tree::CallTree;

impl CallTree {
	/// Detaches `id` from both relations in one step.
	///
	/// The node leaves its parent's children and the traversal chain, whose neighbours are
	/// joined to each other. Its own descendants stay attached to it and go with it.
	pub(crate) fn detach(&mut self, id: NodeId) {
		debug_assert_ne!(id, self.root, "the root is never pruned");
		let node = self.at(id);
		let (prev, next, parent) = (node.prev, node.next, node.parent);

		if let Some(prev) = prev {
			let before = self.at(prev).prev;
			self.relink(prev, before, next);
		}
		if let Some(next) = next {
			let after = self.at(next).next;
			self.relink(next, prev, after);
		}
		self.relink(id, None, None);

		let Some(parent) = parent else {
			return;
		};
		let children = &mut self.nodes[parent.0].children;
		if let Some(index) = children.iter().position(|child| *child == id) {
			children.remove(index);
			self.nodes[id.0].parent = None;
			self.journal.push(Undo::Detached { node: id, parent, index });
		}
	}

	/// Detaches every chain successor of `previous` up to, not including, `current`.
	///
	/// `current` is the node just resolved. When it is not a successor of `previous` (it
	/// was just created) the whole remainder of the chain is detached.
	pub(crate) fn prune_between(&mut self, previous: NodeId, current: NodeId) -> usize {
		let mut pruned = 0;
		while let Some(next) = self.at(previous).next
			&& next != current
		{
			tracing::trace!(id = %self.at(next).id, "tree.prune");
			self.detach(next);
			pruned += 1;
		}
		pruned
	}

	/// Detaches the whole chain after `last`, the final node of a cycle.
	pub(crate) fn prune_after(&mut self, last: NodeId) -> usize {
		let mut pruned = 0;
		while let Some(next) = self.at(last).next {
			tracing::trace!(id = %self.at(next).id, "tree.prune.trailing");
			self.detach(next);
			pruned += 1;
		}
		pruned
	}
}
