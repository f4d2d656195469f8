//! Undo journal for the cycle in progress.

use crate::node::{Fields, NodeId};
use crate::tree::CallTree;

/// One reversible mutation.
#[derive(Debug)]
pub(crate) enum Undo {
	/// A node was inserted and appended to its parent's children.
	Created(NodeId),
	/// A node was removed from `parent.children[index]`.
	Detached { node: NodeId, parent: NodeId, index: usize },
	/// A node's traversal links were overwritten; holds the old links.
	Relinked {
		node: NodeId,
		prev: Option<NodeId>,
		next: Option<NodeId>,
	},
	/// A node's fields were overwritten; holds the old values.
	Assigned { node: NodeId, fields: Box<Fields> },
}

#[derive(Debug, Default)]
pub(crate) struct Journal {
	entries: Vec<Undo>,
}

impl Journal {
	pub fn push(&mut self, undo: Undo) {
		self.entries.push(undo);
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}
}

impl CallTree {
	/// Reverts every journaled mutation, newest first.
	pub(crate) fn rollback(&mut self) {
		let entries = std::mem::take(&mut self.journal.entries);
		let undone = entries.len();
		for undo in entries.into_iter().rev() {
			match undo {
				Undo::Created(node) => {
					if let Some(parent) = self.nodes[node.0].parent {
						self.nodes[parent.0].children.retain(|child| *child != node);
					}
					self.nodes.remove(node.0);
				}
				Undo::Detached { node, parent, index } => {
					self.nodes[parent.0].children.insert(index, node);
					self.nodes[node.0].parent = Some(parent);
				}
				Undo::Relinked { node, prev, next } => {
					let node = &mut self.nodes[node.0];
					node.prev = prev;
					node.next = next;
				}
				Undo::Assigned { node, fields } => self.nodes[node.0].restore(*fields),
			}
		}
		tracing::debug!(generation = self.generation, undone, "tree.cycle.rollback");
	}

	/// Drops the journal and reclaims every subtree detached during the cycle.
	///
	/// Returns the number of reclaimed nodes.
	pub(crate) fn commit(&mut self) -> usize {
		let entries = std::mem::take(&mut self.journal.entries);
		let mut reclaimed = 0;
		let mut stack = Vec::new();
		for undo in entries {
			let Undo::Detached { node, .. } = undo else {
				continue;
			};
			stack.push(node);
			while let Some(id) = stack.pop() {
				if let Some(removed) = self.nodes.try_remove(id.0) {
					stack.extend(removed.children);
					reclaimed += 1;
				}
			}
		}
		reclaimed
	}
}
