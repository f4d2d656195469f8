use memtree_report::Record;
use slab::Slab;

use crate::journal::{Journal, Undo};
use crate::node::{CallNode, NodeId};
use crate::view::{Chain, NodeRef};

/// Persistent call tree updated one report cycle at a time.
///
/// The root node is created with the tree and keeps its [`NodeId`] for the tree's whole
/// lifetime; the first record of every cycle is applied to it.
#[derive(Debug)]
pub struct CallTree {
	pub(crate) nodes: Slab<CallNode>,
	pub(crate) root: NodeId,
	pub(crate) journal: Journal,
	/// Generation of the cycle in progress, or of the last one started.
	pub(crate) generation: u64,
	/// Completed cycles that carried at least one record.
	pub(crate) completed: u64,
}

impl Default for CallTree {
	fn default() -> Self {
		Self::new()
	}
}

impl CallTree {
	/// Creates a tree holding only an empty root.
	pub fn new() -> Self {
		let mut nodes = Slab::new();
		let root = NodeId(nodes.insert(CallNode::new(String::new(), None)));
		Self {
			nodes,
			root,
			journal: Journal::default(),
			generation: 0,
			completed: 0,
		}
	}

	/// Returns the root once a cycle with at least one record has completed.
	pub fn root(&self) -> Option<NodeId> {
		(self.completed > 0).then_some(self.root)
	}

	/// Returns a navigable view of the root, see [`Self::root`].
	pub fn view(&self) -> Option<NodeRef<'_>> {
		self.root().map(|id| NodeRef::new(self, id))
	}

	/// Returns a view of any live node.
	pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
		self.nodes.contains(id.0).then(|| NodeRef::new(self, id))
	}

	/// Returns the node stored under `id`.
	pub fn get(&self, id: NodeId) -> Option<&CallNode> {
		self.nodes.get(id.0)
	}

	/// Number of nodes held, root included.
	#[allow(clippy::len_without_is_empty, reason = "the root lives as long as the tree")]
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	/// Number of completed, non-empty cycles.
	pub fn completed_cycles(&self) -> u64 {
		self.completed
	}

	/// Iterates the traversal chain of the last completed cycle, starting at the root.
	pub fn chain(&self) -> Chain<'_> {
		Chain::new(self, self.root().map(|_| self.root))
	}

	pub(crate) fn at(&self, id: NodeId) -> &CallNode {
		&self.nodes[id.0]
	}

	/// Finds the child of `ancestor` with the given id, creating it if absent.
	///
	/// Returns the node and whether it was created.
	pub(crate) fn resolve_or_create(&mut self, ancestor: NodeId, id: &str) -> (NodeId, bool) {
		let existing = self.nodes[ancestor.0]
			.children
			.iter()
			.copied()
			.find(|child| self.nodes[child.0].id == id);
		if let Some(found) = existing {
			return (found, false);
		}

		let node = NodeId(self.nodes.insert(CallNode::new(id.to_owned(), Some(ancestor))));
		self.nodes[ancestor.0].children.push(node);
		self.journal.push(Undo::Created(node));
		(node, true)
	}

	/// Overwrites the node's fields with the record's values.
	pub(crate) fn assign(&mut self, id: NodeId, record: &Record) {
		let node = &mut self.nodes[id.0];
		if node.matches(record) {
			return;
		}
		let fields = node.assign(record);
		self.journal.push(Undo::Assigned {
			node: id,
			fields: Box::new(fields),
		});
	}

	/// Sets both traversal links of one node, leaving its neighbours untouched.
	pub(crate) fn relink(&mut self, id: NodeId, prev: Option<NodeId>, next: Option<NodeId>) {
		let node = &mut self.nodes[id.0];
		if node.prev == prev && node.next == next {
			return;
		}
		self.journal.push(Undo::Relinked {
			node: id,
			prev: node.prev,
			next: node.next,
		});
		node.prev = prev;
		node.next = next;
	}

	/// Appends `node` to the chain right after `previous`.
	///
	/// `node` keeps its own successor: it is where the previous cycle's order resumes.
	pub(crate) fn link_after(&mut self, previous: NodeId, node: NodeId) {
		let before = self.nodes[previous.0].prev;
		let after = self.nodes[node.0].next;
		self.relink(previous, before, Some(node));
		self.relink(node, Some(previous), after);
	}
}
