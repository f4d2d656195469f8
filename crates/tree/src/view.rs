//! Read-only navigation over a [`CallTree`].

use std::ops::Deref;

use crate::node::{CallNode, NodeId};
use crate::tree::CallTree;

/// Borrowed handle to one node and the tree holding it.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
	tree: &'a CallTree,
	key: NodeId,
}

impl<'a> NodeRef<'a> {
	pub(crate) fn new(tree: &'a CallTree, key: NodeId) -> Self {
		Self { tree, key }
	}

	/// Arena key of the node.
	pub fn key(&self) -> NodeId {
		self.key
	}

	/// The underlying node.
	pub fn node(&self) -> &'a CallNode {
		self.tree.at(self.key)
	}

	/// Identity string, see [`CallNode::id`].
	pub fn id(&self) -> &'a str {
		&self.node().id
	}

	/// Display name, see [`CallNode::name`].
	pub fn name(&self) -> &'a str {
		&self.node().name
	}

	/// Parent node, if any.
	pub fn parent(&self) -> Option<NodeRef<'a>> {
		let tree = self.tree;
		self.node().parent.map(|key| NodeRef::new(tree, key))
	}

	/// Children in report order.
	pub fn children(&self) -> impl ExactSizeIterator<Item = NodeRef<'a>> + use<'a> {
		let tree = self.tree;
		self.node().children.iter().map(move |&key| NodeRef::new(tree, key))
	}

	/// Direct child with the given id.
	pub fn child(&self, id: &str) -> Option<NodeRef<'a>> {
		self.children().find(|child| child.id() == id)
	}

	/// Follows a path of child ids starting below this node.
	pub fn find<'p>(&self, path: impl IntoIterator<Item = &'p str>) -> Option<NodeRef<'a>> {
		path.into_iter().try_fold(*self, |node, id| node.child(id))
	}

	/// Depth-first walk of this node and its descendants.
	pub fn walk(&self) -> Walk<'a> {
		Walk {
			tree: self.tree,
			stack: vec![(self.key, 0)],
		}
	}
}

impl Deref for NodeRef<'_> {
	type Target = CallNode;

	fn deref(&self) -> &CallNode {
		self.node()
	}
}

/// Pre-order iterator yielding each node with its structural depth below the start node.
#[derive(Debug, Clone)]
pub struct Walk<'a> {
	tree: &'a CallTree,
	stack: Vec<(NodeId, usize)>,
}

impl<'a> Iterator for Walk<'a> {
	type Item = (usize, NodeRef<'a>);

	fn next(&mut self) -> Option<Self::Item> {
		let (key, depth) = self.stack.pop()?;
		let node = NodeRef::new(self.tree, key);
		self.stack.extend(node.node().children.iter().rev().map(|&child| (child, depth + 1)));
		Some((depth, node))
	}
}

/// Iterator over the traversal chain, in resolution order.
#[derive(Debug, Clone)]
pub struct Chain<'a> {
	tree: &'a CallTree,
	next: Option<NodeId>,
}

impl<'a> Chain<'a> {
	pub(crate) fn new(tree: &'a CallTree, start: Option<NodeId>) -> Self {
		Self { tree, next: start }
	}
}

impl<'a> Iterator for Chain<'a> {
	type Item = NodeRef<'a>;

	fn next(&mut self) -> Option<Self::Item> {
		let key = self.next?;
		let node = NodeRef::new(self.tree, key);
		self.next = node.node().next;
		Some(node)
	}
}
