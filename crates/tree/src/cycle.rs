//! Applying one report cycle to a [`CallTree`].

use memtree_report::Record;

use crate::error::{Error, Result};
use crate::node::NodeId;
use crate::tree::CallTree;

/// Counters describing one completed cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
	/// Generation number of the cycle.
	pub generation: u64,
	/// Records applied.
	pub records: usize,
	/// Nodes created.
	pub created: usize,
	/// Existing nodes matched by a record, root included.
	pub reused: usize,
	/// Nodes detached from the tree.
	pub pruned: usize,
	/// Nodes reclaimed, detached nodes and their descendants.
	pub reclaimed: usize,
}

/// Single-pass application of one cycle's records.
///
/// Obtained from [`CallTree::begin_cycle`]. The builder holds the tree exclusively until it
/// is finished or dropped. Dropping it without calling [`Self::finish`] rolls back every
/// change made by the cycle.
#[derive(Debug)]
pub struct CycleBuilder<'t> {
	tree: &'t mut CallTree,
	cursor: Option<NodeId>,
	stats: CycleStats,
	done: bool,
}

impl CallTree {
	/// Starts a new cycle.
	pub fn begin_cycle(&mut self) -> CycleBuilder<'_> {
		self.generation += 1;
		tracing::trace!(generation = self.generation, "tree.cycle.begin");
		CycleBuilder {
			stats: CycleStats {
				generation: self.generation,
				..CycleStats::default()
			},
			tree: self,
			cursor: None,
			done: false,
		}
	}
}

impl CycleBuilder<'_> {
	/// Applies the next record of the cycle and returns the node it resolved to.
	///
	/// The first record of a cycle always describes the root. Each later record is looked up
	/// by id under the ancestor selected from its level, created if absent, and overwrites
	/// the node's fields. Nodes that the previous cycle visited between the last resolved node
	/// and this one are detached.
	///
	/// # Errors
	///
	/// - [`Error::Ascent`] when the level is not deeper than the root's.
	/// - [`Error::DuplicateRecord`] when the node was already resolved by this cycle.
	///
	/// The cycle cannot continue after an error; drop the builder to roll it back.
	pub fn apply(&mut self, record: &Record) -> Result<NodeId> {
		let generation = self.stats.generation;
		let node = match self.cursor {
			None => {
				self.stats.reused += 1;
				self.tree.root
			}
			Some(previous) => {
				let ancestor = self.tree.ascend(previous, &record.id, record.level)?;
				let (node, created) = self.tree.resolve_or_create(ancestor, &record.id);
				if created {
					self.stats.created += 1;
				} else if self.tree.at(node).visited == generation {
					return Err(Error::DuplicateRecord {
						id: record.id.clone(),
						level: record.level,
					});
				} else {
					self.stats.reused += 1;
				}
				self.stats.pruned += self.tree.prune_between(previous, node);
				self.tree.link_after(previous, node);
				node
			}
		};

		self.tree.nodes[node.0].visited = generation;
		self.tree.assign(node, record);
		self.cursor = Some(node);
		self.stats.records += 1;
		Ok(node)
	}

	/// Returns the counters accumulated so far.
	pub fn stats(&self) -> &CycleStats {
		&self.stats
	}

	/// Completes the cycle: detaches whatever the previous cycle visited after the last
	/// resolved node, reclaims detached subtrees and makes the changes permanent.
	///
	/// A cycle without records leaves the tree untouched.
	pub fn finish(mut self) -> CycleStats {
		if let Some(last) = self.cursor {
			self.stats.pruned += self.tree.prune_after(last);
			self.tree.completed += 1;
		}
		let journaled = self.tree.journal.len();
		self.stats.reclaimed = self.tree.commit();
		self.done = true;

		let stats = self.stats;
		tracing::debug!(
			generation = stats.generation,
			records = stats.records,
			created = stats.created,
			reused = stats.reused,
			pruned = stats.pruned,
			reclaimed = stats.reclaimed,
			journaled,
			"tree.cycle.commit"
		);
		stats
	}

	/// Abandons the cycle, restoring the tree as of the last completed cycle.
	pub fn abort(mut self) {
		self.tree.rollback();
		self.done = true;
	}
}

impl Drop for CycleBuilder<'_> {
	fn drop(&mut self) {
		if !self.done {
			self.tree.rollback();
		}
	}
}
