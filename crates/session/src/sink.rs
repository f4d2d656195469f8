//! Outbound side of a session.

use memtree_tree::{CycleStats, NodeRef};

use crate::error::Error;

/// Receives everything a session has to show.
///
/// Calls happen on the task driving [`Session::tick`](crate::Session::tick), never from the
/// cycle worker, and only between cycles.
pub trait ReportSink {
	/// Called with the root after every completed cycle, and with `None` once the
	/// connection is torn down and the tree discarded.
	fn publish(&mut self, root: Option<NodeRef<'_>>);

	/// Called with the counters of each completed cycle, before [`Self::publish`].
	fn cycle_complete(&mut self, stats: &CycleStats) {
		let _ = stats;
	}

	/// Called once with the failure that ended a connection.
	fn fatal(&mut self, error: &Error);
}
