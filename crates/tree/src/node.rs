use memtree_report::{Record, Stats};

/// Arena key of a node in a [`CallTree`](crate::CallTree).
///
/// Keys of pruned nodes are recycled once their cycle completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// One call-stack frame at one position in the tree.
#[derive(Debug, Clone)]
pub struct CallNode {
	pub(crate) id: String,
	pub(crate) name: String,
	pub(crate) level: u32,
	pub(crate) stats: Stats,
	pub(crate) parent: Option<NodeId>,
	pub(crate) children: Vec<NodeId>,
	pub(crate) prev: Option<NodeId>,
	pub(crate) next: Option<NodeId>,
	/// Generation of the last cycle that resolved this node.
	pub(crate) visited: u64,
}

/// Field values overwritten by a record, kept for rollback.
#[derive(Debug, Clone)]
pub(crate) struct Fields {
	pub id: String,
	pub name: String,
	pub level: u32,
	pub stats: Stats,
}

impl CallNode {
	pub(crate) fn new(id: String, parent: Option<NodeId>) -> Self {
		Self {
			id,
			name: String::new(),
			level: 0,
			stats: Stats::default(),
			parent,
			children: Vec::new(),
			prev: None,
			next: None,
			visited: 0,
		}
	}

	pub(crate) fn matches(&self, record: &Record) -> bool {
		self.level == record.level && self.stats == record.stats && self.id == record.id && self.name == record.name
	}

	/// Overwrites all fields from `record`, returning the previous values.
	pub(crate) fn assign(&mut self, record: &Record) -> Fields {
		Fields {
			id: std::mem::replace(&mut self.id, record.id.clone()),
			name: std::mem::replace(&mut self.name, record.name.clone()),
			level: std::mem::replace(&mut self.level, record.level),
			stats: std::mem::replace(&mut self.stats, record.stats),
		}
	}

	pub(crate) fn restore(&mut self, fields: Fields) {
		self.id = fields.id;
		self.name = fields.name;
		self.level = fields.level;
		self.stats = fields.stats;
	}

	/// Identity string, unique among siblings.
	pub fn id(&self) -> &str {
		&self.id
	}

	/// Display name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Depth as reported by the stream.
	pub fn level(&self) -> u32 {
		self.level
	}

	/// All metrics of the last applied record.
	pub fn stats(&self) -> &Stats {
		&self.stats
	}

	/// Live allocations including descendants, or `-1` when unavailable.
	pub fn total_count(&self) -> i32 {
		self.stats.total_count
	}

	/// Live allocations made directly by this frame, or `-1` when unavailable.
	pub fn self_count(&self) -> i32 {
		self.stats.self_count
	}

	/// Kilobytes held including descendants.
	pub fn total_kilobytes(&self) -> f64 {
		self.stats.total_kilobytes
	}

	/// Kilobytes held directly by this frame.
	pub fn self_kilobytes(&self) -> f64 {
		self.stats.self_kilobytes
	}

	/// Allocations per frame, or `-1` when unavailable.
	pub fn self_count_per_frame(&self) -> f64 {
		self.stats.self_count_per_frame
	}

	/// Calls per frame, or `-1` when unavailable.
	pub fn calls_per_frame(&self) -> f64 {
		self.stats.calls_per_frame
	}

	/// Structural parent; `None` for the root and for detached nodes.
	pub fn parent(&self) -> Option<NodeId> {
		self.parent
	}

	/// Children in the order they were first reported.
	pub fn children(&self) -> &[NodeId] {
		&self.children
	}

	/// Node resolved just before this one during the last cycle.
	pub fn previous_in_cycle(&self) -> Option<NodeId> {
		self.prev
	}

	/// Node resolved just after this one during the last cycle.
	pub fn next_in_cycle(&self) -> Option<NodeId> {
		self.next
	}
}
