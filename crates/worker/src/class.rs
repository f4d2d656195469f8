/// Execution classes used to tag spawned work in traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// Reading one report cycle off a stream and applying it to the tree.
	Ingest,
	/// Writing report streams to connected viewers.
	Serve,
	/// Blocking file I/O executed on the blocking pool.
	IoBlocking,
}

impl TaskClass {
	pub(crate) const fn as_str(self) -> &'static str {
		match self {
			Self::Ingest => "ingest",
			Self::Serve => "serve",
			Self::IoBlocking => "io_blocking",
		}
	}
}
