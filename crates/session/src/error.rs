//! Session error types.

use thiserror::Error;

use crate::config::ConfigError;

/// Failures that end a cycle or a connection.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
	/// The stream produced a malformed line or failed to read.
	#[error(transparent)]
	Report(#[from] memtree_report::Error),

	/// A well-formed record could not be placed in the tree.
	#[error("line {line}: {source}")]
	Tree {
		/// Line number of the offending record.
		line: u64,
		/// The rejection.
		#[source]
		source: memtree_tree::Error,
	},

	/// The stream closed in the middle of a cycle.
	#[error("report stream closed mid-cycle after line {line}")]
	StreamTerminated {
		/// Last line read before the stream closed.
		line: u64,
	},

	/// The cycle was abandoned because a disconnect was requested.
	#[error("cycle cancelled by disconnect")]
	Cancelled,

	/// Opening the connection failed.
	#[error("cannot connect to {address}: {source}")]
	Connect {
		/// Address that was dialed.
		address: String,
		/// The underlying I/O error.
		#[source]
		source: std::io::Error,
	},

	/// A connection is already open.
	#[error("already connected to {0}")]
	AlreadyConnected(String),

	/// The session configuration could not be loaded.
	#[error(transparent)]
	Config(#[from] ConfigError),

	/// The cycle worker panicked or was aborted.
	#[error("cycle worker failed: {0}")]
	Worker(#[from] tokio::task::JoinError),
}

/// Result type for session operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
