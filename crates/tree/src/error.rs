use thiserror::Error;

/// Protocol violations detected while applying a cycle.
///
/// Either one makes the rest of the cycle meaningless; the caller is expected to drop the
/// [`CycleBuilder`](crate::CycleBuilder), which rolls the cycle back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Error {
	/// The record's level is not deeper than the root, so no ancestor can hold it.
	#[error("record {id:?} at level {level} ascends past the root (cursor at level {cursor_level})")]
	Ascent {
		/// Id of the offending record.
		id: String,
		/// Level of the offending record.
		level: u32,
		/// Level of the node the ascent started from.
		cursor_level: u32,
	},
	/// The same id was resolved twice under one parent within a single cycle.
	#[error("record {id:?} at level {level} repeats a node already reported this cycle")]
	DuplicateRecord {
		/// Id of the offending record.
		id: String,
		/// Level of the offending record.
		level: u32,
	},
}

/// A convenient type alias for `Result` with `E` = [`enum@crate::Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
