//! Error types for report decoding.

use std::io;

use thiserror::Error;

/// A line that cannot be decoded into a [`Record`](crate::Record).
///
/// Every variant is a malformed record: the cycle carrying it cannot be trusted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DecodeError {
	/// The line has fewer separated fields than a record needs.
	#[error("expected at least {expected} fields, found {found}")]
	TooFewFields {
		/// Minimum number of fields.
		expected: usize,
		/// Number of fields present.
		found: usize,
	},
	/// The level field is not a non-negative integer.
	#[error("invalid level {0:?}")]
	InvalidLevel(String),
	/// A required kilobyte field is not a number.
	#[error("invalid {field} {value:?}")]
	InvalidKilobytes {
		/// Name of the offending field.
		field: &'static str,
		/// Raw token.
		value: String,
	},
}

/// Errors raised while reading a report stream.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
	/// A line could not be decoded.
	#[error("malformed record at line {line}: {source}")]
	Malformed {
		/// One-based line number within the stream.
		line: u64,
		/// Decode failure.
		source: DecodeError,
	},
	/// The underlying stream failed.
	#[error("{0}")]
	Io(#[from] io::Error),
}

/// A convenient type alias for `Result` with `E` = [`enum@crate::Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
