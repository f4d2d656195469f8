//! Decoding of single report lines.

use std::fmt;
use std::str::FromStr;

use crate::error::DecodeError;

/// Field separator of the wire format.
pub const SEPARATOR: char = ';';

/// Number of fields in one record.
pub const FIELD_COUNT: usize = 9;

/// Value stored in a soft count field that failed to decode.
pub const MISSING_COUNT: i32 = -1;

/// Value stored in a soft rate field that failed to decode.
pub const MISSING_RATE: f64 = -1.0;

/// Allocation metrics carried by one record.
///
/// `total_*` values include the node's descendants, `self_*` values do not. Counts and
/// per-frame rates are soft: the emitter may produce tokens that do not parse (for example
/// before its first frame), in which case they hold [`MISSING_COUNT`] or [`MISSING_RATE`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Stats {
	/// Live allocations in this node and its descendants.
	pub total_count: i32,
	/// Live allocations made directly by this node.
	pub self_count: i32,
	/// Kilobytes held by this node and its descendants.
	pub total_kilobytes: f64,
	/// Kilobytes held directly by this node.
	pub self_kilobytes: f64,
	/// Allocations per frame made directly by this node since the last reset.
	pub self_count_per_frame: f64,
	/// Calls per frame since the last reset.
	pub calls_per_frame: f64,
}

/// One decoded report line.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
	/// Depth reported by the emitter. Not necessarily one more than the parent's level.
	pub level: u32,
	/// Identity of the node, unique among its siblings and stable across cycles.
	pub id: String,
	/// Display name; may change between cycles for the same id.
	pub name: String,
	/// Allocation metrics.
	pub stats: Stats,
}

/// Classification of one raw line.
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
	/// An empty line. Two in a row terminate a cycle.
	Blank,
	/// A node record.
	Record(Record),
}

impl Line {
	/// Decodes one raw line, without its line terminator.
	///
	/// # Errors
	///
	/// See [`Record::decode`].
	pub fn decode(line: &str) -> Result<Self, DecodeError> {
		let line = line.strip_suffix('\r').unwrap_or(line);
		if line.is_empty() {
			return Ok(Self::Blank);
		}
		Record::decode(line).map(Self::Record)
	}
}

impl Record {
	/// Creates a record with zeroed metrics.
	pub fn new(level: u32, id: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			level,
			id: id.into(),
			name: name.into(),
			stats: Stats::default(),
		}
	}

	/// Replaces the metrics.
	#[must_use]
	pub fn with_stats(mut self, stats: Stats) -> Self {
		self.stats = stats;
		self
	}

	/// Decodes a non-empty line.
	///
	/// Tokens after the ninth are ignored; emitters end every line with a
	/// separator, which yields an empty tenth token.
	///
	/// # Errors
	///
	/// - [`DecodeError::TooFewFields`] when the line has fewer than nine fields.
	/// - [`DecodeError::InvalidLevel`] when the level is not a non-negative integer.
	/// - [`DecodeError::InvalidKilobytes`] when a kilobyte field is not a number.
	pub fn decode(line: &str) -> Result<Self, DecodeError> {
		let mut tokens = [""; FIELD_COUNT];
		let mut found = 0;
		for (slot, token) in tokens.iter_mut().zip(line.split(SEPARATOR)) {
			*slot = token;
			found += 1;
		}
		if found < FIELD_COUNT {
			return Err(DecodeError::TooFewFields {
				expected: FIELD_COUNT,
				found,
			});
		}

		let [level, id, name, total_count, self_count, total_kb, self_kb, self_per_frame, calls_per_frame] = tokens;
		let level = level
			.trim()
			.parse::<u32>()
			.map_err(|_| DecodeError::InvalidLevel(level.to_owned()))?;

		Ok(Self {
			level,
			id: id.to_owned(),
			name: name.to_owned(),
			stats: Stats {
				total_count: soft(total_count, MISSING_COUNT),
				self_count: soft(self_count, MISSING_COUNT),
				total_kilobytes: strict(total_kb, "total_kilobytes")?,
				self_kilobytes: strict(self_kb, "self_kilobytes")?,
				self_count_per_frame: soft(self_per_frame, MISSING_RATE),
				calls_per_frame: soft(calls_per_frame, MISSING_RATE),
			},
		})
	}
}

fn soft<T: FromStr>(token: &str, missing: T) -> T {
	token.trim().parse().unwrap_or(missing)
}

fn strict(token: &str, field: &'static str) -> Result<f64, DecodeError> {
	token.trim().parse().map_err(|_| DecodeError::InvalidKilobytes {
		field,
		value: token.to_owned(),
	})
}

/// Formats the record as one wire line, without the line terminator.
impl fmt::Display for Record {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = &self.stats;
		write!(
			f,
			"{};{};{};{};{};{};{};{};{};",
			self.level,
			self.id,
			self.name,
			s.total_count,
			s.self_count,
			s.total_kilobytes,
			s.self_kilobytes,
			s.self_count_per_frame,
			s.calls_per_frame
		)
	}
}
