//! Session configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Address dialed when none is configured.
pub const DEFAULT_ADDRESS: &str = "localhost:5000";

/// Interval between scheduling ticks when none is configured.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Errors loading a [`SessionConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// The file is not valid TOML or does not match the expected fields.
	#[error("invalid session config{}: {source}", .path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
	Parse {
		/// Path of the offending file, when loaded from disk.
		path: Option<PathBuf>,
		/// The parse error.
		#[source]
		source: toml::de::Error,
	},
}

/// Settings of a [`Session`](crate::Session).
///
/// Every field is optional in TOML:
///
/// ```toml
/// address = "game-host:5000"
/// poll_interval_ms = 250
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
	/// `host:port` of the report emitter.
	pub address: String,
	/// Milliseconds between scheduling ticks. A new cycle is requested at most once per tick.
	pub poll_interval_ms: u64,
}

impl Default for SessionConfig {
	fn default() -> Self {
		Self {
			address: DEFAULT_ADDRESS.to_owned(),
			poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
		}
	}
}

impl SessionConfig {
	/// Creates a configuration for the given address with default timing.
	pub fn new(address: impl Into<String>) -> Self {
		Self {
			address: address.into(),
			..Self::default()
		}
	}

	/// Set the emitter address.
	pub fn address(mut self, address: impl Into<String>) -> Self {
		self.address = address.into();
		self
	}

	/// Set the tick interval in milliseconds.
	pub fn poll_interval_ms(mut self, millis: u64) -> Self {
		self.poll_interval_ms = millis;
		self
	}

	/// Tick interval, never shorter than one millisecond.
	pub fn interval(&self) -> Duration {
		Duration::from_millis(self.poll_interval_ms.max(1))
	}

	/// Parses a configuration from TOML text.
	///
	/// # Errors
	///
	/// [`ConfigError::Parse`] when the text is not a valid configuration.
	pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
		toml::from_str(text).map_err(|source| ConfigError::Parse { path: None, source })
	}

	/// Loads a configuration file.
	///
	/// # Errors
	///
	/// [`ConfigError::Io`] when the file cannot be read, [`ConfigError::Parse`] when its
	/// content is not a valid configuration.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let text = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_owned(),
			error,
		})?;
		toml::from_str(&text).map_err(|source| ConfigError::Parse {
			path: Some(path.to_owned()),
			source,
		})
	}
}

#[cfg(test)]
mod tests {
	use std::io::Write;

	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn empty_file_uses_defaults() {
		let config = SessionConfig::from_toml("").unwrap();
		assert_eq!(config, SessionConfig::default());
		assert_eq!(config.address, "localhost:5000");
		assert_eq!(config.interval(), Duration::from_secs(1));
	}

	#[test]
	fn fields_override_defaults() {
		let config = SessionConfig::from_toml("address = \"game:7000\"\npoll_interval_ms = 250\n").unwrap();
		assert_eq!(config, SessionConfig::new("game:7000").poll_interval_ms(250));
	}

	#[test]
	fn unknown_field_is_rejected() {
		let err = SessionConfig::from_toml("adress = \"typo:1\"").unwrap_err();
		assert!(matches!(err, ConfigError::Parse { path: None, .. }));
	}

	#[test]
	fn zero_interval_is_clamped() {
		assert_eq!(SessionConfig::default().poll_interval_ms(0).interval(), Duration::from_millis(1));
	}

	#[test]
	fn load_reads_file_and_reports_path() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "poll_interval_ms = 10").unwrap();
		let config = SessionConfig::load(file.path()).unwrap();
		assert_eq!(config.poll_interval_ms, 10);
		assert_eq!(config.address, DEFAULT_ADDRESS);

		writeln!(file, "poll_interval_ms = \"soon\"").unwrap();
		let err = SessionConfig::load(file.path()).unwrap_err();
		assert!(err.to_string().contains(&file.path().display().to_string()));
	}

	#[test]
	fn missing_file_is_io_error() {
		let dir = tempfile::tempdir().unwrap();
		let err = SessionConfig::load(dir.path().join("absent.toml")).unwrap_err();
		assert!(matches!(err, ConfigError::Io { .. }));
	}
}
