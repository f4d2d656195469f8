use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio_util::sync::CancellationToken;

/// Monotonic generation clock, one generation per connection lifetime.
#[derive(Debug, Default, Clone)]
pub struct GenerationClock {
	next: Arc<AtomicU64>,
}

impl GenerationClock {
	/// Creates a new generation clock starting at generation 1.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the next generation ID.
	pub fn next(&self) -> u64 {
		self.next.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
	}

	/// Starts a new generation with a fresh cancellation token.
	pub fn issue(&self) -> GenerationToken {
		GenerationToken::new(self.next(), CancellationToken::new())
	}
}

/// Generation-scoped cancellation token for a connection and the cycles it runs.
#[derive(Debug, Clone)]
pub struct GenerationToken {
	generation: u64,
	cancel: CancellationToken,
}

impl GenerationToken {
	/// Creates a new generation token.
	pub fn new(generation: u64, cancel: CancellationToken) -> Self {
		Self { generation, cancel }
	}

	/// Returns generation ID.
	pub const fn generation(&self) -> u64 {
		self.generation
	}

	/// Returns true when cancellation is requested.
	pub fn is_cancelled(&self) -> bool {
		self.cancel.is_cancelled()
	}

	/// Requests cancellation of this token and its children.
	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	/// Future resolving when cancellation is requested.
	pub async fn cancelled(&self) {
		self.cancel.cancelled().await;
	}

	/// Creates a child token in the same generation.
	///
	/// Cancelling the child leaves the parent live.
	pub fn child(&self) -> Self {
		Self {
			generation: self.generation,
			cancel: self.cancel.child_token(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn generations_are_monotonic_across_clones() {
		let clock = GenerationClock::new();
		let shared = clock.clone();
		assert_eq!(clock.next(), 1);
		assert_eq!(shared.next(), 2);
		assert_eq!(clock.issue().generation(), 3);
	}

	#[test]
	fn parent_cancellation_reaches_children() {
		let token = GenerationClock::new().issue();
		let child = token.child();
		assert_eq!(child.generation(), token.generation());

		token.cancel();
		assert!(child.is_cancelled());
	}

	#[test]
	fn child_cancellation_stays_local() {
		let token = GenerationClock::new().issue();
		let child = token.child();

		child.cancel();
		assert!(child.is_cancelled());
		assert!(!token.is_cancelled());
	}

	#[tokio::test]
	async fn cancelled_resolves_after_cancel() {
		let token = GenerationClock::new().issue();
		let waiter = token.clone();
		let task = tokio::spawn(async move { waiter.cancelled().await });
		token.cancel();
		task.await.unwrap();
	}
}
