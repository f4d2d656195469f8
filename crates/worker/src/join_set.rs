use std::future::Future;

use tokio::task::{JoinError, JoinSet};

use crate::TaskClass;

/// A Tokio [`JoinSet`] whose spawns are traced with a [`TaskClass`].
#[derive(Debug)]
pub struct WorkerJoinSet<T> {
	class: TaskClass,
	inner: JoinSet<T>,
}

impl<T> WorkerJoinSet<T>
where
	T: Send + 'static,
{
	/// Creates an empty join set for the given task class.
	pub fn new(class: TaskClass) -> Self {
		Self { class, inner: JoinSet::new() }
	}

	/// Returns the number of tasks currently in the set.
	pub fn len(&self) -> usize {
		self.inner.len()
	}

	/// Returns `true` if the set is empty.
	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}

	/// Spawns a future into the set on the current runtime.
	pub fn spawn<F>(&mut self, fut: F)
	where
		F: Future<Output = T> + Send + 'static,
	{
		tracing::trace!(worker_class = self.class.as_str(), pending = self.inner.len(), "worker.join_set.spawn");
		self.inner.spawn(fut);
	}

	/// Waits for the next completed task.
	pub async fn join_next(&mut self) -> Option<Result<T, JoinError>> {
		self.inner.join_next().await
	}

	/// Aborts every task and waits for all of them to finish.
	pub async fn shutdown(&mut self) {
		tracing::debug!(worker_class = self.class.as_str(), pending = self.inner.len(), "worker.join_set.shutdown");
		self.inner.shutdown().await;
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use super::*;

	#[tokio::test]
	async fn completed_tasks_are_reaped() {
		let mut set = WorkerJoinSet::new(TaskClass::Serve);
		set.spawn(async { 1 });
		set.spawn(async { 2 });
		assert_eq!(set.len(), 2);

		let mut outputs = Vec::new();
		while let Some(joined) = set.join_next().await {
			outputs.push(joined.unwrap());
		}
		outputs.sort();
		assert_eq!(outputs, vec![1, 2]);
		assert!(set.is_empty());
	}

	#[tokio::test]
	async fn shutdown_aborts_pending_tasks() {
		let mut set = WorkerJoinSet::new(TaskClass::Serve);
		set.spawn(async {
			tokio::time::sleep(Duration::from_secs(3600)).await;
		});
		set.shutdown().await;
		assert!(set.is_empty());
		assert!(set.join_next().await.is_none());
	}
}
