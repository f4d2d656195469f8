//! Connection lifecycle and cycle scheduling.

use memtree_report::ReportReader;
use memtree_tree::CallTree;
use memtree_worker::{GenerationClock, GenerationToken, TaskClass};
use tokio::io::{AsyncBufRead, BufReader};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::SessionConfig;
use crate::cycle::{CycleOutcome, read_cycle};
use crate::error::{Error, Result};
use crate::sink::ReportSink;

/// Line source backing a connection.
pub type Source = Box<dyn AsyncBufRead + Send + Unpin>;

type Parts = (CallTree, ReportReader<Source>);

/// What a call to [`Session::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
	/// No connection is open.
	Disconnected,
	/// A cycle is still being read.
	Busy,
	/// A new cycle was started.
	Started,
	/// The connection was torn down.
	Closed,
}

enum Worker {
	Idle(Parts),
	Busy(JoinHandle<(Parts, Result<CycleOutcome>)>),
}

struct Connection {
	peer: String,
	token: GenerationToken,
	worker: Worker,
	disconnect_pending: bool,
}

/// A viewer session: one optional connection, its tree, and the sink it publishes to.
pub struct Session<S> {
	config: SessionConfig,
	sink: S,
	clock: GenerationClock,
	connection: Option<Connection>,
}

impl<S> std::fmt::Debug for Session<S> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Session")
			.field("config", &self.config)
			.field("peer", &self.connection.as_ref().map(|c| &c.peer))
			.field("busy", &self.is_busy())
			.field("disconnect_pending", &self.is_disconnect_pending())
			.finish_non_exhaustive()
	}
}

impl<S> Session<S> {
	/// Returns true while a connection is open.
	pub fn is_connected(&self) -> bool {
		self.connection.is_some()
	}

	/// Returns true while a cycle is being read.
	pub fn is_busy(&self) -> bool {
		matches!(&self.connection, Some(Connection { worker: Worker::Busy(_), .. }))
	}

	/// Returns true between [`Self::disconnect`] and teardown.
	pub fn is_disconnect_pending(&self) -> bool {
		self.connection.as_ref().is_some_and(|c| c.disconnect_pending)
	}

	/// Generation number of the open connection.
	pub fn generation(&self) -> Option<u64> {
		self.connection.as_ref().map(|c| c.token.generation())
	}

	/// The tree as of the last completed cycle.
	///
	/// `None` when disconnected, and while a cycle is in flight.
	pub fn tree(&self) -> Option<&CallTree> {
		match &self.connection {
			Some(Connection {
				worker: Worker::Idle((tree, _)),
				..
			}) => Some(tree),
			_ => None,
		}
	}

	/// Session configuration.
	pub fn config(&self) -> &SessionConfig {
		&self.config
	}

	/// The sink receiving published trees.
	pub fn sink(&self) -> &S {
		&self.sink
	}

	/// Mutable access to the sink.
	pub fn sink_mut(&mut self) -> &mut S {
		&mut self.sink
	}
}

impl<S: ReportSink> Session<S> {
	/// Creates a disconnected session.
	pub fn new(config: SessionConfig, sink: S) -> Self {
		Self {
			config,
			sink,
			clock: GenerationClock::new(),
			connection: None,
		}
	}

	/// Dials the configured address over TCP.
	///
	/// # Errors
	///
	/// [`Error::AlreadyConnected`] when a connection is open, [`Error::Connect`] when the
	/// address cannot be reached.
	pub async fn connect(&mut self) -> Result<()> {
		if let Some(connection) = &self.connection {
			return Err(Error::AlreadyConnected(connection.peer.clone()));
		}
		let address = self.config.address.clone();
		let stream = TcpStream::connect(address.as_str()).await.map_err(|source| Error::Connect {
			address: address.clone(),
			source,
		})?;
		self.attach(address, BufReader::new(stream))
	}

	/// Opens a connection over an arbitrary line source, for example a captured report file.
	///
	/// The tree starts empty and gets its root from the first completed cycle.
	///
	/// # Errors
	///
	/// [`Error::AlreadyConnected`] when a connection is open.
	pub fn attach(&mut self, peer: impl Into<String>, source: impl AsyncBufRead + Send + Unpin + 'static) -> Result<()> {
		if let Some(connection) = &self.connection {
			return Err(Error::AlreadyConnected(connection.peer.clone()));
		}
		let peer = peer.into();
		let token = self.clock.issue();
		tracing::info!(peer = %peer, connection = token.generation(), "session.connect");

		let source: Source = Box::new(source);
		self.connection = Some(Connection {
			peer,
			token,
			worker: Worker::Idle((CallTree::new(), ReportReader::new(source))),
			disconnect_pending: false,
		});
		Ok(())
	}

	/// Connects when disconnected, requests a disconnect otherwise.
	///
	/// # Errors
	///
	/// See [`Self::connect`].
	pub async fn toggle(&mut self) -> Result<()> {
		if self.connection.is_some() {
			self.disconnect();
			Ok(())
		} else {
			self.connect().await
		}
	}

	/// Requests a disconnect.
	///
	/// A running cycle is cancelled at its next line and rolled back. The connection is torn
	/// down by a later [`Self::tick`] or [`Self::settle`] once the worker is idle.
	pub fn disconnect(&mut self) {
		let Some(connection) = &mut self.connection else {
			return;
		};
		if !connection.disconnect_pending {
			tracing::debug!(peer = %connection.peer, connection = connection.token.generation(), "session.disconnect.pending");
		}
		connection.disconnect_pending = true;
		connection.token.cancel();
	}

	/// Runs one scheduling step.
	///
	/// Collects a finished cycle and publishes its tree, then either tears the connection
	/// down (disconnect pending) or starts the next cycle when no cycle is in flight.
	///
	/// # Errors
	///
	/// The failure of a collected cycle. It has already been passed to
	/// [`ReportSink::fatal`] and the connection is closed.
	pub async fn tick(&mut self) -> Result<Tick> {
		self.collect(false).await?;
		let Some(connection) = &self.connection else {
			return Ok(Tick::Disconnected);
		};
		if matches!(connection.worker, Worker::Busy(_)) {
			return Ok(Tick::Busy);
		}
		if connection.disconnect_pending {
			self.close();
			return Ok(Tick::Closed);
		}
		self.start_cycle();
		Ok(Tick::Started)
	}

	/// Waits for the cycle in flight, if any, and collects it like [`Self::tick`] would.
	///
	/// # Errors
	///
	/// As for [`Self::tick`].
	pub async fn settle(&mut self) -> Result<()> {
		self.collect(true).await
	}

	/// Ticks every [`SessionConfig::interval`] until the connection is closed.
	///
	/// # Errors
	///
	/// The failure that closed the connection.
	pub async fn run(&mut self) -> Result<()> {
		let mut interval = tokio::time::interval(self.config.interval());
		interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
		loop {
			interval.tick().await;
			if self.tick().await? == Tick::Disconnected {
				return Ok(());
			}
		}
	}

	fn start_cycle(&mut self) {
		let Some(mut connection) = self.connection.take() else {
			return;
		};
		connection.worker = match connection.worker {
			Worker::Idle((mut tree, mut reader)) => {
				let token = connection.token.child();
				Worker::Busy(memtree_worker::spawn(TaskClass::Ingest, async move {
					let outcome = read_cycle(&mut tree, &mut reader, &token).await;
					((tree, reader), outcome)
				}))
			}
			busy => busy,
		};
		self.connection = Some(connection);
	}

	async fn collect(&mut self, wait: bool) -> Result<()> {
		let Some(connection) = &mut self.connection else {
			return Ok(());
		};
		let Worker::Busy(handle) = &mut connection.worker else {
			return Ok(());
		};
		if !wait && !handle.is_finished() {
			return Ok(());
		}

		let ((tree, reader), outcome) = match handle.await {
			Ok(done) => done,
			Err(join) => return Err(self.fail(Error::Worker(join))),
		};
		match outcome {
			Ok(CycleOutcome::Completed(stats)) => {
				self.sink.cycle_complete(&stats);
				// `None` means teardown; an empty cycle before the first record has no root yet.
				if let Some(root) = tree.view() {
					self.sink.publish(Some(root));
				}
				if let Some(connection) = &mut self.connection {
					connection.worker = Worker::Idle((tree, reader));
				}
				Ok(())
			}
			Ok(CycleOutcome::EndOfStream) => {
				tracing::info!(lines = reader.line_number(), "session.stream.end");
				self.close();
				Ok(())
			}
			Err(Error::Cancelled) => {
				self.close();
				Ok(())
			}
			Err(error) => Err(self.fail(error)),
		}
	}

	fn fail(&mut self, error: Error) -> Error {
		tracing::warn!(error = %error, "session.cycle.abort");
		self.sink.fatal(&error);
		self.close();
		error
	}

	fn close(&mut self) {
		let Some(connection) = self.connection.take() else {
			return;
		};
		connection.token.cancel();
		if let Worker::Busy(handle) = &connection.worker {
			handle.abort();
		}
		tracing::info!(peer = %connection.peer, connection = connection.token.generation(), "session.close");
		drop(connection);
		self.sink.publish(None);
	}
}

impl<S> Drop for Session<S> {
	fn drop(&mut self) {
		if let Some(connection) = &self.connection {
			connection.token.cancel();
		}
	}
}

#[cfg(test)]
mod tests;
