//! Synthetic report emitter for trying the viewer without an instrumented program.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use memtree_report::{Record, ReportWriter, Stats};
use memtree_worker::{TaskClass, WorkerJoinSet};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Call frames of the simulated program in depth-first order, as `(parent, name)`.
const FRAMES: &[(Option<usize>, &str)] = &[
	(None, "root"),
	(Some(0), "functionA"),
	(Some(1), "functionB"),
	(Some(2), "functionC"),
	(Some(3), "recurse"),
	(Some(4), "recurse"),
	(Some(5), "recurse"),
	(Some(3), "functionD"),
	(Some(2), "recurse1"),
	(Some(8), "recurse2"),
	(Some(9), "recurse1"),
	(Some(10), "recurse2"),
	(Some(1), "functionD"),
	(Some(0), "LoopRunnable::run"),
	(Some(13), "functionA"),
	(Some(14), "functionD"),
];

/// Frames that always allocate, so the top of the tree never disappears.
const STEADY: usize = 2;

/// What a frame did with memory since the previous report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Activity {
	/// No allocation at all.
	Idle,
	/// Allocated and freed again: nothing live, but the allocations are counted.
	Churn(u64),
	/// Allocations still live.
	Hold(u64),
}

/// A program whose allocation profile drifts a little every report.
///
/// A frame is left out of a report when nothing in its subtree is live and it made no
/// allocation of its own since the previous report. A churning frame under such a parent
/// is still reported, so reports skip levels.
#[derive(Debug, Clone)]
pub struct DemoProgram {
	state: u64,
	frames: u64,
}

impl DemoProgram {
	pub fn new(seed: u64) -> Self {
		Self {
			state: seed | 1,
			frames: 0,
		}
	}

	fn noise(&mut self) -> u64 {
		// xorshift64
		self.state ^= self.state << 13;
		self.state ^= self.state >> 7;
		self.state ^= self.state << 17;
		self.state
	}

	fn activity(&mut self, index: usize) -> (Activity, u64) {
		let noise = self.noise();
		let amount = 1 + (noise >> 8) % 6;
		let activity = match noise % 4 {
			_ if index < STEADY => Activity::Hold(amount),
			0 => Activity::Idle,
			1 => Activity::Churn(amount),
			_ => Activity::Hold(amount),
		};
		(activity, 1 + (noise >> 16) % 4)
	}

	/// Produces the next report, one record per frame with something to show.
	pub fn report(&mut self) -> Vec<Record> {
		self.frames += 60;
		let frames = self.frames as f64;

		let mut self_counts = Vec::with_capacity(FRAMES.len());
		let mut since_reset = Vec::with_capacity(FRAMES.len());
		let mut calls = Vec::with_capacity(FRAMES.len());
		for index in 0..FRAMES.len() {
			let (activity, called) = self.activity(index);
			let (live, allocated) = match activity {
				Activity::Idle => (0, 0),
				Activity::Churn(count) => (0, count),
				Activity::Hold(count) => (count, count),
			};
			self_counts.push(live as i32);
			since_reset.push(allocated);
			calls.push(called);
		}

		let mut totals = self_counts.clone();
		for (index, (parent, _)) in FRAMES.iter().enumerate().rev() {
			if let Some(parent) = parent {
				totals[*parent] += totals[index];
			}
		}
		let kilobytes = |index: usize, count: i32| f64::from(count) * (index as f64 + 1.0) / 16.0;

		let mut levels = vec![0u32; FRAMES.len()];
		let mut records = Vec::new();
		for (index, (parent, name)) in FRAMES.iter().enumerate() {
			if let Some(parent) = parent {
				levels[index] = levels[*parent] + 1;
			}
			if totals[index] == 0 && since_reset[index] == 0 {
				continue;
			}
			let mut total_kilobytes = 0.0;
			for other in 0..FRAMES.len() {
				if is_within(other, index) {
					total_kilobytes += kilobytes(other, self_counts[other]);
				}
			}
			let stats = Stats {
				total_count: totals[index],
				self_count: self_counts[index],
				total_kilobytes,
				self_kilobytes: kilobytes(index, self_counts[index]),
				self_count_per_frame: since_reset[index] as f64 / frames,
				calls_per_frame: calls[index] as f64,
			};
			records.push(Record::new(levels[index], frame_id(index), *name).with_stats(stats));
		}
		records
	}
}

/// Address-like identity of a frame.
fn frame_id(index: usize) -> String {
	format!("{:#010x}", 0x0040_1000 + index * 0x30)
}

/// Returns true when `frame` is `ancestor` or one of its descendants.
fn is_within(frame: usize, ancestor: usize) -> bool {
	let mut current = Some(frame);
	while let Some(index) = current {
		if index == ancestor {
			return true;
		}
		current = FRAMES[index].0;
	}
	false
}

/// Accepts viewers on `listener` and streams a fresh report to each of them every `interval`.
///
/// Runs until `shutdown` is cancelled, then drops every viewer connection.
///
/// # Errors
///
/// Returns an error when the listener address cannot be read.
pub async fn serve(listener: TcpListener, interval: Duration, shutdown: CancellationToken) -> io::Result<()> {
	tracing::info!(address = %listener.local_addr()?, "demo.listen");

	let mut program = DemoProgram::new(0x5eed_cafe);
	let (reports, _) = watch::channel(Arc::new(Vec::new()));
	let mut ticker = tokio::time::interval(interval);
	ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
	let mut viewers = WorkerJoinSet::new(TaskClass::Serve);

	loop {
		tokio::select! {
			() = shutdown.cancelled() => break,
			_ = ticker.tick() => {
				reports.send_replace(Arc::new(program.report()));
			}
			accepted = listener.accept() => match accepted {
				Ok((stream, peer)) => {
					tracing::info!(peer = %peer, viewers = viewers.len() + 1, "demo.accept");
					viewers.spawn(stream_reports(stream, peer, reports.subscribe()));
				}
				Err(error) => tracing::error!(error = %error, "demo.accept"),
			},
			Some(joined) = viewers.join_next(), if !viewers.is_empty() => {
				if let Err(error) = joined {
					tracing::warn!(error = %error, "demo.viewer.failed");
				}
			}
		}
	}

	tracing::info!(viewers = viewers.len(), "demo.shutdown");
	viewers.shutdown().await;
	Ok(())
}

async fn stream_reports(stream: TcpStream, peer: SocketAddr, mut reports: watch::Receiver<Arc<Vec<Record>>>) {
	let mut writer = ReportWriter::new(stream);
	while reports.changed().await.is_ok() {
		let report = Arc::clone(&reports.borrow_and_update());
		if let Err(error) = writer.write_cycle(report.iter()).await {
			tracing::info!(peer = %peer, error = %error, "demo.viewer.gone");
			return;
		}
	}
}
