use std::io::Cursor;

use memtree_report::{Record, ReportWriter};
use memtree_tree::{CycleStats, NodeRef};
use pretty_assertions::assert_eq;
use tokio::io::{AsyncWriteExt, BufReader, DuplexStream};
use tokio::net::TcpListener;

use super::*;

#[derive(Debug, Clone, PartialEq)]
enum Event {
	Published(Vec<(usize, String)>),
	Cleared,
	Completed { records: usize, created: usize, pruned: usize },
	Fatal(String),
}

#[derive(Debug, Default)]
struct Recorder {
	events: Vec<Event>,
}

impl Recorder {
	fn take(&mut self) -> Vec<Event> {
		std::mem::take(&mut self.events)
	}
}

impl ReportSink for Recorder {
	fn publish(&mut self, root: Option<NodeRef<'_>>) {
		self.events.push(match root {
			Some(root) => Event::Published(root.walk().map(|(depth, node)| (depth, node.id().to_owned())).collect()),
			None => Event::Cleared,
		});
	}

	fn cycle_complete(&mut self, stats: &CycleStats) {
		self.events.push(Event::Completed {
			records: stats.records,
			created: stats.created,
			pruned: stats.pruned,
		});
	}

	fn fatal(&mut self, error: &Error) {
		self.events.push(Event::Fatal(error.to_string()));
	}
}

fn records(shape: &[(u32, &str)]) -> Vec<Record> {
	shape.iter().map(|&(level, id)| Record::new(level, id, id)).collect()
}

fn published(shape: &[(usize, &str)]) -> Event {
	Event::Published(shape.iter().map(|&(depth, id)| (depth, id.to_owned())).collect())
}

fn session() -> Session<Recorder> {
	Session::new(SessionConfig::default().poll_interval_ms(1), Recorder::default())
}

/// Session attached to one end of an in-memory pipe, and a writer on the other.
fn piped() -> (Session<Recorder>, ReportWriter<DuplexStream>) {
	let (client, server) = tokio::io::duplex(4096);
	let mut session = session();
	session.attach("pipe", BufReader::new(client)).unwrap();
	(session, ReportWriter::new(server))
}

#[tokio::test]
async fn completed_cycles_are_published() {
	let (mut session, mut emitter) = piped();
	assert_eq!(session.generation(), Some(1));

	assert_eq!(session.tick().await.unwrap(), Tick::Started);
	emitter.write_cycle(&records(&[(0, "r"), (1, "a"), (1, "b")])).await.unwrap();
	session.settle().await.unwrap();
	assert_eq!(
		session.sink_mut().take(),
		[
			Event::Completed { records: 3, created: 2, pruned: 0 },
			published(&[(0, "r"), (1, "a"), (1, "b")]),
		]
	);

	assert_eq!(session.tick().await.unwrap(), Tick::Started);
	emitter.write_cycle(&records(&[(0, "r"), (1, "b")])).await.unwrap();
	session.settle().await.unwrap();
	assert_eq!(
		session.sink_mut().take(),
		[
			Event::Completed { records: 2, created: 0, pruned: 1 },
			published(&[(0, "r"), (1, "b")]),
		]
	);
	assert_eq!(session.tree().map(|tree| tree.len()), Some(2));
}

#[tokio::test]
async fn tree_is_unreachable_while_a_cycle_runs() {
	let (mut session, mut emitter) = piped();
	assert!(session.tree().is_some());

	session.tick().await.unwrap();
	assert!(session.is_busy());
	assert!(session.tree().is_none());
	assert_eq!(session.tick().await.unwrap(), Tick::Busy);

	emitter.write_cycle(&records(&[(0, "r")])).await.unwrap();
	session.settle().await.unwrap();
	assert!(!session.is_busy());
	assert!(session.tree().is_some_and(|tree| tree.view().is_some()));
}

#[tokio::test]
async fn disconnect_cancels_running_cycle_without_publishing() {
	let (mut session, mut emitter) = piped();
	session.tick().await.unwrap();
	emitter.write_cycle(&records(&[(0, "r")])).await.unwrap();
	session.settle().await.unwrap();
	session.sink_mut().take();

	session.tick().await.unwrap();
	let mut server = emitter.into_inner();
	server.write_all(b"0;r;r;0;0;0;0;0;0\n").await.unwrap();
	session.disconnect();
	assert!(session.is_disconnect_pending());

	session.settle().await.unwrap();
	drop(server);
	assert!(!session.is_connected());
	assert_eq!(session.sink_mut().take(), [Event::Cleared]);
	assert_eq!(session.tick().await.unwrap(), Tick::Disconnected);
}

#[tokio::test]
async fn disconnect_while_idle_closes_on_next_tick() {
	let (mut session, _emitter) = piped();
	session.disconnect();
	assert!(session.is_connected());

	assert_eq!(session.tick().await.unwrap(), Tick::Closed);
	assert!(!session.is_connected());
	assert_eq!(session.sink_mut().take(), [Event::Cleared]);
}

#[tokio::test]
async fn malformed_record_is_fatal_and_tears_down() {
	let (mut session, mut emitter) = piped();
	session.tick().await.unwrap();
	emitter.write_cycle(&records(&[(0, "r"), (1, "a")])).await.unwrap();
	session.settle().await.unwrap();
	session.sink_mut().take();

	session.tick().await.unwrap();
	let mut server = emitter.into_inner();
	server.write_all(b"0;r;r;0;0;0;0;0;0\n1;a;a;0;0;x;0;0;0\n").await.unwrap();
	let err = session.settle().await.unwrap_err();
	assert!(matches!(err, Error::Report(memtree_report::Error::Malformed { line: 6, .. })));
	assert!(!session.is_connected());

	let events = session.sink_mut().take();
	assert!(matches!(&events[..], [Event::Fatal(message), Event::Cleared] if message.contains("line 6")));
}

#[tokio::test]
async fn duplicate_record_is_fatal() {
	let (mut session, mut emitter) = piped();
	session.tick().await.unwrap();
	emitter.write_cycle(&records(&[(0, "r"), (1, "a"), (2, "x"), (1, "a")])).await.unwrap();

	let err = session.settle().await.unwrap_err();
	assert!(matches!(
		err,
		Error::Tree {
			line: 4,
			source: memtree_tree::Error::DuplicateRecord { .. }
		}
	));
	assert!(!session.is_connected());
}

#[tokio::test]
async fn eof_mid_cycle_is_stream_termination() {
	let (mut session, emitter) = piped();
	session.tick().await.unwrap();
	let mut server = emitter.into_inner();
	server.write_all(b"0;r;r;0;0;0;0;0;0\n").await.unwrap();
	drop(server);

	let err = session.settle().await.unwrap_err();
	assert!(matches!(err, Error::StreamTerminated { line: 1 }));
	assert_eq!(session.sink_mut().take().last(), Some(&Event::Cleared));
}

#[tokio::test]
async fn replayed_file_runs_to_a_clean_end() {
	let mut text = String::new();
	memtree_report::write::encode_cycle(&mut text, &records(&[(0, "r"), (1, "a"), (2, "b")]));
	memtree_report::write::encode_cycle(&mut text, &records(&[(0, "r"), (1, "c")]));

	let mut session = session();
	session.attach("capture", BufReader::new(Cursor::new(text.into_bytes()))).unwrap();
	session.run().await.unwrap();

	assert!(!session.is_connected());
	assert_eq!(
		session.sink_mut().take(),
		[
			Event::Completed { records: 3, created: 2, pruned: 0 },
			published(&[(0, "r"), (1, "a"), (2, "b")]),
			Event::Completed { records: 2, created: 1, pruned: 2 },
			published(&[(0, "r"), (1, "c")]),
			Event::Cleared,
		]
	);
}

#[tokio::test]
async fn replay_tolerates_trailing_blank_lines() {
	let mut text = String::new();
	memtree_report::write::encode_cycle(&mut text, &records(&[(0, "r"), (1, "a")]));
	text.push('\n');

	let mut session = session();
	session.attach("capture", BufReader::new(Cursor::new(text.into_bytes()))).unwrap();
	session.run().await.unwrap();

	assert_eq!(
		session.sink_mut().take(),
		[
			Event::Completed { records: 2, created: 1, pruned: 0 },
			published(&[(0, "r"), (1, "a")]),
			Event::Cleared,
		]
	);
}

#[tokio::test]
async fn leading_empty_cycle_publishes_nothing() {
	let (mut session, emitter) = piped();
	session.tick().await.unwrap();
	let mut server = emitter.into_inner();
	server.write_all(b"\n\n").await.unwrap();
	session.settle().await.unwrap();

	assert!(session.is_connected());
	assert_eq!(session.sink_mut().take(), [Event::Completed { records: 0, created: 0, pruned: 0 }]);

	let mut emitter = ReportWriter::new(server);
	session.tick().await.unwrap();
	emitter.write_cycle(&records(&[(0, "r")])).await.unwrap();
	session.settle().await.unwrap();
	assert_eq!(
		session.sink_mut().take(),
		[Event::Completed { records: 1, created: 0, pruned: 0 }, published(&[(0, "r")])]
	);
}

#[tokio::test]
async fn second_connection_is_rejected() {
	let (mut session, _emitter) = piped();
	let err = session.attach("again", BufReader::new(Cursor::new(Vec::new()))).unwrap_err();
	assert!(matches!(err, Error::AlreadyConnected(peer) if peer == "pipe"));
}

#[tokio::test]
async fn reconnect_starts_a_new_generation_with_an_empty_tree() {
	let (mut session, mut emitter) = piped();
	session.tick().await.unwrap();
	emitter.write_cycle(&records(&[(0, "r"), (1, "a")])).await.unwrap();
	session.settle().await.unwrap();
	session.disconnect();
	session.tick().await.unwrap();

	session.attach("pipe", BufReader::new(Cursor::new(Vec::new()))).unwrap();
	assert_eq!(session.generation(), Some(2));
	assert!(session.tree().is_some_and(|tree| tree.view().is_none()));
}

#[tokio::test]
async fn connects_over_tcp() {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let address = listener.local_addr().unwrap().to_string();
	let server = tokio::spawn(async move {
		let (stream, _) = listener.accept().await.unwrap();
		let mut writer = ReportWriter::new(stream);
		writer.write_cycle(&records(&[(0, "r"), (1, "main")])).await.unwrap();
		writer
	});

	let mut session = Session::new(SessionConfig::new(address.clone()), Recorder::default());
	session.toggle().await.unwrap();
	assert!(session.is_connected());
	assert_eq!(session.tick().await.unwrap(), Tick::Started);
	session.settle().await.unwrap();
	assert_eq!(session.sink().events.last(), Some(&published(&[(0, "r"), (1, "main")])));

	session.toggle().await.unwrap();
	assert!(session.is_disconnect_pending());
	assert_eq!(session.tick().await.unwrap(), Tick::Closed);
	drop(server.await.unwrap());
}

#[tokio::test]
async fn unreachable_address_is_a_connect_error() {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let address = listener.local_addr().unwrap().to_string();
	drop(listener);

	let mut session = Session::new(SessionConfig::new(address.clone()), Recorder::default());
	let err = session.connect().await.unwrap_err();
	assert!(matches!(err, Error::Connect { address: dialed, .. } if dialed == address));
	assert!(!session.is_connected());
}
