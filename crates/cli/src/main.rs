//! memtree binary.
//!
//! Subcommands:
//! - `connect`: view a live report stream over TCP
//! - `replay`: view a captured report stream from a file
//! - `serve-demo`: emit a synthetic report stream

mod demo;
mod render;

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use memtree_session::{Session, SessionConfig};
use memtree_worker::TaskClass;
use tokio::io::BufReader;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::render::TextRenderer;

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "memtree")]
#[command(about = "Live call-tree viewer for streaming allocation reports")]
struct Args {
	#[command(subcommand)]
	command: Command,

	/// Verbose logging
	#[arg(short, long, global = true)]
	verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Connect to a report emitter and print the tree after every cycle
	Connect {
		/// Emitter address as host:port
		address: Option<String>,

		/// Session config file (TOML)
		#[arg(short, long, value_name = "PATH")]
		config: Option<PathBuf>,

		/// Milliseconds between cycle requests
		#[arg(short, long, value_name = "MS")]
		interval: Option<u64>,
	},
	/// Replay a captured report stream
	Replay {
		/// File holding the raw stream
		file: PathBuf,

		/// Milliseconds between cycles
		#[arg(short, long, value_name = "MS", default_value_t = 0)]
		interval: u64,
	},
	/// Serve a synthetic, slowly changing report stream
	ServeDemo {
		/// TCP port to listen on
		#[arg(short, long, default_value_t = 5000)]
		port: u16,

		/// Milliseconds between reports
		#[arg(short, long, value_name = "MS", default_value_t = 1000)]
		interval: u64,
	},
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	setup_tracing(args.verbose);

	match args.command {
		Command::Connect {
			address,
			config,
			interval,
		} => {
			let mut config = match config {
				Some(path) => SessionConfig::load(&path).with_context(|| format!("loading {}", path.display()))?,
				None => SessionConfig::default(),
			};
			if let Some(address) = address {
				config = config.address(address);
			}
			if let Some(interval) = interval {
				config = config.poll_interval_ms(interval);
			}
			connect(config).await
		}
		Command::Replay { file, interval } => replay(&file, interval).await,
		Command::ServeDemo { port, interval } => serve_demo(port, interval).await,
	}
}

async fn connect(config: SessionConfig) -> anyhow::Result<()> {
	info!(address = %config.address, interval_ms = config.poll_interval_ms, "starting viewer");
	let mut session = Session::new(config, TextRenderer::new(std::io::stdout()));
	session.connect().await?;
	session.run().await?;
	Ok(())
}

async fn replay(file: &Path, interval: u64) -> anyhow::Result<()> {
	let path = file.to_owned();
	let bytes = memtree_worker::spawn_blocking(TaskClass::IoBlocking, move || std::fs::read(path))
		.await?
		.with_context(|| format!("reading {}", file.display()))?;
	info!(path = %file.display(), bytes = bytes.len(), "replaying capture");

	let config = SessionConfig::default().poll_interval_ms(interval);
	let mut session = Session::new(config, TextRenderer::new(std::io::stdout()));
	session.attach(file.display().to_string(), BufReader::new(Cursor::new(bytes)))?;
	session.run().await?;
	Ok(())
}

async fn serve_demo(port: u16, interval: u64) -> anyhow::Result<()> {
	let listener = TcpListener::bind(("0.0.0.0", port))
		.await
		.with_context(|| format!("binding port {port}"))?;
	info!(port, "waiting for viewers");
	demo::serve(listener, Duration::from_millis(interval.max(1)), CancellationToken::new()).await?;
	Ok(())
}

fn setup_tracing(verbose: bool) {
	use std::fs::OpenOptions;

	use tracing_subscriber::EnvFilter;
	use tracing_subscriber::fmt::format::FmtSpan;
	use tracing_subscriber::prelude::*;

	let filter = || {
		EnvFilter::try_from_env("MEMTREE_LOG")
			.or_else(|_| EnvFilter::try_from_default_env())
			.unwrap_or_else(|_| {
				if verbose {
					EnvFilter::new("memtree=trace,memtree_session=debug,memtree_tree=debug,info")
				} else {
					EnvFilter::new("warn")
				}
			})
	};

	// MEMTREE_LOG_DIR sends logs to a per-process file instead of stderr.
	if let Some(log_dir) = std::env::var("MEMTREE_LOG_DIR").ok().map(PathBuf::from)
		&& std::fs::create_dir_all(&log_dir).is_ok()
	{
		let log_path = log_dir.join(format!("memtree.{}.log", std::process::id()));

		if let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) {
			let file_layer = tracing_subscriber::fmt::layer()
				.with_writer(file)
				.with_ansi(false)
				.with_span_events(FmtSpan::CLOSE)
				.with_target(true);

			tracing_subscriber::registry().with(filter()).with(file_layer).init();

			tracing::info!(path = ?log_path, "tracing initialized");
			return;
		}
	}

	tracing_subscriber::fmt()
		.with_env_filter(filter())
		.with_writer(std::io::stderr)
		.init();
}
