//! Worker primitives shared by the memtree session and binaries.
//!
//! Every task is spawned with a [`TaskClass`] so traces can tell stream ingestion apart
//! from serving and blocking file work. Connection lifetimes are tracked with
//! [`GenerationToken`]s handed out by a [`GenerationClock`].

mod class;
mod join_set;
mod spawn;
mod token;

pub use class::TaskClass;
pub use join_set::WorkerJoinSet;
pub use spawn::{spawn, spawn_blocking};
pub use token::{GenerationClock, GenerationToken};
