//! Incremental call-tree reconstruction.
//!
//! A reporting process re-sends its entire call tree every cycle as a flat, depth-first
//! sequence of [`Record`](memtree_report::Record)s whose nesting is only encoded by a level
//! integer. [`CallTree`] rebuilds and updates a persistent tree from that sequence in one
//! forward pass:
//!
//! * records matching an existing node (same id under the same parent) update it in place
//! * unseen records create nodes, appended after their existing siblings
//! * nodes not revisited by the cycle are detached and reclaimed
//!
//! Disappearance is detected through a traversal chain, a doubly linked list threading the
//! nodes in the order they were resolved during the last cycle. It is independent of the
//! parent/child relation: while a cycle runs, the chain is this cycle's resolved nodes
//! followed by the part of the previous cycle's order not yet reached. Whatever the cursor
//! skips over in that remainder is dead.
//!
//! Every mutation made during a cycle is journaled. A cycle that fails part way (or is
//! dropped without [`CycleBuilder::finish`]) is rolled back, so readers only ever see the
//! tree as of the last completed cycle.
//!
//! ```
//! use memtree_report::Record;
//! use memtree_tree::CallTree;
//!
//! let mut tree = CallTree::new();
//! let mut cycle = tree.begin_cycle();
//! cycle.apply(&Record::new(0, "r", "root"))?;
//! cycle.apply(&Record::new(1, "a", "main"))?;
//! cycle.finish();
//!
//! let root = tree.view().expect("one cycle completed");
//! assert_eq!(root.children().map(|c| c.name()).collect::<Vec<_>>(), ["main"]);
//! # Ok::<(), memtree_tree::Error>(())
//! ```

#![warn(missing_docs)]

mod cursor;
mod cycle;
mod error;
mod journal;
mod node;
mod prune;
mod tree;
mod view;

pub use cycle::{CycleBuilder, CycleStats};
pub use error::{Error, Result};
pub use node::{CallNode, NodeId};
pub use tree::CallTree;
pub use view::{Chain, NodeRef, Walk};
