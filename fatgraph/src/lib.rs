//! Partially persistent directed graphs.
//!
//! This crate provides [`PersistentGraph`], a directed graph with bounded
//! out- and in-degrees in which every mutation produces a new version, while
//! all earlier versions remain browsable. Versions are linear: past versions
//! can be read but not branched from.
//!
//! Persistence is implemented with the fat-node method. Each node carries a
//! bounded [`ModificationLog`] recording the updates made to it since its
//! creation, tagged with the version they were made at. Only when a log is
//! full is the node copied, and the copy is linked in place of the original
//! through the original's predecessor (the node in whose slot it was
//! created). Each version may have its own root, recorded in a version
//! registry from which the graph can be re-entered.
//!
//! ## Summary of data types
//!
//! - [`Node`] A copyable handle to a node. All nodes live in an arena owned
//!   by the graph and are never removed.
//! - [`Version`] The identifier of a version. Versions start at
//!   [`Version::INITIAL`] and only ever advance by one.
//! - [`Graph`] The single-version substrate: an arena of [`Vertex`]es with a
//!   uniform number of out-edge slots, supporting vertex insertion at a slot
//!   and direct edge attachment.
//! - [`VersionedNode`] A [`GraphNode`] extended with an in-degree bound, a
//!   predecessor, a [`ModificationLog`] and its creation version.
//! - [`PersistentGraph`] The persistence manager, owning the version registry
//!   and the version counter.
//!
//! ## Usage
//!
//! ```
//! use fatgraph::{PersistentGraph, Version, WriteOutcome};
//!
//! let mut graph = PersistentGraph::new(1, 2, 1);
//! let root = graph.insert_root(100, Version::new(1)).unwrap();
//! let child = graph.insert_vertex(2, root, 0).unwrap();
//!
//! // Logs have capacity `2 * in_degree_bound`...
//! graph.insert_value(3, child).unwrap();
//! graph.insert_value(4, child).unwrap();
//! // ...after which the node is copied.
//! let outcome = graph.insert_value(5, child).unwrap();
//! assert!(matches!(outcome, WriteOutcome::Copied { .. }));
//! assert_eq!(graph.neighbour(root, 0).unwrap(), outcome.node());
//! assert_eq!(graph.value(child).unwrap(), &4);
//! ```

pub mod config;
pub use config::{GraphConfig, RootBackFill};

mod core;
pub use core::{Node, Version};

pub mod graph;
pub use graph::{EdgeError, Graph, GraphError, GraphNode, Vertex};

pub mod log;
pub use log::{LogEntry, LogFull, ModificationLog, Update, UpdateKind};

pub mod persistent;
pub use persistent::{PersistenceError, PersistentGraph, WriteOutcome};

pub mod versioned;
pub use versioned::VersionedNode;
