//! Graph nodes that carry their own modification history.

use delegate::delegate;

use crate::graph::{GraphNode, Vertex};
use crate::log::{LogEntry, ModificationLog};
use crate::{Node, Version};

/// A [`GraphNode`] extended with the bookkeeping of the fat-node method.
///
/// On top of its value and out-edges, a versioned node records
///  - the bound on the number of edges pointing to it,
///  - its predecessor, i.e. the node whose out-edge slot it was created in
///    (`None` for roots),
///  - a [`ModificationLog`] of capacity `2 * in_degree_bound` holding updates
///    made after the node was created,
///  - the version it was created at.
///
/// The value passed at construction is never overwritten: later values go to
/// the log, so the node can be read as of any version.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VersionedNode<T> {
    #[serde(flatten)]
    base: GraphNode<T>,
    in_degree_bound: usize,
    predecessor: Option<Node>,
    log: ModificationLog<T>,
    version: Version,
}

impl<T> VersionedNode<T> {
    /// Create a node with empty out-edge slots and an empty log.
    pub fn new(value: T, out_degree: usize, in_degree_bound: usize, version: Version) -> Self {
        Self {
            base: GraphNode::new(value, out_degree),
            in_degree_bound,
            predecessor: None,
            log: ModificationLog::for_in_degree(in_degree_bound),
            version,
        }
    }

    /// Set the node's predecessor.
    #[must_use]
    pub fn with_predecessor(mut self, predecessor: Node) -> Self {
        self.predecessor = Some(predecessor);
        self
    }

    /// A fresh copy of `self` holding `value`, created at `version`.
    ///
    /// The copy keeps the current out-edges and the predecessor of `self`,
    /// and starts with an empty log. Pointer updates in the log of `self`
    /// are already reflected in its slots, so the new value is the only
    /// state that has to be folded in.
    pub(crate) fn materialize(&self, value: T, version: Version) -> Self {
        Self {
            base: GraphNode::with_edges(value, self.out_edges()),
            in_degree_bound: self.in_degree_bound,
            predecessor: self.predecessor,
            log: ModificationLog::for_in_degree(self.in_degree_bound),
            version,
        }
    }

    /// The maximum number of edges pointing to this node.
    #[inline]
    pub fn in_degree_bound(&self) -> usize {
        self.in_degree_bound
    }

    /// The node whose out-edge slot produced this node.
    #[inline]
    pub fn predecessor(&self) -> Option<Node> {
        self.predecessor
    }

    /// The version at which the node was created.
    #[inline]
    pub fn version(&self) -> Version {
        self.version
    }

    /// The node's modification log.
    #[inline]
    pub fn log(&self) -> &ModificationLog<T> {
        &self.log
    }

    #[inline]
    pub(crate) fn log_mut(&mut self) -> &mut ModificationLog<T> {
        &mut self.log
    }

    /// The log entries, oldest first.
    #[inline]
    pub fn log_entries(&self) -> &[LogEntry<T>] {
        self.log.entries()
    }

    /// The value after all logged updates.
    pub fn latest_value(&self) -> &T {
        self.log.latest_value().unwrap_or(self.base.value())
    }

    /// The value as seen by `version`.
    ///
    /// Updates logged after `version` are ignored. Versions older than the
    /// node itself see the value it was created with.
    pub fn value_at(&self, version: Version) -> &T {
        self.log.value_at(version).unwrap_or(self.base.value())
    }
}

impl<T> Vertex for VersionedNode<T> {
    type Value = T;

    delegate! {
        to self.base {
            fn value(&self) -> &T;
            fn out_edges(&self) -> &[Option<Node>];
            fn out_edges_mut(&mut self) -> &mut [Option<Node>];
        }
    }
}
