//! The partially persistent graph.

use std::collections::HashSet;
use std::ops::Index;

use indexmap::IndexMap;
use itertools::Itertools;
use thiserror::Error;
use tracing::debug;

use crate::config::{GraphConfig, RootBackFill};
use crate::graph::{EdgeError, Graph, GraphError, Vertex};
use crate::log::{LogEntry, LogFull};
use crate::{Node, Version, VersionedNode};

/// Errors that can occur while manipulating a [`PersistentGraph`].
///
/// A failed operation leaves the graph unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum PersistenceError {
    /// The requested version does not follow the current version.
    #[error("Cannot write at version {requested}, the current version is {current}")]
    #[allow(missing_docs)]
    InvalidVersion { requested: Version, current: Version },
    /// No root is recorded for the version.
    #[error("No root is recorded for version {0}")]
    UnknownVersion(Version),
    /// A vertex insertion targeted a slot that already holds an edge.
    #[error("Slot {slot} of {node} is already occupied")]
    #[allow(missing_docs)]
    SlotOccupied { node: Node, slot: usize },
    /// The operation was rejected by the underlying graph.
    #[error(transparent)]
    Graph(#[from] GraphError),
    /// Navigation through an out-edge slot failed.
    #[error(transparent)]
    Edge(#[from] EdgeError),
}

/// The effect of [`PersistentGraph::insert_value`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WriteOutcome {
    /// The value was appended to the node's log.
    Logged {
        /// The node whose log holds the value.
        node: Node,
    },
    /// The node's log was full, so a copy holding the value was created and
    /// linked in place of the original.
    Copied {
        /// The saturated node. Its log is left untouched.
        original: Node,
        /// The new node holding the value.
        copy: Node,
    },
}

impl WriteOutcome {
    /// The node that now holds the written value.
    pub fn node(&self) -> Node {
        match *self {
            WriteOutcome::Logged { node } => node,
            WriteOutcome::Copied { copy, .. } => copy,
        }
    }
}

/// A directed graph with bounded degrees in which every version stays
/// browsable.
///
/// Each version has a root recorded in a version registry, and
/// [`Self::get_root_at`] re-enters the graph at any recorded version. Changes
/// are made with the fat-node method: every node owns a [`ModificationLog`]
/// of capacity `2 * in_degree_bound`, value writes are appended to it, and a
/// node is only copied once its log is full. The copy replaces the original
/// in its predecessor, so the number of copies is bounded by the number of
/// writes divided by the log capacity.
///
/// Versions are linear: only the newest version can be extended.
///
/// # Propagation to existing nodes
///
/// Nodes are never changed after creation, with three exceptions:
///  - a slot of a predecessor is redirected when one of its nodes is copied,
///  - inserting below the live root back-fills the empty slots of older
///    roots (see [`RootBackFill`]),
///  - inserting below any other node installs the new node in the slot of
///    the same index in the parent's siblings, overwriting their edge.
///
/// Redirects performed after a version was recorded are visible through that
/// version's root.
///
/// [`ModificationLog`]: crate::ModificationLog
#[derive(Clone, Debug)]
pub struct PersistentGraph<T> {
    /// All nodes ever created, and the live root.
    graph: Graph<VersionedNode<T>>,
    /// Root of every version that has one, in version order.
    ///
    /// Invariant: contains [`Version::INITIAL`].
    version_roots: IndexMap<Version, Node>,
    current_version: Version,
    config: GraphConfig,
}

impl<T> PersistentGraph<T> {
    /// Create a graph at version 0 with a single root holding `value`.
    pub fn new(value: T, out_degree_bound: usize, in_degree_bound: usize) -> Self {
        Self::with_config(value, GraphConfig::new(out_degree_bound, in_degree_bound))
    }

    /// Create a graph at version 0 with a single root holding `value`.
    pub fn with_config(value: T, config: GraphConfig) -> Self {
        let root = VersionedNode::new(
            value,
            config.out_degree_bound,
            config.in_degree_bound,
            Version::INITIAL,
        );
        let graph = Graph::new(root);
        let version_roots = IndexMap::from([(Version::INITIAL, graph.root())]);
        Self {
            graph,
            version_roots,
            current_version: Version::INITIAL,
            config,
        }
    }

    /// The configuration the graph was created with.
    #[inline]
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// The newest version.
    #[inline]
    pub fn current_version(&self) -> Version {
        self.current_version
    }

    /// The number of nodes ever created.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Read-only access to the underlying graph.
    #[inline]
    pub fn graph(&self) -> &Graph<VersionedNode<T>> {
        &self.graph
    }

    /// The live root.
    #[inline]
    pub fn get_root(&self) -> Node {
        self.graph.root()
    }

    /// The root recorded for `version`.
    pub fn get_root_at(&self, version: Version) -> Result<Node, PersistenceError> {
        self.version_roots
            .get(&version)
            .copied()
            .ok_or(PersistenceError::UnknownVersion(version))
    }

    /// The root through which `version` is seen: the root of the newest
    /// version at or before `version` that has one.
    ///
    /// Unlike [`Self::get_root_at`], this also resolves versions created by
    /// vertex or edge insertions, which do not record a root of their own.
    pub fn root_at(&self, version: Version) -> Result<Node, PersistenceError> {
        if version > self.current_version {
            return Err(PersistenceError::UnknownVersion(version));
        }
        self.version_roots
            .iter()
            .rev()
            .find(|&(&v, _)| v <= version)
            .map(|(_, &root)| root)
            .ok_or(PersistenceError::UnknownVersion(version))
    }

    /// The version registry, in version order.
    pub fn versions(&self) -> impl ExactSizeIterator<Item = (Version, Node)> + '_ {
        self.version_roots.iter().map(|(&v, &root)| (v, root))
    }

    /// The node behind a handle.
    pub fn node(&self, node: Node) -> Result<&VersionedNode<T>, PersistenceError> {
        Ok(self.graph.try_get(node)?)
    }

    /// The value of `node` after all logged writes.
    pub fn value(&self, node: Node) -> Result<&T, PersistenceError> {
        Ok(self.node(node)?.latest_value())
    }

    /// The value of `node` as seen by `version`.
    pub fn value_at(&self, node: Node, version: Version) -> Result<&T, PersistenceError> {
        Ok(self.node(node)?.value_at(version))
    }

    /// The node at `slot` of `node`.
    pub fn neighbour(&self, node: Node, slot: usize) -> Result<Node, PersistenceError> {
        Ok(self.node(node)?.neighbour(slot)?)
    }

    /// The occupied slots of `node` and the nodes they point to.
    pub fn neighbours(
        &self,
        node: Node,
    ) -> Result<impl Iterator<Item = (usize, Node)> + '_, PersistenceError> {
        Ok(self.node(node)?.neighbours())
    }

    /// The modification log of `node`, oldest entry first.
    pub fn log_entries(&self, node: Node) -> Result<&[LogEntry<T>], PersistenceError> {
        Ok(self.node(node)?.log_entries())
    }

    /// All nodes reachable from `from`, in depth-first order.
    ///
    /// Slots are followed in increasing order and every node is listed once.
    pub fn reachable(&self, from: Node) -> Result<Vec<Node>, PersistenceError> {
        self.node(from)?;
        let mut visited = HashSet::new();
        let mut order = Vec::new();
        let mut stack = vec![from];
        while let Some(node) = stack.pop() {
            if !visited.insert(node) {
                continue;
            }
            order.push(node);
            stack.extend(self.graph[node].out_edges().iter().rev().flatten().copied());
        }
        Ok(order)
    }

    /// Create the root of a new version.
    ///
    /// `version` must directly follow the current version. The new root has
    /// no out-edges and becomes the live root.
    pub fn insert_root(&mut self, value: T, version: Version) -> Result<Node, PersistenceError> {
        self.check_next_version(version)?;
        let root = VersionedNode::new(
            value,
            self.config.out_degree_bound,
            self.config.in_degree_bound,
            version,
        );
        let root = self.graph.add_node(root)?;
        self.graph.set_root(root)?;
        self.version_roots.insert(version, root);
        self.current_version = version;
        debug!(%version, %root, "new root");
        Ok(root)
    }

    /// Insert a vertex holding `value` in the empty `slot` of `parent`, in the
    /// current version.
    ///
    /// The new node's predecessor is `parent`. If `parent` is the live root,
    /// older roots are back-filled according to [`RootBackFill`]. Otherwise
    /// the new node is also installed in the siblings of `parent`, i.e. the
    /// other nodes pointed to by `parent`'s predecessor, replacing whatever
    /// their slot `slot` held.
    pub fn insert_vertex(
        &mut self,
        value: T,
        parent: Node,
        slot: usize,
    ) -> Result<Node, PersistenceError> {
        self.check_free_slot(parent, slot)?;
        self.link_vertex(value, parent, slot, self.current_version)
    }

    /// Insert a vertex as in [`Self::insert_vertex`], at an explicit version.
    ///
    /// `version` must be either the current version, or the one directly
    /// following it, in which case the current version is advanced.
    pub fn insert_vertex_at(
        &mut self,
        value: T,
        parent: Node,
        slot: usize,
        version: Version,
    ) -> Result<Node, PersistenceError> {
        if version != self.current_version && version != self.current_version.next() {
            return Err(self.invalid_version(version));
        }
        self.check_free_slot(parent, slot)?;
        self.link_vertex(value, parent, slot, version)
    }

    /// Point `u`'s `slot` at `v` in a new version.
    ///
    /// Any previous edge in the slot is overwritten. Unlike vertex insertion,
    /// the change is not propagated to other nodes.
    pub fn add_edge(&mut self, u: Node, v: Node, slot: usize) -> Result<(), PersistenceError> {
        self.graph.add_edge(u, v, slot)?;
        self.current_version = self.current_version.next();
        debug!(version = %self.current_version, %u, %v, slot, "edge added");
        Ok(())
    }

    /// Write a new value to `target` in the current version.
    ///
    /// The value is appended to the target's log if it has capacity left.
    /// Otherwise the target is copied: the copy holds the new value, the
    /// target's current out-edges and an empty log, and replaces the target
    /// in every slot of its predecessor that points to it (or in the version
    /// registry and as live root, if the target is a root). The redirect is
    /// also recorded in the predecessor's log while it has capacity.
    pub fn insert_value(
        &mut self,
        value: T,
        target: Node,
    ) -> Result<WriteOutcome, PersistenceError> {
        let version = self.current_version;
        let log = self.graph.try_get_mut(target)?.log_mut();
        let Err(LogFull {
            capacity,
            rejected: value,
        }) = log.append_value(value, version)
        else {
            return Ok(WriteOutcome::Logged { node: target });
        };

        let copy = self.graph[target].materialize(value, version);
        let predecessor = copy.predecessor();
        let copy = self.graph.add_node(copy)?;
        debug!(%version, original = %target, %copy, capacity, "log full, node copied");
        match predecessor {
            Some(predecessor) => self.redirect_slots(predecessor, target, copy)?,
            None => self.redirect_root(target, copy)?,
        }
        Ok(WriteOutcome::Copied {
            original: target,
            copy,
        })
    }

    fn invalid_version(&self, requested: Version) -> PersistenceError {
        PersistenceError::InvalidVersion {
            requested,
            current: self.current_version,
        }
    }

    fn check_next_version(&self, version: Version) -> Result<(), PersistenceError> {
        if version != self.current_version.next() {
            return Err(self.invalid_version(version));
        }
        Ok(())
    }

    fn check_free_slot(&self, parent: Node, slot: usize) -> Result<(), PersistenceError> {
        self.graph.check_slot(slot)?;
        if self.graph.try_get(parent)?.edge(slot).is_some() {
            return Err(PersistenceError::SlotOccupied { node: parent, slot });
        }
        Ok(())
    }

    /// Insert a new node below `parent` at `version` and propagate it.
    ///
    /// The caller has checked that the slot is free.
    fn link_vertex(
        &mut self,
        value: T,
        parent: Node,
        slot: usize,
        version: Version,
    ) -> Result<Node, PersistenceError> {
        let node = VersionedNode::new(
            value,
            self.config.out_degree_bound,
            self.config.in_degree_bound,
            version,
        )
        .with_predecessor(parent);
        let node = self.graph.insert_node(node, parent, slot)?;
        self.current_version = version;

        if parent == self.graph.root() {
            let filled = self.back_fill_roots()?;
            debug!(%version, %node, %parent, slot, filled, "vertex inserted below the root");
        } else {
            let updated = self.propagate_to_siblings(parent, slot, node)?;
            debug!(%version, %node, %parent, slot, updated, "vertex inserted");
        }
        Ok(node)
    }

    /// Fill the empty slots of older roots with the live root's edges.
    ///
    /// Returns the number of filled slots.
    fn back_fill_roots(&mut self) -> Result<usize, GraphError> {
        if self.config.root_back_fill == RootBackFill::Strict {
            return Ok(0);
        }
        let live = self.graph.root();
        let live_edges = self.graph[live].out_edges().to_vec();
        let current = self.current_version;
        let older_roots = self
            .version_roots
            .iter()
            .filter(|&(&v, &root)| v < current && root != live)
            .map(|(_, &root)| root)
            .unique()
            .collect_vec();

        let mut filled = 0;
        for root in older_roots {
            let edges = self.graph.try_get_mut(root)?.out_edges_mut();
            for (edge, &live_edge) in edges.iter_mut().zip(&live_edges) {
                if edge.is_none() && live_edge.is_some() {
                    *edge = live_edge;
                    filled += 1;
                }
            }
        }
        Ok(filled)
    }

    /// Point `slot` of every sibling of `parent` at `node`, replacing any
    /// edge already there.
    ///
    /// Returns the number of updated siblings.
    fn propagate_to_siblings(
        &mut self,
        parent: Node,
        slot: usize,
        node: Node,
    ) -> Result<usize, GraphError> {
        let Some(predecessor) = self.graph.try_get(parent)?.predecessor() else {
            return Ok(0);
        };
        let siblings = self
            .graph
            .try_get(predecessor)?
            .out_edges()
            .iter()
            .flatten()
            .copied()
            .filter(|&sibling| sibling != parent && sibling != node)
            .unique()
            .collect_vec();

        for &sibling in &siblings {
            self.graph.try_get_mut(sibling)?.out_edges_mut()[slot] = Some(node);
        }
        Ok(siblings.len())
    }

    /// Point every slot of `predecessor` that holds `from` at `to`.
    fn redirect_slots(&mut self, predecessor: Node, from: Node, to: Node) -> Result<(), GraphError> {
        let version = self.current_version;
        let pred = self.graph.try_get_mut(predecessor)?;
        let slots = pred
            .out_edges()
            .iter()
            .positions(|&edge| edge == Some(from))
            .collect_vec();
        for slot in slots {
            pred.out_edges_mut()[slot] = Some(to);
            if let Err(full) = pred.log_mut().append_pointer(slot, to, version) {
                debug!(
                    %predecessor,
                    slot,
                    capacity = full.capacity,
                    "predecessor log full, redirect not recorded"
                );
            }
        }
        Ok(())
    }

    /// Replace the root `from` by `to` in the version registry, and as live
    /// root.
    fn redirect_root(&mut self, from: Node, to: Node) -> Result<(), GraphError> {
        if self.graph.root() == from {
            self.graph.set_root(to)?;
        }
        for root in self.version_roots.values_mut().filter(|root| **root == from) {
            *root = to;
        }
        Ok(())
    }
}

impl<T> Index<Node> for PersistentGraph<T> {
    type Output = VersionedNode<T>;

    #[inline]
    fn index(&self, node: Node) -> &VersionedNode<T> {
        &self.graph[node]
    }
}
