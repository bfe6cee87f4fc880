//! The single-version graph substrate.
//!
//! A [`Graph`] is an arena of nodes, each with the same fixed number of
//! out-edge slots. It knows nothing about versions; [`PersistentGraph`] builds
//! on it by storing [`VersionedNode`]s.
//!
//! [`PersistentGraph`]: crate::PersistentGraph
//! [`VersionedNode`]: crate::VersionedNode

use std::ops::Index;

use thiserror::Error;

use crate::Node;

/// Errors that can occur while manipulating a [`Graph`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum GraphError {
    /// The slot index is outside the graph's out-degree bound.
    #[error("Slot {slot} is out of range for out-degree {degree}")]
    #[allow(missing_docs)]
    InvalidPosition { slot: usize, degree: usize },
    /// A node does not have the graph's out-degree.
    #[error("Node has {found} out-edge slots but the graph requires {expected}")]
    #[allow(missing_docs)]
    MismatchedDegree { expected: usize, found: usize },
    /// The handle does not belong to this graph.
    #[error("{0} is not a node of this graph")]
    UnknownNode(Node),
}

/// Errors from navigating a single node's out-edge slots.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum EdgeError {
    /// The slot index is outside the node's out-degree.
    #[error("Slot {slot} is out of range for out-degree {degree}")]
    #[allow(missing_docs)]
    OutOfRange { slot: usize, degree: usize },
    /// The slot is empty.
    #[error("Slot {slot} holds no edge")]
    #[allow(missing_docs)]
    MissingEdge { slot: usize },
}

/// A node that can be stored in a [`Graph`].
///
/// Nodes carry a value and a fixed-length array of out-edge slots.
pub trait Vertex {
    /// The type of value held by the node.
    type Value;

    /// The value the node was created with.
    fn value(&self) -> &Self::Value;

    /// The out-edge slots, in slot order.
    fn out_edges(&self) -> &[Option<Node>];

    /// Mutable access to the out-edge slots.
    fn out_edges_mut(&mut self) -> &mut [Option<Node>];

    /// The number of out-edge slots.
    #[inline]
    fn degree(&self) -> usize {
        self.out_edges().len()
    }

    /// The node at `slot`, if the slot exists and is occupied.
    #[inline]
    fn edge(&self, slot: usize) -> Option<Node> {
        self.out_edges().get(slot).copied().flatten()
    }

    /// The node at `slot`, or why there is none.
    fn neighbour(&self, slot: usize) -> Result<Node, EdgeError> {
        let degree = self.degree();
        self.out_edges()
            .get(slot)
            .copied()
            .ok_or(EdgeError::OutOfRange { slot, degree })?
            .ok_or(EdgeError::MissingEdge { slot })
    }

    /// The occupied slots and the nodes they point to.
    fn neighbours(&self) -> impl Iterator<Item = (usize, Node)> + '_ {
        self.out_edges()
            .iter()
            .enumerate()
            .filter_map(|(slot, edge)| edge.map(|n| (slot, n)))
    }
}

/// A plain graph node: a value and its out-edge slots.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GraphNode<T> {
    value: T,
    out_edges: Box<[Option<Node>]>,
}

impl<T> GraphNode<T> {
    /// Create a node with `degree` empty out-edge slots.
    pub fn new(value: T, degree: usize) -> Self {
        Self {
            value,
            out_edges: vec![None; degree].into_boxed_slice(),
        }
    }

    /// Create a node with a copy of the given slots.
    pub fn with_edges(value: T, out_edges: &[Option<Node>]) -> Self {
        Self {
            value,
            out_edges: out_edges.into(),
        }
    }
}

impl<T> Vertex for GraphNode<T> {
    type Value = T;

    #[inline]
    fn value(&self) -> &T {
        &self.value
    }

    #[inline]
    fn out_edges(&self) -> &[Option<Node>] {
        &self.out_edges
    }

    #[inline]
    fn out_edges_mut(&mut self) -> &mut [Option<Node>] {
        &mut self.out_edges
    }
}

/// A directed graph with a designated root and a uniform out-degree.
///
/// Nodes are stored in an arena and addressed by [`Node`] handles. Edges are
/// plain handles, so any number of slots may point to the same node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Graph<N> {
    nodes: Vec<N>,
    root: Node,
    out_degree: usize,
}

impl<T> Graph<GraphNode<T>> {
    /// Create a graph with a single root holding `value`.
    pub fn with_root(value: T, out_degree: usize) -> Self {
        Self::new(GraphNode::new(value, out_degree))
    }

    /// Insert a new node holding `value` at `parent`'s `slot`.
    ///
    /// See [`Graph::insert_node`].
    pub fn insert_vertex(
        &mut self,
        value: T,
        parent: Node,
        slot: usize,
    ) -> Result<Node, GraphError> {
        let node = GraphNode::new(value, self.out_degree);
        self.insert_node(node, parent, slot)
    }
}

impl<N: Vertex> Graph<N> {
    /// Create a graph rooted at `root`.
    ///
    /// The root's degree fixes the out-degree of the whole graph.
    pub fn new(root: N) -> Self {
        Self {
            out_degree: root.degree(),
            nodes: vec![root],
            root: Node::from(0),
        }
    }

    /// The current root.
    #[inline]
    pub fn root(&self) -> Node {
        self.root
    }

    /// Replace the current root.
    pub fn set_root(&mut self, root: Node) -> Result<(), GraphError> {
        self.try_get(root)?;
        self.root = root;
        Ok(())
    }

    /// The number of out-edge slots of every node.
    #[inline]
    pub fn out_degree(&self) -> usize {
        self.out_degree
    }

    /// The number of nodes in the arena.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether `node` belongs to this graph.
    #[inline]
    pub fn contains(&self, node: Node) -> bool {
        node.index() < self.nodes.len()
    }

    /// The node behind `node`, if it belongs to this graph.
    #[inline]
    pub fn get(&self, node: Node) -> Option<&N> {
        self.nodes.get(node.index())
    }

    /// The node behind `node`, or an [`GraphError::UnknownNode`] error.
    pub fn try_get(&self, node: Node) -> Result<&N, GraphError> {
        self.get(node).ok_or(GraphError::UnknownNode(node))
    }

    /// Mutable access to the node behind `node`.
    pub fn try_get_mut(&mut self, node: Node) -> Result<&mut N, GraphError> {
        self.nodes
            .get_mut(node.index())
            .ok_or(GraphError::UnknownNode(node))
    }

    /// All nodes with their handles, in creation order.
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = (Node, &N)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, n)| (Node::from(index), n))
    }

    /// Add a node without linking it to the rest of the graph.
    pub fn add_node(&mut self, node: N) -> Result<Node, GraphError> {
        self.check_degree(node.degree())?;
        let handle = Node::from(self.nodes.len());
        self.nodes.push(node);
        Ok(handle)
    }

    /// Insert `node` at `parent`'s `slot`.
    ///
    /// Whatever `parent` held at `slot` is moved to the same slot of the new
    /// node, so the new node is inserted between `parent` and its former
    /// neighbour.
    pub fn insert_node(
        &mut self,
        mut node: N,
        parent: Node,
        slot: usize,
    ) -> Result<Node, GraphError> {
        self.check_slot(slot)?;
        let parent_degree = self.try_get(parent)?.degree();
        self.check_degree(parent_degree)?;
        self.check_degree(node.degree())?;

        node.out_edges_mut()[slot] = self.nodes[parent.index()].out_edges()[slot];
        let handle = self.add_node(node)?;
        self.nodes[parent.index()].out_edges_mut()[slot] = Some(handle);
        Ok(handle)
    }

    /// Point `u`'s `slot` at `v`, overwriting any previous edge.
    pub fn add_edge(&mut self, u: Node, v: Node, slot: usize) -> Result<(), GraphError> {
        self.check_slot(slot)?;
        self.try_get(v)?;
        self.try_get_mut(u)?.out_edges_mut()[slot] = Some(v);
        Ok(())
    }

    /// Check that `slot` is within the out-degree bound.
    pub fn check_slot(&self, slot: usize) -> Result<(), GraphError> {
        if slot >= self.out_degree {
            return Err(GraphError::InvalidPosition {
                slot,
                degree: self.out_degree,
            });
        }
        Ok(())
    }

    fn check_degree(&self, degree: usize) -> Result<(), GraphError> {
        if degree != self.out_degree {
            return Err(GraphError::MismatchedDegree {
                expected: self.out_degree,
                found: degree,
            });
        }
        Ok(())
    }
}

impl<N> Index<Node> for Graph<N> {
    type Output = N;

    #[inline]
    fn index(&self, node: Node) -> &N {
        &self.nodes[node.index()]
    }
}

#[cfg(test)]
mod test {
    use cool_asserts::assert_matches;
    use rstest::{fixture, rstest};

    use super::*;

    /// root(0) with a single child(1) at slot 0.
    #[fixture]
    fn small_graph() -> (Graph<GraphNode<u32>>, Node) {
        let mut graph = Graph::with_root(0, 2);
        let child = graph.insert_vertex(1, graph.root(), 0).unwrap();
        (graph, child)
    }

    #[rstest]
    fn insert_between(small_graph: (Graph<GraphNode<u32>>, Node)) {
        let (mut graph, child) = small_graph;
        let root = graph.root();
        let middle = graph.insert_vertex(5, root, 0).unwrap();

        assert_eq!(graph[root].edge(0), Some(middle));
        assert_eq!(graph[middle].edge(0), Some(child));
        assert_eq!(graph[middle].edge(1), None);
        assert_eq!(*graph[middle].value(), 5);
        assert_eq!(graph.node_count(), 3);
    }

    #[rstest]
    fn insert_out_of_range(small_graph: (Graph<GraphNode<u32>>, Node)) {
        let (mut graph, _) = small_graph;
        let root = graph.root();
        assert_eq!(
            graph.insert_vertex(9, root, 2),
            Err(GraphError::InvalidPosition { slot: 2, degree: 2 })
        );
        assert_eq!(graph.node_count(), 2);
    }

    #[rstest]
    fn insert_mismatched_degree(small_graph: (Graph<GraphNode<u32>>, Node)) {
        let (mut graph, _) = small_graph;
        let root = graph.root();
        let wide = GraphNode::new(9, 3);
        assert_eq!(
            graph.insert_node(wide, root, 1),
            Err(GraphError::MismatchedDegree {
                expected: 2,
                found: 3
            })
        );
        assert_eq!(graph[root].edge(1), None);
    }

    #[rstest]
    fn unknown_nodes(small_graph: (Graph<GraphNode<u32>>, Node)) {
        let (mut graph, child) = small_graph;
        let stranger = Node::from(42);
        assert_matches!(
            graph.insert_vertex(3, stranger, 0),
            Err(GraphError::UnknownNode(n)) => assert_eq!(n, stranger)
        );
        assert_eq!(
            graph.add_edge(child, stranger, 0),
            Err(GraphError::UnknownNode(stranger))
        );
        assert_eq!(graph.set_root(stranger), Err(GraphError::UnknownNode(stranger)));
    }

    #[rstest]
    fn add_edge_overwrites(small_graph: (Graph<GraphNode<u32>>, Node)) {
        let (mut graph, child) = small_graph;
        let root = graph.root();
        graph.add_edge(child, root, 1).unwrap();
        graph.add_edge(root, root, 0).unwrap();
        assert_eq!(graph[child].edge(1), Some(root));
        assert_eq!(graph[root].edge(0), Some(root));
        assert_eq!(
            graph.add_edge(root, child, 7),
            Err(GraphError::InvalidPosition { slot: 7, degree: 2 })
        );
    }

    #[rstest]
    fn neighbour_access(small_graph: (Graph<GraphNode<u32>>, Node)) {
        let (graph, child) = small_graph;
        let root = &graph[graph.root()];
        assert_eq!(root.neighbour(0), Ok(child));
        assert_eq!(root.neighbour(1), Err(EdgeError::MissingEdge { slot: 1 }));
        assert_eq!(
            root.neighbour(2),
            Err(EdgeError::OutOfRange { slot: 2, degree: 2 })
        );
        assert_eq!(root.neighbours().collect::<Vec<_>>(), [(0, child)]);
    }
}
