//! Scripts of graph operations and the reports produced by running them.
//!
//! A script is a JSON document holding the graph configuration, the value of
//! the initial root and a list of operations. Nodes are referred to by their
//! index in the graph's arena, which is assigned in creation order starting
//! with the initial root at `0`.
//!
//! ```json
//! {
//!   "config": { "out_degree_bound": 2, "in_degree_bound": 1 },
//!   "initial": 1,
//!   "ops": [
//!     { "op": "insert_root", "value": 10, "version": 1 },
//!     { "op": "insert_vertex", "value": 2, "parent": 1, "slot": 0 },
//!     { "op": "insert_value", "value": 3, "node": 2 }
//!   ]
//! }
//! ```

use fatgraph::{
    GraphConfig, LogEntry, Node, PersistenceError, PersistentGraph, Version, Vertex, WriteOutcome,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::CliError;

/// The value type of scripted graphs.
pub type Value = i64;

/// A single operation on a [`PersistentGraph`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    /// See [`PersistentGraph::insert_root`].
    InsertRoot {
        /// Value of the new root.
        value: Value,
        /// Version of the new root.
        version: Version,
    },
    /// See [`PersistentGraph::insert_vertex`] and
    /// [`PersistentGraph::insert_vertex_at`].
    InsertVertex {
        /// Value of the new node.
        value: Value,
        /// The node below which to insert.
        parent: Node,
        /// The slot of `parent` to insert into.
        slot: usize,
        /// Explicit version of the insertion.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        version: Option<Version>,
    },
    /// See [`PersistentGraph::add_edge`].
    AddEdge {
        /// Source of the edge.
        from: Node,
        /// Target of the edge.
        to: Node,
        /// The slot of `from` to overwrite.
        slot: usize,
    },
    /// See [`PersistentGraph::insert_value`].
    InsertValue {
        /// The value to write.
        value: Value,
        /// The node to write to.
        node: Node,
    },
}

impl Op {
    /// Apply the operation to `graph`.
    pub fn apply(&self, graph: &mut PersistentGraph<Value>) -> Result<StepResult, PersistenceError> {
        Ok(match *self {
            Op::InsertRoot { value, version } => StepResult::Node {
                node: graph.insert_root(value, version)?,
            },
            Op::InsertVertex {
                value,
                parent,
                slot,
                version: None,
            } => StepResult::Node {
                node: graph.insert_vertex(value, parent, slot)?,
            },
            Op::InsertVertex {
                value,
                parent,
                slot,
                version: Some(version),
            } => StepResult::Node {
                node: graph.insert_vertex_at(value, parent, slot, version)?,
            },
            Op::AddEdge { from, to, slot } => {
                graph.add_edge(from, to, slot)?;
                StepResult::Edge
            }
            Op::InsertValue { value, node } => StepResult::Write {
                outcome: graph.insert_value(value, node)?,
            },
        })
    }
}

/// A script of operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    /// Configuration of the graph.
    #[serde(default)]
    pub config: GraphConfig,
    /// Value of the root of version 0.
    pub initial: Value,
    /// The operations, applied in order.
    #[serde(default)]
    pub ops: Vec<Op>,
}

impl Script {
    /// Run the script on a fresh graph.
    ///
    /// Rejected operations are recorded in the report and skipped, unless
    /// `fail_fast` is set, in which case the first rejection is returned as a
    /// [`CliError::StepFailed`].
    pub fn run(&self, fail_fast: bool) -> Result<Report, CliError> {
        let mut graph = PersistentGraph::with_config(self.initial, self.config);
        let mut steps = Vec::with_capacity(self.ops.len());
        for (step, op) in self.ops.iter().enumerate() {
            let result = match op.apply(&mut graph) {
                Ok(result) => result,
                Err(source) if fail_fast => return Err(CliError::StepFailed { step, source }),
                Err(err) => {
                    warn!(step, error = %err, "operation rejected");
                    StepResult::Failed {
                        error: err.to_string(),
                    }
                }
            };
            steps.push(Step {
                op: op.clone(),
                result,
            });
        }
        info!(
            version = %graph.current_version(),
            nodes = graph.node_count(),
            "script finished"
        );
        Ok(Report::new(&graph, steps))
    }
}

/// The result of one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepResult {
    /// A node was created.
    Node {
        /// The new node.
        node: Node,
    },
    /// An edge was added.
    Edge,
    /// A value was written.
    Write {
        /// Where the value went.
        outcome: WriteOutcome,
    },
    /// The operation was rejected.
    Failed {
        /// The error message.
        error: String,
    },
}

/// An operation with its result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// The operation.
    pub op: Op,
    /// Its result.
    pub result: StepResult,
}

/// A root recorded in the version registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRoot {
    /// The version.
    pub version: Version,
    /// Its root.
    pub root: Node,
}

/// The state of a single node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeReport {
    /// The node.
    pub node: Node,
    /// The version the node was created at.
    pub version: Version,
    /// The value the node was created with.
    pub value: Value,
    /// The value after all logged writes.
    pub latest_value: Value,
    /// The node in whose slot this node was created.
    pub predecessor: Option<Node>,
    /// The out-edge slots.
    pub out_edges: Vec<Option<Node>>,
    /// Capacity of the node's modification log.
    pub log_capacity: usize,
    /// The modification log, oldest entry first.
    pub log: Vec<LogEntry<Value>>,
}

/// The final state of a graph after running a script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Every operation with its result.
    pub steps: Vec<Step>,
    /// The newest version.
    pub current_version: Version,
    /// The live root.
    pub live_root: Node,
    /// The version registry, in version order.
    pub versions: Vec<VersionRoot>,
    /// Every node, in creation order.
    pub nodes: Vec<NodeReport>,
}

impl Report {
    /// Describe the state of `graph`.
    pub fn new(graph: &PersistentGraph<Value>, steps: Vec<Step>) -> Self {
        let versions = graph
            .versions()
            .map(|(version, root)| VersionRoot { version, root })
            .collect();
        let nodes = graph
            .graph()
            .nodes()
            .map(|(node, n)| NodeReport {
                node,
                version: n.version(),
                value: *n.value(),
                latest_value: *n.latest_value(),
                predecessor: n.predecessor(),
                out_edges: n.out_edges().to_vec(),
                log_capacity: n.log().capacity(),
                log: n.log_entries().to_vec(),
            })
            .collect();
        Self {
            steps,
            current_version: graph.current_version(),
            live_root: graph.get_root(),
            versions,
            nodes,
        }
    }
}
