//! Configuration of a [`PersistentGraph`].
//!
//! [`PersistentGraph`]: crate::PersistentGraph

/// How insertions below the live root affect the roots of older versions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootBackFill {
    /// After a vertex is inserted below the live root, every older root gets
    /// its empty slots filled with the live root's edges at the same index.
    ///
    /// Older root snapshots thereby see substructure created after them.
    #[default]
    Retroactive,
    /// Older roots are never modified.
    Strict,
}

/// Parameters fixed when a [`PersistentGraph`] is created.
///
/// [`PersistentGraph`]: crate::PersistentGraph
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// The number of out-edge slots of every node.
    pub out_degree_bound: usize,
    /// The bound on edges pointing to a node. Sizes the modification logs.
    pub in_degree_bound: usize,
    /// See [`RootBackFill`].
    pub root_back_fill: RootBackFill,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self::new(2, 1)
    }
}

impl GraphConfig {
    /// A configuration with the given degree bounds and the default
    /// [`RootBackFill`] policy.
    pub const fn new(out_degree_bound: usize, in_degree_bound: usize) -> Self {
        Self {
            out_degree_bound,
            in_degree_bound,
            root_back_fill: RootBackFill::Retroactive,
        }
    }

    /// Replace the [`RootBackFill`] policy.
    #[must_use]
    pub const fn with_root_back_fill(mut self, root_back_fill: RootBackFill) -> Self {
        self.root_back_fill = root_back_fill;
        self
    }

    /// The capacity of every node's modification log.
    #[inline]
    pub const fn log_capacity(&self) -> usize {
        self.in_degree_bound.saturating_mul(2)
    }
}
