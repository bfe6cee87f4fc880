//! Definitions for the handle types used across the crate.
//!
//! These types are re-exported in the root of the crate.

use derive_more::{From, Into};

/// A handle to a node in a graph arena.
///
/// Handles are stable for the lifetime of the graph that issued them: nodes
/// are never removed from the arena.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct Node {
    index: usize,
}

impl Node {
    /// Returns the position of the node in the arena.
    #[inline]
    pub fn index(self) -> usize {
        self.index
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Node({})", self.index)
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Identifier of one version of a persistent graph.
///
/// Versions are totally ordered and only ever advance by one.
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    From,
    Into,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct Version(u32);

impl Version {
    /// The version a graph is created at.
    pub const INITIAL: Self = Self(0);

    /// Creates a version from its number.
    #[inline]
    pub const fn new(version: u32) -> Self {
        Self(version)
    }

    /// The version that directly follows `self`.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the version number.
    #[inline]
    pub const fn number(self) -> u32 {
        self.0
    }
}

impl std::fmt::Debug for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn version_sequence() {
        let v = Version::INITIAL;
        assert_eq!(v.next(), Version::new(1));
        assert_eq!(v.next().next().number(), 2);
        assert!(v < v.next());
        assert_eq!(Version::from(7).to_string(), "v7");
    }

    #[test]
    fn node_handles() {
        let n = Node::from(3);
        assert_eq!(n.index(), 3);
        assert_eq!(usize::from(n), 3);
        assert_eq!(format!("{n}"), "Node(3)");
        assert_eq!(serde_json::to_string(&n).unwrap(), "3");
    }
}
