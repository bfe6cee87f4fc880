//! Bounded modification logs attached to versioned nodes.
//!
//! A [`ModificationLog`] absorbs updates to a node without touching the node
//! itself, so that versions created before the update still see the node as
//! it was. Each log has a fixed capacity; once it is exhausted the node has to
//! be copied (see [`PersistentGraph::insert_value`]).
//!
//! [`PersistentGraph::insert_value`]: crate::PersistentGraph::insert_value

use thiserror::Error;
use tracing::trace;

use crate::{Node, Version};

/// The payload of a single log entry.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Update<T> {
    /// The node's value was replaced.
    Value {
        /// The new value.
        value: T,
    },
    /// One of the node's out-edge slots was redirected.
    Pointer {
        /// The redirected slot.
        slot: usize,
        /// The node the slot points to from this entry onwards.
        target: Node,
    },
}

/// The kind of an [`Update`], without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    /// See [`Update::Value`].
    Value,
    /// See [`Update::Pointer`].
    Pointer,
}

impl<T> Update<T> {
    /// The kind of this update.
    pub fn kind(&self) -> UpdateKind {
        match self {
            Update::Value { .. } => UpdateKind::Value,
            Update::Pointer { .. } => UpdateKind::Pointer,
        }
    }
}

/// An [`Update`] tagged with the version it was written at.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LogEntry<T> {
    /// The version that was current when the entry was written.
    pub version: Version,
    /// The recorded update.
    #[serde(flatten)]
    pub update: Update<T>,
}

impl<T> LogEntry<T> {
    /// The kind of the recorded update.
    pub fn kind(&self) -> UpdateKind {
        self.update.kind()
    }
}

/// A write was attempted on a log with no remaining capacity.
///
/// The rejected payload is handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("modification log is full ({capacity} entries)")]
pub struct LogFull<R> {
    /// The capacity of the log that rejected the write.
    pub capacity: usize,
    /// The payload that could not be recorded.
    pub rejected: R,
}

/// A bounded, append-only sequence of [`LogEntry`]s.
///
/// Value and pointer updates share a single budget. Entries are never
/// removed, so the log only grows until it reaches its capacity.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ModificationLog<T> {
    capacity: usize,
    entries: Vec<LogEntry<T>>,
}

impl<T> ModificationLog<T> {
    /// Create an empty log accepting at most `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::new(),
        }
    }

    /// Create an empty log sized for a node with the given in-degree bound.
    ///
    /// Such a log holds `2 * in_degree_bound` entries, saturating at
    /// `usize::MAX`.
    pub fn for_in_degree(in_degree_bound: usize) -> Self {
        Self::with_capacity(in_degree_bound.saturating_mul(2))
    }

    /// The maximum number of entries.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The number of recorded entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The number of writes still accepted.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity - self.entries.len()
    }

    /// Whether a write would succeed.
    #[inline]
    pub fn has_capacity(&self) -> bool {
        self.entries.len() < self.capacity
    }

    /// The recorded entries, oldest first.
    #[inline]
    pub fn entries(&self) -> &[LogEntry<T>] {
        &self.entries
    }

    /// Record a value update made at `version`.
    ///
    /// On a full log the value is returned in the error.
    pub fn append_value(&mut self, value: T, version: Version) -> Result<(), LogFull<T>> {
        if !self.has_capacity() {
            return Err(self.full(value));
        }
        self.push(version, Update::Value { value });
        Ok(())
    }

    /// Record that `slot` points to `target` from `version` onwards.
    ///
    /// On a full log the target is returned in the error.
    pub fn append_pointer(
        &mut self,
        slot: usize,
        target: Node,
        version: Version,
    ) -> Result<(), LogFull<Node>> {
        if !self.has_capacity() {
            return Err(self.full(target));
        }
        self.push(version, Update::Pointer { slot, target });
        Ok(())
    }

    fn full<R>(&self, rejected: R) -> LogFull<R> {
        LogFull {
            capacity: self.capacity,
            rejected,
        }
    }

    fn push(&mut self, version: Version, update: Update<T>) {
        debug_assert!(self.has_capacity());
        trace!(
            %version,
            kind = ?update.kind(),
            used = self.entries.len() + 1,
            capacity = self.capacity,
            "log append"
        );
        self.entries.push(LogEntry { version, update });
    }

    /// The most recently logged value, if any.
    pub fn latest_value(&self) -> Option<&T> {
        self.values().next_back().map(|(_, value)| value)
    }

    /// The most recent value logged at or before `version`, if any.
    pub fn value_at(&self, version: Version) -> Option<&T> {
        self.values()
            .rev()
            .find(|&(v, _)| v <= version)
            .map(|(_, value)| value)
    }

    fn values(&self) -> impl DoubleEndedIterator<Item = (Version, &T)> {
        self.entries.iter().filter_map(|entry| match &entry.update {
            Update::Value { value } => Some((entry.version, value)),
            Update::Pointer { .. } => None,
        })
    }
}

#[cfg(test)]
mod test {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, 0)]
    #[case(1, 2)]
    #[case(3, 6)]
    #[case(usize::MAX / 2, usize::MAX - 1)]
    #[case(usize::MAX, usize::MAX)]
    fn capacity_is_twice_the_in_degree(#[case] in_degree: usize, #[case] capacity: usize) {
        let log = ModificationLog::<u8>::for_in_degree(in_degree);
        assert_eq!(log.capacity(), capacity);
        assert_eq!(log.remaining(), capacity);
        assert_eq!(log.has_capacity(), capacity > 0);
    }

    #[test]
    fn shared_budget() {
        let mut log = ModificationLog::for_in_degree(1);
        log.append_value(5, Version::new(1)).unwrap();
        log.append_pointer(0, Node::from(4), Version::new(2)).unwrap();
        assert!(!log.has_capacity());

        let err = log.append_value(6, Version::new(2)).unwrap_err();
        assert_eq!(err.capacity, 2);
        assert_eq!(err.rejected, 6);
        assert_eq!(
            log.append_pointer(1, Node::from(2), Version::new(3)),
            Err(LogFull {
                capacity: 2,
                rejected: Node::from(2)
            })
        );
        assert_eq!(log.len(), 2);
        assert_eq!(
            log.entries().iter().map(LogEntry::kind).collect::<Vec<_>>(),
            [UpdateKind::Value, UpdateKind::Pointer]
        );
    }

    #[test]
    fn values_by_version() {
        let mut log = ModificationLog::with_capacity(4);
        assert_eq!(log.latest_value(), None);
        log.append_value('a', Version::new(1)).unwrap();
        log.append_value('b', Version::new(3)).unwrap();
        log.append_pointer(1, Node::from(0), Version::new(3)).unwrap();

        assert_eq!(log.latest_value(), Some(&'b'));
        assert_eq!(log.value_at(Version::new(0)), None);
        assert_eq!(log.value_at(Version::new(2)), Some(&'a'));
        assert_eq!(log.value_at(Version::new(5)), Some(&'b'));
    }

    #[test]
    fn serialized_entries() {
        let mut log = ModificationLog::with_capacity(2);
        log.append_value(11, Version::new(2)).unwrap();
        log.append_pointer(0, Node::from(7), Version::new(3)).unwrap();
        let json = serde_json::to_value(log.entries()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"version": 2, "kind": "value", "value": 11},
                {"version": 3, "kind": "pointer", "slot": 0, "target": 7},
            ])
        );
    }
}
