//! Execution history for drivers that want to scrub back and forth through a run.
//!
//! The engine keeps no history of its own. A driver that wants one records a
//! [`Snapshot`] before each step, seeks with [`History::get`], and can rewind the
//! machine with [`crate::Machine::restore`].

use std::collections::BTreeMap;

/// An immutable copy of a machine's configuration, taken before a step executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Steps executed before this snapshot was taken.
    pub step: usize,
    pub tape: BTreeMap<i64, char>,
    pub head: i64,
    pub state: String,
}

/// Ordered snapshots of one run, indexed by step number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    snapshots: Vec<Snapshot>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a snapshot.
    ///
    /// Snapshots are recorded once per step starting from step 0, so the snapshot of
    /// step `n` sits at index `n`. Recording a step that is already in the history
    /// (after the machine was rewound) discards the snapshots from that step onwards
    /// first, so the history always describes a single linear run.
    pub fn record(&mut self, snapshot: Snapshot) {
        self.snapshots.truncate(snapshot.step);
        self.snapshots.push(snapshot);
    }

    /// The snapshot taken before step `index` (0-based).
    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.snapshots.get(index)
    }

    /// The states immediately before and after `index`, for "go to step" style views.
    pub fn neighbours(&self, index: usize) -> (Option<&str>, Option<&str>) {
        let previous = index
            .checked_sub(1)
            .and_then(|i| self.snapshots.get(i))
            .map(|s| s.state.as_str());
        let next = self.snapshots.get(index + 1).map(|s| s.state.as_str());

        (previous, next)
    }

    pub fn last(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.iter()
    }
}
