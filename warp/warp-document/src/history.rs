//! Snapshot-based undo/redo history.
//!
//! [`SnapshotHistory`] stores every committed state as an [`Arc`], so moving
//! through history only moves pointers and readers can keep an old snapshot
//! alive while newer ones are committed.
//!
//! ```text
//! commit(s3)
//!   undo: [s0, s1, s2, s3]   redo: []        current: s3
//! undo() x2
//!   undo: [s0, s1]           redo: [s3, s2]  current: s1
//! commit(s4)
//!   undo: [s0, s1, s4]       redo: []        current: s4
//! ```
//!
//! The history is never empty: it is created with an initial state, and the
//! oldest retained entry can never be undone past.

use std::collections::VecDeque;
use std::sync::Arc;

/// Configuration for [`SnapshotHistory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Maximum number of snapshots on the undo stack, current included.
    ///
    /// Oldest snapshots are evicted first. Values below 1 are treated as 1.
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_depth: 100 }
    }
}

impl HistoryConfig {
    /// Creates a configuration with the given depth limit.
    #[must_use]
    pub const fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Creates a configuration that never evicts.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_depth: usize::MAX,
        }
    }
}

/// A committed state and the message describing the change that produced it.
#[derive(Debug)]
pub struct Snapshot<T> {
    state: Arc<T>,
    message: String,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            message: self.message.clone(),
        }
    }
}

impl<T> Snapshot<T> {
    /// The stored state.
    #[must_use]
    pub const fn state(&self) -> &Arc<T> {
        &self.state
    }

    /// The commit message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Linear undo/redo history of immutable snapshots.
///
/// # Invariants
///
/// 1. The undo stack is never empty; its back is the current state.
/// 2. The undo stack never holds more than `max_depth` entries.
/// 3. Every commit clears the redo stack.
///
/// # Example
///
/// ```
/// use warp_document::SnapshotHistory;
///
/// let mut history = SnapshotHistory::new(0, "initial");
/// history.commit(1, "increment");
/// history.commit(2, "increment");
///
/// assert_eq!(*history.undo().unwrap(), 1);
/// assert_eq!(*history.redo().unwrap(), 2);
/// assert!(history.redo().is_none());
/// ```
#[derive(Debug)]
pub struct SnapshotHistory<T> {
    undo_stack: VecDeque<Snapshot<T>>,
    redo_stack: VecDeque<Snapshot<T>>,
    config: HistoryConfig,
}

impl<T> SnapshotHistory<T> {
    /// Creates a history whose only entry is `initial`.
    pub fn new(initial: T, message: impl Into<String>) -> Self {
        Self::with_config(initial, message, HistoryConfig::default())
    }

    /// Creates a history with an explicit configuration.
    pub fn with_config(initial: T, message: impl Into<String>, config: HistoryConfig) -> Self {
        let mut undo_stack = VecDeque::new();
        undo_stack.push_back(Snapshot {
            state: Arc::new(initial),
            message: message.into(),
        });
        Self {
            undo_stack,
            redo_stack: VecDeque::new(),
            config,
        }
    }

    /// Commits a new state, discarding everything that could be redone.
    pub fn commit(&mut self, state: T, message: impl Into<String>) {
        self.commit_arc(Arc::new(state), message);
    }

    /// Commits an already shared state.
    pub fn commit_arc(&mut self, state: Arc<T>, message: impl Into<String>) {
        self.redo_stack.clear();
        self.undo_stack.push_back(Snapshot {
            state,
            message: message.into(),
        });
        self.enforce_depth();
    }

    /// Steps back one entry and returns the new current state.
    ///
    /// Returns `None` when already at the oldest retained state.
    pub fn undo(&mut self) -> Option<Arc<T>> {
        if self.undo_stack.len() < 2 {
            return None;
        }
        let undone = self.undo_stack.pop_back()?;
        self.redo_stack.push_back(undone);
        self.undo_stack.back().map(|s| Arc::clone(&s.state))
    }

    /// Steps forward one entry and returns the new current state.
    ///
    /// Returns `None` when already at the newest state.
    pub fn redo(&mut self) -> Option<Arc<T>> {
        let redone = self.redo_stack.pop_back()?;
        self.undo_stack.push_back(redone);
        self.undo_stack.back().map(|s| Arc::clone(&s.state))
    }

    /// The current state.
    #[must_use]
    pub fn current(&self) -> &Arc<T> {
        // The undo stack always holds at least the initial snapshot.
        match self.undo_stack.back() {
            Some(snapshot) => &snapshot.state,
            None => unreachable!("snapshot history is never empty"),
        }
    }

    /// Message of the current state, which is also what `undo` would revert.
    #[must_use]
    pub fn current_message(&self) -> &str {
        self.undo_stack.back().map_or("", Snapshot::message)
    }

    /// Message of the change `redo` would reapply.
    #[must_use]
    pub fn redo_message(&self) -> Option<&str> {
        self.redo_stack.back().map(Snapshot::message)
    }

    /// Returns whether [`undo`](Self::undo) would succeed.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.undo_stack.len() >= 2
    }

    /// Returns whether [`redo`](Self::redo) would succeed.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of entries on the undo stack, current included.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of entries on the redo stack.
    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Undo entries from oldest to current.
    pub fn undo_entries(&self) -> impl Iterator<Item = &Snapshot<T>> + '_ {
        self.undo_stack.iter()
    }

    /// The configuration.
    #[must_use]
    pub const fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Drops all history except the current state.
    pub fn clear(&mut self) {
        self.redo_stack.clear();
        let keep = self.undo_stack.len().saturating_sub(1);
        self.undo_stack.drain(..keep);
    }

    fn enforce_depth(&mut self) {
        while self.undo_stack.len() > self.config.max_depth.max(1) {
            self.undo_stack.pop_front();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn new_history_has_initial_state() {
        let history = SnapshotHistory::new(7, "initial");
        assert_eq!(**history.current(), 7);
        assert_eq!(history.current_message(), "initial");
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(history.undo_depth(), 1);
    }

    #[test]
    fn undo_stops_at_oldest() {
        let mut history = SnapshotHistory::new(1, "a");
        history.commit(2, "b");
        history.commit(3, "c");

        assert_eq!(*history.undo().unwrap(), 2);
        assert_eq!(*history.undo().unwrap(), 1);
        assert!(history.undo().is_none());
        assert_eq!(**history.current(), 1);
    }

    #[test]
    fn redo_stops_at_newest() {
        let mut history = SnapshotHistory::new(1, "a");
        history.commit(2, "b");
        history.undo();
        assert_eq!(history.redo_message(), Some("b"));
        assert_eq!(*history.redo().unwrap(), 2);
        assert!(history.redo().is_none());
    }

    #[test]
    fn commit_clears_redo() {
        let mut history = SnapshotHistory::new(1, "a");
        history.commit(2, "b");
        history.undo();
        assert!(history.can_redo());

        history.commit(3, "c");
        assert!(!history.can_redo());
        assert_eq!(history.redo_depth(), 0);
        let states: Vec<_> = history.undo_entries().map(|s| **s.state()).collect();
        assert_eq!(states, vec![1, 3]);
    }

    #[test]
    fn depth_limit_evicts_oldest() {
        let mut history = SnapshotHistory::with_config(0, "init", HistoryConfig::new(3));
        for i in 1..=5 {
            history.commit(i, "step");
        }
        assert_eq!(history.undo_depth(), 3);
        assert_eq!(*history.undo().unwrap(), 4);
        assert_eq!(*history.undo().unwrap(), 3);
        assert!(history.undo().is_none());
    }

    #[test]
    fn zero_depth_keeps_current() {
        let mut history = SnapshotHistory::with_config(0, "init", HistoryConfig::new(0));
        history.commit(1, "step");
        assert_eq!(**history.current(), 1);
        assert_eq!(history.undo_depth(), 1);
    }

    #[test]
    fn old_snapshots_outlive_history_moves() {
        let mut history = SnapshotHistory::new(String::from("v1"), "init");
        let held = Arc::clone(history.current());
        history.commit(String::from("v2"), "edit");
        history.clear();
        assert_eq!(*held, "v1");
        assert_eq!(**history.current(), "v2");
        assert!(!history.can_undo());
    }
}
