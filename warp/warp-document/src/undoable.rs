//! A landmark document with undo/redo.

use crate::{
    DocumentResult, ElementRecord, HistoryConfig, LandmarkDocument, OffsetFrameFallbackStrategy,
    SnapshotHistory,
};
use nalgebra::{Point3, Vector3};
use std::sync::Arc;
use tracing::debug;
use warp_tps::TpsSolverInputs;
use warp_types::{ElementId, ElementKind, InputSide};

/// A [`LandmarkDocument`] whose successful edits are recorded in a
/// [`SnapshotHistory`].
///
/// Every command runs against a fresh copy of the current snapshot. On
/// success the copy is committed; on failure it is dropped, so failed
/// commands never appear in history. Commands that succeed without changing
/// anything (renaming an element to its own name, for example) are not
/// committed either.
///
/// The [`generation`](Self::generation) counter increases on every commit,
/// undo, and redo. Background work tagged with an older generation is stale.
///
/// # Example
///
/// ```
/// use warp_document::UndoableDocument;
/// use warp_types::{InputSide, Point3};
///
/// let mut doc = UndoableDocument::new();
/// doc.add_landmark_to_input(InputSide::Source, Point3::new(0.0, 0.0, 0.0), None).unwrap();
/// assert_eq!(doc.current().len(), 1);
///
/// doc.undo();
/// assert!(doc.current().is_empty());
/// doc.redo();
/// assert_eq!(doc.current().len(), 1);
/// ```
#[derive(Debug)]
pub struct UndoableDocument {
    scratch: LandmarkDocument,
    history: SnapshotHistory<LandmarkDocument>,
    generation: u64,
}

impl Default for UndoableDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoableDocument {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::from_document(LandmarkDocument::new())
    }

    /// Wraps an existing document; it becomes the oldest history entry.
    #[must_use]
    pub fn from_document(document: LandmarkDocument) -> Self {
        Self::with_config(document, HistoryConfig::default())
    }

    /// Wraps an existing document with an explicit history configuration.
    #[must_use]
    pub fn with_config(document: LandmarkDocument, config: HistoryConfig) -> Self {
        Self {
            scratch: document.clone(),
            history: SnapshotHistory::with_config(document, "initial state", config),
            generation: 0,
        }
    }

    /// The latest committed document.
    #[must_use]
    pub fn current(&self) -> &Arc<LandmarkDocument> {
        self.history.current()
    }

    /// The scratch document.
    ///
    /// Matches [`current`](Self::current) unless it was edited through
    /// [`scratch_mut`](Self::scratch_mut) without a commit.
    #[must_use]
    pub const fn scratch(&self) -> &LandmarkDocument {
        &self.scratch
    }

    /// Mutable access to the scratch document, for live edits such as an
    /// in-progress drag. Finish with [`commit_scratch`](Self::commit_scratch)
    /// or [`rollback`](Self::rollback).
    ///
    /// Commands always start from [`current`](Self::current), so running one
    /// before committing discards the uncommitted scratch edits.
    pub fn scratch_mut(&mut self) -> &mut LandmarkDocument {
        &mut self.scratch
    }

    /// Commits the scratch document if it differs from the current one.
    ///
    /// Returns whether a commit happened.
    pub fn commit_scratch(&mut self, message: impl Into<String>) -> bool {
        if self.scratch == **self.history.current() {
            return false;
        }
        self.history.commit(self.scratch.clone(), message);
        self.bump_generation();
        true
    }

    /// Discards uncommitted scratch edits.
    pub fn rollback(&mut self) {
        self.scratch = LandmarkDocument::clone(self.history.current());
    }

    /// Runs `action` against a copy of the current document and commits the
    /// result if it succeeds and changed something.
    ///
    /// # Errors
    ///
    /// Returns the action's error; nothing is committed in that case.
    pub fn apply<R>(
        &mut self,
        message: &str,
        action: impl FnOnce(&mut LandmarkDocument) -> DocumentResult<R>,
    ) -> DocumentResult<R> {
        let mut candidate = self.candidate(message);
        match action(&mut candidate) {
            Ok(out) => {
                self.settle(candidate, message);
                Ok(out)
            }
            Err(err) => {
                debug!(command = message, %err, "Document command rejected");
                self.rollback();
                Err(err)
            }
        }
    }

    /// Like [`apply`](Self::apply) for commands that cannot fail.
    fn apply_infallible(&mut self, message: &str, action: impl FnOnce(&mut LandmarkDocument)) {
        let mut candidate = self.candidate(message);
        action(&mut candidate);
        self.settle(candidate, message);
    }

    fn candidate(&self, message: &str) -> LandmarkDocument {
        if self.scratch != **self.history.current() {
            debug!(command = message, "Discarding uncommitted scratch edits");
        }
        LandmarkDocument::clone(self.history.current())
    }

    fn settle(&mut self, candidate: LandmarkDocument, message: &str) {
        if candidate != **self.history.current() {
            self.scratch = candidate.clone();
            self.history.commit(candidate, message);
            self.bump_generation();
        } else {
            self.rollback();
        }
    }

    /// Reverts the last committed change.
    ///
    /// Returns the restored document, or `None` at the oldest entry.
    pub fn undo(&mut self) -> Option<Arc<LandmarkDocument>> {
        let restored = self.history.undo()?;
        self.scratch = LandmarkDocument::clone(&restored);
        self.bump_generation();
        Some(restored)
    }

    /// Reapplies the last undone change.
    ///
    /// Returns the restored document, or `None` at the newest entry.
    pub fn redo(&mut self) -> Option<Arc<LandmarkDocument>> {
        let restored = self.history.redo()?;
        self.scratch = LandmarkDocument::clone(&restored);
        self.bump_generation();
        Some(restored)
    }

    /// Returns whether [`undo`](Self::undo) would succeed.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Returns whether [`redo`](Self::redo) would succeed.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Counter increased on every commit, undo, and redo.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// The underlying history.
    #[must_use]
    pub const fn history(&self) -> &SnapshotHistory<LandmarkDocument> {
        &self.history
    }

    fn bump_generation(&mut self) {
        self.generation += 1;
        debug!(
            generation = self.generation,
            change = self.history.current_message(),
            undo_depth = self.history.undo_depth(),
            "Document generation advanced"
        );
    }

    // ====================================================================
    // Commands
    // ====================================================================

    /// See [`LandmarkDocument::add_element`].
    ///
    /// # Errors
    ///
    /// Returns the underlying command error.
    pub fn add_element(
        &mut self,
        side: InputSide,
        kind: ElementKind,
        name: Option<&str>,
    ) -> DocumentResult<ElementId> {
        self.apply("added element", |doc| doc.add_element(side, kind, name))
    }

    /// See [`LandmarkDocument::set_coordinate`].
    ///
    /// # Errors
    ///
    /// Returns the underlying command error.
    pub fn set_coordinate(
        &mut self,
        id: ElementId,
        side: InputSide,
        point: Point3<f64>,
    ) -> DocumentResult<()> {
        self.apply("set landmark position", |doc| doc.set_coordinate(id, side, point))
    }

    /// See [`LandmarkDocument::translate`].
    ///
    /// # Errors
    ///
    /// Returns the underlying command error.
    pub fn translate(
        &mut self,
        id: ElementId,
        side: InputSide,
        delta: Vector3<f64>,
    ) -> DocumentResult<()> {
        self.apply("moved landmark", |doc| doc.translate(id, side, delta))
    }

    /// See [`LandmarkDocument::clear_coordinate`].
    ///
    /// # Errors
    ///
    /// Returns the underlying command error.
    pub fn clear_coordinate(&mut self, id: ElementId, side: InputSide) -> DocumentResult<()> {
        self.apply("deleted landmark location", |doc| doc.clear_coordinate(id, side))
    }

    /// See [`LandmarkDocument::remove_element`].
    ///
    /// # Errors
    ///
    /// Returns the underlying command error.
    pub fn remove_element(&mut self, id: ElementId) -> DocumentResult<()> {
        self.apply("deleted element", |doc| doc.remove_element(id).map(drop))
    }

    /// See [`LandmarkDocument::rename`].
    ///
    /// # Errors
    ///
    /// Returns the underlying command error.
    pub fn rename(&mut self, id: ElementId, new_name: Option<&str>) -> DocumentResult<()> {
        self.apply("renamed element", |doc| doc.rename(id, new_name))
    }

    /// See [`LandmarkDocument::reorder`].
    ///
    /// # Errors
    ///
    /// Returns the underlying command error.
    pub fn reorder(&mut self, id: ElementId, new_index: usize) -> DocumentResult<()> {
        self.apply("reordered element", |doc| doc.reorder(id, new_index))
    }

    /// See [`LandmarkDocument::add_landmark_to_input`].
    ///
    /// # Errors
    ///
    /// Returns the underlying command error.
    pub fn add_landmark_to_input(
        &mut self,
        side: InputSide,
        point: Point3<f64>,
        name: Option<&str>,
    ) -> DocumentResult<ElementId> {
        self.apply("added landmark", |doc| {
            doc.add_landmark_to_input(side, point, name)
        })
    }

    /// See [`LandmarkDocument::add_non_participating_landmark`].
    ///
    /// # Errors
    ///
    /// Returns the underlying command error.
    pub fn add_non_participating_landmark(
        &mut self,
        side: InputSide,
        point: Point3<f64>,
        name: Option<&str>,
    ) -> DocumentResult<ElementId> {
        self.apply("added non-participating landmark", |doc| {
            doc.add_non_participating_landmark(side, point, name)
        })
    }

    /// Replaces the whole document with `records`.
    ///
    /// # Errors
    ///
    /// Returns an error if a record holds a non-finite coordinate.
    pub fn load_records<I, S>(&mut self, records: I) -> DocumentResult<()>
    where
        I: IntoIterator<Item = (Option<S>, ElementRecord)>,
        S: Into<String>,
    {
        self.apply("loaded landmarks", |doc| {
            *doc = LandmarkDocument::from_records(records, *doc.settings())?;
            Ok(())
        })
    }

    /// Removes every landmark.
    pub fn clear_landmarks(&mut self) {
        self.apply_infallible("cleared landmarks", |doc| doc.clear_landmarks());
    }

    /// Removes every non-participating point.
    pub fn clear_non_participating(&mut self) {
        self.apply_infallible("cleared non-participating landmarks", |doc| doc.clear_non_participating());
    }

    /// See [`LandmarkDocument::set_blend_factor`].
    ///
    /// # Errors
    ///
    /// Returns the underlying command error.
    pub fn set_blend_factor(&mut self, value: f64) -> DocumentResult<()> {
        self.apply("changed blend factor", |doc| doc.set_blend_factor(value))
    }

    /// Enables or disables normal recomputation.
    pub fn set_recalculate_normals(&mut self, enabled: bool) {
        self.apply_infallible("toggled normal recalculation", |doc| doc.set_recalculate_normals(enabled));
    }

    /// Sets the offset frame fallback strategy.
    pub fn set_fallback_strategy(&mut self, strategy: OffsetFrameFallbackStrategy) {
        self.apply_infallible("changed offset frame strategy", |doc| doc.set_fallback_strategy(strategy));
    }

    /// Sets the solver inputs.
    pub fn set_solver_inputs(&mut self, inputs: TpsSolverInputs) {
        self.apply_infallible("changed solver inputs", |doc| doc.set_solver_inputs(inputs));
    }
}
