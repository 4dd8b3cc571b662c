//! The landmark document.
//!
//! A [`LandmarkDocument`] is an insertion-ordered collection of named
//! elements. Each element is either a landmark (a source/destination
//! correspondence that drives the spline fit) or a non-participating point
//! carried along for reference.
//!
//! Every command validates its input before touching state, so a failed
//! command leaves the document exactly as it was.

use crate::settings::check_blend_factor;
use crate::{DocumentError, DocumentResult, DocumentSettings, OffsetFrameFallbackStrategy};
use hashbrown::{HashMap, HashSet};
use nalgebra::{Point3, Vector3};
use tracing::debug;
use warp_tps::TpsSolverInputs;
use warp_types::{
    ElementId, ElementKind, InputSide, LandmarkPair, NamedLandmarkPair, is_finite_point,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Prefix of generated landmark names.
pub const LANDMARK_NAME_PREFIX: &str = "landmark_";

/// Prefix of generated non-participating point names.
pub const NON_PARTICIPATING_NAME_PREFIX: &str = "datapoint_";

/// The data held by a document element.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ElementRecord {
    /// A correspondence. Only complete landmarks take part in the fit.
    Landmark {
        /// Location in the source input, if placed.
        source: Option<Point3<f64>>,
        /// Location in the destination input, if placed.
        destination: Option<Point3<f64>>,
    },
    /// A reference point on one side that never takes part in the fit.
    NonParticipating {
        /// The input this point belongs to.
        side: InputSide,
        /// Location, if placed.
        location: Option<Point3<f64>>,
    },
}

impl ElementRecord {
    /// An empty landmark.
    #[must_use]
    pub const fn empty_landmark() -> Self {
        Self::Landmark {
            source: None,
            destination: None,
        }
    }

    /// The element kind of this record.
    #[must_use]
    pub const fn kind(&self) -> ElementKind {
        match self {
            Self::Landmark { .. } => ElementKind::Landmark,
            Self::NonParticipating { .. } => ElementKind::NonParticipatingLandmark,
        }
    }

    /// The location on `side`, if set.
    ///
    /// A non-participating point has no location on the side it does not
    /// belong to.
    #[must_use]
    pub fn location(&self, side: InputSide) -> Option<Point3<f64>> {
        match (self, side) {
            (Self::Landmark { source, .. }, InputSide::Source) => *source,
            (Self::Landmark { destination, .. }, InputSide::Destination) => *destination,
            (Self::NonParticipating { side: own, location }, side) => {
                location.filter(|_| *own == side)
            }
        }
    }

    /// The complete pair, if this is a landmark with both sides set.
    #[must_use]
    pub fn pair(&self) -> Option<LandmarkPair> {
        match self {
            Self::Landmark {
                source: Some(s),
                destination: Some(d),
            } => Some(LandmarkPair::new(*s, *d)),
            _ => None,
        }
    }

    /// Returns whether this landmark has exactly one side set.
    #[must_use]
    pub const fn is_half_set(&self) -> bool {
        matches!(
            self,
            Self::Landmark {
                source: Some(_),
                destination: None,
            } | Self::Landmark {
                source: None,
                destination: Some(_),
            }
        )
    }

    /// Returns whether the record holds no location at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(
            self,
            Self::Landmark {
                source: None,
                destination: None,
            } | Self::NonParticipating { location: None, .. }
        )
    }

    fn is_finite(&self) -> bool {
        match self {
            Self::Landmark {
                source,
                destination,
            } => source.iter().chain(destination.iter()).all(is_finite_point),
            Self::NonParticipating { location, .. } => location.iter().all(is_finite_point),
        }
    }
}

/// One element of a [`LandmarkDocument`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Element {
    id: ElementId,
    name: Option<String>,
    record: ElementRecord,
}

impl Element {
    /// Stable identifier.
    #[must_use]
    pub const fn id(&self) -> ElementId {
        self.id
    }

    /// Display name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The element data.
    #[must_use]
    pub const fn record(&self) -> &ElementRecord {
        &self.record
    }

    /// The element kind.
    #[must_use]
    pub const fn kind(&self) -> ElementKind {
        self.record.kind()
    }

    /// The location on `side`, if set.
    #[must_use]
    pub fn location(&self, side: InputSide) -> Option<Point3<f64>> {
        self.record.location(side)
    }

    /// The complete pair, if this is a fully placed landmark.
    #[must_use]
    pub fn pair(&self) -> Option<LandmarkPair> {
        self.record.pair()
    }
}

/// An ordered, named collection of landmarks and reference points.
///
/// Identifiers are never reused, even after the element they named has
/// been removed. Iteration order is insertion order, changed only by
/// [`reorder`](Self::reorder).
///
/// # Example
///
/// ```
/// use warp_document::LandmarkDocument;
/// use warp_types::{InputSide, Point3};
///
/// let mut doc = LandmarkDocument::new();
/// let a = doc.add_landmark_to_input(InputSide::Source, Point3::new(0.0, 0.0, 0.0), None).unwrap();
/// let b = doc.add_landmark_to_input(InputSide::Destination, Point3::new(1.0, 0.0, 0.0), None).unwrap();
///
/// // The destination filled the empty slot of the first landmark
/// assert_eq!(a, b);
/// assert_eq!(doc.get(a).unwrap().name(), Some("landmark_0"));
/// assert_eq!(doc.participating_pairs().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LandmarkDocument {
    elements: Vec<Element>,
    index: HashMap<ElementId, usize>,
    next_id: u64,
    settings: DocumentSettings,
}

impl LandmarkDocument {
    /// Creates an empty document with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty document with the given settings.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::InvalidBlendFactor`] if the settings carry an
    /// unusable blend factor.
    pub fn with_settings(settings: DocumentSettings) -> DocumentResult<Self> {
        check_blend_factor(settings.blend_factor)?;
        Ok(Self {
            settings,
            ..Self::default()
        })
    }

    /// Rebuilds a document from previously saved records.
    ///
    /// Names are taken as given, so the result may contain duplicate names;
    /// those surface as validation warnings rather than errors. Fresh
    /// identifiers are assigned in record order.
    ///
    /// # Errors
    ///
    /// Returns an error if a record holds a non-finite coordinate or the
    /// settings carry an unusable blend factor.
    pub fn from_records<I, S>(records: I, settings: DocumentSettings) -> DocumentResult<Self>
    where
        I: IntoIterator<Item = (Option<S>, ElementRecord)>,
        S: Into<String>,
    {
        let mut doc = Self::with_settings(settings)?;
        for (name, record) in records {
            if !record.is_finite() {
                let side = match record {
                    ElementRecord::NonParticipating { side, .. } => side,
                    ElementRecord::Landmark { source, .. } => {
                        if source.iter().all(is_finite_point) {
                            InputSide::Destination
                        } else {
                            InputSide::Source
                        }
                    }
                };
                return Err(DocumentError::InvalidCoordinate { side });
            }
            doc.push(name.map(Into::into), record);
        }
        Ok(doc)
    }

    // ====================================================================
    // Queries
    // ====================================================================

    /// All elements in order.
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns whether the document has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Looks up an element by identifier.
    #[must_use]
    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.index.get(&id).map(|&i| &self.elements[i])
    }

    /// Position of an element in iteration order.
    #[must_use]
    pub fn position(&self, id: ElementId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Returns whether an element with this identifier exists.
    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.index.contains_key(&id)
    }

    /// The first element with this name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.name() == Some(name))
    }

    /// The document settings.
    #[must_use]
    pub const fn settings(&self) -> &DocumentSettings {
        &self.settings
    }

    /// Complete landmark pairs, in document order.
    ///
    /// Half-placed landmarks and non-participating points are skipped.
    #[must_use]
    pub fn participating_pairs(&self) -> Vec<LandmarkPair> {
        self.elements.iter().filter_map(Element::pair).collect()
    }

    /// Complete landmark pairs with their names, in document order.
    #[must_use]
    pub fn named_participating_pairs(&self) -> Vec<NamedLandmarkPair> {
        self.elements
            .iter()
            .filter_map(|e| e.pair().map(|p| NamedLandmarkPair::new(p, e.name.clone())))
            .collect()
    }

    /// Placed non-participating points on `side`, in document order.
    #[must_use]
    pub fn non_participating_points(&self, side: InputSide) -> Vec<Point3<f64>> {
        self.elements
            .iter()
            .filter(|e| e.kind() == ElementKind::NonParticipatingLandmark)
            .filter_map(|e| e.location(side))
            .collect()
    }

    /// Number of landmarks with a location on `side`.
    #[must_use]
    pub fn landmark_count_for(&self, side: InputSide) -> usize {
        self.elements
            .iter()
            .filter(|e| e.kind() == ElementKind::Landmark && e.location(side).is_some())
            .count()
    }

    /// Landmarks that have exactly one side placed.
    pub fn half_set_landmarks(&self) -> impl Iterator<Item = &Element> + '_ {
        self.elements.iter().filter(|e| e.record.is_half_set())
    }

    /// Names used by more than one element, in order of first appearance.
    #[must_use]
    pub fn duplicate_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        let mut out = Vec::new();
        for name in self.elements.iter().filter_map(Element::name) {
            if !seen.insert(name) && reported.insert(name) {
                out.push(name);
            }
        }
        out
    }

    /// Hash of the participating pairs and solver inputs.
    ///
    /// Two documents with equal hashes solve to the same coefficients; this
    /// is the key used by `warp_tps::CoefficientCache`.
    #[must_use]
    pub fn content_hash(&self) -> u64 {
        warp_tps::content_hash(&self.participating_pairs(), &self.settings.solver)
    }

    /// The name the next generated landmark would receive.
    #[must_use]
    pub fn next_landmark_name(&self) -> String {
        self.next_unique_name(LANDMARK_NAME_PREFIX)
    }

    /// The name the next generated non-participating point would receive.
    #[must_use]
    pub fn next_non_participating_name(&self) -> String {
        self.next_unique_name(NON_PARTICIPATING_NAME_PREFIX)
    }

    // ====================================================================
    // Element commands
    // ====================================================================

    /// Adds an unplaced element.
    ///
    /// For [`ElementKind::Landmark`], `side` is ignored; the new landmark has
    /// neither side placed. A non-participating point belongs to `side`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::DuplicateName`] if `name` is already in use.
    pub fn add_element(
        &mut self,
        side: InputSide,
        kind: ElementKind,
        name: Option<&str>,
    ) -> DocumentResult<ElementId> {
        if let Some(name) = name {
            self.check_name_free(name, None)?;
        }
        let record = match kind {
            ElementKind::Landmark => ElementRecord::empty_landmark(),
            ElementKind::NonParticipatingLandmark => ElementRecord::NonParticipating {
                side,
                location: None,
            },
        };
        let id = self.push(name.map(str::to_owned), record);
        debug!(%id, ?kind, "Added element");
        Ok(id)
    }

    /// Sets or overwrites one side of an element.
    ///
    /// # Errors
    ///
    /// Returns an error if `point` is not finite, `id` is unknown, or `id`
    /// is a non-participating point on the other side.
    pub fn set_coordinate(
        &mut self,
        id: ElementId,
        side: InputSide,
        point: Point3<f64>,
    ) -> DocumentResult<()> {
        if !is_finite_point(&point) {
            return Err(DocumentError::InvalidCoordinate { side });
        }
        let element = self.element_mut(id)?;
        *slot_mut(id, &mut element.record, side)? = Some(point);
        Ok(())
    }

    /// Moves an existing coordinate by `delta`.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is unknown, the side is unset, or the delta
    /// or the result is not finite.
    pub fn translate(
        &mut self,
        id: ElementId,
        side: InputSide,
        delta: Vector3<f64>,
    ) -> DocumentResult<()> {
        if !delta.iter().all(|c| c.is_finite()) {
            return Err(DocumentError::InvalidCoordinate { side });
        }
        let element = self.element_mut(id)?;
        let slot = slot_mut(id, &mut element.record, side)?;
        let current = slot.ok_or(DocumentError::MissingCoordinate { id, side })?;
        let moved = current + delta;
        if !is_finite_point(&moved) {
            return Err(DocumentError::InvalidCoordinate { side });
        }
        *slot = Some(moved);
        Ok(())
    }

    /// Unsets one side of an element.
    ///
    /// An element left with no location at all is removed.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is unknown or is a non-participating point
    /// on the other side.
    pub fn clear_coordinate(&mut self, id: ElementId, side: InputSide) -> DocumentResult<()> {
        let element = self.element_mut(id)?;
        *slot_mut(id, &mut element.record, side)? = None;
        if element.record.is_empty() {
            self.remove_element(id)?;
        }
        Ok(())
    }

    /// Removes an element and both of its sides.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::UnknownId`] if `id` is unknown.
    pub fn remove_element(&mut self, id: ElementId) -> DocumentResult<Element> {
        let pos = self.position(id).ok_or(DocumentError::UnknownId { id })?;
        let removed = self.elements.remove(pos);
        self.index.remove(&id);
        self.reindex_from(pos);
        debug!(%id, "Removed element");
        Ok(removed)
    }

    /// Renames an element, or clears its name with `None`.
    ///
    /// Renaming an element to its current name succeeds without change.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is unknown or another element already uses
    /// `new_name`.
    pub fn rename(&mut self, id: ElementId, new_name: Option<&str>) -> DocumentResult<()> {
        if !self.contains(id) {
            return Err(DocumentError::UnknownId { id });
        }
        if let Some(name) = new_name {
            self.check_name_free(name, Some(id))?;
        }
        let element = self.element_mut(id)?;
        element.name = new_name.map(str::to_owned);
        Ok(())
    }

    /// Moves an element to `new_index` in iteration order.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is unknown or `new_index` is not a valid
    /// position.
    pub fn reorder(&mut self, id: ElementId, new_index: usize) -> DocumentResult<()> {
        let len = self.elements.len();
        let pos = self.position(id).ok_or(DocumentError::UnknownId { id })?;
        if new_index >= len {
            return Err(DocumentError::IndexOutOfRange {
                index: new_index,
                len,
            });
        }
        let element = self.elements.remove(pos);
        self.elements.insert(new_index, element);
        self.reindex_from(pos.min(new_index));
        Ok(())
    }

    /// Places a landmark location on one side.
    ///
    /// With a name, the landmark of that name is updated (or created).
    /// Without one, the location fills the first landmark that has no
    /// location on `side`; if there is none, a new landmark with a generated
    /// name is created.
    ///
    /// # Errors
    ///
    /// Returns an error if `point` is not finite or `name` belongs to a
    /// non-participating point.
    pub fn add_landmark_to_input(
        &mut self,
        side: InputSide,
        point: Point3<f64>,
        name: Option<&str>,
    ) -> DocumentResult<ElementId> {
        if !is_finite_point(&point) {
            return Err(DocumentError::InvalidCoordinate { side });
        }

        let existing = match name {
            Some(name) => match self.find_by_name(name) {
                Some(e) if e.kind() == ElementKind::Landmark => Some(e.id),
                Some(_) => {
                    return Err(DocumentError::DuplicateName {
                        name: name.to_owned(),
                    });
                }
                None => None,
            },
            None => self
                .elements
                .iter()
                .find(|e| {
                    e.kind() == ElementKind::Landmark && e.location(side).is_none()
                })
                .map(Element::id),
        };

        let id = match existing {
            Some(id) => id,
            None => {
                let name = name.map_or_else(|| self.next_landmark_name(), str::to_owned);
                self.push(Some(name), ElementRecord::empty_landmark())
            }
        };
        self.set_coordinate(id, side, point)?;
        debug!(%id, %side, "Placed landmark");
        Ok(id)
    }

    /// Places a non-participating point on one side.
    ///
    /// With a name that already belongs to a non-participating point, that
    /// point is moved. Otherwise a new point is created, with a generated
    /// name if none is given.
    ///
    /// # Errors
    ///
    /// Returns an error if `point` is not finite, `name` belongs to a
    /// landmark, or the named point belongs to the other side.
    pub fn add_non_participating_landmark(
        &mut self,
        side: InputSide,
        point: Point3<f64>,
        name: Option<&str>,
    ) -> DocumentResult<ElementId> {
        if !is_finite_point(&point) {
            return Err(DocumentError::InvalidCoordinate { side });
        }

        if let Some(name) = name {
            if let Some(existing) = self.find_by_name(name) {
                if existing.kind() != ElementKind::NonParticipatingLandmark {
                    return Err(DocumentError::DuplicateName {
                        name: name.to_owned(),
                    });
                }
                let id = existing.id;
                self.set_coordinate(id, side, point)?;
                return Ok(id);
            }
        }

        let name = name.map_or_else(|| self.next_non_participating_name(), str::to_owned);
        let id = self.push(
            Some(name),
            ElementRecord::NonParticipating {
                side,
                location: Some(point),
            },
        );
        debug!(%id, %side, "Placed non-participating point");
        Ok(id)
    }

    /// Removes every landmark, keeping non-participating points.
    pub fn clear_landmarks(&mut self) {
        self.retain(|e| e.kind() != ElementKind::Landmark);
    }

    /// Removes every non-participating point, keeping landmarks.
    pub fn clear_non_participating(&mut self) {
        self.retain(|e| e.kind() != ElementKind::NonParticipatingLandmark);
    }

    // ====================================================================
    // Settings commands
    // ====================================================================

    /// Sets the blend factor.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::InvalidBlendFactor`] if `value` is not a
    /// finite number in `[0, 1]`.
    pub fn set_blend_factor(&mut self, value: f64) -> DocumentResult<()> {
        self.settings.blend_factor = check_blend_factor(value)?;
        Ok(())
    }

    /// Enables or disables normal recomputation for warped meshes.
    pub fn set_recalculate_normals(&mut self, enabled: bool) {
        self.settings.recalculate_normals = enabled;
    }

    /// Sets the offset frame fallback strategy.
    pub fn set_fallback_strategy(&mut self, strategy: OffsetFrameFallbackStrategy) {
        self.settings.fallback_strategy = strategy;
    }

    /// Sets the solver inputs.
    pub fn set_solver_inputs(&mut self, inputs: TpsSolverInputs) {
        self.settings.solver = inputs;
    }

    // ====================================================================
    // Internals
    // ====================================================================

    fn push(&mut self, name: Option<String>, record: ElementRecord) -> ElementId {
        let id = ElementId::new(self.next_id);
        self.next_id += 1;
        self.index.insert(id, self.elements.len());
        self.elements.push(Element { id, name, record });
        id
    }

    fn element_mut(&mut self, id: ElementId) -> DocumentResult<&mut Element> {
        let pos = self.position(id).ok_or(DocumentError::UnknownId { id })?;
        Ok(&mut self.elements[pos])
    }

    fn check_name_free(&self, name: &str, except: Option<ElementId>) -> DocumentResult<()> {
        match self.find_by_name(name) {
            Some(e) if Some(e.id) != except => Err(DocumentError::DuplicateName {
                name: name.to_owned(),
            }),
            _ => Ok(()),
        }
    }

    fn next_unique_name(&self, prefix: &str) -> String {
        let used: HashSet<&str> = self.elements.iter().filter_map(Element::name).collect();
        (0_usize..)
            .map(|i| format!("{prefix}{i}"))
            .find(|candidate| !used.contains(candidate.as_str()))
            .unwrap_or_else(|| prefix.to_owned())
    }

    fn retain(&mut self, keep: impl Fn(&Element) -> bool) {
        self.elements.retain(keep);
        self.index.clear();
        self.reindex_from(0);
    }

    fn reindex_from(&mut self, start: usize) {
        for (i, e) in self.elements.iter().enumerate().skip(start) {
            self.index.insert(e.id, i);
        }
    }
}

/// The coordinate slot for `side` within `record`.
fn slot_mut(
    id: ElementId,
    record: &mut ElementRecord,
    side: InputSide,
) -> DocumentResult<&mut Option<Point3<f64>>> {
    match record {
        ElementRecord::Landmark { source, .. } if side == InputSide::Source => Ok(source),
        ElementRecord::Landmark { destination, .. } => Ok(destination),
        ElementRecord::NonParticipating { side: own, location } => {
            if *own == side {
                Ok(location)
            } else {
                Err(DocumentError::SideMismatch {
                    id,
                    expected: *own,
                    provided: side,
                })
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3<f64> {
        Point3::new(x, y, z)
    }

    fn full_landmark(doc: &mut LandmarkDocument, name: &str, s: Point3<f64>, d: Point3<f64>) -> ElementId {
        let id = doc
            .add_element(InputSide::Source, ElementKind::Landmark, Some(name))
            .unwrap();
        doc.set_coordinate(id, InputSide::Source, s).unwrap();
        doc.set_coordinate(id, InputSide::Destination, d).unwrap();
        id
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut doc = LandmarkDocument::new();
        let a = doc
            .add_element(InputSide::Source, ElementKind::Landmark, None)
            .unwrap();
        doc.remove_element(a).unwrap();
        let b = doc
            .add_element(InputSide::Source, ElementKind::Landmark, None)
            .unwrap();
        assert_ne!(a, b);
        assert!(doc.get(a).is_none());
    }

    #[test]
    fn test_participating_pairs_in_order() {
        let mut doc = LandmarkDocument::new();
        let a = full_landmark(&mut doc, "a", p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0));
        let half = doc
            .add_element(InputSide::Source, ElementKind::Landmark, Some("half"))
            .unwrap();
        doc.set_coordinate(half, InputSide::Source, p(5.0, 5.0, 5.0))
            .unwrap();
        doc.add_non_participating_landmark(InputSide::Source, p(9.0, 9.0, 9.0), None)
            .unwrap();
        full_landmark(&mut doc, "b", p(0.0, 1.0, 0.0), p(0.0, 2.0, 0.0));

        let pairs = doc.participating_pairs();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].source, p(0.0, 0.0, 0.0));
        assert_eq!(pairs[1].destination, p(0.0, 2.0, 0.0));

        // Deleting leaves the others in place
        doc.remove_element(a).unwrap();
        let pairs = doc.participating_pairs();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].source, p(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_set_coordinate_rejects_non_finite() {
        let mut doc = LandmarkDocument::new();
        let id = doc
            .add_element(InputSide::Source, ElementKind::Landmark, None)
            .unwrap();
        let before = doc.clone();
        let err = doc
            .set_coordinate(id, InputSide::Source, p(f64::NAN, 0.0, 0.0))
            .unwrap_err();
        assert_eq!(
            err,
            DocumentError::InvalidCoordinate {
                side: InputSide::Source
            }
        );
        assert_eq!(doc, before);
    }

    #[test]
    fn test_set_coordinate_unknown_id() {
        let mut doc = LandmarkDocument::new();
        let err = doc
            .set_coordinate(ElementId::new(42), InputSide::Source, p(0.0, 0.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, DocumentError::UnknownId { .. }));
    }

    #[test]
    fn test_non_participating_side_mismatch() {
        let mut doc = LandmarkDocument::new();
        let id = doc
            .add_non_participating_landmark(InputSide::Destination, p(1.0, 1.0, 1.0), None)
            .unwrap();
        let err = doc
            .set_coordinate(id, InputSide::Source, p(0.0, 0.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, DocumentError::SideMismatch { .. }));
        assert_eq!(doc.non_participating_points(InputSide::Destination), vec![p(1.0, 1.0, 1.0)]);
        assert!(doc.non_participating_points(InputSide::Source).is_empty());
    }

    #[test]
    fn test_rename_duplicate_keeps_both_names() {
        let mut doc = LandmarkDocument::new();
        let a = full_landmark(&mut doc, "a", p(0.0, 0.0, 0.0), p(0.0, 0.0, 0.0));
        let b = full_landmark(&mut doc, "b", p(1.0, 0.0, 0.0), p(1.0, 0.0, 0.0));

        let err = doc.rename(b, Some("a")).unwrap_err();
        assert_eq!(err, DocumentError::DuplicateName { name: "a".into() });
        assert_eq!(doc.get(a).unwrap().name(), Some("a"));
        assert_eq!(doc.get(b).unwrap().name(), Some("b"));

        // Own name is a no-op
        doc.rename(a, Some("a")).unwrap();
        doc.rename(a, Some("c")).unwrap();
        assert_eq!(doc.get(a).unwrap().name(), Some("c"));
        doc.rename(a, None).unwrap();
        assert_eq!(doc.get(a).unwrap().name(), None);
    }

    #[test]
    fn test_add_element_duplicate_name() {
        let mut doc = LandmarkDocument::new();
        doc.add_element(InputSide::Source, ElementKind::Landmark, Some("x"))
            .unwrap();
        let err = doc
            .add_element(InputSide::Source, ElementKind::NonParticipatingLandmark, Some("x"))
            .unwrap_err();
        assert!(matches!(err, DocumentError::DuplicateName { .. }));
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_add_landmark_to_input_fills_empty_slots() {
        let mut doc = LandmarkDocument::new();
        let s0 = doc
            .add_landmark_to_input(InputSide::Source, p(0.0, 0.0, 0.0), None)
            .unwrap();
        let s1 = doc
            .add_landmark_to_input(InputSide::Source, p(1.0, 0.0, 0.0), None)
            .unwrap();
        assert_ne!(s0, s1);
        assert_eq!(doc.get(s1).unwrap().name(), Some("landmark_1"));

        let d0 = doc
            .add_landmark_to_input(InputSide::Destination, p(0.0, 0.0, 1.0), None)
            .unwrap();
        let d1 = doc
            .add_landmark_to_input(InputSide::Destination, p(1.0, 0.0, 1.0), None)
            .unwrap();
        assert_eq!(d0, s0);
        assert_eq!(d1, s1);

        // No empty slot left: a new half landmark
        let d2 = doc
            .add_landmark_to_input(InputSide::Destination, p(2.0, 0.0, 1.0), None)
            .unwrap();
        assert_eq!(doc.get(d2).unwrap().name(), Some("landmark_2"));
        assert_eq!(doc.landmark_count_for(InputSide::Source), 2);
        assert_eq!(doc.landmark_count_for(InputSide::Destination), 3);
        assert_eq!(doc.participating_pairs().len(), 2);
    }

    #[test]
    fn test_add_landmark_to_input_by_name() {
        let mut doc = LandmarkDocument::new();
        let a = doc
            .add_landmark_to_input(InputSide::Source, p(0.0, 0.0, 0.0), Some("knee"))
            .unwrap();
        let b = doc
            .add_landmark_to_input(InputSide::Destination, p(0.0, 1.0, 0.0), Some("knee"))
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(doc.named_participating_pairs()[0].name(), Some("knee"));

        // Overwrites
        doc.add_landmark_to_input(InputSide::Destination, p(0.0, 2.0, 0.0), Some("knee"))
            .unwrap();
        assert_relative_eq!(doc.participating_pairs()[0].destination, p(0.0, 2.0, 0.0));
    }

    #[test]
    fn test_generated_names_skip_taken() {
        let mut doc = LandmarkDocument::new();
        doc.add_landmark_to_input(InputSide::Source, p(0.0, 0.0, 0.0), Some("landmark_0"))
            .unwrap();
        assert_eq!(doc.next_landmark_name(), "landmark_1");
        assert_eq!(doc.next_non_participating_name(), "datapoint_0");
    }

    #[test]
    fn test_non_participating_named_update() {
        let mut doc = LandmarkDocument::new();
        let a = doc
            .add_non_participating_landmark(InputSide::Source, p(0.0, 0.0, 0.0), Some("tip"))
            .unwrap();
        let b = doc
            .add_non_participating_landmark(InputSide::Source, p(3.0, 0.0, 0.0), Some("tip"))
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(doc.non_participating_points(InputSide::Source), vec![p(3.0, 0.0, 0.0)]);
        assert!(doc.participating_pairs().is_empty());
    }

    #[test]
    fn test_translate() {
        let mut doc = LandmarkDocument::new();
        let id = doc
            .add_landmark_to_input(InputSide::Source, p(1.0, 1.0, 1.0), None)
            .unwrap();
        doc.translate(id, InputSide::Source, Vector3::new(1.0, 0.0, -1.0))
            .unwrap();
        assert_relative_eq!(
            doc.get(id).unwrap().location(InputSide::Source).unwrap(),
            p(2.0, 1.0, 0.0)
        );

        let err = doc
            .translate(id, InputSide::Destination, Vector3::new(1.0, 0.0, 0.0))
            .unwrap_err();
        assert_eq!(
            err,
            DocumentError::MissingCoordinate {
                id,
                side: InputSide::Destination
            }
        );

        let err = doc
            .translate(id, InputSide::Source, Vector3::new(f64::INFINITY, 0.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, DocumentError::InvalidCoordinate { .. }));
    }

    #[test]
    fn test_clear_coordinate_garbage_collects() {
        let mut doc = LandmarkDocument::new();
        let id = full_landmark(&mut doc, "a", p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0));
        doc.clear_coordinate(id, InputSide::Source).unwrap();
        assert!(doc.contains(id));
        assert_eq!(doc.half_set_landmarks().count(), 1);
        doc.clear_coordinate(id, InputSide::Destination).unwrap();
        assert!(!doc.contains(id));
        assert!(doc.is_empty());
    }

    #[test]
    fn test_reorder() {
        let mut doc = LandmarkDocument::new();
        let a = full_landmark(&mut doc, "a", p(0.0, 0.0, 0.0), p(0.0, 0.0, 0.0));
        let b = full_landmark(&mut doc, "b", p(1.0, 0.0, 0.0), p(1.0, 0.0, 0.0));
        let c = full_landmark(&mut doc, "c", p(2.0, 0.0, 0.0), p(2.0, 0.0, 0.0));

        doc.reorder(c, 0).unwrap();
        let order: Vec<_> = doc.elements().iter().map(Element::id).collect();
        assert_eq!(order, vec![c, a, b]);
        assert_eq!(doc.position(b), Some(2));
        assert_eq!(doc.get(a).unwrap().name(), Some("a"));

        let err = doc.reorder(a, 3).unwrap_err();
        assert_eq!(err, DocumentError::IndexOutOfRange { index: 3, len: 3 });
    }

    #[test]
    fn test_clear_by_kind() {
        let mut doc = LandmarkDocument::new();
        full_landmark(&mut doc, "a", p(0.0, 0.0, 0.0), p(0.0, 0.0, 0.0));
        let np = doc
            .add_non_participating_landmark(InputSide::Source, p(1.0, 0.0, 0.0), None)
            .unwrap();

        let mut landmarks_cleared = doc.clone();
        landmarks_cleared.clear_landmarks();
        assert_eq!(landmarks_cleared.len(), 1);
        assert_eq!(landmarks_cleared.position(np), Some(0));

        doc.clear_non_participating();
        assert_eq!(doc.len(), 1);
        assert!(!doc.contains(np));
    }

    #[test]
    fn test_blend_factor_validation() {
        let mut doc = LandmarkDocument::new();
        doc.set_blend_factor(0.3).unwrap();
        assert_relative_eq!(doc.settings().blend_factor, 0.3);
        let err = doc.set_blend_factor(1.5).unwrap_err();
        assert_eq!(err, DocumentError::InvalidBlendFactor { value: 1.5 });
        assert_relative_eq!(doc.settings().blend_factor, 0.3);
    }

    #[test]
    fn test_from_records_allows_duplicates() {
        let doc = LandmarkDocument::from_records(
            [
                (Some("a"), ElementRecord::empty_landmark()),
                (Some("a"), ElementRecord::empty_landmark()),
                (None, ElementRecord::empty_landmark()),
            ],
            DocumentSettings::default(),
        )
        .unwrap();
        assert_eq!(doc.len(), 3);
        assert_eq!(doc.duplicate_names(), vec!["a"]);
    }

    #[test]
    fn test_from_records_rejects_non_finite() {
        let err = LandmarkDocument::from_records(
            [(
                None::<String>,
                ElementRecord::Landmark {
                    source: Some(p(0.0, 0.0, 0.0)),
                    destination: Some(p(f64::NAN, 0.0, 0.0)),
                },
            )],
            DocumentSettings::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            DocumentError::InvalidCoordinate {
                side: InputSide::Destination
            }
        );
    }

    #[test]
    fn test_content_hash_tracks_solve_inputs() {
        let mut doc = LandmarkDocument::new();
        let a = full_landmark(&mut doc, "a", p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0));
        let h0 = doc.content_hash();

        // Renames and reference points do not affect the solve
        doc.rename(a, Some("renamed")).unwrap();
        doc.add_non_participating_landmark(InputSide::Source, p(5.0, 5.0, 5.0), None)
            .unwrap();
        assert_eq!(doc.content_hash(), h0);

        doc.set_solver_inputs(TpsSolverInputs::affine_only());
        assert_ne!(doc.content_hash(), h0);
    }
}
