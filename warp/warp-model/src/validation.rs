//! Per-element validation of a landmark document and its offset frames.
//!
//! Validation is read-only. It classifies every frame as exactly warpable,
//! warpable through a lossy fallback, or not warpable under the active
//! [`OffsetFrameFallbackStrategy`], and flags document problems that would
//! degrade or block a solve.

use crate::{FrameGraph, FrameId, OffsetFrame, frame_from_points};
use hashbrown::HashMap;
use warp_document::{LandmarkDocument, OffsetFrameFallbackStrategy};
use warp_tps::MIN_LANDMARK_PAIRS;
use warp_types::{ElementId, InputSide, LandmarkPair};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Outcome of validating one element.
///
/// States are ordered by severity, so the worst of several checks is their
/// maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ValidationCheckState {
    /// Exactly representable.
    #[default]
    Ok,
    /// Handled through a lossy fallback, or otherwise suspicious.
    Warning,
    /// Not warpable.
    Error,
}

impl ValidationCheckState {
    /// Short lowercase label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for ValidationCheckState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// What a validation check is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ValidationSubject {
    /// The document as a whole.
    Document,
    /// One document element.
    Element(ElementId),
    /// One offset frame.
    Frame(FrameId),
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ValidationCheck {
    /// The checked element.
    pub subject: ValidationSubject,
    /// Human-readable explanation.
    pub description: String,
    /// Severity.
    pub state: ValidationCheckState,
}

impl ValidationCheck {
    /// Creates a check.
    #[must_use]
    pub fn new(
        subject: ValidationSubject,
        state: ValidationCheckState,
        description: impl Into<String>,
    ) -> Self {
        Self {
            subject,
            description: description.into(),
            state,
        }
    }

    /// Creates an `Ok` check.
    #[must_use]
    pub fn ok(subject: ValidationSubject, description: impl Into<String>) -> Self {
        Self::new(subject, ValidationCheckState::Ok, description)
    }

    /// Creates a `Warning` check.
    #[must_use]
    pub fn warning(subject: ValidationSubject, description: impl Into<String>) -> Self {
        Self::new(subject, ValidationCheckState::Warning, description)
    }

    /// Creates an `Error` check.
    #[must_use]
    pub fn error(subject: ValidationSubject, description: impl Into<String>) -> Self {
        Self::new(subject, ValidationCheckState::Error, description)
    }

    /// Returns whether this check concerns a frame.
    #[must_use]
    pub const fn frame(&self) -> Option<FrameId> {
        match self.subject {
            ValidationSubject::Frame(id) => Some(id),
            _ => None,
        }
    }
}

impl std::fmt::Display for ValidationCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.state, self.description)
    }
}

/// Result of a validation pass.
///
/// Checks are kept in emission order: document checks first, then frames in
/// graph order. Every frame of the graph has an entry in the state map.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationReport {
    checks: Vec<ValidationCheck>,
    frame_states: HashMap<FrameId, ValidationCheckState>,
    strategy: OffsetFrameFallbackStrategy,
}

impl ValidationReport {
    /// All checks in emission order.
    #[must_use]
    pub fn checks(&self) -> &[ValidationCheck] {
        &self.checks
    }

    /// Consumes the report and returns its checks.
    #[must_use]
    pub fn into_checks(self) -> Vec<ValidationCheck> {
        self.checks
    }

    /// The strategy the frames were classified under.
    #[must_use]
    pub const fn strategy(&self) -> OffsetFrameFallbackStrategy {
        self.strategy
    }

    /// Worst state of frame `id`, or `None` if it was not validated.
    #[must_use]
    pub fn frame_state(&self, id: FrameId) -> Option<ValidationCheckState> {
        self.frame_states.get(&id).copied()
    }

    /// Worst state of every validated frame.
    #[must_use]
    pub const fn frame_states(&self) -> &HashMap<FrameId, ValidationCheckState> {
        &self.frame_states
    }

    /// Worst state among the checks about `subject`.
    #[must_use]
    pub fn state_of(&self, subject: ValidationSubject) -> Option<ValidationCheckState> {
        self.checks
            .iter()
            .filter(|c| c.subject == subject)
            .map(|c| c.state)
            .max()
    }

    /// Worst state across the whole report, `Ok` when empty.
    #[must_use]
    pub fn worst(&self) -> ValidationCheckState {
        self.checks
            .iter()
            .map(|c| c.state)
            .max()
            .unwrap_or_default()
    }

    /// Returns whether any check is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.worst() == ValidationCheckState::Error
    }

    /// Error checks about frames, in emission order.
    #[must_use]
    pub fn frame_errors(&self) -> Vec<ValidationCheck> {
        self.checks
            .iter()
            .filter(|c| c.frame().is_some() && c.state == ValidationCheckState::Error)
            .cloned()
            .collect()
    }

    fn push(&mut self, check: ValidationCheck) {
        if let ValidationSubject::Frame(id) = check.subject {
            let state = self.frame_states.entry(id).or_default();
            *state = (*state).max(check.state);
        }
        self.checks.push(check);
    }
}

/// How the landmarks of an offset frame resolve against a document.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameResolution {
    /// All three landmarks are unique complete pairs spanning a proper frame
    /// on both sides. Pairs are in origin, axis, plane order.
    Exact([LandmarkPair; 3]),
    /// The frame cannot be rebuilt from landmarks.
    Inexact {
        /// Why the frame is not exactly warpable.
        reason: String,
        /// Referenced names that match more than one element.
        ambiguous: Vec<String>,
    },
}

impl FrameResolution {
    fn inexact(reason: impl Into<String>) -> Self {
        Self::Inexact {
            reason: reason.into(),
            ambiguous: Vec::new(),
        }
    }

    /// Returns whether the frame can be rebuilt from its landmarks.
    #[must_use]
    pub const fn is_exact(&self) -> bool {
        matches!(self, Self::Exact(_))
    }
}

/// Resolves the landmark definition of `frame` against `document`.
#[must_use]
pub fn resolve_frame(document: &LandmarkDocument, frame: &OffsetFrame) -> FrameResolution {
    let Some(names) = frame.definition.landmark_names() else {
        return FrameResolution::inexact("it has no landmark definition");
    };

    let ambiguous: Vec<String> = names
        .iter()
        .filter(|name| count_named(document, name) > 1)
        .map(|name| (*name).to_owned())
        .collect();
    if let Some(first) = ambiguous.first() {
        return FrameResolution::Inexact {
            reason: format!("landmark name '{first}' is ambiguous"),
            ambiguous,
        };
    }

    let mut pairs = Vec::with_capacity(3);
    for name in names {
        let Some(element) = document.find_by_name(name) else {
            return FrameResolution::inexact(format!("landmark '{name}' does not exist"));
        };
        if !element.kind().participates() {
            return FrameResolution::inexact(format!(
                "'{name}' is not a participating landmark"
            ));
        }
        match element.pair() {
            Some(pair) => pairs.push(pair),
            None => {
                return FrameResolution::inexact(format!("landmark '{name}' is not paired"));
            }
        }
    }

    let [origin, axis, plane] = [pairs[0], pairs[1], pairs[2]];
    for side in InputSide::ALL {
        if frame_from_points(&origin.get(side), &axis.get(side), &plane.get(side)).is_none() {
            return FrameResolution::inexact(format!("its {side} landmarks are collinear"));
        }
    }

    FrameResolution::Exact([origin, axis, plane])
}

fn count_named(document: &LandmarkDocument, name: &str) -> usize {
    document
        .elements()
        .iter()
        .filter(|e| e.name() == Some(name))
        .count()
}

/// Document-level checks.
///
/// Emits a `Warning` for every half-placed landmark and every element whose
/// name is shared, and an `Error` when there are too few pairs to solve.
#[must_use]
pub fn validate_document(document: &LandmarkDocument) -> Vec<ValidationCheck> {
    let mut checks = Vec::new();

    for element in document.half_set_landmarks() {
        let missing = InputSide::ALL
            .into_iter()
            .find(|side| element.location(*side).is_none())
            .unwrap_or(InputSide::Destination);
        checks.push(ValidationCheck::warning(
            ValidationSubject::Element(element.id()),
            format!(
                "landmark '{}' has no {missing} location",
                element.name().unwrap_or("<unnamed>")
            ),
        ));
    }

    let duplicates = document.duplicate_names();
    for element in document.elements() {
        if let Some(name) = element.name().filter(|n| duplicates.contains(n)) {
            checks.push(ValidationCheck::warning(
                ValidationSubject::Element(element.id()),
                format!("name '{name}' is used by more than one element"),
            ));
        }
    }

    let pairs = document.participating_pairs().len();
    if pairs < MIN_LANDMARK_PAIRS {
        checks.push(ValidationCheck::error(
            ValidationSubject::Document,
            format!(
                "{pairs} participating landmark pairs; at least {MIN_LANDMARK_PAIRS} are required"
            ),
        ));
    }

    checks
}

/// Checks for one frame, together with its resolution.
pub(crate) fn frame_checks(
    document: &LandmarkDocument,
    frame: &OffsetFrame,
    strategy: OffsetFrameFallbackStrategy,
) -> (FrameResolution, Vec<ValidationCheck>) {
    let subject = ValidationSubject::Frame(frame.id);
    let resolution = resolve_frame(document, frame);
    let name = &frame.name;

    let checks = match &resolution {
        FrameResolution::Exact(_) => vec![ValidationCheck::ok(
            subject,
            format!("frame '{name}' is rebuilt from its landmarks"),
        )],
        FrameResolution::Inexact { reason, ambiguous } => {
            let mut checks: Vec<_> = ambiguous
                .iter()
                .map(|n| {
                    ValidationCheck::warning(
                        subject,
                        format!("frame '{name}' references duplicate landmark name '{n}'"),
                    )
                })
                .collect();
            checks.push(match strategy {
                OffsetFrameFallbackStrategy::Error => ValidationCheck::error(
                    subject,
                    format!("frame '{name}' cannot be warped exactly: {reason}"),
                ),
                OffsetFrameFallbackStrategy::Ignore => ValidationCheck::warning(
                    subject,
                    format!("frame '{name}' is left unwarped: {reason}"),
                ),
                OffsetFrameFallbackStrategy::WarpPosition => ValidationCheck::warning(
                    subject,
                    format!("only the origin of frame '{name}' is warped: {reason}"),
                ),
            });
            checks
        }
    };
    (resolution, checks)
}

/// Validates `document` and every frame of `graph` under `strategy`.
pub(crate) fn assess<G>(
    document: &LandmarkDocument,
    graph: &G,
    strategy: OffsetFrameFallbackStrategy,
) -> (ValidationReport, Vec<(FrameId, FrameResolution)>)
where
    G: FrameGraph + ?Sized,
{
    let mut report = ValidationReport {
        strategy,
        ..ValidationReport::default()
    };
    for check in validate_document(document) {
        report.push(check);
    }

    let mut resolutions = Vec::new();
    for frame in graph.offset_frames() {
        let (resolution, checks) = frame_checks(document, frame, strategy);
        for check in checks {
            report.push(check);
        }
        resolutions.push((frame.id, resolution));
    }
    (report, resolutions)
}

/// Validates a document and the offset frames of a model.
///
/// # Example
///
/// ```
/// use warp_document::{LandmarkDocument, OffsetFrameFallbackStrategy};
/// use warp_model::{FrameId, FrameSet, OffsetFrame, ValidationCheckState, validate_frames};
/// use nalgebra::Isometry3;
///
/// let doc = LandmarkDocument::new();
/// let frames = FrameSet::new().with_frame(OffsetFrame::new(FrameId::new(1), "tip", Isometry3::identity()));
///
/// let report = validate_frames(&doc, &frames, OffsetFrameFallbackStrategy::Ignore);
/// assert_eq!(report.frame_state(FrameId::new(1)), Some(ValidationCheckState::Warning));
/// // An empty document cannot be solved
/// assert!(report.has_errors());
/// ```
#[must_use]
pub fn validate_frames<G>(
    document: &LandmarkDocument,
    graph: &G,
    strategy: OffsetFrameFallbackStrategy,
) -> ValidationReport
where
    G: FrameGraph + ?Sized,
{
    assess(document, graph, strategy).0
}
