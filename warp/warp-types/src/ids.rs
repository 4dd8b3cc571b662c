//! Identifier and discriminant types.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Stable identifier of an element in a landmark document.
///
/// Identifiers are handed out by the document from a counter that is never
/// rewound, so an id is never reused within the lifetime of a document,
/// even after the element it named was deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ElementId(pub u64);

impl ElementId {
    /// Create a new element ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for ElementId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Element({})", self.0)
    }
}

/// Which input of a correspondence an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InputSide {
    /// The shape being warped.
    Source,
    /// The shape the source is warped towards.
    Destination,
}

impl InputSide {
    /// Both sides, source first.
    pub const ALL: [Self; 2] = [Self::Source, Self::Destination];

    /// Returns the opposite side.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Source => Self::Destination,
            Self::Destination => Self::Source,
        }
    }

    /// Human-readable label, used in validation messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Destination => "destination",
        }
    }
}

impl std::fmt::Display for InputSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Kind of a document element.
///
/// The discriminants are opaque tags. They are not a stable integer encoding
/// and must not be persisted as numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ElementKind {
    /// A correspondence that participates in the spline fit.
    Landmark,
    /// A reference point carried for display only. Never passed to the solver.
    NonParticipatingLandmark,
}

impl ElementKind {
    /// Returns whether elements of this kind are used by the solver.
    #[must_use]
    pub const fn participates(self) -> bool {
        matches!(self, Self::Landmark)
    }
}
