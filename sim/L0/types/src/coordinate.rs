//! Generalized coordinate identifiers.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Index of a generalized coordinate in the host's state vector.
///
/// Coordinates are dense: a state with `n` coordinates accepts ids
/// `0..n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CoordinateId(pub usize);

impl CoordinateId {
    /// Create a new coordinate ID.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the index into the state vectors.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for CoordinateId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl std::fmt::Display for CoordinateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Coordinate({})", self.0)
    }
}
