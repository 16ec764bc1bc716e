//! Cell traits and types for calorimeter data.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Opaque cell identity token.
///
/// The clustering never interprets the value; it is only carried through so
/// clusters can refer back to the cells they were built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct CellId(pub u64);

impl CellId {
    /// Creates a new cell identifier.
    #[inline]
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier value.
    #[inline]
    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for CellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Core data structure for a single calorimeter cell.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellData {
    /// Cell identity token.
    pub id: CellId,
    /// Pseudorapidity of the cell centre.
    pub eta: f64,
    /// Azimuthal angle of the cell centre (radians).
    pub phi: f64,
    /// Transverse energy deposited in the cell.
    pub energy: f64,
}

impl CellData {
    /// Creates a new cell.
    #[inline]
    #[must_use]
    pub fn new(id: u64, eta: f64, phi: f64, energy: f64) -> Self {
        Self {
            id: CellId::new(id),
            eta,
            phi,
            energy,
        }
    }
}

/// Trait for cell data handed to the clustering.
///
/// Anything that can report an identity, an angular position and a
/// transverse energy can be clustered.
pub trait Cell: Send + Sync {
    /// Returns the cell identity token.
    fn id(&self) -> CellId;

    /// Returns the pseudorapidity.
    fn eta(&self) -> f64;

    /// Returns the azimuthal angle.
    fn phi(&self) -> f64;

    /// Returns the transverse energy.
    fn energy(&self) -> f64;
}

impl Cell for CellData {
    #[inline]
    fn id(&self) -> CellId {
        self.id
    }

    #[inline]
    fn eta(&self) -> f64 {
        self.eta
    }

    #[inline]
    fn phi(&self) -> f64 {
        self.phi
    }

    #[inline]
    fn energy(&self) -> f64 {
        self.energy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cell_data() {
        let cell = CellData::new(42, 0.25, -1.5, 3.5);
        assert_eq!(cell.id(), CellId(42));
        assert_eq!(cell.id().as_u64(), 42);
        assert_relative_eq!(cell.eta(), 0.25);
        assert_relative_eq!(cell.phi(), -1.5);
        assert_relative_eq!(cell.energy(), 3.5);
    }

    #[test]
    fn test_cell_id_ordering() {
        assert!(CellId(3) < CellId(7));
        assert_eq!(CellId::new(9).to_string(), "9");
    }
}
