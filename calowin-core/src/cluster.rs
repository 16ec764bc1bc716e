//! Precluster and cluster types.

use crate::cell::CellId;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Integer coordinate of a tower in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TowerCoord {
    /// Index along eta, in `[0, n_eta_tower)`.
    pub eta: usize,
    /// Index along phi, in `[0, n_phi_tower)`.
    pub phi: usize,
}

impl TowerCoord {
    /// Creates a new tower coordinate.
    #[inline]
    #[must_use]
    pub fn new(eta: usize, phi: usize) -> Self {
        Self { eta, phi }
    }
}

/// Provisional cluster seed found by the windowed scan.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PreCluster {
    /// Transverse energy summed over the sliding window.
    pub trans_energy: f64,
    /// Barycentre in eta.
    pub eta: f64,
    /// Barycentre in phi, in `[-pi, pi)`.
    pub phi: f64,
    /// Energy that entered the barycentre (position window, above threshold).
    pub position_energy: f64,
    /// Energy of the seed tower itself.
    pub seed_energy: f64,
    /// Distance, in towers, from the seed to the energy centroid of its
    /// sliding window.
    pub centroid_offset: f64,
    /// Tower the windows were centred on.
    pub seed: TowerCoord,
}

impl PreCluster {
    /// Ranks two preclusters for overlap removal: window energy first, then
    /// the smaller [`centroid_offset`](Self::centroid_offset), then
    /// position-window energy, then seed tower energy.
    ///
    /// A plateau of equal window sums shares one window centroid, so from any
    /// plateau tower a step towards the centroid ranks strictly higher and
    /// only the tower nearest the energy is left. `Equal` is left to the
    /// caller.
    #[must_use]
    pub fn rank(&self, other: &PreCluster) -> std::cmp::Ordering {
        self.trans_energy
            .total_cmp(&other.trans_energy)
            .then(other.centroid_offset.total_cmp(&self.centroid_offset))
            .then(self.position_energy.total_cmp(&other.position_energy))
            .then(self.seed_energy.total_cmp(&other.seed_energy))
    }
}

/// Cartesian position in detector coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position3D {
    /// Places an angular position on a cylinder of radius `radius`.
    ///
    /// The transverse distance is the radius itself, so `z = r * sinh(eta)`.
    #[must_use]
    pub fn on_cylinder(eta: f64, phi: f64, radius: f64) -> Self {
        Self {
            x: radius * phi.cos(),
            y: radius * phi.sin(),
            z: radius * eta.sinh(),
        }
    }

    /// Distance from the beam axis.
    #[must_use]
    pub fn transverse(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Pseudorapidity of the position as seen from the origin.
    #[must_use]
    pub fn eta(&self) -> f64 {
        (self.z / self.transverse()).asinh()
    }

    /// Azimuthal angle of the position.
    #[must_use]
    pub fn phi(&self) -> f64 {
        self.y.atan2(self.x)
    }
}

/// A reconstructed calorimeter cluster.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cluster {
    /// Energy from the sliding-window sum of the precluster.
    pub energy: f64,
    /// Barycentre in eta.
    pub eta: f64,
    /// Barycentre in phi.
    pub phi: f64,
    /// Position on the inner surface of the detector.
    pub position: Position3D,
    /// Member cells, in input order.
    pub cells: Vec<CellId>,
}

impl Cluster {
    /// Returns the number of member cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if no cell was attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns an iterator over the member cells.
    pub fn iter(&self) -> impl Iterator<Item = &CellId> {
        self.cells.iter()
    }

    /// Returns true if the cell is a member of this cluster.
    #[must_use]
    pub fn contains(&self, id: CellId) -> bool {
        self.cells.contains(&id)
    }
}
