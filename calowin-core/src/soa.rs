//! Structure of Arrays (`SoA`) storage for one event's cells.
//!
//! `CellBatch` keeps cell fields in parallel vectors. The tower builder only
//! touches the angular columns and energies, so the columnar layout keeps the
//! hot loop cache friendly.

use crate::cell::{Cell, CellData, CellId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A batch of cells stored in Structure of Arrays (`SoA`) format.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellBatch {
    /// Columnar storage for identity tokens.
    pub id: Vec<CellId>,
    /// Columnar storage for pseudorapidity.
    pub eta: Vec<f64>,
    /// Columnar storage for azimuthal angle.
    pub phi: Vec<f64>,
    /// Columnar storage for transverse energy.
    pub energy: Vec<f64>,
}

impl CellBatch {
    /// Creates a new empty batch with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            id: Vec::with_capacity(capacity),
            eta: Vec::with_capacity(capacity),
            phi: Vec::with_capacity(capacity),
            energy: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of cells in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.id.len()
    }

    /// Returns true if the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }

    /// Clears all vectors in the batch.
    pub fn clear(&mut self) {
        self.id.clear();
        self.eta.clear();
        self.phi.clear();
        self.energy.clear();
    }

    /// Appends all cells from another batch to this one.
    pub fn append(&mut self, other: &CellBatch) {
        self.id.extend_from_slice(&other.id);
        self.eta.extend_from_slice(&other.eta);
        self.phi.extend_from_slice(&other.phi);
        self.energy.extend_from_slice(&other.energy);
    }

    /// Pushes a single cell into the batch.
    pub fn push(&mut self, id: u64, eta: f64, phi: f64, energy: f64) {
        self.id.push(CellId::new(id));
        self.eta.push(eta);
        self.phi.push(phi);
        self.energy.push(energy);
    }

    /// Pushes any [`Cell`] into the batch.
    pub fn push_cell<C: Cell>(&mut self, cell: &C) {
        self.id.push(cell.id());
        self.eta.push(cell.eta());
        self.phi.push(cell.phi());
        self.energy.push(cell.energy());
    }

    /// Returns the cell at `index` as an owned value.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<CellData> {
        Some(CellData {
            id: *self.id.get(index)?,
            eta: self.eta[index],
            phi: self.phi[index],
            energy: self.energy[index],
        })
    }

    /// Iterates over the cells in input order.
    pub fn iter(&self) -> impl Iterator<Item = CellData> + '_ {
        (0..self.len()).map(move |i| CellData {
            id: self.id[i],
            eta: self.eta[i],
            phi: self.phi[i],
            energy: self.energy[i],
        })
    }

    /// Sum of all cell energies.
    #[must_use]
    pub fn total_energy(&self) -> f64 {
        self.energy.iter().sum()
    }
}

impl<C: Cell> FromIterator<C> for CellBatch {
    fn from_iter<I: IntoIterator<Item = C>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut batch = CellBatch::with_capacity(iter.size_hint().0);
        for cell in iter {
            batch.push_cell(&cell);
        }
        batch
    }
}

impl<C: Cell> From<&[C]> for CellBatch {
    fn from(cells: &[C]) -> Self {
        let mut batch = CellBatch::with_capacity(cells.len());
        for cell in cells {
            batch.push_cell(cell);
        }
        batch
    }
}
