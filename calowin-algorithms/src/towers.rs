//! Tower grid construction.
//!
//! Cells are binned into a dense, row-major `[eta][phi]` grid of towers.
//! Besides the energy sums the grid keeps a compressed tower -> cell index
//! (offsets plus member list), so cluster building can collect the cells of
//! a window without rescanning the whole event.

use calowin_core::geometry::TowerGeometry;
use calowin_core::{CellBatch, TowerCoord};

/// Dense tower grid for one event.
///
/// Buffers are kept between events and only cleared, so a grid reused
/// through [`SlidingWindowState`](crate::SlidingWindowState) does not
/// reallocate once it has seen its largest event.
#[derive(Debug, Clone, Default)]
pub struct TowerGrid {
    n_eta: usize,
    n_phi: usize,
    energies: Vec<f64>,
    offsets: Vec<usize>,
    members: Vec<usize>,
    cell_tower: Vec<Option<usize>>,
    cursor: Vec<usize>,
    cells_dropped: usize,
}

impl TowerGrid {
    /// Creates a zeroed grid with the dimensions of `geometry`.
    #[must_use]
    pub fn new(geometry: &TowerGeometry) -> Self {
        let mut grid = Self::default();
        grid.resize(geometry);
        grid
    }

    fn resize(&mut self, geometry: &TowerGeometry) {
        let n_towers = geometry.n_towers();
        self.n_eta = geometry.n_eta();
        self.n_phi = geometry.n_phi();
        self.energies.clear();
        self.energies.resize(n_towers, 0.0);
        self.offsets.clear();
        self.offsets.resize(n_towers + 1, 0);
        self.members.clear();
        self.cell_tower.clear();
        self.cells_dropped = 0;
    }

    /// Clears the grid and accumulates the cells of a new event.
    ///
    /// Cells outside the eta coverage, or with a non-finite position or
    /// energy, are skipped and counted in [`cells_dropped`](Self::cells_dropped).
    pub fn build(&mut self, geometry: &TowerGeometry, cells: &CellBatch) {
        self.resize(geometry);
        self.cell_tower.reserve(cells.len());

        for i in 0..cells.len() {
            let energy = cells.energy[i];
            let tower = geometry
                .tower_of(cells.eta[i], cells.phi[i])
                .filter(|_| energy.is_finite())
                .map(|coord| geometry.flat_index(coord));

            match tower {
                Some(flat) => {
                    self.energies[flat] += energy;
                    self.offsets[flat + 1] += 1;
                }
                None => {
                    self.cells_dropped += 1;
                    log::trace!(
                        "cell {} at (eta={}, phi={}) outside tower grid",
                        cells.id[i],
                        cells.eta[i],
                        cells.phi[i]
                    );
                }
            }
            self.cell_tower.push(tower);
        }

        for flat in 0..self.energies.len() {
            self.offsets[flat + 1] += self.offsets[flat];
        }

        self.cursor.clear();
        self.cursor
            .extend_from_slice(&self.offsets[..self.energies.len()]);
        self.members.resize(cells.len() - self.cells_dropped, 0);
        for (cell, tower) in self.cell_tower.iter().enumerate() {
            if let Some(flat) = *tower {
                self.members[self.cursor[flat]] = cell;
                self.cursor[flat] += 1;
            }
        }
    }

    /// Number of towers in eta.
    #[must_use]
    pub fn n_eta(&self) -> usize {
        self.n_eta
    }

    /// Number of towers in phi.
    #[must_use]
    pub fn n_phi(&self) -> usize {
        self.n_phi
    }

    /// Row-major tower energies.
    #[must_use]
    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    /// Energy accumulated in one tower.
    #[must_use]
    pub fn energy(&self, coord: TowerCoord) -> f64 {
        self.energies[coord.eta * self.n_phi + coord.phi]
    }

    /// Indices (into the event's cell batch) of the cells in a tower, in
    /// input order.
    #[must_use]
    pub fn cells_in(&self, coord: TowerCoord) -> &[usize] {
        let flat = coord.eta * self.n_phi + coord.phi;
        &self.members[self.offsets[flat]..self.offsets[flat + 1]]
    }

    /// Tower each cell was assigned to, `None` for dropped cells.
    #[must_use]
    pub fn tower_of_cell(&self, cell: usize) -> Option<TowerCoord> {
        self.cell_tower
            .get(cell)
            .copied()
            .flatten()
            .map(|flat| TowerCoord::new(flat / self.n_phi, flat % self.n_phi))
    }

    /// Cells skipped during the last build.
    #[must_use]
    pub fn cells_dropped(&self) -> usize {
        self.cells_dropped
    }

    /// Towers holding at least one cell.
    #[must_use]
    pub fn towers_filled(&self) -> usize {
        self.offsets.windows(2).filter(|w| w[1] > w[0]).count()
    }

    /// Sum over all towers.
    #[must_use]
    pub fn total_energy(&self) -> f64 {
        self.energies.iter().sum()
    }
}
