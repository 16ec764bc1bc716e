//! Cluster building from surviving preclusters.

use calowin_core::geometry::{window_offsets, TowerGeometry};
use calowin_core::{CellBatch, Cluster, Position3D, PreCluster, TowerCoord};

use crate::towers::TowerGrid;

/// Collects the indices of all cells whose tower lies inside the
/// `n_eta x n_phi` window centred on `seed`, sorted into input order.
pub fn collect_window_cells(
    geometry: &TowerGeometry,
    grid: &TowerGrid,
    seed: TowerCoord,
    n_eta: usize,
    n_phi: usize,
    out: &mut Vec<usize>,
) {
    out.clear();
    for eta_offset in window_offsets(n_eta) {
        let Some(eta) = geometry.shift_eta(seed.eta, eta_offset) else {
            continue;
        };
        for phi_offset in window_offsets(n_phi) {
            let phi = geometry.shift_phi(seed.phi, phi_offset);
            out.extend_from_slice(grid.cells_in(TowerCoord::new(eta, phi)));
        }
    }
    // Each cell sits in one tower and the window never visits a tower twice,
    // so indices are already unique.
    out.sort_unstable();
}

/// Turns one precluster into a cluster on a cylinder of `inner_radius`,
/// attaching the cells of the sliding window around its seed.
#[must_use]
pub fn build_cluster(
    precluster: &PreCluster,
    cells: &CellBatch,
    members: &[usize],
    inner_radius: f64,
) -> Cluster {
    Cluster {
        energy: precluster.trans_energy,
        eta: precluster.eta,
        phi: precluster.phi,
        position: Position3D::on_cylinder(precluster.eta, precluster.phi, inner_radius),
        cells: members.iter().map(|&i| cells.id[i]).collect(),
    }
}

/// Builds one cluster per precluster, in precluster order.
///
/// A cell inside the windows of several preclusters is attached to each of
/// them; energy is not shared between overlapping clusters.
#[must_use]
#[allow(clippy::too_many_arguments)]
pub fn build_clusters(
    geometry: &TowerGeometry,
    grid: &TowerGrid,
    cells: &CellBatch,
    preclusters: &[PreCluster],
    n_eta_window: usize,
    n_phi_window: usize,
    inner_radius: f64,
    scratch: &mut Vec<usize>,
) -> Vec<Cluster> {
    preclusters
        .iter()
        .map(|precluster| {
            collect_window_cells(
                geometry,
                grid,
                precluster.seed,
                n_eta_window,
                n_phi_window,
                scratch,
            );
            build_cluster(precluster, cells, scratch, inner_radius)
        })
        .collect()
}
