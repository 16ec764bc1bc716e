//! Windowed scan for local maxima.
//!
//! The sliding-window sums are computed separably: first along phi (with
//! wraparound) into a scratch buffer, then along eta (truncated at the grid
//! edges). Each pass is parallel over eta rows.
#![allow(clippy::cast_possible_wrap, clippy::cast_precision_loss)]

use calowin_core::geometry::{window_offsets, wrap_phi, TowerGeometry};
use calowin_core::{PreCluster, SlidingWindowConfig, TowerCoord};
use rayon::prelude::*;

use crate::towers::TowerGrid;

/// Sums tower energies over an `n_eta x n_phi` window centred on every
/// tower. `scratch` and `sums` are resized as needed.
pub fn window_sums(
    geometry: &TowerGeometry,
    energies: &[f64],
    n_eta: usize,
    n_phi: usize,
    scratch: &mut Vec<f64>,
    sums: &mut Vec<f64>,
) {
    let n_phi_tower = geometry.n_phi();
    let n_towers = geometry.n_towers();
    debug_assert_eq!(energies.len(), n_towers);

    scratch.clear();
    scratch.resize(n_towers, 0.0);
    sums.clear();
    sums.resize(n_towers, 0.0);

    if n_towers == 0 {
        return;
    }

    scratch
        .par_chunks_mut(n_phi_tower)
        .zip(energies.par_chunks(n_phi_tower))
        .for_each(|(out, row)| {
            for (phi, value) in out.iter_mut().enumerate() {
                *value = window_offsets(n_phi)
                    .map(|offset| row[geometry.shift_phi(phi, offset)])
                    .sum();
            }
        });

    let phi_sums: &[f64] = scratch;
    sums.par_chunks_mut(n_phi_tower)
        .enumerate()
        .for_each(|(eta, out)| {
            for offset in window_offsets(n_eta) {
                if let Some(row) = geometry.shift_eta(eta, offset) {
                    let src = &phi_sums[row * n_phi_tower..(row + 1) * n_phi_tower];
                    for (value, add) in out.iter_mut().zip(src) {
                        *value += add;
                    }
                }
            }
        });
}

/// Returns true if the windowed energy at `coord` qualifies as a seed.
///
/// The threshold is inclusive and neighbours only disqualify the tower when
/// strictly larger, so a plateau yields one candidate per plateau tower. A
/// window without any energy never seeds.
#[must_use]
pub fn is_local_maximum(
    geometry: &TowerGeometry,
    sums: &[f64],
    coord: TowerCoord,
    config: &SlidingWindowConfig,
) -> bool {
    let n_phi = geometry.n_phi();
    let value = sums[coord.eta * n_phi + coord.phi];
    if value < config.energy_threshold || value <= 0.0 {
        return false;
    }

    if config.check_eta_local_max {
        for offset in [-1, 1] {
            if let Some(eta) = geometry.shift_eta(coord.eta, offset) {
                if sums[eta * n_phi + coord.phi] > value {
                    return false;
                }
            }
        }
    }

    if config.check_phi_local_max {
        for offset in [-1, 1] {
            let phi = geometry.shift_phi(coord.phi, offset);
            if sums[coord.eta * n_phi + phi] > value {
                return false;
            }
        }
    }

    true
}

/// Energy-weighted barycentre over the position window centred on `seed`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Barycentre {
    /// Mean eta.
    pub eta: f64,
    /// Mean phi, in `[-pi, pi)`.
    pub phi: f64,
    /// Total weight that went into the mean.
    pub energy: f64,
}

/// Computes the [`Barycentre`] of the position window centred on `seed`.
///
/// Only towers with energy at or above `energy_pos_threshold` contribute.
/// Phi is averaged over unwrapped tower centres and wrapped back into
/// `[-pi, pi)`. Without any contributing energy the seed centre is returned
/// with zero weight.
#[must_use]
pub fn barycentre(
    geometry: &TowerGeometry,
    grid: &TowerGrid,
    seed: TowerCoord,
    config: &SlidingWindowConfig,
) -> Barycentre {
    let mut weight = 0.0;
    let mut eta_sum = 0.0;
    let mut phi_sum = 0.0;

    for eta_offset in window_offsets(config.n_eta_position) {
        let Some(eta) = geometry.shift_eta(seed.eta, eta_offset) else {
            continue;
        };
        for phi_offset in window_offsets(config.n_phi_position) {
            let phi = geometry.shift_phi(seed.phi, phi_offset);
            let energy = grid.energy(TowerCoord::new(eta, phi));
            if energy < config.energy_pos_threshold {
                continue;
            }
            weight += energy;
            eta_sum += energy * geometry.eta_centre(eta as isize);
            phi_sum += energy * geometry.phi_centre(seed.phi as isize + phi_offset);
        }
    }

    if weight > 0.0 {
        Barycentre {
            eta: eta_sum / weight,
            phi: wrap_phi(phi_sum / weight),
            energy: weight,
        }
    } else {
        Barycentre {
            eta: geometry.eta_centre(seed.eta as isize),
            phi: wrap_phi(geometry.phi_centre(seed.phi as isize)),
            energy: 0.0,
        }
    }
}

/// Distance, in towers, from `seed` to the energy centroid of the
/// `n_eta x n_phi` window centred on it.
///
/// Only towers with positive energy count. Offsets are taken relative to the
/// seed before wrapping, so a window across the phi seam stays contiguous. An
/// empty window gives zero.
#[must_use]
pub fn centroid_offset(
    geometry: &TowerGeometry,
    grid: &TowerGrid,
    seed: TowerCoord,
    n_eta: usize,
    n_phi: usize,
) -> f64 {
    let mut weight = 0.0;
    let mut eta_sum = 0.0;
    let mut phi_sum = 0.0;

    for eta_offset in window_offsets(n_eta) {
        let Some(eta) = geometry.shift_eta(seed.eta, eta_offset) else {
            continue;
        };
        for phi_offset in window_offsets(n_phi) {
            let phi = geometry.shift_phi(seed.phi, phi_offset);
            let energy = grid.energy(TowerCoord::new(eta, phi));
            if energy <= 0.0 {
                continue;
            }
            weight += energy;
            eta_sum += energy * eta_offset as f64;
            phi_sum += energy * phi_offset as f64;
        }
    }

    if weight > 0.0 {
        (eta_sum / weight).hypot(phi_sum / weight)
    } else {
        0.0
    }
}

/// Scans every tower in row-major order (eta outer, phi inner) and appends a
/// precluster for each local maximum.
pub fn find_preclusters(
    geometry: &TowerGeometry,
    grid: &TowerGrid,
    sums: &[f64],
    config: &SlidingWindowConfig,
    preclusters: &mut Vec<PreCluster>,
) {
    for flat in 0..geometry.n_towers() {
        let seed = geometry.coord(flat);
        if !is_local_maximum(geometry, sums, seed, config) {
            continue;
        }
        let centre = barycentre(geometry, grid, seed, config);
        preclusters.push(PreCluster {
            trans_energy: sums[flat],
            eta: centre.eta,
            phi: centre.phi,
            position_energy: centre.energy,
            seed_energy: grid.energy(seed),
            centroid_offset: centroid_offset(
                geometry,
                grid,
                seed,
                config.n_eta_window,
                config.n_phi_window,
            ),
            seed,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use calowin_core::CellBatch;
    use std::f64::consts::PI;

    // 10 eta x 8 phi towers of 0.1 x pi/4.
    fn geometry() -> TowerGeometry {
        TowerGeometry::new(0.1, PI / 4.0, 0.5).unwrap()
    }

    fn grid_with(geo: &TowerGeometry, towers: &[(usize, usize, f64)]) -> TowerGrid {
        let mut cells = CellBatch::default();
        for (i, &(eta, phi, energy)) in towers.iter().enumerate() {
            cells.push(
                i as u64,
                geo.eta_centre(eta as isize),
                geo.phi_centre(phi as isize),
                energy,
            );
        }
        let mut grid = TowerGrid::new(geo);
        grid.build(geo, &cells);
        grid
    }

    fn sums_for(geo: &TowerGeometry, grid: &TowerGrid, n_eta: usize, n_phi: usize) -> Vec<f64> {
        let mut scratch = Vec::new();
        let mut sums = Vec::new();
        window_sums(geo, grid.energies(), n_eta, n_phi, &mut scratch, &mut sums);
        sums
    }

    fn at(geo: &TowerGeometry, sums: &[f64], eta: usize, phi: usize) -> f64 {
        sums[geo.flat_index(TowerCoord::new(eta, phi))]
    }

    #[test]
    fn test_window_sum_isolated_tower() {
        let geo = geometry();
        let grid = grid_with(&geo, &[(5, 4, 10.0)]);
        let sums = sums_for(&geo, &grid, 3, 3);

        for eta in 4..=6 {
            for phi in 3..=5 {
                assert_relative_eq!(at(&geo, &sums, eta, phi), 10.0);
            }
        }
        assert_relative_eq!(at(&geo, &sums, 3, 4), 0.0);
        assert_relative_eq!(at(&geo, &sums, 5, 6), 0.0);
        assert_relative_eq!(sums.iter().sum::<f64>(), 90.0);
    }

    #[test]
    fn test_window_sum_phi_wraps() {
        let geo = geometry();
        let grid = grid_with(&geo, &[(5, 7, 1.0), (5, 0, 2.0)]);
        let sums = sums_for(&geo, &grid, 1, 3);

        // Window at phi 0 reaches phi 7 on its left, and vice versa.
        assert_relative_eq!(at(&geo, &sums, 5, 0), 3.0);
        assert_relative_eq!(at(&geo, &sums, 5, 7), 3.0);
        assert_relative_eq!(at(&geo, &sums, 5, 1), 2.0);
        assert_relative_eq!(at(&geo, &sums, 5, 6), 1.0);
    }

    #[test]
    fn test_window_sum_full_phi_ring_counts_once() {
        let geo = geometry();
        let grid = grid_with(&geo, &[(2, 0, 1.0), (2, 3, 1.0), (2, 7, 1.0)]);
        let sums = sums_for(&geo, &grid, 1, 8);
        for phi in 0..8 {
            assert_relative_eq!(at(&geo, &sums, 2, phi), 3.0);
        }
    }

    #[test]
    fn test_window_sum_eta_truncated() {
        let geo = geometry();
        let grid = grid_with(&geo, &[(0, 2, 4.0), (1, 2, 1.0), (9, 2, 2.0)]);
        let sums = sums_for(&geo, &grid, 5, 1);

        // Window at eta 0 covers eta 0..=2 only; nothing wraps in from eta 9.
        assert_relative_eq!(at(&geo, &sums, 0, 2), 5.0);
        assert_relative_eq!(at(&geo, &sums, 9, 2), 2.0);
        assert_relative_eq!(at(&geo, &sums, 7, 2), 2.0);
        assert_relative_eq!(at(&geo, &sums, 6, 2), 0.0);
    }

    #[test]
    fn test_single_tower_is_single_maximum() {
        let geo = geometry();
        let grid = grid_with(&geo, &[(5, 4, 10.0)]);
        let config = SlidingWindowConfig::default()
            .with_window(1, 1)
            .with_position_window(1, 1)
            .with_energy_threshold(3.0);
        let sums = sums_for(&geo, &grid, 1, 1);

        let mut preclusters = Vec::new();
        find_preclusters(&geo, &grid, &sums, &config, &mut preclusters);

        assert_eq!(preclusters.len(), 1);
        let pre = preclusters[0];
        assert_eq!(pre.seed, TowerCoord::new(5, 4));
        assert_relative_eq!(pre.trans_energy, 10.0);
        assert_relative_eq!(pre.eta, geo.eta_centre(5), epsilon = 1e-12);
        assert_relative_eq!(pre.phi, geo.phi_centre(4), epsilon = 1e-12);
        assert_relative_eq!(pre.position_energy, 10.0);
        assert_relative_eq!(pre.seed_energy, 10.0);
    }

    #[test]
    fn test_plateau_yields_every_tower() {
        let geo = geometry();
        let grid = grid_with(&geo, &[(5, 4, 10.0)]);
        let config = SlidingWindowConfig::default()
            .with_window(3, 3)
            .with_position_window(1, 1);
        let sums = sums_for(&geo, &grid, 3, 3);

        let mut preclusters = Vec::new();
        find_preclusters(&geo, &grid, &sums, &config, &mut preclusters);
        assert_eq!(preclusters.len(), 9);
        // Row-major scan order.
        assert_eq!(preclusters[0].seed, TowerCoord::new(4, 3));
        assert_eq!(preclusters[8].seed, TowerCoord::new(6, 5));
    }

    #[test]
    fn test_centroid_offset_points_at_deposit() {
        let geo = geometry();
        let grid = grid_with(&geo, &[(5, 4, 10.0)]);

        assert_relative_eq!(centroid_offset(&geo, &grid, TowerCoord::new(5, 4), 3, 3), 0.0);
        assert_relative_eq!(centroid_offset(&geo, &grid, TowerCoord::new(4, 4), 3, 3), 1.0);
        assert_relative_eq!(
            centroid_offset(&geo, &grid, TowerCoord::new(6, 3), 3, 3),
            2.0_f64.sqrt()
        );
        // Even window: the deposit is two towers below the seed.
        assert_relative_eq!(centroid_offset(&geo, &grid, TowerCoord::new(7, 4), 4, 1), 2.0);
        // Nothing in the window.
        assert_relative_eq!(centroid_offset(&geo, &grid, TowerCoord::new(1, 1), 3, 3), 0.0);
    }

    #[test]
    fn test_centroid_offset_across_phi_seam() {
        let geo = geometry();
        let grid = grid_with(&geo, &[(5, 7, 1.0), (5, 0, 3.0)]);

        // From tower 0 the deposit at 7 sits one step below: (3*0 - 1) / 4.
        assert_relative_eq!(centroid_offset(&geo, &grid, TowerCoord::new(5, 0), 1, 3), 0.25);
        // From tower 7 the deposit at 0 sits one step above: (1*0 + 3) / 4.
        assert_relative_eq!(centroid_offset(&geo, &grid, TowerCoord::new(5, 7), 1, 3), 0.75);
    }

    #[test]
    fn test_plateau_centroid_offsets() {
        let geo = geometry();
        let grid = grid_with(&geo, &[(5, 4, 10.0)]);
        let config = SlidingWindowConfig::default()
            .with_window(3, 3)
            .with_position_window(1, 1);
        let sums = sums_for(&geo, &grid, 3, 3);

        let mut preclusters = Vec::new();
        find_preclusters(&geo, &grid, &sums, &config, &mut preclusters);

        // Only the deposit tower sees the energy at its own centre.
        let central: Vec<_> = preclusters
            .iter()
            .filter(|p| p.centroid_offset.abs() < f64::EPSILON)
            .map(|p| p.seed)
            .collect();
        assert_eq!(central, vec![TowerCoord::new(5, 4)]);
    }

    #[test]
    fn test_threshold_inclusive() {
        let geo = geometry();
        let grid = grid_with(&geo, &[(5, 4, 1.0), (5, 5, 2.0)]);
        let sums = sums_for(&geo, &grid, 1, 3);
        let seed = TowerCoord::new(5, 4);
        assert_relative_eq!(at(&geo, &sums, 5, 4), 3.0);

        let config = SlidingWindowConfig::default()
            .with_window(1, 3)
            .with_energy_threshold(3.0);
        assert!(is_local_maximum(&geo, &sums, seed, &config));

        let config = config.with_energy_threshold(4.0);
        assert!(!is_local_maximum(&geo, &sums, seed, &config));
    }

    #[test]
    fn test_local_max_checks_toggle() {
        let geo = geometry();
        let grid = grid_with(&geo, &[(5, 4, 5.0), (6, 4, 8.0), (5, 5, 9.0)]);
        let sums = sums_for(&geo, &grid, 1, 1);
        let seed = TowerCoord::new(5, 4);
        let base = SlidingWindowConfig::default()
            .with_window(1, 1)
            .with_energy_threshold(1.0);

        assert!(!is_local_maximum(&geo, &sums, seed, &base));
        let eta_only = base.clone().with_local_max_checks(true, false);
        assert!(!is_local_maximum(&geo, &sums, seed, &eta_only));
        let phi_only = base.clone().with_local_max_checks(false, true);
        assert!(!is_local_maximum(&geo, &sums, seed, &phi_only));
        let none = base.with_local_max_checks(false, false);
        assert!(is_local_maximum(&geo, &sums, seed, &none));
    }

    #[test]
    fn test_eta_edge_tower_can_be_maximum() {
        let geo = geometry();
        let grid = grid_with(&geo, &[(0, 0, 6.0)]);
        let sums = sums_for(&geo, &grid, 1, 1);
        let config = SlidingWindowConfig::default()
            .with_window(1, 1)
            .with_energy_threshold(1.0);
        assert!(is_local_maximum(&geo, &sums, TowerCoord::new(0, 0), &config));
    }

    #[test]
    fn test_empty_grid_has_no_maxima_even_without_threshold() {
        let geo = geometry();
        let grid = TowerGrid::new(&geo);
        let sums = sums_for(&geo, &grid, 3, 3);
        let config = SlidingWindowConfig::default().with_energy_threshold(0.0);
        let mut preclusters = Vec::new();
        find_preclusters(&geo, &grid, &sums, &config, &mut preclusters);
        assert!(preclusters.is_empty());
    }

    #[test]
    fn test_barycentre_weighted() {
        let geo = geometry();
        let grid = grid_with(&geo, &[(5, 4, 3.0), (6, 4, 1.0)]);
        let config = SlidingWindowConfig::default().with_position_window(3, 3);
        let centre = barycentre(&geo, &grid, TowerCoord::new(5, 4), &config);
        let expected = (3.0 * geo.eta_centre(5) + geo.eta_centre(6)) / 4.0;
        assert_relative_eq!(centre.eta, expected, epsilon = 1e-12);
        assert_relative_eq!(centre.phi, geo.phi_centre(4), epsilon = 1e-12);
        assert_relative_eq!(centre.energy, 4.0);
    }

    #[test]
    fn test_barycentre_ignores_noise_towers() {
        let geo = geometry();
        let grid = grid_with(&geo, &[(5, 4, 3.0), (6, 4, 0.05)]);
        let config = SlidingWindowConfig::default()
            .with_position_window(3, 3)
            .with_energy_pos_threshold(0.1);
        let centre = barycentre(&geo, &grid, TowerCoord::new(5, 4), &config);
        assert_relative_eq!(centre.eta, geo.eta_centre(5), epsilon = 1e-12);
        assert_relative_eq!(centre.energy, 3.0);
    }

    #[test]
    fn test_barycentre_falls_back_to_seed_centre() {
        let geo = geometry();
        let grid = grid_with(&geo, &[(5, 4, 0.01)]);
        let config = SlidingWindowConfig::default().with_energy_pos_threshold(1.0);
        let centre = barycentre(&geo, &grid, TowerCoord::new(5, 4), &config);
        assert_relative_eq!(centre.eta, geo.eta_centre(5), epsilon = 1e-12);
        assert_relative_eq!(centre.phi, geo.phi_centre(4), epsilon = 1e-12);
        assert_relative_eq!(centre.energy, 0.0);
    }

    #[test]
    fn test_barycentre_across_phi_seam() {
        let geo = geometry();
        let grid = grid_with(&geo, &[(5, 7, 1.0), (5, 0, 3.0)]);
        let config = SlidingWindowConfig::default().with_position_window(1, 3);
        let centre = barycentre(&geo, &grid, TowerCoord::new(5, 0), &config);
        // Tower 7 sits at -pi - pi/8 seen from tower 0, not at 7pi/8.
        assert_relative_eq!(centre.phi, -PI + PI / 16.0, epsilon = 1e-12);

        let centre = barycentre(&geo, &grid, TowerCoord::new(5, 7), &config);
        assert_relative_eq!(centre.phi, -PI + PI / 16.0, epsilon = 1e-12);
    }
}
