//! Overlap removal between preclusters.

use std::cmp::Ordering;

use calowin_core::geometry::TowerGeometry;
use calowin_core::PreCluster;

/// Returns true if two seeds lie within the `n_eta x n_phi` overlap window.
///
/// Distances are in towers; phi is measured around the circle. A window size
/// of zero never matches.
#[inline]
#[must_use]
pub fn are_duplicates(
    geometry: &TowerGeometry,
    a: &PreCluster,
    b: &PreCluster,
    n_eta: usize,
    n_phi: usize,
) -> bool {
    a.seed.eta.abs_diff(b.seed.eta) < n_eta && geometry.phi_distance(a.seed.phi, b.seed.phi) < n_phi
}

/// Removes every precluster that overlaps a more energetic one.
///
/// Suppression is pairwise over the input list: of two overlapping
/// preclusters the one with lower window energy goes. Equal window energies
/// are settled by [`PreCluster::rank`] (distance to the window centroid, then
/// position-window energy, then seed tower energy) and finally by list order,
/// the later one going. A suppressed precluster still suppresses its own
/// weaker neighbours. Survivors keep their relative order.
///
/// Returns the number of preclusters removed.
pub fn remove_duplicates(
    geometry: &TowerGeometry,
    preclusters: &mut Vec<PreCluster>,
    n_eta: usize,
    n_phi: usize,
) -> usize {
    if n_eta == 0 || n_phi == 0 || preclusters.len() < 2 {
        return 0;
    }

    let mut removed = vec![false; preclusters.len()];
    for (i, first) in preclusters.iter().enumerate() {
        for (j, second) in preclusters.iter().enumerate().skip(i + 1) {
            if !are_duplicates(geometry, first, second, n_eta, n_phi) {
                continue;
            }
            if second.rank(first) == Ordering::Greater {
                removed[i] = true;
            } else {
                removed[j] = true;
            }
        }
    }

    let before = preclusters.len();
    let mut flags = removed.into_iter();
    preclusters.retain(|_| !flags.next().unwrap_or(false));
    before - preclusters.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use calowin_core::TowerCoord;
    use std::f64::consts::PI;

    fn geometry() -> TowerGeometry {
        TowerGeometry::new(0.1, PI / 4.0, 0.5).unwrap()
    }

    fn pre(eta: usize, phi: usize, energy: f64) -> PreCluster {
        PreCluster {
            trans_energy: energy,
            eta: 0.0,
            phi: 0.0,
            position_energy: 0.0,
            seed_energy: 0.0,
            centroid_offset: 0.0,
            seed: TowerCoord::new(eta, phi),
        }
    }

    #[test]
    fn test_neighbour_in_eta_removed() {
        let geo = geometry();
        let mut list = vec![pre(4, 2, 7.0), pre(5, 2, 10.0)];
        let removed = remove_duplicates(&geo, &mut list, 2, 2);
        assert_eq!(removed, 1);
        assert_eq!(list.len(), 1);
        assert!((list[0].trans_energy - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_distant_preclusters_kept() {
        let geo = geometry();
        let mut list = vec![pre(1, 2, 7.0), pre(5, 2, 10.0), pre(5, 6, 4.0)];
        assert_eq!(remove_duplicates(&geo, &mut list, 2, 2), 0);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_window_edge_is_exclusive() {
        let geo = geometry();
        let mut list = vec![pre(3, 2, 7.0), pre(5, 2, 10.0)];
        assert_eq!(remove_duplicates(&geo, &mut list, 2, 2), 0);
        assert_eq!(remove_duplicates(&geo, &mut list, 3, 2), 1);
    }

    #[test]
    fn test_phi_distance_wraps() {
        let geo = geometry();
        let mut list = vec![pre(5, 0, 7.0), pre(5, 7, 10.0)];
        assert_eq!(remove_duplicates(&geo, &mut list, 2, 2), 1);
        assert_eq!(list[0].seed, TowerCoord::new(5, 7));
    }

    #[test]
    fn test_tie_keeps_first_in_scan_order() {
        let geo = geometry();
        let mut list = vec![pre(5, 3, 10.0), pre(5, 4, 10.0), pre(6, 4, 10.0)];
        assert_eq!(remove_duplicates(&geo, &mut list, 2, 2), 2);
        assert_eq!(list, vec![pre(5, 3, 10.0)]);
    }

    #[test]
    fn test_tie_prefers_energy_near_seed() {
        let geo = geometry();
        let corner = pre(4, 3, 10.0);
        let ring = PreCluster {
            position_energy: 10.0,
            ..pre(4, 4, 10.0)
        };
        let centre = PreCluster {
            position_energy: 10.0,
            seed_energy: 10.0,
            ..pre(5, 4, 10.0)
        };
        let mut list = vec![corner, ring, centre];
        assert_eq!(remove_duplicates(&geo, &mut list, 2, 2), 2);
        assert_eq!(list, vec![centre]);
    }

    #[test]
    fn test_tie_prefers_seed_on_window_centroid() {
        let geo = geometry();
        // The corner sees more energy in its position window but sits off the
        // centroid of its sliding window.
        let corner = PreCluster {
            position_energy: 10.0,
            seed_energy: 10.0,
            centroid_offset: 2.0_f64.sqrt(),
            ..pre(4, 3, 10.0)
        };
        let centre = PreCluster {
            position_energy: 4.0,
            ..pre(5, 4, 10.0)
        };
        let mut list = vec![corner, centre];
        assert_eq!(remove_duplicates(&geo, &mut list, 2, 2), 1);
        assert_eq!(list, vec![centre]);
    }

    #[test]
    fn test_suppression_is_pairwise() {
        let geo = geometry();
        // 5 overlaps 7 but not 10; 7 overlaps 10. Both weaker ones go.
        let mut list = vec![pre(3, 2, 5.0), pre(4, 2, 7.0), pre(5, 2, 10.0)];
        assert_eq!(remove_duplicates(&geo, &mut list, 2, 1), 2);
        assert_eq!(list, vec![pre(5, 2, 10.0)]);
    }

    #[test]
    fn test_survivors_keep_order() {
        let geo = geometry();
        let mut list = vec![
            pre(0, 0, 3.0),
            pre(0, 1, 2.0),
            pre(5, 4, 6.0),
            pre(9, 6, 9.0),
            pre(9, 5, 1.0),
        ];
        assert_eq!(remove_duplicates(&geo, &mut list, 2, 2), 2);
        let seeds: Vec<TowerCoord> = list.iter().map(|p| p.seed).collect();
        assert_eq!(
            seeds,
            vec![
                TowerCoord::new(0, 0),
                TowerCoord::new(5, 4),
                TowerCoord::new(9, 6)
            ]
        );
    }

    #[test]
    fn test_zero_window_disables_removal() {
        let geo = geometry();
        let mut list = vec![pre(5, 2, 7.0), pre(5, 2, 10.0)];
        assert_eq!(remove_duplicates(&geo, &mut list, 0, 2), 0);
        assert_eq!(remove_duplicates(&geo, &mut list, 2, 0), 0);
        assert_eq!(list.len(), 2);
    }
}
