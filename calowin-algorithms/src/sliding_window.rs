//! Sliding-window clustering.
//!
//! Per event:
//! 1. Build the tower grid from the cells
//! 2. Sum energy over the sliding window around every tower
//! 3. Keep local maxima above threshold as preclusters, positioned at the
//!    barycentre of the (smaller) position window
//! 4. Drop preclusters overlapping a more energetic one
//! 5. Build clusters and reattach the cells of each sliding window
//!
//! Performs well for electron and photon showers; topological clustering is
//! the better fit for jets.

use calowin_core::clustering::{CellClustering, ClusteringState, ClusteringStatistics};
use calowin_core::error::{ClusteringError, ConfigError};
use calowin_core::geometry::TowerGeometry;
use calowin_core::{
    Cell, CellBatch, Cluster, DetectorGeometry, PreCluster, SlidingWindowConfig, TowerCoord,
};

use crate::builder::build_clusters;
use crate::duplicates::remove_duplicates;
use crate::scanner::{find_preclusters, window_sums};
use crate::towers::TowerGrid;

/// Sliding-window clustering state.
///
/// Holds the per-event buffers. A default state is unbound and adopts the
/// grid of the first algorithm that uses it.
#[derive(Debug, Default)]
pub struct SlidingWindowState {
    grid: TowerGrid,
    phi_sums: Vec<f64>,
    window_sums: Vec<f64>,
    preclusters: Vec<PreCluster>,
    members: Vec<usize>,
    bound: Option<(usize, usize)>,
    statistics: ClusteringStatistics,
}

impl SlidingWindowState {
    /// Tower grid of the last event.
    #[must_use]
    pub fn grid(&self) -> &TowerGrid {
        &self.grid
    }

    /// Sliding-window energy around `coord` in the last event.
    ///
    /// `None` before the first event or for a tower outside the grid.
    #[must_use]
    pub fn window_energy(&self, coord: TowerCoord) -> Option<f64> {
        let n_phi = self.grid.n_phi();
        if coord.phi >= n_phi {
            return None;
        }
        self.window_sums.get(coord.eta * n_phi + coord.phi).copied()
    }

    /// Preclusters of the last event that survived overlap removal.
    #[must_use]
    pub fn preclusters(&self) -> &[PreCluster] {
        &self.preclusters
    }
}

impl ClusteringState for SlidingWindowState {
    fn reset(&mut self) {
        self.phi_sums.clear();
        self.window_sums.clear();
        self.preclusters.clear();
        self.members.clear();
        self.statistics = ClusteringStatistics::default();
    }
}

/// Sliding-window clustering algorithm.
#[derive(Debug, Clone)]
pub struct SlidingWindowClustering {
    config: SlidingWindowConfig,
    detector: DetectorGeometry,
    geometry: TowerGeometry,
}

impl SlidingWindowClustering {
    /// Validates the configuration against the detector and derives the
    /// tower grid. Fails before any event is seen if the two do not fit.
    pub fn new(
        config: SlidingWindowConfig,
        detector: DetectorGeometry,
    ) -> Result<Self, ConfigError> {
        let geometry = config.validate(&detector)?;
        log::info!(
            "sliding window: {}x{} towers of {}x{}, window {}x{}, position {}x{}, duplicates {}x{}",
            geometry.n_eta(),
            geometry.n_phi(),
            geometry.delta_eta(),
            geometry.delta_phi(),
            config.n_eta_window,
            config.n_phi_window,
            config.n_eta_position,
            config.n_phi_position,
            config.n_eta_duplicates,
            config.n_phi_duplicates
        );
        Ok(Self {
            config,
            detector,
            geometry,
        })
    }

    /// Clustering parameters.
    #[must_use]
    pub fn config(&self) -> &SlidingWindowConfig {
        &self.config
    }

    /// Detector description.
    #[must_use]
    pub fn detector(&self) -> &DetectorGeometry {
        &self.detector
    }

    /// Tower grid geometry.
    #[must_use]
    pub fn geometry(&self) -> &TowerGeometry {
        &self.geometry
    }

    /// Clusters any slice of [`Cell`]s.
    pub fn cluster_cells<C: Cell>(
        &self,
        cells: &[C],
        state: &mut SlidingWindowState,
    ) -> Result<Vec<Cluster>, ClusteringError> {
        self.cluster(&CellBatch::from(cells), state)
    }

    fn bind(&self, state: &mut SlidingWindowState) -> Result<(), ClusteringError> {
        let dims = (self.geometry.n_eta(), self.geometry.n_phi());
        match state.bound {
            None => {
                state.bound = Some(dims);
                Ok(())
            }
            Some(bound) if bound == dims => Ok(()),
            Some((state_eta, state_phi)) => Err(ClusteringError::StateMismatch {
                state_eta,
                state_phi,
                eta: dims.0,
                phi: dims.1,
            }),
        }
    }
}

impl CellClustering for SlidingWindowClustering {
    type State = SlidingWindowState;

    fn name(&self) -> &'static str {
        "SlidingWindow"
    }

    fn create_state(&self) -> Self::State {
        SlidingWindowState {
            grid: TowerGrid::new(&self.geometry),
            phi_sums: Vec::with_capacity(self.geometry.n_towers()),
            window_sums: Vec::with_capacity(self.geometry.n_towers()),
            bound: Some((self.geometry.n_eta(), self.geometry.n_phi())),
            ..SlidingWindowState::default()
        }
    }

    fn cluster(
        &self,
        cells: &CellBatch,
        state: &mut Self::State,
    ) -> Result<Vec<Cluster>, ClusteringError> {
        self.bind(state)?;
        state.reset();

        state.grid.build(&self.geometry, cells);
        window_sums(
            &self.geometry,
            state.grid.energies(),
            self.config.n_eta_window,
            self.config.n_phi_window,
            &mut state.phi_sums,
            &mut state.window_sums,
        );
        find_preclusters(
            &self.geometry,
            &state.grid,
            &state.window_sums,
            &self.config,
            &mut state.preclusters,
        );
        let preclusters_found = state.preclusters.len();
        let duplicates_removed = remove_duplicates(
            &self.geometry,
            &mut state.preclusters,
            self.config.n_eta_duplicates,
            self.config.n_phi_duplicates,
        );
        let clusters = build_clusters(
            &self.geometry,
            &state.grid,
            cells,
            &state.preclusters,
            self.config.n_eta_window,
            self.config.n_phi_window,
            self.detector.inner_radius,
            &mut state.members,
        );

        state.statistics = ClusteringStatistics {
            events_processed: 1,
            cells_processed: cells.len(),
            cells_dropped: state.grid.cells_dropped(),
            towers_filled: state.grid.towers_filled(),
            preclusters_found,
            duplicates_removed,
            clusters_found: clusters.len(),
        };

        if state.statistics.cells_dropped > 0 {
            log::debug!(
                "{} of {} cells outside the tower grid",
                state.statistics.cells_dropped,
                cells.len()
            );
        }
        log::debug!(
            "{} preclusters, {} duplicates removed, {} clusters",
            preclusters_found,
            duplicates_removed,
            clusters.len()
        );

        Ok(clusters)
    }

    fn statistics(&self, state: &Self::State) -> ClusteringStatistics {
        state.statistics
    }
}
