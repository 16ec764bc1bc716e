//! Clustering traits and statistics.

use crate::cluster::Cluster;
use crate::error::ClusteringError;
use crate::soa::CellBatch;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Counters describing one or more clustered events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusteringStatistics {
    /// Number of events clustered.
    pub events_processed: usize,
    /// Cells offered to the tower builder.
    pub cells_processed: usize,
    /// Cells outside the tower grid (coverage mismatch).
    pub cells_dropped: usize,
    /// Towers that received energy.
    pub towers_filled: usize,
    /// Local maxima above threshold.
    pub preclusters_found: usize,
    /// Preclusters suppressed by a nearby, more energetic one.
    pub duplicates_removed: usize,
    /// Clusters emitted.
    pub clusters_found: usize,
}

impl ClusteringStatistics {
    /// Adds the counters of `other` to these.
    pub fn merge(&mut self, other: &ClusteringStatistics) {
        self.events_processed += other.events_processed;
        self.cells_processed += other.cells_processed;
        self.cells_dropped += other.cells_dropped;
        self.towers_filled += other.towers_filled;
        self.preclusters_found += other.preclusters_found;
        self.duplicates_removed += other.duplicates_removed;
        self.clusters_found += other.clusters_found;
    }
}

/// Reusable per-event buffers of a clustering algorithm.
pub trait ClusteringState: Send {
    /// Discards everything left over from the previous event.
    fn reset(&mut self);
}

/// Trait for algorithms turning one event's cells into clusters.
///
/// The algorithm object holds only immutable configuration, so it can be
/// shared across threads; everything mutable lives in its [`State`].
///
/// [`State`]: CellClustering::State
pub trait CellClustering: Send + Sync {
    /// Per-event working buffers.
    type State: ClusteringState;

    /// Algorithm name.
    fn name(&self) -> &'static str;

    /// Creates empty working buffers sized for this algorithm.
    fn create_state(&self) -> Self::State;

    /// Clusters one event.
    fn cluster(
        &self,
        cells: &CellBatch,
        state: &mut Self::State,
    ) -> Result<Vec<Cluster>, ClusteringError>;

    /// Counters for the last event clustered with `state`.
    fn statistics(&self, state: &Self::State) -> ClusteringStatistics;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistics_merge() {
        let mut total = ClusteringStatistics::default();
        let event = ClusteringStatistics {
            events_processed: 1,
            cells_processed: 100,
            cells_dropped: 2,
            towers_filled: 40,
            preclusters_found: 5,
            duplicates_removed: 3,
            clusters_found: 2,
        };
        total.merge(&event);
        total.merge(&event);
        assert_eq!(total.events_processed, 2);
        assert_eq!(total.cells_processed, 200);
        assert_eq!(total.cells_dropped, 4);
        assert_eq!(total.towers_filled, 80);
        assert_eq!(total.preclusters_found, 10);
        assert_eq!(total.duplicates_removed, 6);
        assert_eq!(total.clusters_found, 4);
    }
}
