//! Helpers running a clustering over many events.

use calowin_core::clustering::{CellClustering, ClusteringStatistics};
use calowin_core::error::ClusteringError;
use calowin_core::{CellBatch, Cluster};
use rayon::prelude::*;

/// Clusters of a sequence of events plus aggregated counters.
#[derive(Debug, Clone, Default)]
pub struct EventsOutput {
    /// One cluster list per event, in input order.
    pub clusters: Vec<Vec<Cluster>>,
    /// Counters summed over all events.
    pub statistics: ClusteringStatistics,
}

impl EventsOutput {
    /// Total number of clusters over all events.
    #[must_use]
    pub fn total_clusters(&self) -> usize {
        self.clusters.iter().map(Vec::len).sum()
    }
}

/// Clusters events one after the other, reusing a single state.
pub fn process_events<'a, A, I>(algo: &A, events: I) -> Result<EventsOutput, ClusteringError>
where
    A: CellClustering,
    I: IntoIterator<Item = &'a CellBatch>,
{
    let mut output = EventsOutput::default();
    for result in cluster_stream(algo, events) {
        let (clusters, statistics) = result?;
        output.statistics.merge(&statistics);
        output.clusters.push(clusters);
    }
    Ok(output)
}

/// Clusters events in parallel, one state per worker. Results come back in
/// input order and match [`process_events`] exactly.
pub fn process_events_parallel<A>(
    algo: &A,
    events: &[CellBatch],
) -> Result<EventsOutput, ClusteringError>
where
    A: CellClustering,
{
    let per_event: Vec<(Vec<Cluster>, ClusteringStatistics)> = events
        .par_iter()
        .map_init(
            || algo.create_state(),
            |state, cells| {
                let clusters = algo.cluster(cells, state)?;
                Ok::<_, ClusteringError>((clusters, algo.statistics(state)))
            },
        )
        .collect::<Result<_, ClusteringError>>()?;

    let mut output = EventsOutput {
        clusters: Vec::with_capacity(per_event.len()),
        statistics: ClusteringStatistics::default(),
    };
    for (clusters, statistics) in per_event {
        output.statistics.merge(&statistics);
        output.clusters.push(clusters);
    }
    Ok(output)
}

/// Lazily clusters a stream of events, yielding each event's clusters and
/// counters.
pub fn cluster_stream<A, I, B>(algo: &A, events: I) -> ClusterStream<'_, A, I::IntoIter>
where
    A: CellClustering,
    I: IntoIterator<Item = B>,
    B: std::borrow::Borrow<CellBatch>,
{
    ClusterStream {
        algo,
        state: algo.create_state(),
        events: events.into_iter(),
    }
}

/// Iterator returned by [`cluster_stream`].
pub struct ClusterStream<'a, A: CellClustering, I> {
    algo: &'a A,
    state: A::State,
    events: I,
}

impl<A, I, B> Iterator for ClusterStream<'_, A, I>
where
    A: CellClustering,
    I: Iterator<Item = B>,
    B: std::borrow::Borrow<CellBatch>,
{
    type Item = Result<(Vec<Cluster>, ClusteringStatistics), ClusteringError>;

    fn next(&mut self) -> Option<Self::Item> {
        let event = self.events.next()?;
        Some(
            self.algo
                .cluster(event.borrow(), &mut self.state)
                .map(|clusters| (clusters, self.algo.statistics(&self.state))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SlidingWindowClustering;
    use calowin_core::{DetectorGeometry, SlidingWindowConfig};

    fn algo() -> SlidingWindowClustering {
        let config = SlidingWindowConfig::default().with_tower_size(0.1, 0.1);
        SlidingWindowClustering::new(config, DetectorGeometry::new(1.0, 1.0)).unwrap()
    }

    fn events() -> Vec<CellBatch> {
        (0..12)
            .map(|i| {
                let mut batch = CellBatch::default();
                for k in 0..i % 3 {
                    batch.push(k as u64, -0.75 + 0.6 * k as f64, 0.05 + 2.0 * k as f64, 5.0);
                }
                batch.push(99, 0.95, 0.0, 0.1);
                batch.push(100, 1.25, 0.0, 1.0);
                batch
            })
            .collect()
    }

    #[test]
    fn test_process_events_counts() {
        let algo = algo();
        let events = events();
        let output = process_events(&algo, &events).unwrap();

        assert_eq!(output.clusters.len(), 12);
        // Events carry 0, 1, 2 isolated deposits in turn.
        assert_eq!(output.total_clusters(), 12);
        assert_eq!(output.statistics.events_processed, 12);
        assert_eq!(output.statistics.cells_dropped, 12);
        assert_eq!(output.statistics.clusters_found, 12);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let algo = algo();
        let events = events();
        let sequential = process_events(&algo, &events).unwrap();
        let parallel = process_events_parallel(&algo, &events).unwrap();
        assert_eq!(sequential.clusters, parallel.clusters);
        assert_eq!(sequential.statistics, parallel.statistics);
    }

    #[test]
    fn test_stream_is_lazy_per_event() {
        let algo = algo();
        let mut stream = cluster_stream(&algo, events());
        let (clusters, stats) = stream.next().unwrap().unwrap();
        assert!(clusters.is_empty());
        assert_eq!(stats.cells_processed, 2);
        let (clusters, _) = stream.next().unwrap().unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(stream.count(), 10);
    }
}
