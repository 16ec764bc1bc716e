//! calowin-algorithms: Sliding-window clustering of calorimeter towers.
//!
//! The pipeline runs in four stages, each in its own module:
//! - [`towers`] - bins cells into a dense eta x phi tower grid
//! - [`scanner`] - windowed energy sums, local maxima and barycentres
//! - [`duplicates`] - pairwise overlap removal between preclusters
//! - [`builder`] - clusters with 3D positions and member cells
//!
//! [`SlidingWindowClustering`] drives all four for one event;
//! [`process_events`] and friends run it over many.
//!
#![warn(missing_docs)]

pub mod builder;
pub mod duplicates;
mod processing;
pub mod scanner;
mod sliding_window;
pub mod towers;

pub use processing::{
    cluster_stream, process_events, process_events_parallel, ClusterStream, EventsOutput,
};
pub use sliding_window::{SlidingWindowClustering, SlidingWindowState};
pub use towers::TowerGrid;

// Re-export core clustering traits
pub use calowin_core::clustering::{CellClustering, ClusteringState, ClusteringStatistics};
