//! calowin-core: Core traits and types for calorimeter cell clustering.
//!
//! This crate provides the foundational abstractions shared by the
//! sliding-window clustering: cells and cell batches, the tower grid
//! geometry, preclusters and clusters, configuration and error types.
//!

pub mod cell;
pub mod cluster;
pub mod clustering;
pub mod config;
pub mod error;
pub mod geometry;
pub mod soa;

pub use cell::{Cell, CellData, CellId};
pub use cluster::{Cluster, Position3D, PreCluster, TowerCoord};
pub use clustering::{CellClustering, ClusteringState, ClusteringStatistics};
pub use config::{ClusteringSettings, DetectorGeometry, SlidingWindowConfig};
pub use error::{Axis, ClusteringError, ConfigError, Error, Result, WindowKind};
pub use geometry::TowerGeometry;
pub use soa::CellBatch;
