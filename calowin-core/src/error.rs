//! Error types for calowin-core.

use thiserror::Error;

/// Result type alias for calowin operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for calowin operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid clustering configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Clustering failed for an event.
    #[error("clustering error: {0}")]
    Clustering(#[from] ClusteringError),
}

/// Fatal configuration problems, detected once before any event is processed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Tower size must be finite and strictly positive.
    #[error("tower size in {axis} must be positive and finite, got {value}")]
    InvalidTowerSize { axis: Axis, value: f64 },

    /// The tower count does not fit in memory indices.
    #[error(
        "towers of {delta_eta} x {delta_phi} over eta coverage {eta_max} give too many towers"
    )]
    GridTooLarge {
        delta_eta: f64,
        delta_phi: f64,
        eta_max: f64,
    },

    /// Detector eta half-width must be finite and strictly positive.
    #[error("detector eta coverage must be positive and finite, got {0}")]
    InvalidCoverage(f64),

    /// Inner radius must be finite and strictly positive.
    #[error("detector inner radius must be positive and finite, got {0}")]
    InvalidRadius(f64),

    /// A window must cover at least one tower.
    #[error("{window} window size in {axis} must be at least 1")]
    EmptyWindow { window: WindowKind, axis: Axis },

    /// The sliding window does not fit in the tower grid.
    #[error("sliding window in {axis} ({size}) exceeds the {towers} towers of the grid")]
    WindowLargerThanGrid {
        axis: Axis,
        size: usize,
        towers: usize,
    },

    /// A secondary window is wider than the sliding window.
    #[error("{window} window in {axis} ({size}) exceeds the sliding window ({sliding})")]
    WindowLargerThanSliding {
        window: WindowKind,
        axis: Axis,
        size: usize,
        sliding: usize,
    },

    /// Energy thresholds must be finite numbers.
    #[error("{name} must be finite, got {value}")]
    InvalidThreshold { name: &'static str, value: f64 },
}

/// Errors raised while clustering a single event.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClusteringError {
    /// The per-event state was created for a different tower grid.
    #[error("state grid {state_eta}x{state_phi} does not match configured grid {eta}x{phi}")]
    StateMismatch {
        state_eta: usize,
        state_phi: usize,
        eta: usize,
        phi: usize,
    },
}

/// Angular axis of the tower grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Pseudorapidity.
    Eta,
    /// Azimuthal angle.
    Phi,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Eta => f.write_str("eta"),
            Axis::Phi => f.write_str("phi"),
        }
    }
}

/// The windows configured for the sliding-window algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    /// Energy summation and maximum finding.
    Sliding,
    /// Barycentre calculation.
    Position,
    /// Overlap removal.
    Duplicates,
}

impl std::fmt::Display for WindowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowKind::Sliding => f.write_str("sliding"),
            WindowKind::Position => f.write_str("position"),
            WindowKind::Duplicates => f.write_str("duplicates"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_messages() {
        let err = ConfigError::WindowLargerThanGrid {
            axis: Axis::Phi,
            size: 700,
            towers: 629,
        };
        assert_eq!(
            err.to_string(),
            "sliding window in phi (700) exceeds the 629 towers of the grid"
        );

        let err: Error = ConfigError::EmptyWindow {
            window: WindowKind::Position,
            axis: Axis::Eta,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "configuration error: position window size in eta must be at least 1"
        );

        let err = ConfigError::GridTooLarge {
            delta_eta: 1e-10,
            delta_phi: 0.5,
            eta_max: 1.5,
        };
        assert_eq!(
            err.to_string(),
            "towers of 0.0000000001 x 0.5 over eta coverage 1.5 give too many towers"
        );
    }
}
