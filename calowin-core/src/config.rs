//! Sliding-window clustering configuration.

use crate::error::{Axis, ConfigError, WindowKind};
use crate::geometry::TowerGeometry;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tunable parameters of the sliding-window algorithm.
///
/// Window sizes are in units of towers. Defaults reproduce the standard
/// electromagnetic calorimeter setup: 0.01 x 0.01 towers, a 5x5 sliding
/// window, a 3x3 position window and a 2x2 overlap window.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SlidingWindowConfig {
    /// Size of the tower in eta.
    pub delta_eta_tower: f64,
    /// Size of the tower in phi.
    pub delta_phi_tower: f64,
    /// Sliding window size in eta.
    pub n_eta_window: usize,
    /// Sliding window size in phi.
    pub n_phi_window: usize,
    /// Position window size in eta.
    pub n_eta_position: usize,
    /// Position window size in phi.
    pub n_phi_position: usize,
    /// Overlap removal window in eta (0 disables removal).
    pub n_eta_duplicates: usize,
    /// Overlap removal window in phi (0 disables removal).
    pub n_phi_duplicates: usize,
    /// Minimum windowed transverse energy of a precluster (inclusive).
    pub energy_threshold: f64,
    /// Minimum tower energy taking part in the barycentre (inclusive).
    pub energy_pos_threshold: f64,
    /// Require a local maximum along eta.
    pub check_eta_local_max: bool,
    /// Require a local maximum along phi.
    pub check_phi_local_max: bool,
}

impl Default for SlidingWindowConfig {
    fn default() -> Self {
        Self {
            delta_eta_tower: 0.01,
            delta_phi_tower: 0.01,
            n_eta_window: 5,
            n_phi_window: 5,
            n_eta_position: 3,
            n_phi_position: 3,
            n_eta_duplicates: 2,
            n_phi_duplicates: 2,
            energy_threshold: 3.0,
            energy_pos_threshold: 0.00001,
            check_eta_local_max: true,
            check_phi_local_max: true,
        }
    }
}

impl SlidingWindowConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the tower size.
    #[must_use]
    pub fn with_tower_size(mut self, delta_eta: f64, delta_phi: f64) -> Self {
        self.delta_eta_tower = delta_eta;
        self.delta_phi_tower = delta_phi;
        self
    }

    /// Sets the sliding window size.
    #[must_use]
    pub fn with_window(mut self, n_eta: usize, n_phi: usize) -> Self {
        self.n_eta_window = n_eta;
        self.n_phi_window = n_phi;
        self
    }

    /// Sets the position window size.
    #[must_use]
    pub fn with_position_window(mut self, n_eta: usize, n_phi: usize) -> Self {
        self.n_eta_position = n_eta;
        self.n_phi_position = n_phi;
        self
    }

    /// Sets the overlap removal window size.
    #[must_use]
    pub fn with_duplicates_window(mut self, n_eta: usize, n_phi: usize) -> Self {
        self.n_eta_duplicates = n_eta;
        self.n_phi_duplicates = n_phi;
        self
    }

    /// Sets the precluster energy threshold.
    #[must_use]
    pub fn with_energy_threshold(mut self, threshold: f64) -> Self {
        self.energy_threshold = threshold;
        self
    }

    /// Sets the barycentre tower energy threshold.
    #[must_use]
    pub fn with_energy_pos_threshold(mut self, threshold: f64) -> Self {
        self.energy_pos_threshold = threshold;
        self
    }

    /// Enables or disables the local maximum checks.
    #[must_use]
    pub fn with_local_max_checks(mut self, eta: bool, phi: bool) -> Self {
        self.check_eta_local_max = eta;
        self.check_phi_local_max = phi;
        self
    }

    /// Checks the configuration against a detector and returns the tower
    /// grid it describes.
    pub fn validate(&self, detector: &DetectorGeometry) -> Result<TowerGeometry, ConfigError> {
        detector.validate()?;
        let geometry = TowerGeometry::from_config(self, detector)?;

        for (window, axis, size) in [
            (WindowKind::Sliding, Axis::Eta, self.n_eta_window),
            (WindowKind::Sliding, Axis::Phi, self.n_phi_window),
            (WindowKind::Position, Axis::Eta, self.n_eta_position),
            (WindowKind::Position, Axis::Phi, self.n_phi_position),
        ] {
            if size == 0 {
                return Err(ConfigError::EmptyWindow { window, axis });
            }
        }

        for (axis, size, towers) in [
            (Axis::Eta, self.n_eta_window, geometry.n_eta()),
            (Axis::Phi, self.n_phi_window, geometry.n_phi()),
        ] {
            if size > towers {
                return Err(ConfigError::WindowLargerThanGrid { axis, size, towers });
            }
        }

        for (window, axis, size, sliding) in [
            (WindowKind::Position, Axis::Eta, self.n_eta_position, self.n_eta_window),
            (WindowKind::Position, Axis::Phi, self.n_phi_position, self.n_phi_window),
            (WindowKind::Duplicates, Axis::Eta, self.n_eta_duplicates, self.n_eta_window),
            (WindowKind::Duplicates, Axis::Phi, self.n_phi_duplicates, self.n_phi_window),
        ] {
            if size > sliding {
                return Err(ConfigError::WindowLargerThanSliding {
                    window,
                    axis,
                    size,
                    sliding,
                });
            }
        }

        for (name, value) in [
            ("energy threshold", self.energy_threshold),
            ("position energy threshold", self.energy_pos_threshold),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::InvalidThreshold { name, value });
            }
        }

        Ok(geometry)
    }
}

/// Angular coverage and inner surface of the calorimeter.
///
/// These normally come from the detector description; the clustering only
/// needs the eta half-width (to size the grid) and the inner radius (to place
/// clusters in space).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DetectorGeometry {
    /// Half-width of the eta coverage; the grid spans `[-eta_max, eta_max]`.
    pub eta_max: f64,
    /// Inner radius of the calorimeter, in the caller's length unit.
    pub inner_radius: f64,
}

impl Default for DetectorGeometry {
    fn default() -> Self {
        Self {
            eta_max: 1.5,
            inner_radius: 1.0,
        }
    }
}

impl DetectorGeometry {
    /// Creates a detector description.
    #[must_use]
    pub fn new(eta_max: f64, inner_radius: f64) -> Self {
        Self {
            eta_max,
            inner_radius,
        }
    }

    /// Checks coverage and radius.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.eta_max.is_finite() && self.eta_max > 0.0) {
            return Err(ConfigError::InvalidCoverage(self.eta_max));
        }
        if !(self.inner_radius.is_finite() && self.inner_radius > 0.0) {
            return Err(ConfigError::InvalidRadius(self.inner_radius));
        }
        Ok(())
    }
}

/// Algorithm parameters and detector description, as stored in settings files.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClusteringSettings {
    /// Sliding-window parameters.
    pub clustering: SlidingWindowConfig,
    /// Detector coverage.
    pub detector: DetectorGeometry,
}

impl ClusteringSettings {
    /// Validates both parts and returns the tower grid.
    pub fn validate(&self) -> Result<TowerGeometry, ConfigError> {
        self.clustering.validate(&self.detector)
    }
}
