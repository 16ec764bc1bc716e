//! Tower grid geometry: binning of the (eta, phi) plane.
//!
//! Bins are half-open, `[low, high)`. Values that land within a relative
//! tolerance of [`EDGE_TOLERANCE`] of an exact bin edge are snapped onto the
//! edge first, so a cell sitting on a boundary always goes to the upper bin
//! regardless of how the division rounds.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

use std::f64::consts::{PI, TAU};
use std::ops::RangeInclusive;

use crate::cluster::TowerCoord;
use crate::config::{DetectorGeometry, SlidingWindowConfig};
use crate::error::{Axis, ConfigError};

/// Relative tolerance used to snap values onto bin edges.
pub const EDGE_TOLERANCE: f64 = 1e-9;

/// Floors `x`, treating values within tolerance of an integer as that integer.
#[inline]
fn snap_floor(x: f64) -> f64 {
    let nearest = x.round();
    if (x - nearest).abs() <= EDGE_TOLERANCE * nearest.abs().max(1.0) {
        nearest
    } else {
        x.floor()
    }
}

/// Ceils `x`, treating values within tolerance of an integer as that integer.
#[inline]
fn snap_ceil(x: f64) -> f64 {
    let nearest = x.round();
    if (x - nearest).abs() <= EDGE_TOLERANCE * nearest.abs().max(1.0) {
        nearest
    } else {
        x.ceil()
    }
}

/// Number of whole towers needed to cover `x` tower widths, if it fits a
/// `usize`.
#[inline]
fn tower_count(x: f64) -> Option<usize> {
    let count = snap_ceil(x);
    (count.is_finite() && count < usize::MAX as f64).then_some(count as usize)
}

/// Wraps an angle into `[-pi, pi)`.
#[inline]
#[must_use]
pub fn wrap_phi(phi: f64) -> f64 {
    (phi + PI).rem_euclid(TAU) - PI
}

/// Tower offsets covered by a window of `size` towers centred on a tower.
///
/// Odd sizes are symmetric. Even sizes reach one tower further on the low
/// side, so the window always spans exactly `size` towers.
#[inline]
#[must_use]
pub fn window_offsets(size: usize) -> RangeInclusive<isize> {
    let size = size as isize;
    let low = -(size / 2);
    low..=low + size - 1
}

/// Fixed binning of the detector's angular coverage into towers.
#[derive(Debug, Clone, PartialEq)]
pub struct TowerGeometry {
    delta_eta: f64,
    delta_phi: f64,
    n_eta: usize,
    n_phi: usize,
    eta_min: f64,
}

impl TowerGeometry {
    /// Builds the grid for towers of `delta_eta x delta_phi` covering
    /// `[-eta_max, eta_max]` (rounded outwards to whole towers) and the full
    /// phi circle.
    pub fn new(delta_eta: f64, delta_phi: f64, eta_max: f64) -> Result<Self, ConfigError> {
        if !(delta_eta.is_finite() && delta_eta > 0.0) {
            return Err(ConfigError::InvalidTowerSize {
                axis: Axis::Eta,
                value: delta_eta,
            });
        }
        if !(delta_phi.is_finite() && delta_phi > 0.0) {
            return Err(ConfigError::InvalidTowerSize {
                axis: Axis::Phi,
                value: delta_phi,
            });
        }
        if !(eta_max.is_finite() && eta_max > 0.0) {
            return Err(ConfigError::InvalidCoverage(eta_max));
        }

        let too_large = || ConfigError::GridTooLarge {
            delta_eta,
            delta_phi,
            eta_max,
        };
        let n_phi = tower_count(TAU / delta_phi).ok_or_else(too_large)?;
        let n_eta = tower_count(eta_max / delta_eta)
            .and_then(|half| half.checked_mul(2))
            .ok_or_else(too_large)?;
        n_eta.checked_mul(n_phi).ok_or_else(too_large)?;
        let eta_min = -(n_eta as f64) * delta_eta / 2.0;

        Ok(Self {
            delta_eta,
            delta_phi,
            n_eta,
            n_phi,
            eta_min,
        })
    }

    /// Builds the grid described by a clustering configuration and detector.
    pub fn from_config(
        config: &SlidingWindowConfig,
        detector: &DetectorGeometry,
    ) -> Result<Self, ConfigError> {
        Self::new(config.delta_eta_tower, config.delta_phi_tower, detector.eta_max)
    }

    /// Number of towers in eta.
    #[inline]
    #[must_use]
    pub fn n_eta(&self) -> usize {
        self.n_eta
    }

    /// Number of towers in phi.
    #[inline]
    #[must_use]
    pub fn n_phi(&self) -> usize {
        self.n_phi
    }

    /// Total number of towers.
    #[inline]
    #[must_use]
    pub fn n_towers(&self) -> usize {
        self.n_eta * self.n_phi
    }

    /// Tower size in eta.
    #[inline]
    #[must_use]
    pub fn delta_eta(&self) -> f64 {
        self.delta_eta
    }

    /// Tower size in phi.
    #[inline]
    #[must_use]
    pub fn delta_phi(&self) -> f64 {
        self.delta_phi
    }

    /// Lower edge of the first eta tower.
    #[inline]
    #[must_use]
    pub fn eta_min(&self) -> f64 {
        self.eta_min
    }

    /// Upper edge of the last eta tower.
    #[inline]
    #[must_use]
    pub fn eta_max(&self) -> f64 {
        -self.eta_min
    }

    /// Eta tower index containing `eta`, or `None` outside the coverage.
    #[must_use]
    pub fn eta_index(&self, eta: f64) -> Option<usize> {
        let bin = snap_floor((eta - self.eta_min) / self.delta_eta);
        if bin.is_finite() && bin >= 0.0 && bin < self.n_eta as f64 {
            Some(bin as usize)
        } else {
            None
        }
    }

    /// Phi tower index containing `phi`; any finite angle is accepted.
    #[must_use]
    pub fn phi_index(&self, phi: f64) -> Option<usize> {
        if !phi.is_finite() {
            return None;
        }
        let bin = snap_floor((wrap_phi(phi) + PI) / self.delta_phi) as isize;
        Some(self.wrap_phi_index(bin))
    }

    /// Tower containing the angular position, or `None` outside the coverage.
    #[must_use]
    pub fn tower_of(&self, eta: f64, phi: f64) -> Option<TowerCoord> {
        Some(TowerCoord::new(self.eta_index(eta)?, self.phi_index(phi)?))
    }

    /// Normalizes a phi index into `[0, n_phi)`.
    #[inline]
    #[must_use]
    pub fn wrap_phi_index(&self, index: isize) -> usize {
        index.rem_euclid(self.n_phi as isize) as usize
    }

    /// Eta index shifted by `offset`, or `None` if it leaves the grid.
    #[inline]
    #[must_use]
    pub fn shift_eta(&self, index: usize, offset: isize) -> Option<usize> {
        let shifted = index as isize + offset;
        if shifted >= 0 && (shifted as usize) < self.n_eta {
            Some(shifted as usize)
        } else {
            None
        }
    }

    /// Phi index shifted by `offset`, wrapped around the circle.
    #[inline]
    #[must_use]
    pub fn shift_phi(&self, index: usize, offset: isize) -> usize {
        self.wrap_phi_index(index as isize + offset)
    }

    /// Shortest distance between two phi indices around the circle.
    #[inline]
    #[must_use]
    pub fn phi_distance(&self, a: usize, b: usize) -> usize {
        let d = a.abs_diff(b);
        d.min(self.n_phi - d)
    }

    /// Eta at the centre of tower `index`. Indices outside the grid
    /// extrapolate linearly.
    #[inline]
    #[must_use]
    pub fn eta_centre(&self, index: isize) -> f64 {
        self.eta_min + (index as f64 + 0.5) * self.delta_eta
    }

    /// Phi at the centre of tower `index`, without wrapping, so neighbours
    /// across the seam stay numerically adjacent.
    #[inline]
    #[must_use]
    pub fn phi_centre(&self, index: isize) -> f64 {
        -PI + (index as f64 + 0.5) * self.delta_phi
    }

    /// Row-major offset of a tower in a flat buffer.
    #[inline]
    #[must_use]
    pub fn flat_index(&self, coord: TowerCoord) -> usize {
        debug_assert!(coord.eta < self.n_eta && coord.phi < self.n_phi);
        coord.eta * self.n_phi + coord.phi
    }

    /// Tower at a row-major offset.
    #[inline]
    #[must_use]
    pub fn coord(&self, flat: usize) -> TowerCoord {
        TowerCoord::new(flat / self.n_phi, flat % self.n_phi)
    }
}
