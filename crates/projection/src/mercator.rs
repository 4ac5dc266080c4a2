//! Mercator projections.
//!
//! - [`WebMercator`]: EPSG:3857, spherical formulas on the WGS84 semi-major
//!   axis (the "Pseudo-Mercator" used by web maps).
//! - [`EllipsoidalMercator`]: EPSG:3395, true Mercator on the WGS84
//!   ellipsoid. The inverse has no closed form and is solved iteratively.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use tms_common::crs::WGS84_SEMI_MAJOR;
use tms_common::{CrsCode, ProjectionError};

use crate::wgs84_eccentricity;

/// Iteration limit for inverse latitude solutions.
pub(crate) const MAX_ITERATIONS: usize = 15;

/// Convergence threshold for latitude iteration, in radians.
pub(crate) const CONVERGENCE: f64 = 1e-12;

/// Spherical Web Mercator (EPSG:3857).
#[derive(Debug, Clone, Copy)]
pub struct WebMercator {
    /// Sphere radius (meters)
    pub radius: f64,
}

impl Default for WebMercator {
    fn default() -> Self {
        Self {
            radius: WGS84_SEMI_MAJOR,
        }
    }
}

impl WebMercator {
    /// Longitude/latitude (degrees) to meters.
    ///
    /// The poles map to infinity and are rejected as a singularity.
    pub fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjectionError> {
        if !(lon.is_finite() && lat.is_finite()) {
            return Err(out_of_domain(CrsCode::Epsg3857, lon, lat));
        }
        if lat.abs() >= 90.0 {
            return Err(ProjectionError::Singularity {
                crs: CrsCode::Epsg3857.to_string(),
                x: lon,
                y: lat,
            });
        }

        let x = self.radius * lon.to_radians();
        let y = self.radius * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
        Ok((x, y))
    }

    /// Meters to longitude/latitude (degrees).
    pub fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        if !(x.is_finite() && y.is_finite()) {
            return Err(out_of_domain(CrsCode::Epsg3857, x, y));
        }

        let lon = (x / self.radius).to_degrees();
        let lat = (2.0 * (y / self.radius).exp().atan() - FRAC_PI_2).to_degrees();
        Ok((lon, lat))
    }
}

/// Ellipsoidal World Mercator (EPSG:3395).
#[derive(Debug, Clone, Copy)]
pub struct EllipsoidalMercator {
    /// Semi-major axis (meters)
    pub semi_major: f64,
    /// First eccentricity
    pub eccentricity: f64,
}

impl Default for EllipsoidalMercator {
    fn default() -> Self {
        Self {
            semi_major: WGS84_SEMI_MAJOR,
            eccentricity: wgs84_eccentricity(),
        }
    }
}

impl EllipsoidalMercator {
    pub fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjectionError> {
        if !(lon.is_finite() && lat.is_finite()) {
            return Err(out_of_domain(CrsCode::Epsg3395, lon, lat));
        }
        if lat.abs() >= 90.0 {
            return Err(ProjectionError::Singularity {
                crs: CrsCode::Epsg3395.to_string(),
                x: lon,
                y: lat,
            });
        }

        let e = self.eccentricity;
        let phi = lat.to_radians();
        let esin = e * phi.sin();
        let y = self.semi_major
            * ((FRAC_PI_4 + phi / 2.0).tan() * ((1.0 - esin) / (1.0 + esin)).powf(e / 2.0)).ln();
        Ok((self.semi_major * lon.to_radians(), y))
    }

    pub fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        if !(x.is_finite() && y.is_finite()) {
            return Err(out_of_domain(CrsCode::Epsg3395, x, y));
        }

        let t = (-y / self.semi_major).exp();
        let phi = solve_latitude(t, self.eccentricity).ok_or_else(|| {
            ProjectionError::NonConvergence {
                crs: CrsCode::Epsg3395.to_string(),
                x,
                y,
            }
        })?;
        Ok(((x / self.semi_major).to_degrees(), phi.to_degrees()))
    }
}

/// Solve `t = tan(pi/4 - phi/2) / ((1 - e sin phi) / (1 + e sin phi))^(e/2)`
/// for `phi` (Snyder 7-9).
pub(crate) fn solve_latitude(t: f64, e: f64) -> Option<f64> {
    let mut phi = FRAC_PI_2 - 2.0 * t.atan();
    for _ in 0..MAX_ITERATIONS {
        let esin = e * phi.sin();
        let next = FRAC_PI_2 - 2.0 * (t * ((1.0 - esin) / (1.0 + esin)).powf(e / 2.0)).atan();
        if (next - phi).abs() < CONVERGENCE {
            return Some(next);
        }
        phi = next;
    }
    None
}

fn out_of_domain(crs: CrsCode, x: f64, y: f64) -> ProjectionError {
    ProjectionError::OutOfDomain {
        crs: crs.to_string(),
        x,
        y,
    }
}
