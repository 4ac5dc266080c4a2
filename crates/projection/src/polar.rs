//! Polar Stereographic projection on the WGS84 ellipsoid.
//!
//! Variant B (latitude of true scale), as used by EPSG:3413 (NSIDC Sea Ice
//! North) and EPSG:3031 (Antarctic). Formulas follow Snyder, "Map
//! Projections: A Working Manual", 21-33 to 21-41. The south polar aspect is
//! computed by mirroring through the north aspect.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use tms_common::crs::WGS84_SEMI_MAJOR;
use tms_common::{CrsCode, ProjectionError};

use crate::mercator::solve_latitude;
use crate::wgs84_eccentricity;

/// Polar Stereographic projection parameters.
#[derive(Debug, Clone)]
pub struct PolarStereographic {
    /// CRS this instance implements, for error reporting
    pub crs: CrsCode,
    /// Latitude of true scale in degrees (negative for the south aspect)
    pub lat_ts: f64,
    /// Longitude of the central meridian (straight down from the pole) in degrees
    pub lon0: f64,
    /// Semi-major axis (meters)
    pub semi_major: f64,
    /// First eccentricity
    pub eccentricity: f64,
    /// a * m_c / t_c, constant for the projection
    scale: f64,
}

impl PolarStereographic {
    pub fn new(crs: CrsCode, lat_ts: f64, lon0: f64) -> Self {
        let e = wgs84_eccentricity();
        let phi_c = lat_ts.abs().to_radians();
        let scale = WGS84_SEMI_MAJOR * m(phi_c, e) / t(phi_c, e);

        Self {
            crs,
            lat_ts,
            lon0,
            semi_major: WGS84_SEMI_MAJOR,
            eccentricity: e,
            scale,
        }
    }

    /// NSIDC Sea Ice Polar Stereographic North (EPSG:3413).
    pub fn nsidc_north() -> Self {
        Self::new(CrsCode::Epsg3413, 70.0, -45.0)
    }

    /// Antarctic Polar Stereographic (EPSG:3031).
    pub fn antarctic() -> Self {
        Self::new(CrsCode::Epsg3031, -71.0, 0.0)
    }

    fn is_south(&self) -> bool {
        self.lat_ts < 0.0
    }

    /// Longitude/latitude (degrees) to meters.
    ///
    /// The opposite pole projects to infinity and is rejected.
    pub fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjectionError> {
        if !(lon.is_finite() && lat.is_finite()) || lat.abs() > 90.0 {
            return Err(ProjectionError::OutOfDomain {
                crs: self.crs.to_string(),
                x: lon,
                y: lat,
            });
        }

        // mirror the south aspect onto the north one
        let (lon_n, lat_n, lon0_n) = if self.is_south() {
            (-lon, -lat, -self.lon0)
        } else {
            (lon, lat, self.lon0)
        };

        if lat_n <= -90.0 {
            return Err(ProjectionError::Singularity {
                crs: self.crs.to_string(),
                x: lon,
                y: lat,
            });
        }

        let rho = self.scale * t(lat_n.to_radians(), self.eccentricity);
        let theta = (lon_n - lon0_n).to_radians();
        let x = rho * theta.sin();
        let y = -rho * theta.cos();

        if self.is_south() {
            Ok((-x, -y))
        } else {
            Ok((x, y))
        }
    }

    /// Meters to longitude/latitude (degrees).
    pub fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        if !(x.is_finite() && y.is_finite()) {
            return Err(ProjectionError::OutOfDomain {
                crs: self.crs.to_string(),
                x,
                y,
            });
        }

        let (xn, yn, lon0_n) = if self.is_south() {
            (-x, -y, -self.lon0)
        } else {
            (x, y, self.lon0)
        };

        let rho = xn.hypot(yn);
        let (lon_n, lat_n) = if rho == 0.0 {
            (lon0_n, 90.0)
        } else {
            let t_value = rho / self.scale;
            let phi = solve_latitude(t_value, self.eccentricity).ok_or_else(|| {
                ProjectionError::NonConvergence {
                    crs: self.crs.to_string(),
                    x,
                    y,
                }
            })?;
            let lon = lon0_n + xn.atan2(-yn).to_degrees();
            (normalize_lon(lon), phi.to_degrees())
        };

        if self.is_south() {
            Ok((normalize_lon(-lon_n), -lat_n))
        } else {
            Ok((lon_n, lat_n))
        }
    }
}

/// Snyder 14-15.
fn m(phi: f64, e: f64) -> f64 {
    phi.cos() / (1.0 - (e * phi.sin()).powi(2)).sqrt()
}

/// Snyder 15-9.
fn t(phi: f64, e: f64) -> f64 {
    let esin = e * phi.sin();
    if phi >= FRAC_PI_2 {
        return 0.0;
    }
    (FRAC_PI_4 - phi / 2.0).tan() / ((1.0 - esin) / (1.0 + esin)).powf(e / 2.0)
}

fn normalize_lon(lon: f64) -> f64 {
    let mut lon = lon;
    while lon > 180.0 {
        lon -= 360.0;
    }
    while lon < -180.0 {
        lon += 360.0;
    }
    lon
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pole_maps_to_origin() {
        let (x, y) = PolarStereographic::nsidc_north().forward(0.0, 90.0).unwrap();
        assert!(x.abs() < 1e-6 && y.abs() < 1e-6);

        let (x, y) = PolarStereographic::antarctic().forward(120.0, -90.0).unwrap();
        assert!(x.abs() < 1e-6 && y.abs() < 1e-6);
    }

    #[test]
    fn test_antarctic_known_point() {
        // EPSG:3031, 60S on the prime meridian
        let (x, y) = PolarStereographic::antarctic().forward(0.0, -60.0).unwrap();
        assert!(x.abs() < 1e-6);
        assert!((y - 3333134.0276).abs() < 1e-3);

        // 90E lies on the positive x axis
        let (x, y) = PolarStereographic::antarctic().forward(90.0, -71.0).unwrap();
        assert!((x - 2082760.1085).abs() < 1e-3);
        assert!(y.abs() < 1e-6);
    }

    #[test]
    fn test_nsidc_central_meridian() {
        let (x, y) = PolarStereographic::nsidc_north().forward(-45.0, 70.0).unwrap();
        assert!(x.abs() < 1e-6);
        assert!((y + 2187927.6493).abs() < 1e-3);
    }

    #[test]
    fn test_roundtrip_both_aspects() {
        let cases = [
            (PolarStereographic::nsidc_north(), [(-45.0, 70.0), (100.0, 55.0), (10.0, 89.5)]),
            (PolarStereographic::antarctic(), [(0.0, -60.0), (-150.0, -75.0), (45.0, -89.0)]),
        ];
        for (proj, points) in cases {
            for (lon, lat) in points {
                let (x, y) = proj.forward(lon, lat).unwrap();
                let (lon2, lat2) = proj.inverse(x, y).unwrap();
                assert!((lon - lon2).abs() < 1e-8, "{:?} lon {} vs {}", proj.crs, lon, lon2);
                assert!((lat - lat2).abs() < 1e-8, "{:?} lat {} vs {}", proj.crs, lat, lat2);
            }
        }
    }

    #[test]
    fn test_opposite_pole_singularity() {
        assert!(matches!(
            PolarStereographic::nsidc_north().forward(0.0, -90.0),
            Err(ProjectionError::Singularity { .. })
        ));
        assert!(matches!(
            PolarStereographic::antarctic().forward(0.0, 90.0),
            Err(ProjectionError::Singularity { .. })
        ));
    }

    #[test]
    fn test_inverse_origin_is_pole() {
        let (_, lat) = PolarStereographic::antarctic().inverse(0.0, 0.0).unwrap();
        assert_eq!(lat, -90.0);
    }
}
