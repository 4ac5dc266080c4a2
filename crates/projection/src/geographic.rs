//! Geographic (longitude/latitude) coordinate systems.
//!
//! CRS84, EPSG:4326 and EPSG:4269 are all treated as WGS84 degrees in
//! (lon, lat) order; the NAD83 datum shift is below a meter and ignored.

use tms_common::{CrsCode, ProjectionError};

/// Pass-through "projection" for geographic coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Geographic {
    crs: CrsCode,
}

impl Geographic {
    pub fn new(crs: CrsCode) -> Self {
        Self { crs }
    }

    /// Longitude/latitude to the CRS: identity, only rejecting non-finite input.
    pub fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjectionError> {
        self.check(lon, lat)?;
        Ok((lon, lat))
    }

    pub fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        self.check(x, y)?;
        Ok((x, y))
    }

    fn check(&self, x: f64, y: f64) -> Result<(), ProjectionError> {
        if x.is_finite() && y.is_finite() {
            Ok(())
        } else {
            Err(ProjectionError::OutOfDomain {
                crs: self.crs.to_string(),
                x,
                y,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let g = Geographic::new(CrsCode::Crs84);
        assert_eq!(g.forward(-120.5, 45.25).unwrap(), (-120.5, 45.25));
        assert_eq!(g.inverse(190.0, 10.0).unwrap(), (190.0, 10.0));
    }

    #[test]
    fn test_non_finite_rejected() {
        let g = Geographic::new(CrsCode::Epsg4326);
        assert!(matches!(
            g.forward(f64::INFINITY, 0.0),
            Err(ProjectionError::OutOfDomain { .. })
        ));
    }
}
