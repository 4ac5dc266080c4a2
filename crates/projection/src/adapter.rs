//! The projection capability consumed by the tile resolver.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use tracing::debug;

use tms_common::{AxisOrder, CrsCode, ProjectionError};

use crate::geographic::Geographic;
use crate::mercator::{EllipsoidalMercator, WebMercator};
use crate::polar::PolarStereographic;

/// Forward/inverse transforms between WGS84 longitude/latitude and a CRS.
///
/// All coordinates are exchanged in (x, y) / (lon, lat) order; authority
/// axis order is only reported through [`axis_order`](Self::axis_order) so
/// callers can reorder at their I/O boundary.
pub trait ProjectionAdapter: Send + Sync {
    /// WGS84 longitude/latitude (degrees) to `crs` coordinates.
    fn forward(&self, crs: CrsCode, lon: f64, lat: f64) -> Result<(f64, f64), ProjectionError>;

    /// `crs` coordinates to WGS84 longitude/latitude (degrees).
    fn inverse(&self, crs: CrsCode, x: f64, y: f64) -> Result<(f64, f64), ProjectionError>;

    /// Whether the adapter can handle `crs` at all.
    fn supports(&self, crs: CrsCode) -> bool;

    fn axis_order(&self, crs: CrsCode) -> AxisOrder {
        crs.axis_order()
    }

    fn is_geographic(&self, crs: CrsCode) -> bool {
        crs.is_geographic()
    }

    /// Transform a point between two CRSes through geographic coordinates.
    fn transform(
        &self,
        from: CrsCode,
        to: CrsCode,
        x: f64,
        y: f64,
    ) -> Result<(f64, f64), ProjectionError> {
        if from.same_space(&to) {
            return Ok((x, y));
        }
        let (lon, lat) = self.inverse(from, x, y)?;
        self.forward(to, lon, lat)
    }
}

/// One entry of the built-in CRS table.
#[derive(Debug, Clone)]
enum Projection {
    Geographic(Geographic),
    WebMercator(WebMercator),
    WorldMercator(EllipsoidalMercator),
    PolarStereographic(PolarStereographic),
}

impl Projection {
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjectionError> {
        match self {
            Projection::Geographic(p) => p.forward(lon, lat),
            Projection::WebMercator(p) => p.forward(lon, lat),
            Projection::WorldMercator(p) => p.forward(lon, lat),
            Projection::PolarStereographic(p) => p.forward(lon, lat),
        }
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        match self {
            Projection::Geographic(p) => p.inverse(x, y),
            Projection::WebMercator(p) => p.inverse(x, y),
            Projection::WorldMercator(p) => p.inverse(x, y),
            Projection::PolarStereographic(p) => p.inverse(x, y),
        }
    }
}

/// CRS table, built once on first use and shared by all adapters.
static PROJECTIONS: Lazy<HashMap<CrsCode, Projection>> = Lazy::new(|| {
    let mut table = HashMap::new();
    for crs in [CrsCode::Crs84, CrsCode::Epsg4326, CrsCode::Epsg4269] {
        table.insert(crs, Projection::Geographic(Geographic::new(crs)));
    }
    table.insert(
        CrsCode::Epsg3857,
        Projection::WebMercator(WebMercator::default()),
    );
    table.insert(
        CrsCode::Epsg3395,
        Projection::WorldMercator(EllipsoidalMercator::default()),
    );
    table.insert(
        CrsCode::Epsg3413,
        Projection::PolarStereographic(PolarStereographic::nsidc_north()),
    );
    table.insert(
        CrsCode::Epsg3031,
        Projection::PolarStereographic(PolarStereographic::antarctic()),
    );

    debug!(count = table.len(), "Initialised projection table");
    table
});

/// Adapter backed by the projections implemented in this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinProjections;

impl BuiltinProjections {
    fn lookup(&self, crs: CrsCode) -> Result<&'static Projection, ProjectionError> {
        PROJECTIONS
            .get(&crs)
            .ok_or_else(|| ProjectionError::UnsupportedCrs(crs.to_string()))
    }
}

impl ProjectionAdapter for BuiltinProjections {
    fn forward(&self, crs: CrsCode, lon: f64, lat: f64) -> Result<(f64, f64), ProjectionError> {
        self.lookup(crs)?.forward(lon, lat)
    }

    fn inverse(&self, crs: CrsCode, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        self.lookup(crs)?.inverse(x, y)
    }

    fn supports(&self, crs: CrsCode) -> bool {
        PROJECTIONS.contains_key(&crs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_crs() {
        let adapter = BuiltinProjections;
        assert!(!adapter.supports(CrsCode::Epsg(2193)));
        assert!(matches!(
            adapter.forward(CrsCode::Epsg(2193), 0.0, 0.0),
            Err(ProjectionError::UnsupportedCrs(_))
        ));
    }

    #[test]
    fn test_transform_between_projected() {
        let adapter = BuiltinProjections;
        let (x, y) = adapter
            .transform(CrsCode::Epsg3857, CrsCode::Epsg3395, 1000000.0, 5000000.0)
            .unwrap();
        assert!((x - 1000000.0).abs() < 1e-6);
        assert!(y < 5000000.0);

        let (x2, y2) = adapter
            .transform(CrsCode::Epsg3395, CrsCode::Epsg3857, x, y)
            .unwrap();
        assert!((x2 - 1000000.0).abs() < 1e-6);
        assert!((y2 - 5000000.0).abs() < 1e-4);
    }

    #[test]
    fn test_same_space_is_identity() {
        let adapter = BuiltinProjections;
        assert_eq!(
            adapter
                .transform(CrsCode::Crs84, CrsCode::Epsg4326, 12.5, 41.9)
                .unwrap(),
            (12.5, 41.9)
        );
    }
}
