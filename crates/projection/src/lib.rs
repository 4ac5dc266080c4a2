//! Coordinate reference system transformations.
//!
//! Implements the map projections needed by the built-in tile matrix sets
//! from scratch without external dependencies, behind the
//! [`ProjectionAdapter`] capability consumed by the tile resolver.

pub mod adapter;
pub mod geographic;
pub mod mercator;
pub mod polar;
pub mod transform;

pub use adapter::{BuiltinProjections, ProjectionAdapter};
pub use mercator::{EllipsoidalMercator, WebMercator};
pub use polar::PolarStereographic;
pub use transform::{transform_bounds, DEFAULT_DENSIFY_POINTS};

/// WGS84 ellipsoid flattening.
pub const WGS84_FLATTENING: f64 = 1.0 / 298.257223563;

/// WGS84 first eccentricity.
pub fn wgs84_eccentricity() -> f64 {
    (WGS84_FLATTENING * (2.0 - WGS84_FLATTENING)).sqrt()
}
