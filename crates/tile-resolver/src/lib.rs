//! Coordinate resolver for OGC Tile Matrix Sets.
//!
//! Converts between coordinates and tile indices for any validated
//! [`TileMatrixSet`](tms_common::TileMatrixSet): point to tile, tile to
//! bounds, bbox to tile ranges, quadkeys, the tile hierarchy and GeoJSON
//! export. All operations are pure functions of the set and their inputs.

pub mod custom;
pub mod feature;
pub mod hierarchy;
pub mod quadkey;
pub mod range;
pub mod resolver;
pub mod validation;
pub mod zoom;

pub use custom::custom_from_extent;
pub use feature::FeatureOptions;
pub use range::{TileCover, TileRange};
pub use resolver::{LookupMode, Resolver};
pub use zoom::ZoomLevelStrategy;

pub use tms_common::{BoundingBox, CrsCode, Tile, TmsError, TmsResult};
