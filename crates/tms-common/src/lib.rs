//! Common types for OGC Tile Matrix Sets: tiles, tile matrices, validated
//! matrix sets, CRS identifiers and the registry of well-known sets.

pub mod bbox;
pub mod crs;
pub mod custom;
pub mod definition;
pub mod error;
pub mod matrix_set;
pub mod registry;
pub mod tile;

pub use bbox::BoundingBox;
pub use crs::{AxisOrder, CrsCode, CrsUnits};
pub use custom::CustomOptions;
pub use definition::TileMatrixSetDocument;
pub use error::{ProjectionError, TmsError, TmsResult};
pub use matrix_set::{TileMatrixSet, TileMatrixSetBuilder, STANDARD_PIXEL_SIZE};
pub use registry::{RegistryConfig, TileMatrixSets};
pub use tile::{CornerOfOrigin, Tile, TileMatrix};
