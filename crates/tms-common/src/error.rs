//! Error types for tile matrix set operations.

use thiserror::Error;

use crate::tile::Tile;

/// Result type alias using TmsError.
pub type TmsResult<T> = Result<T, TmsError>;

/// Failures reported by a projection adapter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),

    #[error("Coordinate ({x}, {y}) is outside the domain of {crs}")]
    OutOfDomain { crs: String, x: f64, y: f64 },

    #[error("Projection singularity at ({x}, {y}) for {crs}")]
    Singularity { crs: String, x: f64, y: f64 },

    #[error("Inverse projection for {crs} did not converge at ({x}, {y})")]
    NonConvergence { crs: String, x: f64, y: f64 },
}

/// Primary error type for tile matrix set operations.
#[derive(Debug, Error)]
pub enum TmsError {
    // === Construction Errors ===
    #[error("Tile matrix set '{0}' has no tile matrices")]
    EmptyMatrixSet(String),

    #[error("Invalid tile matrix set definition: {0}")]
    InvalidDefinition(String),

    // === Lookup Errors ===
    #[error("Zoom level {zoom} is not defined in tile matrix set '{identifier}'")]
    UnsupportedZoom { identifier: String, zoom: u32 },

    /// Indices are signed: a strict point lookup can land left of or above
    /// the matrix.
    #[error("Tile ({x}, {y}, {z}) is outside the {matrix_width}x{matrix_height} matrix")]
    TileOutOfBounds {
        x: i64,
        y: i64,
        z: u32,
        matrix_width: u32,
        matrix_height: u32,
    },

    // === Quadtree Errors ===
    #[error("Tile matrix set '{0}' does not support 2 x 2 quadkeys")]
    QuadkeyUnsupported(String),

    #[error("Invalid quadkey '{quadkey}': {message}")]
    InvalidQuadkey { quadkey: String, message: String },

    #[error("Tile {0} has no parent in this tile matrix set")]
    NoParent(Tile),

    #[error("Tile {0} has no quadtree children in this tile matrix set")]
    NoChildren(Tile),

    // === Input Errors ===
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Invalid BBOX: {0}")]
    InvalidBbox(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error(transparent)]
    Projection(#[from] ProjectionError),

    // === Registry Errors ===
    #[error("Unknown tile matrix set identifier: {0}")]
    UnknownIdentifier(String),

    #[error("Tile matrix set '{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl TmsError {
    /// Stable, machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            TmsError::EmptyMatrixSet(_) => "EmptyMatrixSet",
            TmsError::InvalidDefinition(_) => "InvalidDefinition",
            TmsError::UnsupportedZoom { .. } => "UnsupportedZoom",
            TmsError::TileOutOfBounds { .. } => "TileOutOfBounds",
            TmsError::QuadkeyUnsupported(_) => "QuadkeyUnsupported",
            TmsError::InvalidQuadkey { .. } => "InvalidQuadkey",
            TmsError::NoParent(_) => "NoParent",
            TmsError::NoChildren(_) => "NoChildren",
            TmsError::InvalidCoordinate(_) => "InvalidCoordinate",
            TmsError::InvalidBbox(_) => "InvalidBBox",
            TmsError::InvalidParameter { .. } => "InvalidParameterValue",
            TmsError::Projection(_) => "ProjectionError",
            TmsError::UnknownIdentifier(_) => "UnknownIdentifier",
            TmsError::AlreadyRegistered(_) => "AlreadyRegistered",
            TmsError::Io(_) => "NoApplicableCode",
        }
    }

    /// Whether the error stems from bad caller input rather than configuration.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            TmsError::UnsupportedZoom { .. }
                | TmsError::TileOutOfBounds { .. }
                | TmsError::InvalidQuadkey { .. }
                | TmsError::InvalidCoordinate(_)
                | TmsError::InvalidBbox(_)
                | TmsError::InvalidParameter { .. }
        )
    }
}

// Conversion from common error types
impl From<std::io::Error> for TmsError {
    fn from(err: std::io::Error) -> Self {
        TmsError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for TmsError {
    fn from(err: serde_json::Error) -> Self {
        TmsError::InvalidDefinition(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_error_converts() {
        let err: TmsError = ProjectionError::UnsupportedCrs("EPSG:5070".to_string()).into();
        assert_eq!(err.code(), "ProjectionError");
        assert_eq!(err.to_string(), "Unsupported CRS: EPSG:5070");
    }

    #[test]
    fn test_input_errors() {
        let err = TmsError::UnsupportedZoom {
            identifier: "WebMercatorQuad".to_string(),
            zoom: 40,
        };
        assert!(err.is_input_error());
        assert!(!TmsError::EmptyMatrixSet("x".to_string()).is_input_error());
    }
}
