//! Coordinate Reference System identifiers and their static properties.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TmsError;

/// WGS84 semi-major axis in meters.
pub const WGS84_SEMI_MAJOR: f64 = 6378137.0;

/// Identifier of a coordinate reference system.
///
/// The well-known codes carry their axis order and units; any other EPSG code
/// is accepted as `Epsg(code)` and left to the projection adapter to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CrsCode {
    /// OGC CRS84: WGS84 geographic with lon/lat axis order
    Crs84,
    /// WGS84 Geographic (lat/lon authority axis order)
    Epsg4326,
    /// NAD83 Geographic
    Epsg4269,
    /// Web Mercator (meters)
    Epsg3857,
    /// World Mercator on the WGS84 ellipsoid (meters)
    Epsg3395,
    /// NSIDC Sea Ice Polar Stereographic North
    Epsg3413,
    /// Antarctic Polar Stereographic
    Epsg3031,
    /// Any other EPSG code
    Epsg(u32),
}

impl CrsCode {
    /// Build a code from an EPSG number, folding well-known codes into their variants.
    pub fn from_epsg(code: u32) -> Self {
        match code {
            4326 => CrsCode::Epsg4326,
            4269 => CrsCode::Epsg4269,
            3857 | 900913 => CrsCode::Epsg3857,
            3395 => CrsCode::Epsg3395,
            3413 => CrsCode::Epsg3413,
            3031 => CrsCode::Epsg3031,
            other => CrsCode::Epsg(other),
        }
    }

    /// EPSG number, if the CRS has one (CRS84 does not).
    pub fn epsg(&self) -> Option<u32> {
        match self {
            CrsCode::Crs84 => None,
            CrsCode::Epsg4326 => Some(4326),
            CrsCode::Epsg4269 => Some(4269),
            CrsCode::Epsg3857 => Some(3857),
            CrsCode::Epsg3395 => Some(3395),
            CrsCode::Epsg3413 => Some(3413),
            CrsCode::Epsg3031 => Some(3031),
            CrsCode::Epsg(code) => Some(*code),
        }
    }

    /// Axis order as defined by the CRS authority.
    ///
    /// Geographic EPSG codes are lat/lon; CRS84 and the projected codes are x/y.
    pub fn axis_order(&self) -> AxisOrder {
        match self {
            CrsCode::Epsg4326 | CrsCode::Epsg4269 => AxisOrder::LatLon,
            _ => AxisOrder::XY,
        }
    }

    /// Check if this is a geographic (lon/lat) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(
            self,
            CrsCode::Crs84 | CrsCode::Epsg4326 | CrsCode::Epsg4269
        )
    }

    /// Units of the horizontal axes.
    pub fn units(&self) -> CrsUnits {
        if self.is_geographic() {
            CrsUnits::Degree
        } else {
            CrsUnits::Metre
        }
    }

    /// Coefficient converting CRS units into meters (OGC `metersPerUnit`).
    pub fn meters_per_unit(&self) -> f64 {
        match self.units() {
            CrsUnits::Metre => 1.0,
            CrsUnits::Degree => 2.0 * std::f64::consts::PI * WGS84_SEMI_MAJOR / 360.0,
        }
    }

    /// OGC URI form, e.g. `http://www.opengis.net/def/crs/EPSG/0/3857`.
    pub fn to_uri(&self) -> String {
        match self.epsg() {
            Some(code) => format!("http://www.opengis.net/def/crs/EPSG/0/{}", code),
            None => "http://www.opengis.net/def/crs/OGC/1.3/CRS84".to_string(),
        }
    }

    /// True when both codes name the same datum/projection and only differ in axis order.
    pub fn same_space(&self, other: &CrsCode) -> bool {
        self == other
            || matches!(
                (self, other),
                (CrsCode::Crs84, CrsCode::Epsg4326) | (CrsCode::Epsg4326, CrsCode::Crs84)
            )
    }
}

impl FromStr for CrsCode {
    type Err = TmsError;

    /// Accepts formats like:
    /// - "EPSG:4326" / "epsg:4326"
    /// - "CRS:84", "OGC:CRS84"
    /// - "http://www.opengis.net/def/crs/EPSG/0/3857"
    /// - "http://www.opengis.net/def/crs/OGC/1.3/CRS84"
    /// - "urn:ogc:def:crs:EPSG::3857"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let normalized = trimmed.to_uppercase();

        if matches!(
            normalized.as_str(),
            "CRS:84" | "CRS84" | "OGC:CRS84" | "URN:OGC:DEF:CRS:OGC:1.3:CRS84"
        ) || normalized.ends_with("/OGC/1.3/CRS84")
        {
            return Ok(CrsCode::Crs84);
        }

        let code = if let Some(code) = normalized.strip_prefix("EPSG:") {
            code
        } else if let Some(rest) = normalized.strip_prefix("URN:OGC:DEF:CRS:EPSG:") {
            // urn:ogc:def:crs:EPSG:<version>:<code>, version usually empty
            rest.rsplit(':').next().unwrap_or(rest)
        } else if normalized.contains("/DEF/CRS/EPSG/") {
            normalized.rsplit('/').next().unwrap_or("")
        } else {
            return Err(TmsError::InvalidParameter {
                param: "crs".to_string(),
                message: format!("unrecognised CRS identifier '{}'", trimmed),
            });
        };

        code.parse::<u32>()
            .map(CrsCode::from_epsg)
            .map_err(|_| TmsError::InvalidParameter {
                param: "crs".to_string(),
                message: format!("invalid EPSG code in '{}'", trimmed),
            })
    }
}

impl TryFrom<String> for CrsCode {
    type Error = TmsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CrsCode> for String {
    fn from(crs: CrsCode) -> Self {
        crs.to_string()
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.epsg() {
            Some(code) => write!(f, "EPSG:{}", code),
            None => write!(f, "OGC:CRS84"),
        }
    }
}

/// Axis order for coordinate interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisOrder {
    /// X (longitude/easting), Y (latitude/northing)
    XY,
    /// Y (latitude/northing), X (longitude/easting)
    LatLon,
}

impl AxisOrder {
    /// Interpret an `orderedAxes` declaration such as `["Lat", "Lon"]`.
    pub fn from_ordered_axes<S: AsRef<str>>(axes: &[S]) -> AxisOrder {
        match axes.first().map(|a| a.as_ref().to_uppercase()) {
            Some(first) if matches!(first.as_str(), "Y" | "LAT" | "N") => AxisOrder::LatLon,
            _ => AxisOrder::XY,
        }
    }

    /// Reorder an authority-ordered pair into (x, y).
    pub fn to_xy(&self, pair: (f64, f64)) -> (f64, f64) {
        match self {
            AxisOrder::XY => pair,
            AxisOrder::LatLon => (pair.1, pair.0),
        }
    }

    /// Reorder an (x, y) pair into authority order.
    pub fn from_xy(&self, pair: (f64, f64)) -> (f64, f64) {
        self.to_xy(pair)
    }
}

/// Horizontal units of a CRS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrsUnits {
    Metre,
    Degree,
}
