//! OGC Tile Matrix Set 2.0 JSON documents.
//!
//! The document keeps coordinates in the CRS authority axis order (for
//! EPSG:4326 that is lat/lon); conversion to and from [`TileMatrixSet`]
//! normalises everything to (x, y). Version 1.0 documents are upgraded to
//! the 2.0 layout when parsed.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::crs::AxisOrder;
use crate::tile::{CornerOfOrigin, TileMatrix};
use crate::{BoundingBox, CrsCode, TileMatrixSet, TmsError, TmsResult};

/// A CRS reference: either a plain string or `{"uri": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CrsReference {
    Uri { uri: String },
    Text(String),
}

impl CrsReference {
    pub fn as_str(&self) -> &str {
        match self {
            CrsReference::Uri { uri } => uri,
            CrsReference::Text(text) => text,
        }
    }

    pub fn to_crs(&self) -> TmsResult<CrsCode> {
        self.as_str().parse()
    }
}

/// `boundingBox` member of a TMS document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBoxDocument {
    pub lower_left: [f64; 2],
    pub upper_right: [f64; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crs: Option<CrsReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordered_axes: Option<Vec<String>>,
}

/// One entry of `tileMatrices`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TileMatrixDocument {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(default)]
    pub scale_denominator: f64,
    #[serde(default)]
    pub cell_size: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corner_of_origin: Option<CornerOfOrigin>,
    pub point_of_origin: [f64; 2],
    pub tile_width: u32,
    pub tile_height: u32,
    pub matrix_width: u32,
    pub matrix_height: u32,
}

/// A complete TMS 2.0 document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileMatrixSetDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    pub crs: CrsReference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordered_axes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub well_known_scale_set: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBoxDocument>,
    pub tile_matrices: Vec<TileMatrixDocument>,
}

/// `boundingBox` member of a TMS 1.0 document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoundingBoxV1 {
    lower_corner: [f64; 2],
    upper_corner: [f64; 2],
    #[serde(default)]
    crs: Option<CrsReference>,
}

/// One entry of a TMS 1.0 `tileMatrix` list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TileMatrixV1 {
    identifier: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, rename = "abstract")]
    description: Option<String>,
    #[serde(default)]
    keywords: Option<Vec<String>>,
    scale_denominator: f64,
    top_left_corner: [f64; 2],
    tile_width: u32,
    tile_height: u32,
    matrix_width: u32,
    matrix_height: u32,
}

/// A TMS 1.0 document, as published before the 2.0 revision.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TileMatrixSetV1 {
    identifier: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, rename = "abstract")]
    description: Option<String>,
    #[serde(rename = "supportedCRS")]
    supported_crs: CrsReference,
    #[serde(default)]
    well_known_scale_set: Option<String>,
    #[serde(default)]
    bounding_box: Option<BoundingBoxV1>,
    tile_matrix: Vec<TileMatrixV1>,
}

impl TileMatrixSetV1 {
    /// Rename members to their 2.0 names and derive `cellSize` from the
    /// scale denominator (0.28 mm pixels).
    fn upgrade(self) -> TmsResult<TileMatrixSetDocument> {
        let mpu = self.supported_crs.to_crs()?.meters_per_unit();
        let tile_matrices = self
            .tile_matrix
            .into_iter()
            .map(|m| TileMatrixDocument {
                id: m.identifier,
                title: m.title,
                description: m.description,
                keywords: m.keywords,
                scale_denominator: m.scale_denominator,
                cell_size: m.scale_denominator * 0.00028 / mpu,
                corner_of_origin: None,
                point_of_origin: m.top_left_corner,
                tile_width: m.tile_width,
                tile_height: m.tile_height,
                matrix_width: m.matrix_width,
                matrix_height: m.matrix_height,
            })
            .collect();

        Ok(TileMatrixSetDocument {
            id: Some(self.identifier),
            title: self.title,
            description: self.description,
            uri: None,
            crs: self.supported_crs,
            ordered_axes: None,
            well_known_scale_set: self.well_known_scale_set,
            bounding_box: self.bounding_box.map(|b| BoundingBoxDocument {
                lower_left: b.lower_corner,
                upper_right: b.upper_corner,
                crs: b.crs,
                ordered_axes: None,
            }),
            tile_matrices,
        })
    }
}

fn is_v1(value: &serde_json::Value) -> bool {
    value.get("supportedCRS").is_some() || value.get("tileMatrix").is_some()
}

impl TileMatrixSetDocument {
    /// Parse a document from JSON text. TMS 1.0 documents are upgraded.
    pub fn from_json(json: &str) -> TmsResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if is_v1(&value) {
            return Self::upgrade_v1(value);
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Parse a TMS 1.0 document and convert it to the 2.0 layout.
    pub fn from_v1_json(json: &str) -> TmsResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if !is_v1(&value) {
            return Err(TmsError::InvalidDefinition(
                "expected a version 1.0 document with 'supportedCRS' and 'tileMatrix'".to_string(),
            ));
        }
        Self::upgrade_v1(value)
    }

    fn upgrade_v1(value: serde_json::Value) -> TmsResult<Self> {
        let v1: TileMatrixSetV1 = serde_json::from_value(value)?;
        debug!(identifier = %v1.identifier, "Upgrading TMS 1.0 document");
        v1.upgrade()
    }

    /// Read a document from a file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> TmsResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn to_json_pretty(&self) -> TmsResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate the document into a [`TileMatrixSet`].
    ///
    /// `fallback_id` names the set when the document carries no `id`
    /// (the registry passes the file stem).
    pub fn into_tile_matrix_set(self, fallback_id: Option<&str>) -> TmsResult<TileMatrixSet> {
        let crs = self.crs.to_crs()?;
        let axis_order = match &self.ordered_axes {
            Some(axes) => AxisOrder::from_ordered_axes(axes),
            None => crs.axis_order(),
        };

        let identifier = self
            .id
            .or_else(|| fallback_id.map(str::to_string))
            .ok_or_else(|| TmsError::InvalidDefinition("missing 'id'".to_string()))?;

        let corner = set_corner(&self.tile_matrices)?;

        let mut matrices = Vec::with_capacity(self.tile_matrices.len());
        for doc in self.tile_matrices {
            let zoom = doc.id.parse::<u32>().map_err(|_| {
                TmsError::InvalidDefinition(format!(
                    "tile matrix id '{}' must be a non-negative integer",
                    doc.id
                ))
            })?;
            let origin = axis_order.to_xy((doc.point_of_origin[0], doc.point_of_origin[1]));
            matrices.push(TileMatrix {
                zoom,
                scale_denominator: doc.scale_denominator,
                cell_size: doc.cell_size,
                point_of_origin: origin,
                tile_width: doc.tile_width,
                tile_height: doc.tile_height,
                matrix_width: doc.matrix_width,
                matrix_height: doc.matrix_height,
            });
        }

        let mut builder = TileMatrixSet::builder(identifier, crs)
            .corner_of_origin(corner)
            .matrices(matrices);

        if let Some(title) = self.title {
            builder = builder.title(title);
        }
        if let Some(uri) = self.uri {
            builder = builder.uri(uri);
        }
        if let Some(wkss) = self.well_known_scale_set {
            builder = builder.well_known_scale_set(wkss);
        }
        if let Some(axes) = self.ordered_axes {
            builder = builder.ordered_axes(axes);
        }
        if let Some(bbox) = self.bounding_box {
            let bbox_order = match &bbox.ordered_axes {
                Some(axes) => AxisOrder::from_ordered_axes(axes),
                None => axis_order,
            };
            let (x0, y0) = bbox_order.to_xy((bbox.lower_left[0], bbox.lower_left[1]));
            let (x1, y1) = bbox_order.to_xy((bbox.upper_right[0], bbox.upper_right[1]));
            builder = builder.bounding_box(BoundingBox::new(
                x0.min(x1),
                y0.min(y1),
                x0.max(x1),
                y0.max(y1),
            ));
        }

        builder.build()
    }
}

/// Per-matrix corners must agree; the set carries a single convention.
fn set_corner(matrices: &[TileMatrixDocument]) -> TmsResult<CornerOfOrigin> {
    let mut corners = matrices.iter().filter_map(|m| m.corner_of_origin);
    let first = corners.next().unwrap_or_default();
    if corners.any(|c| c != first) {
        return Err(TmsError::InvalidDefinition(
            "mixed cornerOfOrigin values across tile matrices are not supported".to_string(),
        ));
    }
    Ok(first)
}

impl From<&TileMatrixSet> for TileMatrixSetDocument {
    fn from(tms: &TileMatrixSet) -> Self {
        let axis_order = match tms.ordered_axes() {
            Some(axes) => AxisOrder::from_ordered_axes(axes),
            None => tms.crs().axis_order(),
        };
        let corner = tms.corner_of_origin();
        let bbox = tms.bounding_box();
        let ll = axis_order.from_xy((bbox.min_x, bbox.min_y));
        let ur = axis_order.from_xy((bbox.max_x, bbox.max_y));

        let tile_matrices = tms
            .iter()
            .map(|m| {
                let origin = axis_order.from_xy(m.point_of_origin);
                TileMatrixDocument {
                    id: m.zoom.to_string(),
                    title: None,
                    description: None,
                    keywords: None,
                    scale_denominator: m.scale_denominator,
                    cell_size: m.cell_size,
                    corner_of_origin: match corner {
                        CornerOfOrigin::TopLeft => None,
                        CornerOfOrigin::BottomLeft => Some(CornerOfOrigin::BottomLeft),
                    },
                    point_of_origin: [origin.0, origin.1],
                    tile_width: m.tile_width,
                    tile_height: m.tile_height,
                    matrix_width: m.matrix_width,
                    matrix_height: m.matrix_height,
                }
            })
            .collect();

        TileMatrixSetDocument {
            id: Some(tms.identifier().to_string()),
            title: tms.title().map(str::to_string),
            description: None,
            uri: tms.uri().map(str::to_string),
            crs: CrsReference::Text(tms.crs().to_uri()),
            ordered_axes: tms.ordered_axes().map(<[String]>::to_vec),
            well_known_scale_set: tms.well_known_scale_set().map(str::to_string),
            bounding_box: Some(BoundingBoxDocument {
                lower_left: [ll.0, ll.1],
                upper_right: [ur.0, ur.1],
                crs: Some(CrsReference::Text(tms.crs().to_uri())),
                ordered_axes: None,
            }),
            tile_matrices,
        }
    }
}
