//! Bounding box transformation between coordinate reference systems.

use tms_common::{BoundingBox, CrsCode, ProjectionError};

use crate::adapter::ProjectionAdapter;

/// Points sampled along each edge, corners included.
pub const DEFAULT_DENSIFY_POINTS: usize = 21;

/// Transform a bounding box into `to`, returning the envelope of a densified
/// boundary.
///
/// Projections bend straight edges, so the corners alone can under-estimate
/// the result. When the target is geographic and a pole of the source
/// projection lies inside the box, the envelope is extended to that pole
/// across all longitudes.
pub fn transform_bounds(
    adapter: &dyn ProjectionAdapter,
    bbox: &BoundingBox,
    from: CrsCode,
    to: CrsCode,
    densify_points: usize,
) -> Result<BoundingBox, ProjectionError> {
    if from.same_space(&to) {
        return Ok(bbox.with_crs(to));
    }

    let points = densify(bbox, densify_points.max(2));
    let mut projected = Vec::with_capacity(points.len());
    for (x, y) in points {
        projected.push(adapter.transform(from, to, x, y)?);
    }

    // `projected` is never empty: densify yields at least the 4 corners
    let mut envelope = BoundingBox::from_points(projected)
        .unwrap_or(*bbox)
        .with_crs(to);

    if adapter.is_geographic(to) && !adapter.is_geographic(from) {
        for pole in [90.0, -90.0] {
            if let Ok((px, py)) = adapter.forward(from, 0.0, pole) {
                if bbox.contains_point(px, py) {
                    envelope.min_x = -180.0;
                    envelope.max_x = 180.0;
                    if pole > 0.0 {
                        envelope.max_y = 90.0;
                    } else {
                        envelope.min_y = -90.0;
                    }
                }
            }
        }
    }

    Ok(envelope)
}

/// Sample `per_edge` evenly spaced points along each edge of `bbox`.
fn densify(bbox: &BoundingBox, per_edge: usize) -> Vec<(f64, f64)> {
    let steps = (per_edge - 1) as f64;
    let mut points = Vec::with_capacity(per_edge * 4);
    for i in 0..per_edge {
        let f = i as f64 / steps;
        let x = bbox.min_x + f * bbox.width();
        let y = bbox.min_y + f * bbox.height();
        points.push((x, bbox.min_y));
        points.push((x, bbox.max_y));
        points.push((bbox.min_x, y));
        points.push((bbox.max_x, y));
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BuiltinProjections;

    const MAX_EXTENT: f64 = 20037508.342789244;

    #[test]
    fn test_web_mercator_world_to_geographic() {
        let world = BoundingBox::new(-MAX_EXTENT, -MAX_EXTENT, MAX_EXTENT, MAX_EXTENT);
        let geo = transform_bounds(
            &BuiltinProjections,
            &world,
            CrsCode::Epsg3857,
            CrsCode::Crs84,
            DEFAULT_DENSIFY_POINTS,
        )
        .unwrap();

        assert!((geo.min_x + 180.0).abs() < 1e-9);
        assert!((geo.max_x - 180.0).abs() < 1e-9);
        assert!((geo.max_y - 85.0511287798066).abs() < 1e-9);
        assert_eq!(geo.crs, Some(CrsCode::Crs84));
    }

    #[test]
    fn test_densify_includes_corners() {
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 20.0);
        let points = densify(&bbox, 3);
        for corner in bbox.corners() {
            assert!(points.contains(&corner));
        }
        assert!(points.contains(&(5.0, 0.0)));
        assert!(points.contains(&(10.0, 10.0)));
    }

    #[test]
    fn test_pole_inside_polar_box() {
        let bbox = BoundingBox::new(-1_000_000.0, -1_000_000.0, 1_000_000.0, 1_000_000.0);
        let geo = transform_bounds(
            &BuiltinProjections,
            &bbox,
            CrsCode::Epsg3413,
            CrsCode::Epsg4326,
            DEFAULT_DENSIFY_POINTS,
        )
        .unwrap();

        assert_eq!(geo.max_y, 90.0);
        assert_eq!((geo.min_x, geo.max_x), (-180.0, 180.0));
        assert!(geo.min_y > 75.0 && geo.min_y < 82.0);
    }

    #[test]
    fn test_singularity_propagates() {
        let bbox = BoundingBox::new(-180.0, -90.0, 180.0, 90.0);
        let result = transform_bounds(
            &BuiltinProjections,
            &bbox,
            CrsCode::Crs84,
            CrsCode::Epsg3857,
            DEFAULT_DENSIFY_POINTS,
        );
        assert!(matches!(result, Err(ProjectionError::Singularity { .. })));
    }
}
