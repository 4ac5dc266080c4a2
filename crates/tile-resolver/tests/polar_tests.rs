//! Tests against a polar stereographic set loaded from a definition file.

use test_utils::{assert_approx_eq, require_test_file};
use tile_resolver::{BoundingBox, CrsCode, Resolver, Tile};
use tms_common::TileMatrixSetDocument;

fn load_antarctic() -> Option<tms_common::TileMatrixSet> {
    let path = test_utils::find_test_file("AntarcticPolarQuad.json")?;
    let doc = TileMatrixSetDocument::from_path(path).ok()?;
    doc.into_tile_matrix_set(None).ok()
}

#[test]
fn test_load_definition() {
    let path = require_test_file!("AntarcticPolarQuad.json");
    let doc = TileMatrixSetDocument::from_path(&path).unwrap();
    let tms = doc.into_tile_matrix_set(None).unwrap();

    assert_eq!(tms.identifier(), "AntarcticPolarQuad");
    assert_eq!(tms.crs(), CrsCode::Epsg3031);
    assert!(tms.is_quadtree());
    assert_eq!(tms.zoom_range().unwrap(), (0, 6));
}

#[test]
fn test_south_pole_is_the_center() {
    let Some(tms) = load_antarctic() else {
        eprintln!("SKIPPED: AntarcticPolarQuad.json not found");
        return;
    };
    let resolver = Resolver::new(&tms);

    // the pole sits on the shared corner of the four zoom-1 tiles
    assert_eq!(resolver.tile(0.0, -90.0, 1, false).unwrap(), Tile::new(1, 1, 1));
    assert!(resolver.tile(0.0, 90.0, 1, false).is_err());
}

#[test]
fn test_geographic_bounds_include_pole() {
    let Some(tms) = load_antarctic() else {
        eprintln!("SKIPPED: AntarcticPolarQuad.json not found");
        return;
    };
    let resolver = Resolver::new(&tms);

    let bounds = resolver.bounds(&Tile::new(0, 0, 0)).unwrap();
    assert_eq!(bounds.min_x, -180.0);
    assert_eq!(bounds.max_x, 180.0);
    assert_eq!(bounds.min_y, -90.0);
    // the grid corners are the points farthest from the pole
    assert_approx_eq!(bounds.max_y, -38.94, 0.05);
}

#[test]
fn test_polar_cap_query() {
    let Some(tms) = load_antarctic() else {
        eprintln!("SKIPPED: AntarcticPolarQuad.json not found");
        return;
    };
    let resolver = Resolver::new(&tms);

    // lat -80 is ~1089 km from the pole, inside the central 2 x 2 tiles at zoom 2
    let cap = BoundingBox::new(-180.0, -90.0, 180.0, -80.0);
    let cover = resolver
        .tiles_for_bounding_box(&cap, 2, CrsCode::Crs84)
        .unwrap();
    assert_eq!(
        cover.iter().collect::<Vec<_>>(),
        vec![
            Tile::new(1, 1, 2),
            Tile::new(2, 1, 2),
            Tile::new(1, 2, 2),
            Tile::new(2, 2, 2)
        ]
    );
}
