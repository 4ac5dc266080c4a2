//! Benchmarks for tile resolution.
//!
//! Run with: cargo bench --package tile-resolver --bench resolver_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use tile_resolver::{BoundingBox, CrsCode, LookupMode, Resolver, Tile};
use tms_common::TileMatrixSets;

/// Random longitude/latitude pairs inside the Web Mercator latitude range.
fn generate_points(count: usize) -> Vec<(f64, f64)> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| (rng.gen_range(-180.0..180.0), rng.gen_range(-85.0..85.0)))
        .collect()
}

/// Random valid tiles at one zoom of a square quadtree.
fn generate_tiles(count: usize, zoom: u32) -> Vec<Tile> {
    let mut rng = rand::thread_rng();
    let n = 1u32 << zoom;
    (0..count)
        .map(|_| Tile::new(rng.gen_range(0..n), rng.gen_range(0..n), zoom))
        .collect()
}

// =============================================================================
// POINT -> TILE BENCHMARKS
// =============================================================================

fn bench_point_to_tile(c: &mut Criterion) {
    let mut group = c.benchmark_group("point_to_tile");
    let tms = TileMatrixSets::builtin().get("WebMercatorQuad").unwrap();
    let resolver = Resolver::new(&tms);
    let points = generate_points(1000);

    group.throughput(Throughput::Elements(points.len() as u64));

    group.bench_function("native_1000", |b| {
        let native: Vec<(f64, f64)> = points
            .iter()
            .map(|&(lng, lat)| resolver.xy(lng, lat, false).unwrap())
            .collect();
        b.iter(|| {
            for &(x, y) in &native {
                black_box(
                    resolver
                        .point_to_tile(x, y, 14, CrsCode::Epsg3857, LookupMode::Lenient)
                        .unwrap(),
                );
            }
        });
    });

    group.bench_function("geographic_1000", |b| {
        b.iter(|| {
            for &(lng, lat) in &points {
                black_box(resolver.tile(lng, lat, 14, false).unwrap());
            }
        });
    });

    group.finish();
}

// =============================================================================
// TILE -> BOUNDS BENCHMARKS
// =============================================================================

fn bench_tile_bounds(c: &mut Criterion) {
    let mut group = c.benchmark_group("tile_bounds");
    let tms = TileMatrixSets::builtin().get("WebMercatorQuad").unwrap();
    let resolver = Resolver::new(&tms);
    let tiles = generate_tiles(1000, 12);

    group.throughput(Throughput::Elements(tiles.len() as u64));

    group.bench_function("native", |b| {
        b.iter(|| {
            for tile in &tiles {
                black_box(resolver.tile_to_bounds(tile).unwrap());
            }
        });
    });

    group.bench_function("geographic", |b| {
        b.iter(|| {
            for tile in &tiles {
                black_box(resolver.bounds(tile).unwrap());
            }
        });
    });

    group.finish();
}

// =============================================================================
// BBOX ENUMERATION BENCHMARKS
// =============================================================================

fn bench_bbox_enumeration(c: &mut Criterion) {
    let mut group = c.benchmark_group("bbox_enumeration");
    let tms = TileMatrixSets::builtin().get("WebMercatorQuad").unwrap();
    let resolver = Resolver::new(&tms);
    let conus = BoundingBox::new(-130.0, 20.0, -60.0, 55.0);

    for zoom in [4u32, 8, 10] {
        group.bench_with_input(BenchmarkId::new("conus", zoom), &zoom, |b, &zoom| {
            b.iter(|| {
                let cover = resolver
                    .tiles_for_bounding_box(black_box(&conus), zoom, CrsCode::Crs84)
                    .unwrap();
                black_box(cover.iter().count())
            });
        });
    }

    group.finish();
}

// =============================================================================
// QUADKEY BENCHMARKS
// =============================================================================

fn bench_quadkey(c: &mut Criterion) {
    let mut group = c.benchmark_group("quadkey");
    let tms = TileMatrixSets::builtin().get("WebMercatorQuad").unwrap();
    let resolver = Resolver::new(&tms);
    let tiles = generate_tiles(1000, 18);
    let keys: Vec<String> = tiles.iter().map(|t| resolver.quadkey(t).unwrap()).collect();

    group.throughput(Throughput::Elements(tiles.len() as u64));

    group.bench_function("encode", |b| {
        b.iter(|| {
            for tile in &tiles {
                black_box(resolver.quadkey(tile).unwrap());
            }
        });
    });

    group.bench_function("decode", |b| {
        b.iter(|| {
            for key in &keys {
                black_box(resolver.quadkey_to_tile(key).unwrap());
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_point_to_tile,
    bench_tile_bounds,
    bench_bbox_enumeration,
    bench_quadkey,
);
criterion_main!(benches);
