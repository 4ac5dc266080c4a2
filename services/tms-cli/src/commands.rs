//! Line-oriented command implementations.
//!
//! Every command reads JSON text lines from a reader and writes lines to a
//! writer, so the same code serves files, stdin and tests. Lines may carry
//! a leading RS (0x1E) separator as written by `--seq`.

use std::io::{BufRead, Write};

use anyhow::{anyhow, bail, Context, Result};
use serde_json::{json, Value};
use tracing::debug;

use tile_resolver::{BoundingBox, CrsCode, FeatureOptions, LookupMode, Resolver, Tile, TileRange};

/// ASCII record separator used by RFC 8142 JSON text sequences.
const RS: char = '\u{1e}';

/// A geographic or projected input: a point or a box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Point(f64, f64),
    Bbox(BoundingBox),
}

/// Options for [`tiles`].
#[derive(Debug, Clone, Copy)]
pub struct TilesOptions {
    pub zoom: u32,
    pub crs: CrsCode,
    pub seq: bool,
    /// Refuse boxes that would enumerate more tiles than this.
    pub max_tiles: u64,
}

/// Options for [`shapes`].
#[derive(Debug, Clone, Default)]
pub struct ShapesOptions {
    pub feature: FeatureOptions,
    pub seq: bool,
    pub collect: bool,
    pub extents: bool,
}

/// Non-empty input lines with their 1-based line numbers.
fn records<R: BufRead>(reader: R) -> impl Iterator<Item = Result<(usize, String)>> {
    reader.lines().enumerate().filter_map(|(i, line)| match line {
        Ok(line) => {
            let text = line.trim().trim_start_matches(RS).trim().to_string();
            (!text.is_empty()).then_some(Ok((i + 1, text)))
        }
        Err(e) => Some(Err(e.into())),
    })
}

fn write_record<W: Write>(writer: &mut W, text: &str, seq: bool) -> Result<()> {
    if seq {
        write!(writer, "{}", RS)?;
    }
    writeln!(writer, "{}", text)?;
    Ok(())
}

fn numbers(values: &[Value]) -> Option<Vec<f64>> {
    values.iter().map(Value::as_f64).collect()
}

/// Parse `[x, y]`, `[x, y, z]`, `[w, s, e, n]` or an object with a `bbox`.
pub fn parse_shape(text: &str) -> Result<Shape> {
    let value: Value = serde_json::from_str(text)?;
    let coords = match &value {
        Value::Array(items) => numbers(items),
        Value::Object(members) => members
            .get("bbox")
            .and_then(Value::as_array)
            .and_then(|items| numbers(items)),
        _ => None,
    }
    .ok_or_else(|| anyhow!("expected a coordinate array or an object with a bbox"))?;

    match coords.as_slice() {
        [x, y] | [x, y, _] => Ok(Shape::Point(*x, *y)),
        [w, s, e, n] => Ok(Shape::Bbox(BoundingBox::new(*w, *s, *e, *n))),
        other => bail!("expected 2, 3 or 4 coordinates, got {}", other.len()),
    }
}

/// Parse `[x, y, z]` or an object with a `tile` member holding one.
pub fn parse_tile(text: &str) -> Result<Tile> {
    let value: Value = serde_json::from_str(text)?;
    let items = match &value {
        Value::Object(members) => members.get("tile").cloned().unwrap_or(Value::Null),
        other => other.clone(),
    };
    let xyz: [u32; 3] =
        serde_json::from_value(items).context("expected a tile as [x, y, z]")?;
    Ok(Tile::from(xyz))
}

/// Write the tiles under each input point or box.
pub fn tiles<R: BufRead, W: Write>(
    resolver: &Resolver<'_>,
    reader: R,
    writer: &mut W,
    options: &TilesOptions,
) -> Result<u64> {
    let mut written = 0u64;
    for record in records(reader) {
        let (line, text) = record?;
        let shape = parse_shape(&text).with_context(|| format!("line {}", line))?;

        match shape {
            Shape::Point(x, y) => {
                let tile = resolver
                    .point_to_tile(x, y, options.zoom, options.crs, LookupMode::Lenient)
                    .with_context(|| format!("line {}", line))?;
                write_record(writer, &json!(tile.to_array()).to_string(), options.seq)?;
                written += 1;
            }
            Shape::Bbox(bbox) => {
                let cover = resolver
                    .tiles_for_bounding_box(&bbox, options.zoom, options.crs)
                    .with_context(|| format!("line {}", line))?;
                if cover.len() > options.max_tiles {
                    bail!(
                        "line {}: {} tiles exceed the limit of {}",
                        line,
                        cover.len(),
                        options.max_tiles
                    );
                }
                for tile in &cover {
                    write_record(writer, &json!(tile.to_array()).to_string(), options.seq)?;
                }
                written += cover.len();
            }
        }
    }
    debug!(tiles = written, "Wrote tiles");
    Ok(written)
}

/// Write a GeoJSON feature (or extent line) for each input tile.
pub fn shapes<R: BufRead, W: Write>(
    resolver: &Resolver<'_>,
    reader: R,
    writer: &mut W,
    options: &ShapesOptions,
) -> Result<u64> {
    let tiles = records(reader).map(|record| {
        let (line, text) = record?;
        parse_tile(&text).with_context(|| format!("line {}", line))
    });
    write_shapes(resolver, tiles, writer, options)
}

/// Write every tile of one matrix level as shapes.
pub fn tms_to_geojson<W: Write>(
    resolver: &Resolver<'_>,
    level: u32,
    writer: &mut W,
    options: &ShapesOptions,
) -> Result<u64> {
    let matrix = resolver.tms().matrix_at(level)?;
    let range = TileRange::full(matrix);
    debug!(level, tiles = range.len(), "Writing tile matrix");
    write_shapes(resolver, range.iter().map(Ok), writer, options)
}

fn write_shapes<I, W>(
    resolver: &Resolver<'_>,
    tiles: I,
    writer: &mut W,
    options: &ShapesOptions,
) -> Result<u64>
where
    I: IntoIterator<Item = Result<Tile>>,
    W: Write,
{
    let mut collected = Vec::new();
    let mut written = 0u64;

    for tile in tiles {
        let tile = tile?;
        let feature = resolver
            .feature(&tile, &options.feature)
            .with_context(|| format!("tile {}", tile))?;
        written += 1;

        if options.extents {
            let extent = feature["bbox"]
                .as_array()
                .map(|values| {
                    values
                        .iter()
                        .map(|v| v.to_string())
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .unwrap_or_default();
            write_record(writer, &extent, options.seq)?;
        } else if options.collect {
            collected.push(feature);
        } else {
            write_record(writer, &feature.to_string(), options.seq)?;
        }
    }

    if options.collect && !options.extents {
        let collection = json!({"type": "FeatureCollection", "features": collected});
        write_record(writer, &collection.to_string(), options.seq)?;
    }
    Ok(written)
}

/// Convert `[x, y, z]` lines to quadkeys and quadkey lines to `[x, y, z]`.
pub fn quadkeys<R: BufRead, W: Write>(
    resolver: &Resolver<'_>,
    reader: R,
    writer: &mut W,
) -> Result<()> {
    for record in records(reader) {
        let (line, text) = record?;
        let output = if text.starts_with('[') || text.starts_with('{') {
            let tile = parse_tile(&text).with_context(|| format!("line {}", line))?;
            resolver
                .quadkey(&tile)
                .with_context(|| format!("line {}", line))?
        } else {
            let quadkey = text.trim_matches('"');
            let tile = resolver
                .quadkey_to_tile(quadkey)
                .with_context(|| format!("line {}", line))?;
            json!(tile.to_array()).to_string()
        };
        write_record(writer, &output, false)?;
    }
    Ok(())
}
