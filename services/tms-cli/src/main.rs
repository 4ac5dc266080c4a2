//! Tile Matrix Set command line tools.
//!
//! Resolves points and boxes to tiles, writes tile shapes as GeoJSON,
//! converts quadkeys, writes whole matrix levels as GeoJSON, and prints or
//! generates OGC TMS 2.0 definitions.
//! Input is read as JSON text lines from a file or stdin.

mod commands;

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use projection::BuiltinProjections;
use tile_resolver::{custom_from_extent, BoundingBox, CrsCode, FeatureOptions, Resolver};
use tms_common::{CornerOfOrigin, CustomOptions, RegistryConfig, TileMatrixSetDocument, TileMatrixSets};

use commands::{ShapesOptions, TilesOptions};

#[derive(Parser, Debug)]
#[command(name = "tms")]
#[command(about = "OGC Tile Matrix Set tools")]
struct Args {
    /// Tile matrix set identifier
    #[arg(long, global = true, env = "TMS_IDENTIFIER", default_value = "WebMercatorQuad")]
    identifier: String,

    /// Directory of additional TMS 2.0 JSON definitions
    #[arg(long, global = true, env = "TILEMATRIXSET_DIRECTORY")]
    tms_directory: Option<PathBuf>,

    /// Log level
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the tiles under points `[x, y]` or boxes `[w, s, e, n]`
    Tiles {
        /// Zoom level
        zoom: u32,

        /// Input file (default: stdin)
        input: Option<PathBuf>,

        /// CRS of the input coordinates
        #[arg(long, default_value = "CRS84")]
        crs: String,

        /// Write RS-delimited JSON text sequences
        #[arg(long)]
        seq: bool,

        /// Refuse boxes covering more tiles than this
        #[arg(long, default_value = "1000000")]
        max_tiles: u64,
    },

    /// Write GeoJSON features for tiles `[x, y, z]`
    Shapes {
        /// Input file (default: stdin)
        input: Option<PathBuf>,

        /// Output native CRS coordinates instead of longitude/latitude
        #[arg(long)]
        projected: bool,

        /// Decimal precision of coordinates
        #[arg(long)]
        precision: Option<u32>,

        /// Grow each shape by this amount, in output units
        #[arg(long, allow_negative_numbers = true)]
        buffer: Option<f64>,

        /// Write a single FeatureCollection
        #[arg(long)]
        collect: bool,

        /// Write "west south east north" lines instead of features
        #[arg(long)]
        extents: bool,

        /// Write RS-delimited JSON text sequences
        #[arg(long)]
        seq: bool,
    },

    /// Convert tiles `[x, y, z]` to quadkeys and quadkeys to tiles
    Quadkey {
        /// Input file (default: stdin)
        input: Option<PathBuf>,
    },

    /// Write every tile of one matrix level as GeoJSON
    TmsToGeojson {
        /// Zoom/matrix level
        #[arg(long)]
        level: u32,

        /// Output native CRS coordinates instead of longitude/latitude
        #[arg(long)]
        projected: bool,

        /// Decimal precision of coordinates
        #[arg(long)]
        precision: Option<u32>,

        /// Grow each shape by this amount, in output units
        #[arg(long, allow_negative_numbers = true)]
        buffer: Option<f64>,

        /// Write a single FeatureCollection
        #[arg(long)]
        collect: bool,

        /// Write "west south east north" lines instead of features
        #[arg(long)]
        extents: bool,

        /// Write RS-delimited JSON text sequences
        #[arg(long)]
        seq: bool,
    },

    /// Print the TMS 2.0 definition of the selected set
    Tms,

    /// List the registered tile matrix sets
    List,

    /// Generate a regular tile matrix set from an extent
    Custom {
        /// EPSG code of the tile matrix set CRS
        #[arg(long)]
        epsg: u32,

        /// Extent as west south east north
        #[arg(long, num_args = 4, allow_negative_numbers = true, required = true)]
        extent: Vec<f64>,

        /// EPSG code of the extent (default: the set CRS)
        #[arg(long)]
        extent_epsg: Option<u32>,

        /// Identifier of the new set
        #[arg(long, default_value = "Custom")]
        name: String,

        /// Title of the new set
        #[arg(long)]
        title: Option<String>,

        #[arg(long, default_value = "0")]
        minzoom: u32,

        #[arg(long, default_value = "24")]
        maxzoom: u32,

        #[arg(long, default_value = "256")]
        tile_width: u32,

        #[arg(long, default_value = "256")]
        tile_height: u32,

        /// Root tiles along x and y
        #[arg(long, num_args = 2, default_values_t = [1u32, 1u32])]
        matrix_scale: Vec<u32>,

        /// Put tile (0, 0) at the bottom-left corner
        #[arg(long)]
        bottom_left: bool,
    },
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args.log_level, args.log_json)?;

    let mut config = RegistryConfig::from_env();
    if args.tms_directory.is_some() {
        config.directory = args.tms_directory.clone();
    }
    let registry = TileMatrixSets::from_config(&config)?;
    debug!(sets = registry.len(), "Loaded tile matrix set registry");

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match args.command {
        Command::Tiles {
            zoom,
            input,
            crs,
            seq,
            max_tiles,
        } => {
            let tms = registry.get(&args.identifier)?;
            let resolver = Resolver::new(&tms);
            let options = TilesOptions {
                zoom,
                crs: crs.parse::<CrsCode>()?,
                seq,
                max_tiles,
            };
            commands::tiles(&resolver, open_input(input.as_ref())?, &mut out, &options)?;
        }
        Command::Shapes {
            input,
            projected,
            precision,
            buffer,
            collect,
            extents,
            seq,
        } => {
            let tms = registry.get(&args.identifier)?;
            let resolver = Resolver::new(&tms);
            let options = ShapesOptions {
                feature: FeatureOptions {
                    projected,
                    buffer,
                    precision,
                    ..FeatureOptions::default()
                },
                seq,
                collect,
                extents,
            };
            commands::shapes(&resolver, open_input(input.as_ref())?, &mut out, &options)?;
        }
        Command::TmsToGeojson {
            level,
            projected,
            precision,
            buffer,
            collect,
            extents,
            seq,
        } => {
            let tms = registry.get(&args.identifier)?;
            let resolver = Resolver::new(&tms);
            let options = ShapesOptions {
                feature: FeatureOptions {
                    projected,
                    buffer,
                    precision,
                    ..FeatureOptions::default()
                },
                seq,
                collect,
                extents,
            };
            commands::tms_to_geojson(&resolver, level, &mut out, &options)?;
        }
        Command::Quadkey { input } => {
            let tms = registry.get(&args.identifier)?;
            let resolver = Resolver::new(&tms);
            commands::quadkeys(&resolver, open_input(input.as_ref())?, &mut out)?;
        }
        Command::Tms => {
            let tms = registry.get(&args.identifier)?;
            let doc = TileMatrixSetDocument::from(tms.as_ref());
            writeln!(out, "{}", doc.to_json_pretty()?)?;
        }
        Command::List => {
            for identifier in registry.list() {
                writeln!(out, "{}", identifier)?;
            }
        }
        Command::Custom {
            epsg,
            extent,
            extent_epsg,
            name,
            title,
            minzoom,
            maxzoom,
            tile_width,
            tile_height,
            matrix_scale,
            bottom_left,
        } => {
            let crs = CrsCode::from_epsg(epsg);
            let extent_crs = extent_epsg.map(CrsCode::from_epsg).unwrap_or(crs);
            let bbox = BoundingBox::new(extent[0], extent[1], extent[2], extent[3]);
            let options = CustomOptions {
                identifier: name,
                title,
                tile_width,
                tile_height,
                matrix_scale: [matrix_scale[0], matrix_scale[1]],
                min_zoom: minzoom,
                max_zoom: maxzoom,
                corner_of_origin: if bottom_left {
                    CornerOfOrigin::BottomLeft
                } else {
                    CornerOfOrigin::TopLeft
                },
                ordered_axes: None,
            };
            let tms = custom_from_extent(&bbox, extent_crs, crs, &options, &BuiltinProjections)?;
            let doc = TileMatrixSetDocument::from(&tms);
            writeln!(out, "{}", doc.to_json_pretty()?)?;
        }
    }

    out.flush()?;
    Ok(())
}

/// Install a stderr subscriber so stdout stays clean for data.
fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn open_input(path: Option<&PathBuf>) -> Result<Box<dyn BufRead>> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}
