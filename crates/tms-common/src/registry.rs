//! Registry of tile matrix sets.
//!
//! Holds the well-known OGC sets plus any user definitions, keyed by
//! identifier. Definitions loaded from a directory are parsed lazily on first
//! access and cached.

use once_cell::sync::{Lazy, OnceCell};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::tile::TileMatrix;
use crate::{
    BoundingBox, CrsCode, TileMatrixSet, TileMatrixSetDocument, TmsError, TmsResult,
};

/// Half the equatorial circumference of the WGS84 sphere, in meters.
const MERCATOR_MAX_EXTENT: f64 = 20037508.342789244;

/// Zoom-0 cell size and scale denominator of the quad sets.
const MERCATOR_CELL_SIZE: f64 = 156543.03392804097;
const MERCATOR_SCALE: f64 = 559082264.0287178;
const GEOGRAPHIC_CELL_SIZE: f64 = 0.703125;
const GEOGRAPHIC_SCALE: f64 = 279541132.0143589;

/// Registry configuration.
#[derive(Debug, Clone, Default)]
pub struct RegistryConfig {
    /// Directory of additional TMS JSON documents (1.0 or 2.0)
    pub directory: Option<PathBuf>,
}

impl RegistryConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            directory: env::var("TILEMATRIXSET_DIRECTORY")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
        }
    }
}

#[derive(Debug)]
enum Source {
    Builtin(fn() -> TmsResult<TileMatrixSet>),
    File(PathBuf),
    Memory,
}

#[derive(Debug)]
struct Entry {
    source: Source,
    loaded: OnceCell<Arc<TileMatrixSet>>,
}

impl Entry {
    fn load(&self, identifier: &str) -> TmsResult<Arc<TileMatrixSet>> {
        self.loaded
            .get_or_try_init(|| {
                let tms = match &self.source {
                    Source::Builtin(build) => build()?,
                    Source::File(path) => {
                        debug!(identifier = %identifier, path = %path.display(), "Loading tile matrix set");
                        let stem = file_stem(path);
                        TileMatrixSetDocument::from_path(path)?.into_tile_matrix_set(stem.as_deref())?
                    }
                    Source::Memory => {
                        return Err(TmsError::UnknownIdentifier(identifier.to_string()))
                    }
                };
                Ok(Arc::new(tms))
            })
            .cloned()
    }
}

/// A collection of tile matrix sets addressable by identifier.
#[derive(Debug, Default)]
pub struct TileMatrixSets {
    entries: BTreeMap<String, Entry>,
}

impl TileMatrixSets {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in OGC sets.
    pub fn builtin() -> Self {
        let mut entries = BTreeMap::new();
        let builtins: [(&str, fn() -> TmsResult<TileMatrixSet>); 4] = [
            ("WebMercatorQuad", web_mercator_quad),
            ("WorldCRS84Quad", world_crs84_quad),
            ("WGS1984Quad", wgs1984_quad),
            ("WorldMercatorWGS84Quad", world_mercator_wgs84_quad),
        ];
        for (id, build) in builtins {
            entries.insert(
                id.to_string(),
                Entry {
                    source: Source::Builtin(build),
                    loaded: OnceCell::new(),
                },
            );
        }
        Self { entries }
    }

    /// Built-in sets plus the configured directory, if any.
    pub fn from_config(config: &RegistryConfig) -> TmsResult<Self> {
        let mut registry = Self::builtin();
        if let Some(dir) = &config.directory {
            registry.load_directory(dir)?;
        }
        Ok(registry)
    }

    /// Get a set by identifier.
    pub fn get(&self, identifier: &str) -> TmsResult<Arc<TileMatrixSet>> {
        self.entries
            .get(identifier)
            .ok_or_else(|| TmsError::UnknownIdentifier(identifier.to_string()))?
            .load(identifier)
    }

    /// Registered identifiers, sorted.
    pub fn list(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Register in-memory sets.
    ///
    /// Fails with `AlreadyRegistered` on the first identifier clash unless
    /// `overwrite` is set; nothing is registered in that case.
    pub fn register<I>(&mut self, sets: I, overwrite: bool) -> TmsResult<()>
    where
        I: IntoIterator<Item = TileMatrixSet>,
    {
        let sets: Vec<TileMatrixSet> = sets.into_iter().collect();
        if !overwrite {
            if let Some(clash) = sets.iter().find(|t| self.contains(t.identifier())) {
                return Err(TmsError::AlreadyRegistered(clash.identifier().to_string()));
            }
        }

        for tms in sets {
            if self.contains(tms.identifier()) {
                warn!(identifier = %tms.identifier(), "Overwriting tile matrix set");
            }
            self.entries.insert(
                tms.identifier().to_string(),
                Entry {
                    source: Source::Memory,
                    loaded: OnceCell::with_value(Arc::new(tms)),
                },
            );
        }
        Ok(())
    }

    /// Register every `*.json` file in `dir`, keyed by file stem.
    ///
    /// Files are only parsed when first requested. Returns the number of
    /// files registered.
    pub fn load_directory<P: AsRef<Path>>(&mut self, dir: P) -> TmsResult<usize> {
        let dir = dir.as_ref();
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().map(|e| e == "json").unwrap_or(false))
            .collect();
        paths.sort();

        let mut count = 0;
        for path in paths {
            let Some(identifier) = file_stem(&path) else {
                continue;
            };
            if self.contains(&identifier) {
                warn!(identifier = %identifier, path = %path.display(), "Overriding registered tile matrix set");
            }
            self.entries.insert(
                identifier,
                Entry {
                    source: Source::File(path),
                    loaded: OnceCell::new(),
                },
            );
            count += 1;
        }

        info!(directory = %dir.display(), count = count, "Registered tile matrix set definitions");
        Ok(count)
    }
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
}

static DEFAULT_REGISTRY: Lazy<TileMatrixSets> = Lazy::new(|| {
    let config = RegistryConfig::from_env();
    TileMatrixSets::from_config(&config).unwrap_or_else(|e| {
        warn!(error = %e, "Could not load TILEMATRIXSET_DIRECTORY, using built-in sets only");
        TileMatrixSets::builtin()
    })
});

/// Process-wide registry: built-ins plus `TILEMATRIXSET_DIRECTORY`.
pub fn default_registry() -> &'static TileMatrixSets {
    &DEFAULT_REGISTRY
}

/// Regular power-of-two levels shared by the built-in sets.
fn quad_levels(
    max_zoom: u32,
    origin: (f64, f64),
    cell_size: f64,
    scale_denominator: f64,
    root: (u32, u32),
) -> impl Iterator<Item = TileMatrix> {
    (0..=max_zoom).map(move |zoom| {
        let factor = (1u64 << zoom) as f64;
        TileMatrix {
            zoom,
            scale_denominator: scale_denominator / factor,
            cell_size: cell_size / factor,
            point_of_origin: origin,
            tile_width: 256,
            tile_height: 256,
            matrix_width: root.0 << zoom,
            matrix_height: root.1 << zoom,
        }
    })
}

fn web_mercator_quad() -> TmsResult<TileMatrixSet> {
    let e = MERCATOR_MAX_EXTENT;
    TileMatrixSet::builder("WebMercatorQuad", CrsCode::Epsg3857)
        .title("Google Maps Compatible for the World")
        .uri("http://www.opengis.net/def/tilematrixset/OGC/1.0/WebMercatorQuad")
        .well_known_scale_set("http://www.opengis.net/def/wkss/OGC/1.0/GoogleMapsCompatible")
        .bounding_box(BoundingBox::new(-e, -e, e, e))
        .matrices(quad_levels(24, (-e, e), MERCATOR_CELL_SIZE, MERCATOR_SCALE, (1, 1)))
        .require_quadtree(true)
        .build()
}

fn world_crs84_quad() -> TmsResult<TileMatrixSet> {
    TileMatrixSet::builder("WorldCRS84Quad", CrsCode::Crs84)
        .title("CRS84 for the World")
        .uri("http://www.opengis.net/def/tilematrixset/OGC/1.0/WorldCRS84Quad")
        .well_known_scale_set("http://www.opengis.net/def/wkss/OGC/1.0/GoogleCRS84Quad")
        .bounding_box(BoundingBox::new(-180.0, -90.0, 180.0, 90.0))
        .matrices(quad_levels(
            17,
            (-180.0, 90.0),
            GEOGRAPHIC_CELL_SIZE,
            GEOGRAPHIC_SCALE,
            (2, 1),
        ))
        .build()
}

fn wgs1984_quad() -> TmsResult<TileMatrixSet> {
    TileMatrixSet::builder("WGS1984Quad", CrsCode::Epsg4326)
        .title("EPSG:4326 for the World")
        .uri("http://www.opengis.net/def/tilematrixset/OGC/1.0/WGS1984Quad")
        .ordered_axes(vec!["Lat".to_string(), "Lon".to_string()])
        .bounding_box(BoundingBox::new(-180.0, -90.0, 180.0, 90.0))
        .matrices(quad_levels(
            17,
            (-180.0, 90.0),
            GEOGRAPHIC_CELL_SIZE,
            GEOGRAPHIC_SCALE,
            (2, 1),
        ))
        .build()
}

fn world_mercator_wgs84_quad() -> TmsResult<TileMatrixSet> {
    let e = MERCATOR_MAX_EXTENT;
    TileMatrixSet::builder("WorldMercatorWGS84Quad", CrsCode::Epsg3395)
        .title("World Mercator WGS84 (ellipsoid)")
        .uri("http://www.opengis.net/def/tilematrixset/OGC/1.0/WorldMercatorWGS84Quad")
        .well_known_scale_set("http://www.opengis.net/def/wkss/OGC/1.0/WorldMercatorWGS84")
        .bounding_box(BoundingBox::new(-e, -e, e, e))
        .matrices(quad_levels(24, (-e, e), MERCATOR_CELL_SIZE, MERCATOR_SCALE, (1, 1)))
        .require_quadtree(true)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_build() {
        let registry = TileMatrixSets::builtin();
        for id in registry.list() {
            let tms = registry.get(id).unwrap();
            assert_eq!(tms.identifier(), id);
        }
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_web_mercator_quad() {
        let tms = TileMatrixSets::builtin().get("WebMercatorQuad").unwrap();
        assert!(tms.is_quadtree());
        assert_eq!(tms.zoom_range().unwrap(), (0, 24));
        let m = tms.matrix_at(24).unwrap();
        assert_eq!(m.matrix_width, 1 << 24);
        assert!((m.cell_size - 0.009330691929342784).abs() < 1e-12);
    }

    #[test]
    fn test_world_crs84_quad_not_quadtree() {
        let tms = TileMatrixSets::builtin().get("WorldCRS84Quad").unwrap();
        assert!(!tms.is_quadtree());
        let m = tms.matrix_at(0).unwrap();
        assert_eq!((m.matrix_width, m.matrix_height), (2, 1));
    }

    #[test]
    fn test_unknown_identifier() {
        let result = TileMatrixSets::builtin().get("NoSuchSet");
        assert!(matches!(result, Err(TmsError::UnknownIdentifier(_))));
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = TileMatrixSets::builtin();
        let tms = web_mercator_quad().unwrap();
        assert!(matches!(
            registry.register([tms.clone()], false),
            Err(TmsError::AlreadyRegistered(_))
        ));
        registry.register([tms], true).unwrap();
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_load_directory() {
        let dir = tempfile::tempdir().unwrap();
        let wgs = TileMatrixSets::builtin().get("WGS1984Quad").unwrap();
        let mut doc = TileMatrixSetDocument::from(wgs.as_ref());
        doc.id = None;
        std::fs::write(dir.path().join("MyQuad.json"), doc.to_json_pretty().unwrap()).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut registry = TileMatrixSets::new();
        assert_eq!(registry.load_directory(dir.path()).unwrap(), 1);

        let tms = registry.get("MyQuad").unwrap();
        assert_eq!(tms.identifier(), "MyQuad");
        assert_eq!(tms.crs(), CrsCode::Epsg4326);
        assert_eq!(tms.matrix_at(0).unwrap().point_of_origin, (-180.0, 90.0));
    }

    #[test]
    fn test_bad_file_fails_on_get() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Broken.json"), "{not json").unwrap();

        let mut registry = TileMatrixSets::new();
        registry.load_directory(dir.path()).unwrap();
        assert!(matches!(
            registry.get("Broken"),
            Err(TmsError::InvalidDefinition(_))
        ));
    }
}
