//! Zoom level selection from a target resolution.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use tms_common::{TmsError, TmsResult};

use crate::resolver::Resolver;

/// Relative tolerance under which a resolution matches a level exactly.
const RESOLUTION_TOLERANCE: f64 = 1e-8;

/// How to pick a zoom when the resolution falls between two levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoomLevelStrategy {
    /// The coarser level (fewer, larger pixels).
    Lower,
    /// The finer level.
    Upper,
    /// Whichever level is closer on a log scale.
    #[default]
    Auto,
}

impl FromStr for ZoomLevelStrategy {
    type Err = TmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lower" => Ok(ZoomLevelStrategy::Lower),
            "upper" => Ok(ZoomLevelStrategy::Upper),
            "auto" => Ok(ZoomLevelStrategy::Auto),
            _ => Err(TmsError::InvalidParameter {
                param: "zoom_level_strategy".to_string(),
                message: format!("expected lower, upper or auto, got '{}'", s),
            }),
        }
    }
}

impl Resolver<'_> {
    /// Zoom level matching `resolution` (native units per pixel).
    ///
    /// The search is limited to `[min_zoom, max_zoom]`, defaulting to the
    /// whole set. A resolution finer than every searched level gives the
    /// finest level; one coarser than every level gives the coarsest.
    pub fn zoom_for_resolution(
        &self,
        resolution: f64,
        strategy: ZoomLevelStrategy,
        min_zoom: Option<u32>,
        max_zoom: Option<u32>,
    ) -> TmsResult<u32> {
        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(TmsError::InvalidParameter {
                param: "resolution".to_string(),
                message: format!("must be a positive number, got {}", resolution),
            });
        }

        let min_zoom = min_zoom.unwrap_or_else(|| self.tms().min_zoom());
        let max_zoom = max_zoom.unwrap_or_else(|| self.tms().max_zoom());
        let levels: Vec<_> = self
            .tms()
            .iter()
            .filter(|m| (min_zoom..=max_zoom).contains(&m.zoom))
            .collect();

        let Some(last) = levels.last() else {
            return Err(TmsError::InvalidParameter {
                param: "zoom".to_string(),
                message: format!("no zoom levels between {} and {}", min_zoom, max_zoom),
            });
        };

        // first level at least as fine as the request
        let Some(pos) = levels.iter().position(|m| {
            resolution > m.cell_size || same_resolution(resolution, m.cell_size)
        }) else {
            return Ok(last.zoom);
        };

        let finer = levels[pos];
        if pos == 0 || same_resolution(resolution, finer.cell_size) {
            return Ok(finer.zoom);
        }
        let coarser = levels[pos - 1];

        Ok(match strategy {
            ZoomLevelStrategy::Lower => coarser.zoom,
            ZoomLevelStrategy::Upper => finer.zoom,
            ZoomLevelStrategy::Auto => {
                if coarser.cell_size / resolution < resolution / finer.cell_size {
                    coarser.zoom
                } else {
                    finer.zoom
                }
            }
        })
    }
}

fn same_resolution(resolution: f64, cell_size: f64) -> bool {
    ((resolution - cell_size) / cell_size).abs() <= RESOLUTION_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use tms_common::TileMatrixSets;

    const Z10_RES: f64 = 152.8740565703525;

    #[test]
    fn test_exact_resolution() {
        let tms = TileMatrixSets::builtin().get("WebMercatorQuad").unwrap();
        let resolver = Resolver::new(&tms);
        for strategy in [
            ZoomLevelStrategy::Lower,
            ZoomLevelStrategy::Upper,
            ZoomLevelStrategy::Auto,
        ] {
            assert_eq!(
                resolver.zoom_for_resolution(Z10_RES, strategy, None, None).unwrap(),
                10
            );
        }
    }

    #[test]
    fn test_between_levels() {
        let tms = TileMatrixSets::builtin().get("WebMercatorQuad").unwrap();
        let resolver = Resolver::new(&tms);

        // between z10 and z11, closer to z11
        let res = Z10_RES * 0.6;
        assert_eq!(
            resolver.zoom_for_resolution(res, ZoomLevelStrategy::Lower, None, None).unwrap(),
            10
        );
        assert_eq!(
            resolver.zoom_for_resolution(res, ZoomLevelStrategy::Upper, None, None).unwrap(),
            11
        );
        assert_eq!(
            resolver.zoom_for_resolution(res, ZoomLevelStrategy::Auto, None, None).unwrap(),
            11
        );

        // closer to z10
        let res = Z10_RES * 0.9;
        assert_eq!(
            resolver.zoom_for_resolution(res, ZoomLevelStrategy::Auto, None, None).unwrap(),
            10
        );
    }

    #[test]
    fn test_out_of_range_resolutions() {
        let tms = TileMatrixSets::builtin().get("WebMercatorQuad").unwrap();
        let resolver = Resolver::new(&tms);
        assert_eq!(
            resolver.zoom_for_resolution(1e-6, ZoomLevelStrategy::Lower, None, None).unwrap(),
            24
        );
        assert_eq!(
            resolver.zoom_for_resolution(1e9, ZoomLevelStrategy::Upper, None, None).unwrap(),
            0
        );
        assert_eq!(
            resolver.zoom_for_resolution(1e-6, ZoomLevelStrategy::Auto, Some(2), Some(5)).unwrap(),
            5
        );
        assert!(resolver
            .zoom_for_resolution(-1.0, ZoomLevelStrategy::Auto, None, None)
            .is_err());
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("Lower".parse::<ZoomLevelStrategy>().unwrap(), ZoomLevelStrategy::Lower);
        assert!("nearest".parse::<ZoomLevelStrategy>().is_err());
    }
}
