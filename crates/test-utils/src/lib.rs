//! Test support for the tile matrix set crates.
//!
//! Small hand-checkable grids in both corner conventions, the built-in sets
//! behind `Arc`s, tile and point generators, and a few assertion macros.
//! Integration tests pull it in as a dev-dependency:
//!
//! ```ignore
//! use test_utils::{grid_top_left, require_test_file};
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Resolve a definition document by name, or return early from the test
/// with a SKIPPED note when it cannot be found.
///
/// ```ignore
/// let path = require_test_file!("AntarcticPolarQuad.json");
/// ```
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {{
        match $crate::find_test_file($name) {
            Some(path) => path,
            None => {
                eprintln!("SKIPPED: definition '{}' not found (set TEST_DATA_DIR)", $name);
                return;
            }
        }
    }};
}

/// Assert two coordinates differ by at most `epsilon`.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (left, right, epsilon): (f64, f64, f64) = ($left, $right, $epsilon);
        let diff = (left - right).abs();
        if !(diff <= epsilon) {
            panic!(
                "coordinates differ: {} vs {} (|diff| {} > {})",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Compare a bounding box edge by edge against `[west, south, east, north]`.
#[macro_export]
macro_rules! assert_bbox_approx_eq {
    ($bbox:expr, $expected:expr, $epsilon:expr) => {{
        let actual: [f64; 4] = $bbox.to_array();
        let expected: [f64; 4] = $expected;
        for (a, e) in actual.iter().zip(expected.iter()) {
            $crate::assert_approx_eq!(*a, *e, $epsilon);
        }
    }};
}
