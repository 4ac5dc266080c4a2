//! Locating tile matrix set definition documents used by tests.

use std::path::PathBuf;

/// Workspace root, two levels above this crate's manifest.
pub fn workspace_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .ancestors()
        .nth(2)
        .map(PathBuf::from)
        .unwrap_or(manifest_dir)
}

/// Find a definition document by file name.
///
/// `TEST_DATA_DIR` wins when set; otherwise the `testdata/` directories of
/// the resolver and common crates are searched.
pub fn find_test_file(name: &str) -> Option<PathBuf> {
    let root = workspace_root();
    std::env::var_os("TEST_DATA_DIR")
        .map(|dir| PathBuf::from(dir).join(name))
        .into_iter()
        .chain(
            ["crates/tile-resolver/testdata", "crates/tms-common/testdata"]
                .iter()
                .map(|dir| root.join(dir).join(name)),
        )
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_root_holds_manifest() {
        assert!(workspace_root().join("Cargo.toml").is_file());
    }

    #[test]
    fn test_polar_definition_is_found() {
        let path = find_test_file("AntarcticPolarQuad.json").unwrap();
        assert!(path.ends_with("testdata/AntarcticPolarQuad.json"));
    }

    #[test]
    fn test_missing_definition() {
        assert!(find_test_file("NoSuchQuad.json").is_none());
    }
}
