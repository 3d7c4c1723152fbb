// Wing - Great Wyrm Diamond tooling
// Copyright (C) 2024 Moonstream DAO
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Test utilities for locating the shared Wing test fixtures.
//!
//! The workspace keeps build artifacts of the Diamond contracts under
//! `testdata/artifacts`. Tests either read them in place or copy them into an
//! isolated temporary directory when they need to modify the set.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

use tracing::info;

use crate::ArtifactStore;

/// Get the testdata artifacts directory root path
pub fn get_testdata_artifacts_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent() // crates/
        .and_then(|p| p.parent()) // workspace root
        .expect("Failed to find workspace root")
        .join("testdata")
        .join("artifacts")
}

/// An [`ArtifactStore`] over the shared testdata artifacts.
///
/// Read-only usage only; use [`create_temp_artifacts_dir`] when a test needs
/// to add or remove artifacts.
pub fn testdata_store() -> ArtifactStore {
    ArtifactStore::new(get_testdata_artifacts_root())
}

/// Creates a temporary directory holding a copy of the testdata artifacts.
///
/// The returned [`tempfile::TempDir`] removes the copy when dropped.
///
/// # Examples
///
/// ```rust, no_run
/// use wing_common::test_utils::create_temp_artifacts_dir;
///
/// let dir = create_temp_artifacts_dir();
/// std::fs::remove_file(dir.path().join("Diamond.json")).unwrap();
/// ```
pub fn create_temp_artifacts_dir() -> tempfile::TempDir {
    let temp_dir = tempfile::Builder::new()
        .prefix("wing-test-artifacts-")
        .tempdir()
        .expect("Failed to create temp artifacts directory");

    copy_dir_all(get_testdata_artifacts_root(), temp_dir.path())
        .expect("Failed to copy testdata artifacts to temp directory");

    info!("Created temporary test artifacts directory: {}", temp_dir.path().display());
    temp_dir
}

/// Helper function to recursively copy directories.
fn copy_dir_all(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> io::Result<()> {
    fs::create_dir_all(&dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            copy_dir_all(entry.path(), dst.as_ref().join(entry.file_name()))?;
        } else {
            fs::copy(entry.path(), dst.as_ref().join(entry.file_name()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_testdata_root_exists() {
        let root = get_testdata_artifacts_root();
        assert!(root.ends_with("testdata/artifacts"));
        assert!(root.join("DiamondCutFacet.json").exists());
    }

    #[test]
    fn test_temp_copy_is_isolated() {
        let dir = create_temp_artifacts_dir();
        fs::remove_file(dir.path().join("Diamond.json")).unwrap();

        assert!(!dir.path().join("Diamond.json").exists());
        assert!(get_testdata_artifacts_root().join("Diamond.json").exists());
    }

    #[test]
    fn test_testdata_store_loads_every_known_contract() {
        let store = testdata_store();
        for name in
            ["Diamond", "DiamondCutFacet", "DiamondLoupeFacet", "OwnershipFacet", "CharactersFacet"]
        {
            let artifact = store.load(name).unwrap();
            assert!(artifact.bytecode.is_some(), "{name} should be deployable");
        }
    }
}
