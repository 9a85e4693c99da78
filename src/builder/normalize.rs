//! Install tree normalization.
//!
//! Rewrites the raw CMake install tree into the layout consumers expect.
//! Every step is idempotent, so normalizing an already-normalized tree
//! changes nothing.

use std::path::PathBuf;

use anyhow::{Context, Result};
use glob::Pattern;

use crate::core::context::Variant;
use crate::core::errors::PackageError;
use crate::core::install_tree::InstallTree;
use crate::util::fs::{ensure_dir, move_dir_contents, remove_dir_all_if_exists, remove_files_matching};

/// Build-system metadata directories, relative to the install root.
const METADATA_DIRS: &[&str] = &["cmake", "lib/pkgconfig", "lib/cmake", "share"];

/// Package-config files removed anywhere in the tree.
const CONFIG_FILE_PATTERN: &str = "OpenColorIOConfig*.cmake";

/// Debug symbol files removed from the binary directory.
const DEBUG_SYMBOL_PATTERN: &str = "*.pdb";

/// What a normalization pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    /// Entries moved out of `lib/static`
    pub relocated: usize,
    /// Directories and files removed
    pub removed: Vec<PathBuf>,
    /// Where the license was copied
    pub license: PathBuf,
}

impl NormalizeReport {
    /// Whether the pass only re-copied the license.
    pub fn is_noop(&self) -> bool {
        self.relocated == 0 && self.removed.is_empty()
    }
}

/// Normalize `tree` for `variant`.
///
/// Static relocation runs before metadata cleanup, since the nested static
/// directory lives under `lib`.
pub fn normalize(tree: &InstallTree, variant: Variant) -> Result<NormalizeReport> {
    if !tree.root().is_dir() {
        return Err(PackageError::normalization(tree.root(), "install root does not exist").into());
    }
    if !tree.lib_dir().is_dir() {
        return Err(PackageError::normalization(tree.lib_dir(), "library directory is missing").into());
    }
    if !tree.license_source().is_file() {
        return Err(PackageError::normalization(tree.license_source(), "license file is missing from the source tree").into());
    }

    let mut report = NormalizeReport::default();

    if variant.is_static() {
        report.relocated = relocate_static(tree)?;
    }

    report.removed.extend(remove_metadata(tree)?);
    report.removed.extend(remove_debug_symbols(tree)?);
    report.license = copy_license(tree)?;

    tracing::info!(
        "normalized {}: {} relocated, {} removed",
        tree.root().display(),
        report.relocated,
        report.removed.len()
    );
    Ok(report)
}

/// (a) Move `lib/static/*` into `lib` and drop the nested directory.
fn relocate_static(tree: &InstallTree) -> Result<usize> {
    let nested = tree.nested_static_dir();
    if !nested.is_dir() {
        return Ok(0);
    }

    let moved = move_dir_contents(&nested, &tree.lib_dir())?;
    remove_dir_all_if_exists(&nested)?;
    tracing::debug!("relocated {} entries from {}", moved, nested.display());
    Ok(moved)
}

/// (b) Remove package-config, discovery and packaging metadata.
fn remove_metadata(tree: &InstallTree) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();

    for dir in METADATA_DIRS {
        let path = tree.root().join(dir);
        if remove_dir_all_if_exists(&path)? {
            removed.push(path);
        }
    }

    let pattern = Pattern::new(CONFIG_FILE_PATTERN).context("invalid config file pattern")?;
    removed.extend(remove_files_matching(tree.root(), |name| pattern.matches(name))?);
    Ok(removed)
}

/// (c) Remove debug symbols from the binary directory.
fn remove_debug_symbols(tree: &InstallTree) -> Result<Vec<PathBuf>> {
    let pattern = Pattern::new(DEBUG_SYMBOL_PATTERN).context("invalid debug symbol pattern")?;
    remove_files_matching(&tree.bin_dir(), |name| pattern.matches(name))
}

/// (d) Copy the license into `licenses/`.
fn copy_license(tree: &InstallTree) -> Result<PathBuf> {
    let dest = tree.license_dest();
    ensure_dir(&tree.licenses_dir())?;
    std::fs::copy(tree.license_source(), &dest).with_context(|| {
        format!(
            "failed to copy license {} to {}",
            tree.license_source().display(),
            dest.display()
        )
    })?;
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixtures::{snapshot_tree, write_raw_install_tree};
    use std::fs;
    use tempfile::TempDir;

    fn setup(variant: Variant) -> (TempDir, InstallTree) {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("src");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("LICENSE"), "BSD-3-Clause").unwrap();

        let root = tmp.path().join("package");
        write_raw_install_tree(&root, variant);
        let tree = InstallTree::new(&root, source.join("LICENSE"));
        (tmp, tree)
    }

    #[test]
    fn test_static_relocation() {
        let (_tmp, tree) = setup(Variant::Static);
        let report = normalize(&tree, Variant::Static).unwrap();

        assert!(report.relocated > 0);
        assert!(tree.lib_dir().join("libOpenColorIO.a").is_file());
        assert!(!tree.nested_static_dir().exists());
    }

    #[test]
    fn test_metadata_and_symbols_removed() {
        let (_tmp, tree) = setup(Variant::Shared);
        normalize(&tree, Variant::Shared).unwrap();

        let root = tree.root();
        assert!(!root.join("cmake").exists());
        assert!(!root.join("lib/cmake").exists());
        assert!(!root.join("lib/pkgconfig").exists());
        assert!(!root.join("share").exists());
        assert!(!root.join("OpenColorIOConfig.cmake").exists());
        assert!(!root.join("bin/OpenColorIO.pdb").exists());
        assert!(root.join("bin/ocioinfo").exists());
        assert!(root.join("include/OpenColorIO/OpenColorIO.h").is_file());
        assert_eq!(fs::read_to_string(root.join("licenses/LICENSE")).unwrap(), "BSD-3-Clause");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for variant in [Variant::Shared, Variant::Static] {
            let (_tmp, tree) = setup(variant);
            normalize(&tree, variant).unwrap();
            let once = snapshot_tree(tree.root());

            let report = normalize(&tree, variant).unwrap();
            assert!(report.is_noop());
            assert_eq!(snapshot_tree(tree.root()), once);
        }
    }

    #[test]
    fn test_missing_paths_are_errors() {
        let tmp = TempDir::new().unwrap();
        let tree = InstallTree::new(tmp.path().join("nope"), tmp.path().join("LICENSE"));
        let err = normalize(&tree, Variant::Shared).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PackageError>(),
            Some(PackageError::Normalization { .. })
        ));

        let (_tmp, tree) = setup(Variant::Shared);
        fs::remove_file(tree.license_source()).unwrap();
        let err = normalize(&tree, Variant::Shared).unwrap_err();
        match err.downcast_ref::<PackageError>() {
            Some(PackageError::Normalization { message, .. }) => assert!(message.contains("license")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_lib_dir_is_error() {
        let (_tmp, tree) = setup(Variant::Shared);
        fs::remove_dir_all(tree.lib_dir()).unwrap();
        let err = normalize(&tree, Variant::Shared).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PackageError>(),
            Some(PackageError::Normalization { path, .. }) if path.ends_with("lib")
        ));
    }
}
