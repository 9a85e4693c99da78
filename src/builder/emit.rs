//! Package descriptor emission.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::core::context::BuildContext;
use crate::core::descriptor::PackageDescriptor;
use crate::core::errors::PackageError;
use crate::core::install_tree::InstallTree;
use crate::recipe::Recipe;

/// Below this version, static builds need an explicit marker define.
pub const STATIC_MARKER_VERSION: semver::Version = semver::Version::new(2, 1, 0);

pub const STATIC_MARKER_DEFINE: &str = "OpenColorIO_STATIC";
pub const SKIP_IMPORTS_DEFINE: &str = "OpenColorIO_SKIP_IMPORTS";

/// Describe the normalized `tree` for consumers.
///
/// The static marker and the skip-imports define are decided
/// independently; a static MSVC build of an old version gets both.
pub fn emit(recipe: &Recipe, tree: &InstallTree, ctx: &BuildContext) -> Result<PackageDescriptor> {
    for dir in [tree.include_dir(), tree.lib_dir()] {
        if !dir.is_dir() {
            return Err(PackageError::normalization(dir, "expected install directory is missing").into());
        }
    }

    let version = recipe.version()?;

    let mut defines = Vec::new();
    if version < STATIC_MARKER_VERSION && ctx.variant.is_static() {
        defines.push(STATIC_MARKER_DEFINE.to_string());
    }
    if ctx.is_msvc_static() {
        defines.push(SKIP_IMPORTS_DEFINE.to_string());
    }

    let frameworks = if ctx.platform.is_apple_desktop() {
        recipe.apple_frameworks.clone()
    } else {
        Vec::new()
    };

    let bin_path = std::path::absolute(tree.bin_dir())
        .with_context(|| format!("failed to resolve {}", tree.bin_dir().display()))?;
    tracing::info!("Appending PATH env var with: {}", bin_path.display());
    let env = BTreeMap::from([("PATH".to_string(), vec![bin_path])]);

    Ok(PackageDescriptor {
        package: recipe.requirement.clone(),
        license: recipe.license.clone(),
        homepage: recipe.homepage.clone(),
        description: recipe.description.clone(),
        topics: recipe.topics.clone(),
        context: ctx.clone(),
        libs: recipe.libs.clone(),
        defines,
        frameworks,
        include_dirs: vec![PathBuf::from("include")],
        lib_dirs: vec![PathBuf::from("lib")],
        bin_dirs: vec![PathBuf::from("bin")],
        env,
        properties: recipe.properties.clone(),
        requires: recipe.requires.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::{Arch, CompilerFamily, CompilerIdentity, Platform, Variant};
    use crate::recipe::opencolorio;
    use std::fs;
    use tempfile::TempDir;

    fn tree() -> (TempDir, InstallTree) {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("package");
        fs::create_dir_all(root.join("include/OpenColorIO")).unwrap();
        fs::create_dir_all(root.join("lib")).unwrap();
        let tree = InstallTree::new(&root, tmp.path().join("LICENSE"));
        (tmp, tree)
    }

    fn ctx(platform: Platform, family: CompilerFamily, variant: Variant) -> BuildContext {
        BuildContext::new(platform, Arch::X86_64, CompilerIdentity::new(family, "1"), variant)
    }

    #[test]
    fn test_skip_imports_only_for_msvc_static() {
        let (_tmp, tree) = tree();
        let recipe = opencolorio::recipe();

        let d = emit(&recipe, &tree, &ctx(Platform::Windows, CompilerFamily::Msvc, Variant::Static)).unwrap();
        assert_eq!(d.defines, vec![SKIP_IMPORTS_DEFINE]);

        for family in [CompilerFamily::Msvc, CompilerFamily::Gcc, CompilerFamily::Clang] {
            let d = emit(&recipe, &tree, &ctx(Platform::Windows, family, Variant::Shared)).unwrap();
            assert!(!d.has_define(SKIP_IMPORTS_DEFINE));
        }

        let d = emit(&recipe, &tree, &ctx(Platform::Linux, CompilerFamily::Gcc, Variant::Static)).unwrap();
        assert!(d.defines.is_empty());
    }

    #[test]
    fn test_static_marker_below_threshold_unions_with_skip_imports() {
        let (_tmp, tree) = tree();
        let mut recipe = opencolorio::recipe();
        recipe.requirement.version = "2.0.1".to_string();

        let d = emit(&recipe, &tree, &ctx(Platform::Windows, CompilerFamily::Msvc, Variant::Static)).unwrap();
        assert_eq!(d.defines, vec![STATIC_MARKER_DEFINE, SKIP_IMPORTS_DEFINE]);

        let d = emit(&recipe, &tree, &ctx(Platform::Linux, CompilerFamily::Gcc, Variant::Shared)).unwrap();
        assert!(d.defines.is_empty());
    }

    #[test]
    fn test_frameworks_only_on_macos() {
        let (_tmp, tree) = tree();
        let recipe = opencolorio::recipe();

        let d = emit(&recipe, &tree, &ctx(Platform::Macos, CompilerFamily::AppleClang, Variant::Shared)).unwrap();
        assert_eq!(d.frameworks, vec!["Foundation", "IOKit", "ColorSync", "CoreGraphics"]);

        let d = emit(&recipe, &tree, &ctx(Platform::Linux, CompilerFamily::Gcc, Variant::Shared)).unwrap();
        assert!(d.frameworks.is_empty());
    }

    #[test]
    fn test_path_always_gets_bin_dir() {
        let (_tmp, tree) = tree();
        let recipe = opencolorio::recipe();

        for variant in [Variant::Shared, Variant::Static] {
            let d = emit(&recipe, &tree, &ctx(Platform::Linux, CompilerFamily::Gcc, variant)).unwrap();
            let path = d.path_additions();
            assert_eq!(path.len(), 1);
            assert!(path[0].is_absolute());
            assert!(path[0].ends_with("bin"));
        }
    }

    #[test]
    fn test_fixed_fields() {
        let (_tmp, tree) = tree();
        let d = emit(
            &opencolorio::recipe(),
            &tree,
            &ctx(Platform::Linux, CompilerFamily::Gcc, Variant::Shared),
        )
        .unwrap();
        assert_eq!(d.libs, vec!["OpenColorIO"]);
        assert_eq!(d.include_dirs, vec![PathBuf::from("include")]);
        assert_eq!(d.properties["cmake_target_name"], "OpenColorIO::OpenColorIO");
        assert_eq!(d.license, "BSD-3-Clause");
        assert!(d.requires.iter().any(|r| r.to_string() == "pystring/1.1.3"));
    }

    #[test]
    fn test_missing_include_dir_is_error() {
        let (_tmp, tree) = tree();
        fs::remove_dir_all(tree.include_dir()).unwrap();
        let err = emit(
            &opencolorio::recipe(),
            &tree,
            &ctx(Platform::Linux, CompilerFamily::Gcc, Variant::Shared),
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PackageError>(),
            Some(PackageError::Normalization { .. })
        ));
    }

    #[test]
    fn test_descriptor_round_trips_through_json() {
        let (_tmp, tree) = tree();
        let d = emit(
            &opencolorio::recipe(),
            &tree,
            &ctx(Platform::Macos, CompilerFamily::AppleClang, Variant::Static),
        )
        .unwrap();
        d.write(&tree.descriptor_path()).unwrap();
        assert_eq!(PackageDescriptor::load(&tree.descriptor_path()).unwrap(), d);
    }
}
