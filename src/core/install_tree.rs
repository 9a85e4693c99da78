//! Install tree layout.

use std::path::{Path, PathBuf};

/// An install prefix and the canonical subpaths consumers rely on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallTree {
    root: PathBuf,
    /// License file in the patched source tree
    license_source: PathBuf,
}

impl InstallTree {
    pub fn new(root: impl Into<PathBuf>, license_source: impl Into<PathBuf>) -> Self {
        InstallTree {
            root: root.into(),
            license_source: license_source.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn lib_dir(&self) -> PathBuf {
        self.root.join("lib")
    }

    /// Where static builds of the library are installed before normalization.
    pub fn nested_static_dir(&self) -> PathBuf {
        self.lib_dir().join("static")
    }

    pub fn include_dir(&self) -> PathBuf {
        self.root.join("include")
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    pub fn licenses_dir(&self) -> PathBuf {
        self.root.join("licenses")
    }

    pub fn license_source(&self) -> &Path {
        &self.license_source
    }

    /// Destination of the copied license file.
    pub fn license_dest(&self) -> PathBuf {
        let name = self
            .license_source
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "LICENSE".into());
        self.licenses_dir().join(name)
    }

    /// Path of the serialized package descriptor.
    pub fn descriptor_path(&self) -> PathBuf {
        self.root.join("berth-package.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let tree = InstallTree::new("/pkg", "/src/OpenColorIO-2.1.2/LICENSE");
        assert_eq!(tree.lib_dir(), PathBuf::from("/pkg/lib"));
        assert_eq!(tree.nested_static_dir(), PathBuf::from("/pkg/lib/static"));
        assert_eq!(tree.include_dir(), PathBuf::from("/pkg/include"));
        assert_eq!(tree.bin_dir(), PathBuf::from("/pkg/bin"));
        assert_eq!(tree.license_dest(), PathBuf::from("/pkg/licenses/LICENSE"));
    }
}
