//! Test fixtures for common test scenarios.
//!
//! Generators for a minimal OpenColorIO-shaped source tree, the raw
//! install tree CMake leaves behind, and in-memory tarballs.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::core::context::Variant;

/// Top-level directory of the upstream archive.
pub const SOURCE_DIR_NAME: &str = "OpenColorIO-2.1.2";

/// Files of a minimal source tree carrying every patch target.
pub fn ocio_source_files() -> Vec<(String, String)> {
    let mut files = vec![
        (
            "CMakeLists.txt".to_string(),
            "cmake_minimum_required(VERSION 3.12)\nproject(OpenColorIO)\ninclude(FindExtPackages)\nadd_subdirectory(src)\n"
                .to_string(),
        ),
        (
            "src/OpenColorIO/CMakeLists.txt".to_string(),
            "target_link_libraries(OpenColorIO PRIVATE expat::expat pystring::pystring)\n".to_string(),
        ),
        (
            "src/OpenColorIO/FileRules.cpp".to_string(),
            "#include <map>\n#include <string>\n\nsize_t n = strlen(\"x\");\n".to_string(),
        ),
        ("LICENSE".to_string(), "Copyright Contributors to the OpenColorIO Project.\n".to_string()),
    ];

    for file in [
        "Context.cpp",
        "OCIOYaml.cpp",
        "Op.cpp",
        "PathUtils.cpp",
        "fileformats/FileFormatCTF.cpp",
        "fileformats/FileFormatICC.cpp",
        "fileformats/FileFormatIridasLook.cpp",
        "transforms/FileTransform.cpp",
        "fileformats/FileFormatDiscreet1DL.cpp",
    ] {
        files.push((
            format!("src/OpenColorIO/{}", file),
            "#include <OpenColorIO/OpenColorIO.h>\n#include \"pystring/pystring.h\"\n".to_string(),
        ));
    }

    files
}

/// Write the minimal source tree under `root`.
pub fn write_ocio_source(root: &Path) {
    for (rel, content) in ocio_source_files() {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
}

/// Gzip tarball of the minimal source tree, wrapped in `SOURCE_DIR_NAME`.
pub fn ocio_source_tarball() -> Vec<u8> {
    let files: Vec<(String, String)> = ocio_source_files()
        .into_iter()
        .map(|(rel, content)| (format!("{}/{}", SOURCE_DIR_NAME, rel), content))
        .collect();
    let entries: Vec<(&str, &str)> = files.iter().map(|(p, c)| (p.as_str(), c.as_str())).collect();
    make_tarball(&entries)
}

/// Write the tree OpenColorIO's install step produces, before normalization.
pub fn write_raw_install_tree(root: &Path, variant: Variant) {
    let mut files = vec![
        ("include/OpenColorIO/OpenColorIO.h", "#pragma once\n"),
        ("include/OpenColorIO/OpenColorABI.h", "#pragma once\n"),
        ("lib/cmake/OpenColorIO/OpenColorIOConfig.cmake", ""),
        ("lib/cmake/OpenColorIO/OpenColorIOConfigVersion.cmake", ""),
        ("lib/pkgconfig/OpenColorIO.pc", "Name: OpenColorIO\n"),
        ("cmake/macros/ocio_macros.cmake", ""),
        ("share/ocio/setup_ocio.sh", "#!/bin/sh\n"),
        ("OpenColorIOConfig.cmake", ""),
        ("bin/ocioinfo", "binary"),
        ("bin/OpenColorIO.pdb", "symbols"),
    ];

    match variant {
        Variant::Shared => {
            files.push(("lib/libOpenColorIO.so.2.1", "shared"));
            files.push(("bin/OpenColorIO_2_1.dll", "dll"));
        }
        Variant::Static => {
            files.push(("lib/static/libOpenColorIO.a", "static"));
            files.push(("lib/static/OpenColorIO.lib", "static"));
        }
    }

    for (rel, content) in files {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
}

/// Every path under `root` with its content; directories map to `None`.
pub fn snapshot_tree(root: &Path) -> BTreeMap<String, Option<Vec<u8>>> {
    WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .map(|e| e.unwrap())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/");
            let content = if e.file_type().is_file() {
                Some(fs::read(e.path()).unwrap())
            } else {
                None
            };
            (rel, content)
        })
        .collect()
}

/// Build an in-memory `.tar.gz` from `(path, content)` pairs.
pub fn make_tarball(entries: &[(&str, &str)]) -> Vec<u8> {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tar::Builder;

    let mut tar_data = Vec::new();
    {
        let encoder = GzEncoder::new(&mut tar_data, Compression::default());
        let mut builder = Builder::new(encoder);

        for (path, content) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_path(path).unwrap();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append(&header, content.as_bytes()).unwrap();
        }

        builder.into_inner().unwrap().finish().unwrap();
    }
    tar_data
}
