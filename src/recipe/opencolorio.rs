//! OpenColorIO 2.1 recipe.
//!
//! The recipe version is 2.1.0 while the upstream snapshot is the v2.1.2
//! tag. The snapshot needs four source patches to build against externally
//! provided expat and pystring packages.

use std::collections::BTreeMap;

use crate::builder::patch::PatchRule;
use crate::core::context::{Arch, Platform, Variant};
use crate::core::language::CppStandard;
use crate::core::options::{Applicability, OptionDecl, OptionModel};
use crate::core::requirement::Requirement;
use crate::recipe::Recipe;
use crate::sources::SourceSpec;

pub const NAME: &str = "opencolorio";
pub const VERSION: &str = "2.1.0";

/// Upstream tag the sources are taken from.
pub const UPSTREAM_TAG: &str = "v2.1.2";

pub const SOURCE_URL: &str =
    "https://github.com/AcademySoftwareFoundation/OpenColorIO/archive/refs/tags/v2.1.2.tar.gz";

/// Position-independent code for static builds.
pub const OPTION_FPIC: &str = "fPIC";

/// SSE vectorization.
pub const OPTION_USE_SSE: &str = "use_sse";

/// Sources that include pystring through its subdirectory.
const PYSTRING_SOURCES: &[&str] = &[
    "Context.cpp",
    "OCIOYaml.cpp",
    "Op.cpp",
    "PathUtils.cpp",
    "fileformats/FileFormatCTF.cpp",
    "fileformats/FileFormatICC.cpp",
    "fileformats/FileFormatIridasLook.cpp",
    "transforms/FileTransform.cpp",
    "fileformats/FileFormatDiscreet1DL.cpp",
];

const EXT_INCLUDES_BLOCK: &str = "
include(FindExtPackages)

message(\"PYSTRING INCLUDE DIRS : ${pystring_INCLUDE_DIRS}\")
message(\"EXPAT INCLUDE DIRS : ${EXPAT_INCLUDE_DIRS}\")

include_directories(
        ${pystring_INCLUDE_DIRS}
        ${EXPAT_INCLUDE_DIRS}
)
";

/// The complete recipe.
pub fn recipe() -> Recipe {
    Recipe {
        requirement: Requirement::new(NAME, VERSION),
        description: "A color management framework for visual effects and animation.".to_string(),
        license: "BSD-3-Clause".to_string(),
        homepage: "https://opencolorio.org/".to_string(),
        topics: ["colors", "visual", "effects", "animation"]
            .iter()
            .map(|t| t.to_string())
            .collect(),
        source: SourceSpec::new(SOURCE_URL),
        patches: patch_rules(),
        options: option_model(),
        requires: requirements(),
        min_cppstd: CppStandard::Cpp11,
        libs: vec!["OpenColorIO".to_string()],
        apple_frameworks: ["Foundation", "IOKit", "ColorSync", "CoreGraphics"]
            .iter()
            .map(|f| f.to_string())
            .collect(),
        properties: BTreeMap::from([
            ("cmake_file_name".to_string(), "OpenColorIO".to_string()),
            ("cmake_target_name".to_string(), "OpenColorIO::OpenColorIO".to_string()),
            ("pkg_config_name".to_string(), "OpenColorIO".to_string()),
        ]),
        license_file: "LICENSE".to_string(),
    }
}

/// `fPIC` exists only for non-Windows static builds; `use_sse` only on x86.
pub fn option_model() -> OptionModel {
    OptionModel::new()
        .declare(
            OptionDecl::boolean(OPTION_FPIC, true)
                .applicable_when(
                    Applicability::always()
                        .exclude_platform(Platform::Windows)
                        .exclude_variant(Variant::Shared),
                )
                .config_key("CMAKE_POSITION_INDEPENDENT_CODE"),
        )
        .declare(
            OptionDecl::boolean(OPTION_USE_SSE, true)
                .applicable_when(Applicability::always().only_arch(Arch::X86).only_arch(Arch::X86_64))
                .config_key("OCIO_USE_SSE"),
        )
}

/// Source patches, in application order.
pub fn patch_rules() -> Vec<PatchRule> {
    let mut rules = vec![
        PatchRule::new(
            "expat-libraries",
            "src/OpenColorIO/CMakeLists.txt",
            "expat::expat",
            "${EXPAT_LIBRARIES}",
        ),
        PatchRule::new(
            "ext-include-dirs",
            "CMakeLists.txt",
            "include(FindExtPackages)",
            EXT_INCLUDES_BLOCK,
        ),
    ];

    rules.extend(PYSTRING_SOURCES.iter().map(|file| {
        PatchRule::new(
            format!("pystring-include:{}", file),
            format!("src/OpenColorIO/{}", file),
            "#include \"pystring/pystring.h\"",
            "#include \"pystring.h\"",
        )
    }));

    rules.push(PatchRule::new(
        "missing-strlen",
        "src/OpenColorIO/FileRules.cpp",
        "#include <map>",
        "#include <cstring>\n#include <map>",
    ));

    rules
}

/// Requirements OpenColorIO is built against.
pub fn requirements() -> Vec<Requirement> {
    vec![
        Requirement::new("expat", "2.4.8"),
        Requirement::new("openexr", "3.1.5"),
        Requirement::new("yaml-cpp", "0.7.0"),
        Requirement::new("pystring", "1.1.3"),
        // Only the command-line tools use lcms
        Requirement::new("lcms", "2.13.1"),
    ]
}
