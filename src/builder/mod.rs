//! Build-and-patch stages.
//!
//! Each stage of the packaging pipeline lives here, leaves first:
//! patching, configuration assembly, the external build, install tree
//! normalization and descriptor emission.

pub mod cmake;
pub mod configure;
pub mod emit;
pub mod normalize;
pub mod patch;
pub mod toolchain;

pub use cmake::{BuildInvoker, BuildSystem, CMake, ConfiguredBuild};
pub use configure::{assemble, BuildConfiguration, ConfigValue};
pub use emit::emit;
pub use normalize::{normalize, NormalizeReport};
pub use patch::{apply_patches, PatchReport, PatchRule};
pub use toolchain::detect_host_compiler;
