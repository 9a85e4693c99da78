//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use berth::core::{Arch, BuildType, CompilerFamily, CppStandard, OptionOverride, Platform, Variant};
use berth::util::ColorChoice;

/// Berth - build, patch and package OpenColorIO
#[derive(Parser)]
#[command(name = "berth")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    pub color: ColorChoice,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch, patch, build and package the library
    Package(PackageArgs),

    /// Show the resolved options for a build context
    Options(OptionsArgs),

    /// Show the build configuration for a build context (no build)
    Configure(ConfigureArgs),

    /// Merge cached package include paths into an editor configuration
    EditorConfig(EditorConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Flags describing the build context.
#[derive(Args, Debug, Clone, Default)]
pub struct ContextArgs {
    /// Library variant (shared, static)
    #[arg(long)]
    pub variant: Option<Variant>,

    /// Build type (Release, Debug, RelWithDebInfo, MinSizeRel)
    #[arg(long)]
    pub build_type: Option<BuildType>,

    /// Target platform (windows, macos, linux, freebsd)
    #[arg(long)]
    pub platform: Option<Platform>,

    /// Target architecture (x86, x86_64, armv7, arm64)
    #[arg(long)]
    pub arch: Option<Arch>,

    /// Compiler family (gcc, clang, apple-clang, msvc)
    #[arg(long)]
    pub compiler: Option<CompilerFamily>,

    /// Compiler version
    #[arg(long)]
    pub compiler_version: Option<String>,

    /// Declared C++ standard (98, 11, 14, 17, 20, 23; at least 11)
    #[arg(long)]
    pub cppstd: Option<CppStandard>,

    /// Directory with dependency find-modules (CMAKE_MODULE_PATH)
    #[arg(long)]
    pub module_path: Option<PathBuf>,

    /// Override an option (name=value, repeatable)
    #[arg(short = 'o', long = "option", value_name = "NAME=VALUE")]
    pub options: Vec<OptionOverride>,
}

#[derive(Args)]
pub struct PackageArgs {
    #[command(flatten)]
    pub context: ContextArgs,

    /// Use an already-unpacked source tree instead of downloading
    #[arg(long, conflicts_with = "archive")]
    pub source_dir: Option<PathBuf>,

    /// Use a local .tar.gz instead of downloading
    #[arg(long)]
    pub archive: Option<PathBuf>,

    /// Work directory (default: .berth/work)
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Path to cmake
    #[arg(long, env = "BERTH_CMAKE")]
    pub cmake: Option<PathBuf>,

    /// CMake generator (e.g., Ninja)
    #[arg(long)]
    pub generator: Option<String>,

    /// Number of parallel jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[derive(Args)]
pub struct OptionsArgs {
    #[command(flatten)]
    pub context: ContextArgs,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ConfigureFormat {
    /// -D arguments, one per line
    #[default]
    Cmake,
    /// JSON object
    Json,
}

#[derive(Args)]
pub struct ConfigureArgs {
    #[command(flatten)]
    pub context: ContextArgs,

    /// Output format
    #[arg(long, value_enum, default_value_t = ConfigureFormat::Cmake)]
    pub format: ConfigureFormat,
}

#[derive(Args)]
pub struct EditorConfigArgs {
    /// Requirements file listing name/version lines
    #[arg(long, default_value = "conanfile.txt")]
    pub requirements: PathBuf,

    /// Package cache root (default: ~/.berth/packages)
    #[arg(long, env = "BERTH_CACHE_ROOT")]
    pub cache_root: Option<PathBuf>,

    /// Extra root scanned for include directories (repeatable)
    #[arg(long = "extra-root")]
    pub extra_roots: Vec<PathBuf>,

    /// Editor configuration to create or update
    #[arg(long, default_value = ".vscode/c_cpp_properties.json")]
    pub output: PathBuf,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
