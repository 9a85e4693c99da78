//! Command implementations

pub mod completions;
pub mod configure;
pub mod editor_config;
pub mod options;
pub mod package;

use std::str::FromStr;

use anyhow::{anyhow, Result};

use crate::cli::ContextArgs;
use berth::builder::toolchain::{default_compiler_for, detect_host_compiler};
use berth::core::{
    Arch, BuildContext, BuildType, CompilerFamily, CompilerIdentity, CppStandard, OptionOverride, Platform, Variant,
};
use berth::recipe::Recipe;
use berth::util::GlobalContext;

/// Parse a value from the configuration file.
fn parse_config<T>(key: &str, value: Option<&str>) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|v| v.parse::<T>().map_err(|e| anyhow!("invalid `{}` in config: {}", key, e)))
        .transpose()
}

/// Build the context from CLI flags, then config, then host defaults.
pub fn resolve_context(gctx: &GlobalContext, args: &ContextArgs) -> Result<BuildContext> {
    let toolchain = &gctx.config().toolchain;
    let build = &gctx.config().build;

    let platform = match &args.platform {
        Some(p) => p.clone(),
        None => parse_config::<Platform>("toolchain.platform", toolchain.platform.as_deref())?
            .unwrap_or_else(Platform::host),
    };
    let arch = match &args.arch {
        Some(a) => a.clone(),
        None => parse_config::<Arch>("toolchain.arch", toolchain.arch.as_deref())?.unwrap_or_else(Arch::host),
    };

    let family = match args.compiler {
        Some(f) => Some(f),
        None => parse_config::<CompilerFamily>("toolchain.compiler", toolchain.compiler.as_deref())?,
    };
    let version = args
        .compiler_version
        .clone()
        .or_else(|| toolchain.compiler_version.clone());

    let mut compiler = match family {
        Some(family) => CompilerIdentity::new(family, "unknown"),
        // Only the host compiler can be probed
        None if platform == Platform::host() => detect_host_compiler().unwrap_or_else(|| {
            tracing::warn!("no C++ compiler found; assuming the {} default", platform);
            default_compiler_for(&platform)
        }),
        None => default_compiler_for(&platform),
    };
    if let Some(version) = version {
        compiler.version = version;
    }

    let variant = match args.variant {
        Some(v) => v,
        None => parse_config::<Variant>("build.variant", build.variant.as_deref())?.unwrap_or_default(),
    };
    let build_type = match args.build_type {
        Some(b) => b,
        None => parse_config::<BuildType>("build.build_type", build.build_type.as_deref())?.unwrap_or_default(),
    };
    let cppstd = match args.cppstd {
        Some(s) => Some(s),
        None => parse_config::<CppStandard>("build.cppstd", build.cppstd.as_deref())?,
    };
    let module_path = args
        .module_path
        .as_deref()
        .or(build.module_path.as_deref())
        .map(|p| gctx.resolve_path(p));

    let mut ctx = BuildContext::new(platform, arch, compiler, variant).with_build_type(build_type);
    ctx.cppstd = cppstd;
    ctx.module_path = module_path;

    tracing::debug!("build context: {}", ctx);
    Ok(ctx)
}

/// Config-file overrides followed by CLI overrides, so the CLI wins.
///
/// Config entries for options that do not apply to `ctx` are skipped;
/// the same override on the command line is a conflict.
pub fn collect_overrides(gctx: &GlobalContext, recipe: &Recipe, ctx: &BuildContext, args: &ContextArgs) -> Vec<OptionOverride> {
    let mut overrides: Vec<OptionOverride> = gctx
        .config()
        .option_overrides()
        .into_iter()
        .filter(|ov| match recipe.options.get(&ov.name) {
            Some(decl) if !decl.applicability.applies(ctx) => {
                tracing::debug!("ignoring config option `{}`: not applicable to {}", ov.name, ctx);
                false
            }
            _ => true,
        })
        .collect();
    overrides.extend(args.options.iter().cloned());
    overrides
}
