//! `berth package` command

use std::sync::Arc;

use anyhow::{bail, Result};

use crate::cli::PackageArgs;
use crate::commands::{collect_overrides, resolve_context};
use berth::builder::cmake::CMake;
use berth::ops::package::{package, PackageOptions, WorkLayout};
use berth::recipe::opencolorio;
use berth::sources::{DirectoryFetcher, SourceFetcher, TarballFetcher};
use berth::util::hash::is_sha256_hex;
use berth::util::{GlobalContext, Shell, Status};

pub fn execute(args: PackageArgs, shell: &Arc<Shell>) -> Result<()> {
    let gctx = GlobalContext::new()?;
    let config = gctx.config();
    let mut recipe = opencolorio::recipe();

    let ctx = resolve_context(&gctx, &args.context)?;
    let overrides = collect_overrides(&gctx, &recipe, &ctx, &args.context);

    // Mirror URL and pinned hash from config
    if let Some(url) = &config.source.url {
        recipe.source.url = url.clone();
    }
    if let Some(sha256) = &config.source.sha256 {
        if !is_sha256_hex(sha256) {
            bail!("invalid `source.sha256` in config: expected 64 hex digits, got `{}`", sha256);
        }
        recipe.source.sha256 = Some(sha256.clone());
    }

    // Source: CLI > config > upstream download
    let source_dir = args.source_dir.as_ref().or(config.source.dir.as_ref());
    let archive = args.archive.as_ref().or(config.source.archive.as_ref());
    let fetcher: Box<dyn SourceFetcher> = match (source_dir, archive) {
        (Some(dir), _) => Box::new(DirectoryFetcher::new(gctx.resolve_path(dir))),
        (None, Some(archive)) => {
            recipe.source.url = gctx.resolve_path(archive).to_string_lossy().into_owned();
            Box::new(TarballFetcher::new())
        }
        (None, None) => {
            if recipe.source.sha256.is_none() {
                shell.warn("upstream archive hash is not pinned; set `source.sha256` to verify the download");
            }
            Box::new(TarballFetcher::new())
        }
    };

    let mut cmake = match args.cmake.as_ref().or(config.toolchain.cmake.as_ref()) {
        Some(program) => CMake::new(gctx.resolve_path(program)),
        None => CMake::discover()?,
    };
    if let Some(generator) = args.generator.as_ref().or(config.build.generator.as_ref()) {
        cmake = cmake.with_generator(generator);
    }
    tracing::debug!("using cmake at {}", cmake.program().display());

    let layout = WorkLayout::new(match &args.work_dir {
        Some(dir) => gctx.resolve_path(dir),
        None => gctx.work_dir(),
    });

    // Jobs: CLI > config > build system default
    let opts = PackageOptions {
        jobs: args.jobs.or(config.build.jobs),
    };

    let outcome = package(&recipe, &ctx, &overrides, &layout, fetcher.as_ref(), &cmake, &opts, shell)?;

    shell.status(Status::Packaged, outcome.descriptor_path().display());
    if !outcome.descriptor.defines.is_empty() {
        shell.note(format!("defines: {}", outcome.descriptor.defines.join(" ")));
    }

    Ok(())
}
