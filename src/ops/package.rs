//! Implementation of `berth package`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Result};

use crate::builder::cmake::{BuildInvoker, BuildSystem};
use crate::builder::configure::{assemble, BuildConfiguration};
use crate::builder::emit::emit;
use crate::builder::normalize::normalize;
use crate::builder::patch::{apply_patches, PatchReport};
use crate::core::context::BuildContext;
use crate::core::descriptor::PackageDescriptor;
use crate::core::install_tree::InstallTree;
use crate::core::options::OptionOverride;
use crate::recipe::Recipe;
use crate::sources::{locate_source_root, SourceFetcher};
use crate::util::fs::{ensure_dir, remove_dir_all_if_exists, write_string};
use crate::util::shell::{Shell, Status};

const WORK_STAMP: &str = ".berth-work";

/// Work directory layout for one packaging run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkLayout {
    root: PathBuf,
}

impl WorkLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        WorkLayout { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where sources are extracted and patched.
    pub fn source_dir(&self) -> PathBuf {
        self.root.join("src")
    }

    /// CMake build tree.
    pub fn build_dir(&self) -> PathBuf {
        self.root.join("build")
    }

    /// Install prefix; becomes the package.
    pub fn package_dir(&self) -> PathBuf {
        self.root.join("package")
    }

    /// Marker written into work directories berth owns.
    pub fn stamp_path(&self) -> PathBuf {
        self.root.join(WORK_STAMP)
    }

    /// Discard anything a previous run left and recreate empty directories.
    ///
    /// Only trees carrying the work stamp are discarded; existing `src`,
    /// `build` or `package` directories without it are left alone and the
    /// reset fails.
    pub fn reset(&self) -> Result<()> {
        let dirs = [self.source_dir(), self.build_dir(), self.package_dir()];

        if self.stamp_path().is_file() {
            for dir in &dirs {
                if remove_dir_all_if_exists(dir)? {
                    tracing::debug!("discarded previous work tree {}", dir.display());
                }
            }
        } else {
            if let Some(foreign) = dirs.iter().find(|d| d.exists()) {
                bail!(
                    "refusing to use {} as a work directory: {} exists and was not created by berth\n\
                     help: pass an empty or dedicated directory with `--work-dir`",
                    self.root.display(),
                    foreign.display()
                );
            }
            ensure_dir(&self.root)?;
            write_string(&self.stamp_path(), "berth work directory\n")?;
        }

        for dir in &dirs {
            ensure_dir(dir)?;
        }
        Ok(())
    }
}

/// Options for the package command.
#[derive(Debug, Clone, Default)]
pub struct PackageOptions {
    /// Number of parallel build jobs
    pub jobs: Option<usize>,
}

/// Everything a successful run produced.
#[derive(Debug)]
pub struct PackageOutcome {
    pub patch_report: PatchReport,
    /// The configuration the tree was built and installed with
    pub configuration: BuildConfiguration,
    /// The normalized install tree
    pub install_tree: InstallTree,
    pub descriptor: PackageDescriptor,
}

impl PackageOutcome {
    pub fn descriptor_path(&self) -> PathBuf {
        self.install_tree.descriptor_path()
    }
}

/// Run the full pipeline for `recipe` in `ctx`.
///
/// Fails fast: the first error is returned and the work tree is left as
/// it was for inspection. The next run starts from a clean layout.
#[allow(clippy::too_many_arguments)]
pub fn package(
    recipe: &Recipe,
    ctx: &BuildContext,
    overrides: &[OptionOverride],
    layout: &WorkLayout,
    fetcher: &dyn SourceFetcher,
    build_system: &dyn BuildSystem,
    opts: &PackageOptions,
    shell: &Arc<Shell>,
) -> Result<PackageOutcome> {
    ctx.validate(recipe.min_cppstd)?;
    let resolved = recipe.options.resolve(ctx, overrides)?;
    let version = recipe.version()?;

    tracing::info!("packaging {} for {}", recipe.requirement, ctx);
    let span = shell.span(Status::Packaging, format!("{} ({})", recipe.requirement, ctx));

    layout.reset()?;

    shell.status(Status::Fetching, fetcher.describe(&recipe.source));
    let extracted = fetcher.fetch(&recipe.source, &layout.source_dir())?;
    let source_root = locate_source_root(&extracted)?;
    tracing::debug!("source root: {}", source_root.display());

    shell.status(Status::Patching, format!("{} rules", recipe.patches.len()));
    let patch_report = apply_patches(&recipe.patches, &source_root)?;
    tracing::info!("patched sources: {}", patch_report);

    let configuration = assemble(&recipe.options, &resolved, ctx, &version);
    let invoker = BuildInvoker::new(build_system).with_jobs(opts.jobs);

    shell.status(Status::Configuring, layout.build_dir().display());
    let handle = invoker.configure_once(configuration, &source_root, &layout.build_dir(), ctx.build_type)?;
    tracing::debug!("configuration fingerprint {}", handle.fingerprint());

    let spinner = shell.spinner(Status::Building, format!("{} [{}]", recipe.requirement, ctx.build_type));
    invoker.build(&handle)?;
    drop(spinner);

    shell.status(Status::Installing, layout.package_dir().display());
    invoker.install(&handle, &layout.package_dir())?;
    let configuration = invoker.finish(handle);

    let install_tree = InstallTree::new(layout.package_dir(), source_root.join(&recipe.license_file));
    normalize(&install_tree, ctx.variant)?;

    let descriptor = emit(recipe, &install_tree, ctx)?;
    descriptor.write(&install_tree.descriptor_path())?;

    span.finish_with_message(format!("{} at {}", recipe.requirement, install_tree.root().display()));

    Ok(PackageOutcome {
        patch_report,
        configuration,
        install_tree,
        descriptor,
    })
}
