//! `berth editor-config` command

use std::sync::Arc;

use anyhow::Result;

use crate::cli::EditorConfigArgs;
use berth::ops::editor_config::{generate, write_document};
use berth::util::{GlobalContext, Shell, Status};

pub fn execute(args: EditorConfigArgs, shell: &Arc<Shell>) -> Result<()> {
    let gctx = GlobalContext::new()?;
    let editor = &gctx.config().editor;

    let requirements = gctx.resolve_path(&args.requirements);
    let cache_root = match &args.cache_root {
        Some(root) => gctx.resolve_path(root),
        None => gctx.package_cache_dir(),
    };
    let extra_roots: Vec<_> = if args.extra_roots.is_empty() {
        editor.extra_roots.iter().map(|r| gctx.resolve_path(r)).collect()
    } else {
        args.extra_roots.iter().map(|r| gctx.resolve_path(r)).collect()
    };
    let output = gctx.resolve_path(&args.output);

    let document = generate(&requirements, &cache_root, &extra_roots, &output)?;
    write_document(&output, &document)?;

    let count = document["configurations"][0]["includePath"]
        .as_array()
        .map(Vec::len)
        .unwrap_or(0);
    shell.status(
        Status::Finished,
        format!("{} ({} include paths)", output.display(), count),
    );

    Ok(())
}
