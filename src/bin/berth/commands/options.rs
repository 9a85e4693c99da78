//! `berth options` command

use anyhow::Result;

use crate::cli::OptionsArgs;
use crate::commands::{collect_overrides, resolve_context};
use berth::recipe::opencolorio;
use berth::util::GlobalContext;

pub fn execute(args: OptionsArgs) -> Result<()> {
    let gctx = GlobalContext::new()?;
    let recipe = opencolorio::recipe();

    let ctx = resolve_context(&gctx, &args.context)?;
    let overrides = collect_overrides(&gctx, &recipe, &ctx, &args.context);
    let resolved = recipe.options.resolve(&ctx, &overrides)?;

    println!("# {} for {}", recipe.requirement, ctx);
    for decl in recipe.options.iter() {
        match resolved.get(&decl.name) {
            Some(value) => println!("{} = {}", decl.name, value),
            None => {
                let reason = decl
                    .applicability
                    .check(&ctx)
                    .err()
                    .unwrap_or_else(|| "not resolved".to_string());
                println!("# {}: {}", decl.name, reason);
            }
        }
    }

    Ok(())
}
