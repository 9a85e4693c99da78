//! `berth configure` command

use anyhow::Result;

use crate::cli::{ConfigureArgs, ConfigureFormat};
use crate::commands::{collect_overrides, resolve_context};
use berth::builder::configure::assemble;
use berth::recipe::opencolorio;
use berth::util::GlobalContext;

pub fn execute(args: ConfigureArgs) -> Result<()> {
    let gctx = GlobalContext::new()?;
    let recipe = opencolorio::recipe();

    let ctx = resolve_context(&gctx, &args.context)?;
    ctx.validate(recipe.min_cppstd)?;
    let overrides = collect_overrides(&gctx, &recipe, &ctx, &args.context);
    let resolved = recipe.options.resolve(&ctx, &overrides)?;

    let configuration = assemble(&recipe.options, &resolved, &ctx, &recipe.version()?);

    match args.format {
        ConfigureFormat::Cmake => {
            for arg in configuration.to_cmake_args() {
                println!("{}", arg);
            }
        }
        ConfigureFormat::Json => println!("{}", configuration.to_json_pretty()?),
    }

    Ok(())
}
