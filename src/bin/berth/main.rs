//! Berth CLI - build, patch and package OpenColorIO

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use berth::core::PackageError;
use berth::util::Shell;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    let shell = Arc::new(Shell::from_flags(cli.quiet, cli.verbose, cli.color));

    // Set up logging
    let filter = if cli.quiet {
        EnvFilter::new("berth=error")
    } else if cli.verbose {
        EnvFilter::new("berth=debug")
    } else {
        EnvFilter::new("berth=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(shell.use_color())
        .with_target(false)
        .without_time()
        .init();

    if let Err(e) = run(cli, &shell) {
        report(&shell, e);
        std::process::exit(1);
    }
}

fn run(cli: Cli, shell: &Arc<Shell>) -> Result<()> {
    match cli.command {
        Commands::Package(args) => commands::package::execute(args, shell),
        Commands::Options(args) => commands::options::execute(args),
        Commands::Configure(args) => commands::configure::execute(args),
        Commands::EditorConfig(args) => commands::editor_config::execute(args, shell),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

/// Print an error: taxonomy errors as diagnostics, anything else plainly.
fn report(shell: &Shell, e: anyhow::Error) {
    match e.downcast::<PackageError>() {
        Ok(err) => {
            if let PackageError::BuildInvocation { command, stderr, .. } = &err {
                eprintln!("command: {}", command);
                if !stderr.trim().is_empty() {
                    eprintln!("{}", stderr.trim_end());
                }
            }
            let use_color = shell.use_color();
            let _ = miette::set_hook(Box::new(move |_| {
                Box::new(miette::MietteHandlerOpts::new().color(use_color).build())
            }));
            eprintln!("{:?}", miette::Report::new(err));
        }
        Err(e) => eprintln!("error: {:#}", e),
    }
}
