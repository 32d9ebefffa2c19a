//! webgen - a static site build pipeline.
//!
//! Renders a tree of jinja templates in two passes into a fresh
//! `build.<timestamp>` directory and publishes it by swapping the
//! `build` link.

mod build;
mod classify;
mod cli;
mod config;
mod error;
mod logger;
mod phase;
mod publish;
mod render;
mod utils;

use anyhow::Result;
use build::build_site;
use clap::Parser;
use cli::{Cli, Commands};
use config::SiteConfig;
use error::{BuildError, describe_render_error};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let manifest = cli.manifest();
    match &cli.command {
        Commands::Build { build_args, .. } => {
            let config = SiteConfig::load(manifest, build_args)?;
            let report = build_site(&config)?;
            log!(
                "build";
                "done: {} pages, {} templates, {} minified, {} copied -> {}",
                report.pages,
                report.templates,
                report.minified,
                report.copied,
                report.output_root.display()
            );
        }
        Commands::Clean { .. } => {
            let (root, _) = config::locate(manifest)?;
            let report = publish::clean(&root)?;
            log!(
                "clean";
                "removed {} build directories{}",
                report.removed_dirs.len(),
                if report.removed_link { " and the build link" } else { "" }
            );
        }
    }
    Ok(())
}

/// Render errors carry the template line and helper failure in their
/// source chain; everything else reads fine with `{:#}`.
fn report_error(err: &anyhow::Error) {
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::Render { template, source }) => {
            log!("error"; "failed to render `{}`\n{}", template, describe_render_error(source));
        }
        _ => log!("error"; "{:#}", err),
    }
}
