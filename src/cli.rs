//! Command-line interface definitions.
//!
//! ```text
//! webgen build <path/to/gen.toml>
//! webgen clean <path/to/gen.toml>
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Build a static site from a directory of jinja templates and assets
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Overrides for the `[build]` section of gen.toml
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Minify html, css and js output
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub minify: Option<bool>,

    /// Validate every rendered page with the configured html validator
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub validate: Option<bool>,

    /// Process stylesheets, scripts and other files on a thread pool
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub parallel: Option<bool>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Render the site into <site>/build.<timestamp> and point <site>/build at it
    Build {
        /// Path to the site's gen.toml
        manifest: PathBuf,

        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Remove the <site>/build link and every <site>/build.<timestamp> directory
    Clean {
        /// Path to the site's gen.toml
        manifest: PathBuf,
    },
}

impl Cli {
    pub fn manifest(&self) -> &PathBuf {
        match &self.command {
            Commands::Build { manifest, .. } | Commands::Clean { manifest } => manifest,
        }
    }
}
