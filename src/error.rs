//! Build failure taxonomy.
//!
//! Configuration problems live in [`crate::config::ConfigError`]; everything
//! that can go wrong once the output root exists is a [`BuildError`]. None of
//! them are retried: a failed build is fixed and re-run by the operator.

use std::{path::PathBuf, process::ExitStatus};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    /// Template missing, malformed, or a helper raised.
    #[error("failed to render `{template}`")]
    Render {
        template: String,
        #[source]
        source: minijinja::Error,
    },

    /// External minifier or validator exited non-zero.
    #[error("`{tool}` failed on `{}` ({status})\n{stderr}", path.display())]
    Tool {
        tool: String,
        path: PathBuf,
        status: ExitStatus,
        stderr: String,
    },

    /// External tool could not be started at all.
    #[error("failed to run `{tool}` on `{}`", path.display())]
    Spawn {
        tool: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("filesystem error at `{}`", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    pub fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    pub fn render(template: impl Into<String>, source: minijinja::Error) -> Self {
        Self::Render {
            template: template.into(),
            source,
        }
    }
}

/// Render the full cause chain of a minijinja error, which carries the
/// template line and the failing helper in nested sources.
pub fn describe_render_error(err: &minijinja::Error) -> String {
    let mut out = format!("{err:#}");
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        out.push_str(&format!("\ncaused by: {cause}"));
        source = cause.source();
    }
    out
}
