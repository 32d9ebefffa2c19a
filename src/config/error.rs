//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Problems detected before the build touches the filesystem.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("`{}` does not exist", .0.display())]
    MissingManifest(PathBuf),

    #[error("manifest must point to a file named `{expected}`, got `{}`", found.display())]
    MisnamedManifest { expected: &'static str, found: PathBuf },

    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("manifest parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("tool `{name}` is not installed or not on PATH (configured as `{program}`)")]
    ToolNotFound { name: &'static str, program: String },

    #[error("helper `{name}`: {reason}")]
    Helper { name: String, reason: String },

    #[error("manifest validation error: {0}")]
    Validation(String),
}

impl ConfigError {
    pub fn helper(name: &str, reason: impl Into<String>) -> Self {
        Self::Helper {
            name: name.to_owned(),
            reason: reason.into(),
        }
    }
}
