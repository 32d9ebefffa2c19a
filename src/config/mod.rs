//! Site manifest (`gen.toml`) management.
//!
//! The manifest's location anchors the site: its parent directory is the
//! source tree, and build outputs are created next to it.
//!
//! # Sections
//!
//! | Section            | Purpose                                       |
//! |--------------------|-----------------------------------------------|
//! | `[build]`          | Template suffix, minify/validate/parallel     |
//! | `[tools]`          | External minifier and validator commands      |
//! | `[helpers.<name>]` | Site helpers callable from templates          |
//!
//! # Example
//!
//! ```toml
//! [build]
//! minify = true
//!
//! [tools]
//! css_minifier = ["cleancss", "-o", "{output}", "{input}"]
//!
//! [helpers.footer]
//! template = "_partials/footer.html"
//! ```

mod build;
pub mod defaults;
mod error;
mod helpers;
mod tools;

pub use build::BuildConfig;
pub use error::ConfigError;
pub use helpers::{HelperDecl, HelperSource};
pub use tools::{INPUT_PLACEHOLDER, OUTPUT_PLACEHOLDER, Tool, ToolsConfig};

use crate::cli::BuildArgs;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

/// Reserved manifest file name.
pub const MANIFEST_NAME: &str = "gen.toml";

/// Root configuration structure representing gen.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute site directory (set after loading)
    #[serde(skip)]
    pub root: PathBuf,

    /// Absolute manifest path (set after loading)
    #[serde(skip)]
    pub manifest_path: PathBuf,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    /// Ordered by name so helper registration is deterministic.
    #[serde(default)]
    pub helpers: BTreeMap<String, HelperDecl>,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load and validate the manifest, applying CLI overrides.
    ///
    /// Nothing is written to disk: a `ConfigError` here means the build never started.
    pub fn load(manifest: &Path, args: &BuildArgs) -> Result<Self, ConfigError> {
        let (root, manifest_path) = locate(manifest)?;
        let content = fs::read_to_string(&manifest_path)
            .map_err(|err| ConfigError::Io(manifest_path.clone(), err))?;

        let mut config = Self::from_str(&content)?;
        config.root = root;
        config.manifest_path = manifest_path;
        config.update_with_cli(args);
        config.validate()?;
        Ok(config)
    }

    /// Apply `--minify` / `--validate` / `--parallel`.
    pub fn update_with_cli(&mut self, args: &BuildArgs) {
        Self::update_option(&mut self.build.minify, args.minify.as_ref());
        Self::update_option(&mut self.build.validate, args.validate.as_ref());
        Self::update_option(&mut self.build.parallel, args.parallel.as_ref());
    }

    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Validate manifest contents against the site directory.
    ///
    /// Tools are only required to be installed when the switch that uses
    /// them is on, so `--minify=false` builds work without a node toolchain.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        let ext = &self.build.template_ext;
        if ext.is_empty() || ext.contains(['.', '/', '\\']) {
            return Err(ConfigError::Validation(format!(
                "build.template_ext `{ext}` must be a bare extension like `j2`"
            )));
        }

        self.tools.normalize()?;
        let mut required = ToolsConfig::default();
        if self.build.minify {
            required.html_minifier = self.tools.html_minifier.clone();
            required.css_minifier = self.tools.css_minifier.clone();
            required.js_minifier = self.tools.js_minifier.clone();
        }
        if self.build.validate {
            if self.tools.html_validator.is_none() {
                return Err(ConfigError::Validation(
                    "build.validate is on but tools.html_validator is not set".into(),
                ));
            }
            required.html_validator = self.tools.html_validator.clone();
        }
        required.check_installed()?;

        for (name, decl) in &self.helpers {
            decl.validate(name, &self.root)?;
        }
        Ok(())
    }
}

/// Resolve a manifest argument to `(site root, manifest path)`, both absolute.
pub fn locate(manifest: &Path) -> Result<(PathBuf, PathBuf), ConfigError> {
    if !manifest.is_file() {
        return Err(ConfigError::MissingManifest(manifest.to_path_buf()));
    }
    if manifest.file_name().is_none_or(|name| name != MANIFEST_NAME) {
        return Err(ConfigError::MisnamedManifest {
            expected: MANIFEST_NAME,
            found: manifest.to_path_buf(),
        });
    }

    let manifest_path = manifest
        .canonicalize()
        .map_err(|err| ConfigError::Io(manifest.to_path_buf(), err))?;
    let root = manifest_path
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| ConfigError::Validation("manifest has no parent directory".into()))?;
    Ok((root, manifest_path))
}
