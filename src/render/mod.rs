//! Template rendering.
//!
//! One [`Renderer`] per build. Templates are loaded lazily from the site
//! root by their `/`-separated relative path and cached for the second pass.

mod helpers;

use crate::{
    config::{ConfigError, SiteConfig},
    error::BuildError,
    phase::RenderContext,
};
use minijinja::{AutoEscape, Environment, Error, ErrorKind, UndefinedBehavior};
use std::{
    fs, io,
    path::{Component, Path, PathBuf},
};

pub struct Renderer {
    env: Environment<'static>,
}

impl Renderer {
    /// Build the template environment and load the site's helpers.
    ///
    /// Declared helpers are compiled here, so a malformed helper is a
    /// `ConfigError` rather than a failure halfway through the build.
    pub fn new(config: &SiteConfig) -> Result<Self, ConfigError> {
        let mut env = Environment::new();
        env.set_loader(site_loader(config.root.clone()));
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);

        let suffix = config.build.template_suffix();
        env.set_auto_escape_callback(move |name| auto_escape(name, &suffix));

        helpers::register_builtins(&mut env);
        helpers::register_declared(&mut env, config)?;
        Ok(Self { env })
    }

    /// Render `template` (site-relative, `/`-separated) for one page.
    pub fn render(&self, template: &str, ctx: &RenderContext) -> Result<String, BuildError> {
        self.env
            .get_template(template)
            .and_then(|tmpl| tmpl.render(ctx.to_value()))
            .map_err(|err| BuildError::render(template, err))
    }
}

/// Template name for a site-relative path: `blog/index.html.j2`.
pub fn template_name(rel_path: &Path) -> String {
    rel_path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Load templates from `root` by relative name.
///
/// Unlike `minijinja::path_loader` this accepts dot-prefixed segments
/// (`.well-known/security.txt.j2`). Names that would leave `root` are
/// treated as missing.
fn site_loader(root: PathBuf) -> impl Fn(&str) -> Result<Option<String>, Error> + Send + Sync + 'static {
    move |name| {
        let rel = Path::new(name);
        if !rel.components().all(|c| matches!(c, Component::Normal(_))) {
            return Ok(None);
        }
        match fs::read_to_string(root.join(rel)) {
            Ok(source) => Ok(Some(source)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Error::new(ErrorKind::InvalidOperation, "could not read template").with_source(err)),
        }
    }
}

/// HTML-escape variables in html and xml templates, with or without the
/// template suffix. Snippet helpers have no extension and are left alone.
fn auto_escape(name: &str, template_suffix: &str) -> AutoEscape {
    let name = name.strip_suffix(template_suffix).unwrap_or(name);
    match name.rsplit_once('.').map(|(_, ext)| ext) {
        Some("html" | "htm" | "xml") => AutoEscape::Html,
        _ => AutoEscape::None,
    }
}
