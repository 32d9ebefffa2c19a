//! `[helpers.<name>]` declarations.
//!
//! A site extends its templates with named helpers. Each declaration is a
//! small template (a file or an inline snippet) with positional parameters,
//! optionally emitted as a file instead of returned inline.

use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// One `[helpers.<name>]` table.
///
/// ```toml
/// [helpers.tab]
/// snippet = '<a href="/{{ route }}">{{ title }}</a>'
/// params = ["route", "title"]
///
/// [helpers.footer]
/// template = "_partials/footer.html"
///
/// [helpers.theme_css]
/// template = "_partials/theme.css"
/// emit = "res/theme.css"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HelperDecl {
    /// Template file, relative to the site root.
    #[serde(default)]
    pub template: Option<PathBuf>,

    /// Inline template source.
    #[serde(default)]
    pub snippet: Option<String>,

    /// Positional parameter names, bound as template variables.
    #[serde(default)]
    pub params: Vec<String>,

    /// Write the rendered text to this output-relative path and return its URL.
    #[serde(default)]
    pub emit: Option<PathBuf>,
}

/// Where a declared helper's template text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelperSource {
    /// Relative path inside the site root.
    File(PathBuf),
    Inline(String),
}

impl HelperDecl {
    /// Check the declaration shape and resolve its source.
    ///
    /// `root` is the site directory; template files must exist inside it.
    pub fn validate(&self, name: &str, root: &Path) -> Result<HelperSource, ConfigError> {
        if !is_identifier(name) {
            return Err(ConfigError::helper(name, "name must be a valid identifier"));
        }

        for (i, param) in self.params.iter().enumerate() {
            if !is_identifier(param) {
                return Err(ConfigError::helper(
                    name,
                    format!("parameter `{param}` is not a valid identifier"),
                ));
            }
            if self.params[..i].contains(param) {
                return Err(ConfigError::helper(
                    name,
                    format!("parameter `{param}` is declared twice"),
                ));
            }
        }

        if let Some(emit) = &self.emit
            && !is_plain_relative(emit)
        {
            return Err(ConfigError::helper(
                name,
                format!("emit path `{}` must be relative and stay inside the output", emit.display()),
            ));
        }

        match (&self.template, &self.snippet) {
            (Some(_), Some(_)) => Err(ConfigError::helper(
                name,
                "set either `template` or `snippet`, not both",
            )),
            (None, None) => Err(ConfigError::helper(name, "missing `template` or `snippet`")),
            (None, Some(snippet)) => Ok(HelperSource::Inline(snippet.clone())),
            (Some(template), None) => {
                if !is_plain_relative(template) {
                    return Err(ConfigError::helper(
                        name,
                        format!("template `{}` must be relative to the site root", template.display()),
                    ));
                }
                if !root.join(template).is_file() {
                    return Err(ConfigError::helper(
                        name,
                        format!("template `{}` does not exist", template.display()),
                    ));
                }
                Ok(HelperSource::File(template.clone()))
            }
        }
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_plain_relative(path: &Path) -> bool {
    path.components().next().is_some()
        && path.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
