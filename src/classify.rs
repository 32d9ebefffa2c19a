//! File classification and traversal exclusions.
//!
//! Classification is purely by name:
//!
//! ```text
//! index.html.j2  → Page             (rendered, output index.html)
//! feed.xml.j2    → GenericTemplate  (rendered, output feed.xml)
//! main.css       → Stylesheet       (css minifier)
//! app.js         → Script           (js minifier)
//! logo.png       → Opaque           (copied)
//! ```

use crate::{config::MANIFEST_NAME, publish};
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

/// Reserved suffix for intermediate files written next to their output.
pub const TEMP_SUFFIX: &str = ".webgen-tmp";

/// Names pruned at any depth: OS metadata, caches, VCS.
const IGNORED_NAMES: &[&str] = &[".DS_Store", "Thumbs.db", "desktop.ini", "__pycache__", ".git"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Page,
    GenericTemplate,
    Stylesheet,
    Script,
    Opaque,
}

impl FileKind {
    pub const fn is_template(self) -> bool {
        matches!(self, Self::Page | Self::GenericTemplate)
    }
}

/// Classify a file name. `template_ext` is the bare extension (`j2`).
pub fn classify(file_name: &str, template_ext: &str) -> FileKind {
    let Some(stem) = file_name
        .strip_suffix(template_ext)
        .and_then(|rest| rest.strip_suffix('.'))
    else {
        return match extension(file_name) {
            Some("css") => FileKind::Stylesheet,
            Some("js") => FileKind::Script,
            _ => FileKind::Opaque,
        };
    };

    if stem.is_empty() {
        // a bare `.j2` dotfile is not a template
        FileKind::Opaque
    } else if stem.ends_with(".html") && stem.len() > ".html".len() {
        FileKind::Page
    } else {
        FileKind::GenericTemplate
    }
}

fn extension(file_name: &str) -> Option<&str> {
    file_name
        .rsplit_once('.')
        .filter(|(stem, _)| !stem.is_empty())
        .map(|(_, ext)| ext)
}

/// Vendored assets (`jquery.min.js`) are already minified.
pub fn is_preminified(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .is_some_and(|(stem, _)| stem.ends_with(".min"))
}

/// Output name for a template: `about.html.j2` → `about.html`, `robots.j2` → `robots`.
pub fn output_name<'a>(file_name: &'a str, template_ext: &str) -> &'a str {
    file_name
        .strip_suffix(template_ext)
        .and_then(|rest| rest.strip_suffix('.'))
        .unwrap_or(file_name)
}

/// Page name handed to templates: the output name without `.html` for pages.
pub fn page_name<'a>(file_name: &'a str, kind: FileKind, template_ext: &str) -> &'a str {
    let output = output_name(file_name, template_ext);
    match kind {
        FileKind::Page => output.strip_suffix(".html").unwrap_or(output),
        _ => output,
    }
}

/// Logical route of a page: `""` for the site root, `blog` for
/// `blog/index.html.j2`, `blog/post` for `blog/post.html.j2`.
pub fn page_path(rel_dir: &Path, page_name: &str) -> String {
    let mut segments: Vec<String> = rel_dir
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if page_name != "index" {
        segments.push(page_name.to_owned());
    }
    segments.join("/")
}

// ============================================================================
// Exclusions
// ============================================================================

/// Everything the walker prunes before classification.
#[derive(Debug, Clone, Default)]
pub struct Exclusions {
    /// Names pruned at any depth.
    names: HashSet<String>,
    /// Exact site-relative paths (helper templates).
    paths: HashSet<PathBuf>,
}

impl Exclusions {
    pub fn new<I, P>(extra_names: &[String], helper_templates: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let names = IGNORED_NAMES
            .iter()
            .map(|s| (*s).to_owned())
            .chain(extra_names.iter().cloned())
            .collect();
        let paths = helper_templates
            .into_iter()
            .map(|p| normalize_rel(p.as_ref()))
            .collect();
        Self { names, paths }
    }

    /// Whether `rel_path` (relative to the site root) is skipped.
    pub fn is_excluded(&self, rel_path: &Path) -> bool {
        let Some(name) = rel_path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };

        let at_root = rel_path.parent().is_none_or(|p| p.as_os_str().is_empty());
        if at_root && is_reserved_root_name(name) {
            return true;
        }

        name.ends_with(TEMP_SUFFIX)
            || self.names.contains(name)
            || self.paths.contains(&normalize_rel(rel_path))
    }
}

/// Manifest, published link, swap link and `build.<timestamp>` directories.
fn is_reserved_root_name(name: &str) -> bool {
    name == MANIFEST_NAME
        || name == publish::LINK_NAME
        || name == publish::SWAP_LINK_NAME
        || publish::parse_build_dir_name(name).is_some()
}

fn normalize_rel(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, std::path::Component::CurDir))
        .collect()
}
