//! Site helpers: the functions templates may call.
//!
//! Builtins are always present. Declared helpers come from
//! `[helpers.<name>]` tables in the manifest and are checked when the
//! renderer is built, so a broken declaration fails before anything is
//! written.

use super::template_name;
use crate::{
    config::{ConfigError, HelperDecl, HelperSource, SiteConfig},
    error::describe_render_error,
    phase::{BUILD_PHASE, BuildPhase, PAGE_NAME, PAGE_PATH, RenderContext},
};
use chrono::Datelike;
use minijinja::{
    Environment, Error, ErrorKind, State,
    value::{Rest, Value},
};
use std::{
    fs,
    path::{Component, Path, PathBuf},
};

/// Names of the builtin helpers.
pub const BUILTINS: &[&str] = &["current_year", "page_link", "asset_url", "inline_css", "inline_js"];

/// Template variables a helper name would shadow.
const RESERVED: &[&str] = &[PAGE_NAME, PAGE_PATH, BUILD_PHASE];

/// Template name prefix for inline snippets.
const SNIPPET_PREFIX: &str = "@helpers/";

pub fn register_builtins(env: &mut Environment<'static>) {
    env.add_function("current_year", current_year);
    env.add_function("page_link", page_link);
    env.add_function("asset_url", asset_url);
    env.add_function("inline_css", inline_css);
    env.add_function("inline_js", inline_js);
}

/// Validate, compile and register every `[helpers.<name>]` entry.
pub fn register_declared(env: &mut Environment<'static>, config: &SiteConfig) -> Result<(), ConfigError> {
    for (name, decl) in &config.helpers {
        let helper = DeclaredHelper::load(env, name, decl, &config.root)?;
        env.add_function(name.clone(), move |state: &State, args: Rest<Value>| {
            helper.call(state, &args)
        });
    }
    Ok(())
}

/// A `[helpers.<name>]` entry after validation.
#[derive(Debug, Clone)]
struct DeclaredHelper {
    name: String,
    template: String,
    params: Vec<String>,
    emit: Option<PathBuf>,
}

impl DeclaredHelper {
    fn load(
        env: &mut Environment<'static>,
        name: &str,
        decl: &HelperDecl,
        root: &Path,
    ) -> Result<Self, ConfigError> {
        if BUILTINS.contains(&name) {
            return Err(ConfigError::helper(name, "name clashes with a builtin helper"));
        }
        if RESERVED.contains(&name) {
            return Err(ConfigError::helper(name, "name clashes with a template variable"));
        }

        let template = match decl.validate(name, root)? {
            HelperSource::Inline(snippet) => {
                let template = format!("{SNIPPET_PREFIX}{name}");
                env.add_template_owned(template.clone(), snippet)
                    .map_err(|err| ConfigError::helper(name, describe_render_error(&err)))?;
                template
            }
            HelperSource::File(path) => {
                let template = template_name(&path);
                env.get_template(&template)
                    .map_err(|err| ConfigError::helper(name, describe_render_error(&err)))?;
                template
            }
        };

        Ok(Self {
            name: name.to_owned(),
            template,
            params: decl.params.clone(),
            emit: decl.emit.clone(),
        })
    }

    /// Render with the caller's page variables plus positional params.
    fn call(&self, state: &State, args: &[Value]) -> Result<Value, Error> {
        if args.len() != self.params.len() {
            return Err(Error::new(
                ErrorKind::InvalidOperation,
                format!(
                    "helper `{}` takes {} argument(s) but {} were given",
                    self.name,
                    self.params.len(),
                    args.len()
                ),
            ));
        }

        let ctx = RenderContext::from_state(state)?;
        let mut vars = ctx.vars();
        vars.extend(self.params.iter().cloned().zip(args.iter().cloned()));

        let text = state
            .env()
            .get_template(&self.template)?
            .render(Value::from_serialize(&vars))?;

        let Some(emit) = &self.emit else {
            return Ok(Value::from_safe_string(text));
        };

        // Earlier renders are provisional; only the final text is written.
        if ctx.phase == BuildPhase::Final {
            let dest = ctx.output_root.join(emit);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(|err| io_error(&dest, err))?;
            }
            fs::write(&dest, text).map_err(|err| io_error(&dest, err))?;
        }
        Ok(Value::from_safe_string(url_path(&template_name(emit))))
    }
}

// ============================================================================
// Builtins
// ============================================================================

fn current_year() -> i32 {
    chrono::Local::now().year()
}

/// `/route`, after checking in the final phase that the page was built.
fn page_link(state: &State, route: String) -> Result<Value, Error> {
    let ctx = RenderContext::from_state(state)?;
    let route = checked_relative(route.trim_matches('/'))?;

    if ctx.phase == BuildPhase::Final && !page_exists(&ctx.output_root, route) {
        return Err(Error::new(
            ErrorKind::InvalidOperation,
            format!("page_link(\"{route}\"): no such page in this build"),
        ));
    }
    Ok(Value::from_safe_string(url_path(route)))
}

fn asset_url(state: &State, path: String) -> Result<Value, Error> {
    let ctx = RenderContext::from_state(state)?;
    let path = checked_relative(path.trim_start_matches('/'))?;
    Ok(Value::from_safe_string(format!("{}?v={}", url_path(path), ctx.build_id)))
}

fn inline_css(state: &State, path: String) -> Result<Value, Error> {
    inline(state, &path, |body| format!("<style>{body}</style>"), |url| {
        format!(r#"<link rel="stylesheet" href="{url}">"#)
    })
}

fn inline_js(state: &State, path: String) -> Result<Value, Error> {
    inline(state, &path, |body| format!("<script>{body}</script>"), |url| {
        format!(r#"<script src="{url}"></script>"#)
    })
}

/// Embed the processed asset on the entry page in the final phase,
/// reference it everywhere else.
fn inline(
    state: &State,
    path: &str,
    embed: impl FnOnce(&str) -> String,
    reference: impl FnOnce(&str) -> String,
) -> Result<Value, Error> {
    let ctx = RenderContext::from_state(state)?;
    let path = checked_relative(path.trim_start_matches('/'))?;

    let html = if ctx.phase == BuildPhase::Final && ctx.is_entry_page() {
        let file = ctx.output_root.join(path);
        let body = fs::read_to_string(&file).map_err(|err| io_error(&file, err))?;
        embed(body.trim_end())
    } else {
        reference(&format!("{}?v={}", url_path(path), ctx.build_id))
    };
    Ok(Value::from_safe_string(html))
}

fn page_exists(output_root: &Path, route: &str) -> bool {
    if route.is_empty() {
        return output_root.join("index.html").is_file();
    }
    output_root.join(format!("{route}.html")).is_file()
        || output_root.join(route).join("index.html").is_file()
}

fn url_path(route: &str) -> String {
    format!("/{route}")
}

/// Reject absolute paths and `..` so helpers cannot read outside the build.
fn checked_relative(path: &str) -> Result<&str, Error> {
    let escapes = Path::new(path)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(Error::new(
            ErrorKind::InvalidOperation,
            format!("`{path}` must be a path inside the site"),
        ));
    }
    Ok(path)
}

fn io_error(path: &Path, err: std::io::Error) -> Error {
    Error::new(ErrorKind::InvalidOperation, format!("cannot access `{}`", path.display())).with_source(err)
}
