//! Build phase and the per-render context.
//!
//! Every render receives an explicit [`RenderContext`]; helpers read it back
//! from the template state instead of from process-wide globals.

use minijinja::{Error, ErrorKind, State, Value};
use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
};

/// Template variable: the page name (`about`).
pub const PAGE_NAME: &str = "page_name";
/// Template variable: the page route (`blog/post`, `""` for the root).
pub const PAGE_PATH: &str = "page_path";
/// Template variable: `"initial"` or `"final"`.
pub const BUILD_PHASE: &str = "build_phase";
const OUTPUT_ROOT: &str = "__webgen_output_root";
const BUILD_ID: &str = "__webgen_build_id";

/// Which of the two rendering passes is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BuildPhase {
    /// First pass: establishes every page on disk. Output is provisional.
    Initial,
    /// Second pass: every page exists; output is what gets published.
    Final,
}

impl BuildPhase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Final => "final",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "initial" => Some(Self::Initial),
            "final" => Some(Self::Final),
            _ => None,
        }
    }
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a template or helper may depend on besides its own source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderContext {
    pub phase: BuildPhase,
    pub page_name: String,
    pub page_path: String,
    pub output_root: PathBuf,
    /// Build timestamp, used as a cache-busting token.
    pub build_id: String,
}

impl RenderContext {
    pub fn new(
        phase: BuildPhase,
        page_name: impl Into<String>,
        page_path: impl Into<String>,
        output_root: &Path,
        build_id: impl Into<String>,
    ) -> Self {
        Self {
            phase,
            page_name: page_name.into(),
            page_path: page_path.into(),
            output_root: output_root.to_path_buf(),
            build_id: build_id.into(),
        }
    }

    /// The entry page is the site root index.
    pub fn is_entry_page(&self) -> bool {
        self.page_path.is_empty()
    }

    /// Template variables for this context, including the reserved keys.
    pub fn vars(&self) -> BTreeMap<String, Value> {
        BTreeMap::from([
            (PAGE_NAME.to_owned(), Value::from(self.page_name.as_str())),
            (PAGE_PATH.to_owned(), Value::from(self.page_path.as_str())),
            (BUILD_PHASE.to_owned(), Value::from(self.phase.as_str())),
            (
                OUTPUT_ROOT.to_owned(),
                Value::from(self.output_root.to_string_lossy().into_owned()),
            ),
            (BUILD_ID.to_owned(), Value::from(self.build_id.as_str())),
        ])
    }

    pub fn to_value(&self) -> Value {
        Value::from_serialize(self.vars())
    }

    /// Recover the context inside a helper call.
    pub fn from_state(state: &State) -> Result<Self, Error> {
        let lookup = |key: &str| -> Result<String, Error> {
            state
                .lookup(key)
                .and_then(|v| v.as_str().map(str::to_owned))
                .ok_or_else(|| {
                    Error::new(
                        ErrorKind::InvalidOperation,
                        format!("helper called outside a page render (`{key}` unset)"),
                    )
                })
        };

        let phase = lookup(BUILD_PHASE)?;
        let phase = BuildPhase::parse(&phase).ok_or_else(|| {
            Error::new(ErrorKind::InvalidOperation, format!("unknown build phase `{phase}`"))
        })?;

        Ok(Self {
            phase,
            page_name: lookup(PAGE_NAME)?,
            page_path: lookup(PAGE_PATH)?,
            output_root: PathBuf::from(lookup(OUTPUT_ROOT)?),
            build_id: lookup(BUILD_ID)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::{Environment, context};

    #[test]
    fn test_phase_order_and_names() {
        assert!(BuildPhase::Initial < BuildPhase::Final);
        assert_eq!(BuildPhase::Final.to_string(), "final");
        assert_eq!(BuildPhase::parse("initial"), Some(BuildPhase::Initial));
        assert_eq!(BuildPhase::parse("done"), None);
    }

    #[test]
    fn test_entry_page() {
        let root = Path::new("/site/build.1");
        assert!(RenderContext::new(BuildPhase::Final, "index", "", root, "1").is_entry_page());
        assert!(!RenderContext::new(BuildPhase::Final, "about", "about", root, "1").is_entry_page());
    }

    #[test]
    fn test_context_round_trips_through_state() {
        let ctx = RenderContext::new(BuildPhase::Final, "post", "blog/post", Path::new("/out"), "42");
        let expected = ctx.clone();

        let mut env = Environment::new();
        env.add_function("peek", move |state: &State| -> Result<bool, Error> {
            Ok(RenderContext::from_state(state)? == expected)
        });
        env.add_template("t", "{{ peek() }} {{ page_path }} {{ build_phase }}").unwrap();

        let out = env.get_template("t").unwrap().render(ctx.to_value()).unwrap();
        assert_eq!(out, "true blog/post final");
    }

    #[test]
    fn test_from_state_outside_render_fails() {
        let mut env = Environment::new();
        env.add_function("peek", |state: &State| -> Result<String, Error> {
            RenderContext::from_state(state).map(|c| c.page_name)
        });
        env.add_template("t", "{{ peek() }}").unwrap();
        assert!(env.get_template("t").unwrap().render(context!()).is_err());
    }
}
