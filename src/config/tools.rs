//! `[tools]` section configuration.
//!
//! Each tool is an argv list. `{input}` and `{output}` are substituted at
//! invocation time; without `{output}` the tool's stdout becomes the output.

use super::{ConfigError, defaults};
use educe::Educe;
use serde::{Deserialize, Serialize};

/// Placeholder replaced with the file being processed.
pub const INPUT_PLACEHOLDER: &str = "{input}";
/// Placeholder replaced with the file to produce.
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// `[tools]` section in gen.toml.
///
/// # Example
/// ```toml
/// [tools]
/// html_minifier = ["html-minifier", "--collapse-whitespace", "-o", "{output}", "{input}"]
/// html_validator = ["vnu", "--errors-only", "{input}"]
/// css_minifier = ["cleancss", "-o", "{output}", "{input}"]
/// js_minifier = ["uglifyjs", "{input}"]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    /// Falls back to the built-in minifier when unset.
    #[serde(default = "defaults::tools::none")]
    #[educe(Default = defaults::tools::none())]
    pub html_minifier: Option<Vec<String>>,

    #[serde(default = "defaults::tools::none")]
    #[educe(Default = defaults::tools::none())]
    pub html_validator: Option<Vec<String>>,

    /// Stylesheets are copied verbatim when unset.
    #[serde(default = "defaults::tools::none")]
    #[educe(Default = defaults::tools::none())]
    pub css_minifier: Option<Vec<String>>,

    /// Scripts are copied verbatim when unset.
    #[serde(default = "defaults::tools::none")]
    #[educe(Default = defaults::tools::none())]
    pub js_minifier: Option<Vec<String>>,
}

/// A fully resolved external tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tool {
    /// Short name used in logs and errors (`css_minifier`).
    pub name: &'static str,
    /// argv with the program expanded (`~` → home directory).
    pub argv: Vec<String>,
}

impl Tool {
    /// Whether the tool writes the output file itself.
    pub fn writes_output(&self) -> bool {
        self.argv.iter().any(|arg| arg.contains(OUTPUT_PLACEHOLDER))
    }
}

impl ToolsConfig {
    fn entries(&self) -> [(&'static str, Option<&Vec<String>>); 4] {
        [
            ("html_minifier", self.html_minifier.as_ref()),
            ("html_validator", self.html_validator.as_ref()),
            ("css_minifier", self.css_minifier.as_ref()),
            ("js_minifier", self.js_minifier.as_ref()),
        ]
    }

    /// Check argv shapes and tilde-expand programs.
    pub fn normalize(&mut self) -> Result<(), ConfigError> {
        for (name, argv) in self.entries() {
            let Some(argv) = argv else { continue };
            let Some(program) = argv.first() else {
                return Err(ConfigError::Validation(format!("tools.{name} is empty")));
            };
            if program.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "tools.{name} has an empty program name"
                )));
            }
            if !argv.iter().any(|arg| arg.contains(INPUT_PLACEHOLDER)) {
                return Err(ConfigError::Validation(format!(
                    "tools.{name} must reference `{INPUT_PLACEHOLDER}`"
                )));
            }
        }
        if let Some(validator) = &self.html_validator
            && validator.iter().any(|arg| arg.contains(OUTPUT_PLACEHOLDER))
        {
            return Err(ConfigError::Validation(format!(
                "tools.html_validator produces no output; remove `{OUTPUT_PLACEHOLDER}`"
            )));
        }

        for argv in [
            &mut self.html_minifier,
            &mut self.html_validator,
            &mut self.css_minifier,
            &mut self.js_minifier,
        ]
        .into_iter()
        .flatten()
        {
            argv[0] = shellexpand::tilde(&argv[0]).into_owned();
        }
        Ok(())
    }

    /// Fail fast when a configured program cannot be found.
    pub fn check_installed(&self) -> Result<(), ConfigError> {
        for (name, argv) in self.entries() {
            if let Some(program) = argv.and_then(|argv| argv.first())
                && which::which(program).is_err()
            {
                return Err(ConfigError::ToolNotFound {
                    name,
                    program: program.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn html_minifier(&self) -> Option<Tool> {
        Self::tool("html_minifier", self.html_minifier.as_ref())
    }

    pub fn html_validator(&self) -> Option<Tool> {
        Self::tool("html_validator", self.html_validator.as_ref())
    }

    pub fn css_minifier(&self) -> Option<Tool> {
        Self::tool("css_minifier", self.css_minifier.as_ref())
    }

    pub fn js_minifier(&self) -> Option<Tool> {
        Self::tool("js_minifier", self.js_minifier.as_ref())
    }

    fn tool(name: &'static str, argv: Option<&Vec<String>>) -> Option<Tool> {
        argv.map(|argv| Tool {
            name,
            argv: argv.clone(),
        })
    }
}
