//! External command execution.
//!
//! Runs a process to completion, maps a non-zero exit to
//! [`BuildError::Tool`] and logs any stderr a successful tool printed.

use crate::{error::BuildError, log};
use regex::Regex;
use std::{
    borrow::Cow,
    ffi::OsString,
    path::Path,
    process::{Command, Output, Stdio},
    sync::OnceLock,
};

/// Run `argv` to completion, capturing stdout and stderr.
///
/// `subject` is the file being processed; it is named in the error on failure.
pub fn exec(name: &str, argv: &[OsString], subject: &Path) -> Result<Output, BuildError> {
    let mut command = prepare(argv).ok_or_else(|| BuildError::Spawn {
        tool: name.to_owned(),
        path: subject.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
    })?;

    let output = command
        .stdin(Stdio::null())
        .output()
        .map_err(|source| BuildError::Spawn {
            tool: name.to_owned(),
            path: subject.to_path_buf(),
            source,
        })?;

    if !output.status.success() {
        return Err(BuildError::Tool {
            tool: name.to_owned(),
            path: subject.to_path_buf(),
            status: output.status,
            stderr: format_error(&output),
        });
    }

    // warnings from a successful run
    let stderr = String::from_utf8_lossy(&output.stderr);
    let warnings = meaningful_lines(&stderr);
    if !warnings.is_empty() {
        log!(name; "{}", warnings.join("\n"));
    }
    Ok(output)
}

fn prepare(argv: &[OsString]) -> Option<Command> {
    let (program, args) = argv.split_first()?;
    let mut command = Command::new(program);
    command.args(args);
    Some(command)
}

// ============================================================================
// Output Filtering
// ============================================================================

fn strip_ansi(s: &str) -> Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").expect("static regex"));
    re.replace_all(s, "")
}

/// Non-blank lines of `output` with ANSI codes removed.
fn meaningful_lines(output: &str) -> Vec<Cow<'_, str>> {
    output
        .lines()
        .map(strip_ansi)
        .filter(|line| !line.trim().is_empty())
        .collect()
}

/// Diagnostics for a failed tool: stderr, falling back to stdout
/// for tools (validators) that report on stdout.
fn format_error(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let kept = meaningful_lines(&stderr);
    if !kept.is_empty() {
        return kept.join("\n");
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    strip_ansi(stdout.trim()).into_owned()
}
