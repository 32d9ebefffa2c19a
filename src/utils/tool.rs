//! Minifier and validator invocation.
//!
//! A tool never writes its final output directly: it writes an intermediate
//! `<output>.<stage>.webgen-tmp` that is renamed into place on success and
//! removed on every exit path by [`TempFile`].

use super::exec::exec;
use crate::{
    classify::TEMP_SUFFIX,
    config::{INPUT_PLACEHOLDER, OUTPUT_PLACEHOLDER, Tool},
    error::BuildError,
};
use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

/// An intermediate file removed when dropped.
#[derive(Debug)]
pub struct TempFile {
    path: PathBuf,
}

impl TempFile {
    /// `<output>.<stage>.webgen-tmp`, next to `output`.
    pub fn beside(output: &Path, stage: &str) -> Self {
        let mut name = output.file_name().map(OsString::from).unwrap_or_default();
        name.push(format!(".{stage}{TEMP_SUFFIX}"));
        Self {
            path: output.with_file_name(name),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Move the intermediate into its final place.
    pub fn persist(self, dest: &Path) -> Result<(), BuildError> {
        fs::rename(&self.path, dest).map_err(|err| BuildError::fs(dest, err))
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        // already renamed on success; nothing to do if missing
        let _ = fs::remove_file(&self.path);
    }
}

/// Run `tool` on `input`, producing `output`.
///
/// Tools whose argv names `{output}` write the file themselves; for the
/// rest, captured stdout becomes the output.
pub fn invoke(tool: &Tool, input: &Path, output: &Path) -> Result<(), BuildError> {
    let temp = TempFile::beside(output, "tool");
    let argv = substitute(&tool.argv, input, Some(temp.path()));
    let result = exec(tool.name, &argv, input)?;

    if !tool.writes_output() {
        fs::write(temp.path(), &result.stdout).map_err(|err| BuildError::fs(temp.path(), err))?;
    } else if !temp.path().is_file() {
        return Err(BuildError::fs(
            output,
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("`{}` exited successfully but wrote no output", tool.name),
            ),
        ));
    }
    temp.persist(output)
}

/// Run a validator on `input`. Its output is discarded; only the exit status matters.
pub fn validate(tool: &Tool, input: &Path) -> Result<(), BuildError> {
    let argv = substitute(&tool.argv, input, None);
    exec(tool.name, &argv, input).map(|_| ())
}

fn substitute(argv: &[String], input: &Path, output: Option<&Path>) -> Vec<OsString> {
    let input = input.to_string_lossy();
    let output = output.map(Path::to_string_lossy).unwrap_or_default();
    argv.iter()
        .map(|arg| {
            OsString::from(
                arg.replace(INPUT_PLACEHOLDER, &input)
                    .replace(OUTPUT_PLACEHOLDER, &output),
            )
        })
        .collect()
}
