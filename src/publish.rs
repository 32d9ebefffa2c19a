//! Versioned output directories and the published link.
//!
//! ```text
//! site/
//! ├── gen.toml
//! ├── build.1718000000/     ← older build (or a failed one, kept for inspection)
//! ├── build.1718000420/     ← newest successful build
//! └── build -> build.1718000420
//! ```
//!
//! The link target is relative, so the site directory can be moved or
//! served from a different mount point.

use crate::{error::BuildError, log};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Name of the published link inside the site directory.
pub const LINK_NAME: &str = "build";
/// Temporary link renamed over [`LINK_NAME`].
pub const SWAP_LINK_NAME: &str = ".build.swap";
const DIR_PREFIX: &str = "build.";

/// `build.<digits>` → timestamp.
pub fn parse_build_dir_name(name: &str) -> Option<u64> {
    let digits = name.strip_prefix(DIR_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// The directory one build run writes into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRoot {
    path: PathBuf,
    timestamp: u64,
}

impl OutputRoot {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Cache-busting token handed to templates.
    pub fn build_id(&self) -> String {
        self.timestamp().to_string()
    }

    pub fn dir_name(&self) -> String {
        format!("{DIR_PREFIX}{}", self.timestamp)
    }
}

/// Create `site/build.<timestamp>`.
///
/// The timestamp is the current unix time, bumped past any existing build
/// directory so names only ever increase and two runs never share a root.
pub fn create_output_root(site: &Path) -> Result<OutputRoot, BuildError> {
    let now = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default();
    let newest = build_dirs(site)?.into_iter().map(|(ts, _)| ts).max();
    let mut timestamp = newest.map_or(now, |newest| now.max(newest + 1));

    loop {
        let path = site.join(format!("{DIR_PREFIX}{timestamp}"));
        match fs::create_dir(&path) {
            Ok(()) => return Ok(OutputRoot { path, timestamp }),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => timestamp += 1,
            Err(err) => return Err(BuildError::fs(path, err)),
        }
    }
}

/// Point `site/build` at `root`, replacing any previous link atomically.
pub fn publish(site: &Path, root: &OutputRoot) -> Result<(), BuildError> {
    let link = site.join(LINK_NAME);
    let swap = site.join(SWAP_LINK_NAME);

    if swap.symlink_metadata().is_ok() {
        remove_link(&swap).map_err(|err| BuildError::fs(&swap, err))?;
    }
    make_dir_link(Path::new(&root.dir_name()), &swap).map_err(|err| BuildError::fs(&swap, err))?;
    swap_into_place(&swap, &link).map_err(|err| BuildError::fs(&link, err))?;

    log!("publish"; "{} -> {}", LINK_NAME, root.dir_name());
    Ok(())
}

/// The build directory `site/build` currently points at.
pub fn current(site: &Path) -> Option<PathBuf> {
    let target = fs::read_link(site.join(LINK_NAME)).ok()?;
    Some(site.join(target))
}

/// What `clean` removed.
#[derive(Debug, Default)]
pub struct CleanReport {
    pub removed_link: bool,
    pub removed_dirs: Vec<PathBuf>,
}

/// Remove the published link and every `build.<timestamp>` directory.
///
/// Anything else in the site directory is left alone.
pub fn clean(site: &Path) -> Result<CleanReport, BuildError> {
    let mut report = CleanReport::default();

    for name in [LINK_NAME, SWAP_LINK_NAME] {
        let path = site.join(name);
        let Ok(meta) = path.symlink_metadata() else {
            continue;
        };
        if meta.file_type().is_symlink() {
            remove_link(&path).map_err(|err| BuildError::fs(&path, err))?;
            report.removed_link |= name == LINK_NAME;
        } else if meta.is_dir() && name == LINK_NAME {
            // a plain `build/` directory left by an older tool
            fs::remove_dir_all(&path).map_err(|err| BuildError::fs(&path, err))?;
            log!("clean"; "{}", path.display());
            report.removed_dirs.push(path);
        }
    }

    for (_, path) in build_dirs(site)? {
        fs::remove_dir_all(&path).map_err(|err| BuildError::fs(&path, err))?;
        log!("clean"; "{}", path.display());
        report.removed_dirs.push(path);
    }

    Ok(report)
}

/// Every real `build.<timestamp>` directory, oldest first.
fn build_dirs(site: &Path) -> Result<Vec<(u64, PathBuf)>, BuildError> {
    let entries = fs::read_dir(site).map_err(|err| BuildError::fs(site, err))?;
    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| BuildError::fs(site, err))?;
        let Some(timestamp) = entry.file_name().to_str().and_then(parse_build_dir_name) else {
            continue;
        };
        let is_dir = entry
            .file_type()
            .map(|t| t.is_dir() && !t.is_symlink())
            .unwrap_or(false);
        if is_dir {
            dirs.push((timestamp, entry.path()));
        }
    }
    dirs.sort();
    Ok(dirs)
}

#[cfg(unix)]
fn make_dir_link(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn make_dir_link(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

#[cfg(unix)]
fn remove_link(link: &Path) -> io::Result<()> {
    fs::remove_file(link)
}

#[cfg(windows)]
fn remove_link(link: &Path) -> io::Result<()> {
    fs::remove_dir(link)
}

/// rename(2) replaces the old link in one step.
#[cfg(unix)]
fn swap_into_place(swap: &Path, link: &Path) -> io::Result<()> {
    fs::rename(swap, link)
}

/// Windows cannot rename over a directory link; remove then rename.
#[cfg(windows)]
fn swap_into_place(swap: &Path, link: &Path) -> io::Result<()> {
    if link.symlink_metadata().is_ok() {
        remove_link(link)?;
    }
    fs::rename(swap, link)
}
