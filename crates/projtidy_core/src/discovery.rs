//! Recursive project file discovery.
//!
//! # Responsibility
//! - Walk a directory tree and collect files whose name matches a pattern.
//!
//! # Invariants
//! - Output order is deterministic (sorted by file name at every level).
//! - An unreadable entry is logged and skipped, never fatal.

use log::warn;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug)]
pub enum DiscoveryError {
    NotADirectory(PathBuf),
}

impl Display for DiscoveryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotADirectory(path) => {
                write!(f, "`{}` is not an existing directory", path.display())
            }
        }
    }
}

impl Error for DiscoveryError {}

/// Lists project files under `root` whose file name matches `pattern`.
pub fn discover_project_files(
    root: &Path,
    pattern: &Regex,
) -> Result<Vec<PathBuf>, DiscoveryError> {
    if !root.is_dir() {
        return Err(DiscoveryError::NotADirectory(root.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("event=discovery_skip module=discovery status=error error={err}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .file_name()
            .to_str()
            .is_some_and(|name| pattern.is_match(name));
        if matches {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
