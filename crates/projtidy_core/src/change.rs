//! Byte-level change detection and safe rewrites.
//!
//! # Responsibility
//! - Decide whether a normalization pass changed the serialized file.
//! - Persist changed bytes without ever leaving a partially written file.
//!
//! # Invariants
//! - Identical bytes never touch the file system.
//! - `WriteMode::Check` never writes.
//! - Rewritten files keep the permissions of the file they replace.

use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Whether changed files are persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteMode {
    #[default]
    Write,
    /// Report would-be rewrites only.
    Check,
}

/// Result of one normalization pass for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassOutcome {
    Unchanged,
    Rewritten,
    WouldRewrite,
    /// The pass was aborted and its result discarded.
    Skipped,
    /// The pass changed the file but the rewrite could not be persisted.
    Failed,
}

impl PassOutcome {
    pub fn changed(self) -> bool {
        matches!(self, Self::Rewritten | Self::WouldRewrite)
    }
}

/// Compares `updated` with `baseline` and persists it to `path` if needed.
pub fn commit(
    path: &Path,
    baseline: &[u8],
    updated: &[u8],
    mode: WriteMode,
) -> std::io::Result<PassOutcome> {
    if baseline == updated {
        return Ok(PassOutcome::Unchanged);
    }
    match mode {
        WriteMode::Check => Ok(PassOutcome::WouldRewrite),
        WriteMode::Write => {
            write_atomically(path, updated)?;
            Ok(PassOutcome::Rewritten)
        }
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let permissions = std::fs::metadata(path).ok().map(|meta| meta.permissions());

    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(bytes)?;
    staged.as_file().sync_all()?;
    if let Some(permissions) = permissions {
        staged.as_file().set_permissions(permissions)?;
    }
    staged.persist(path).map_err(|err| err.error)?;
    Ok(())
}
