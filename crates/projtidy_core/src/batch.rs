//! Parallel batch driver over a fixed file list.
//!
//! # Responsibility
//! - Process independent files concurrently.
//! - Aggregate per-file results without letting one failure stop the rest.
//!
//! # Invariants
//! - Entries are returned in input order regardless of scheduling.

use crate::pipeline::{FileReport, Normalizer, ProcessError};
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;

/// Per-file results of one run, in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub entries: Vec<Result<FileReport, ProcessError>>,
}

/// Counters summarizing a [`BatchReport`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub files: usize,
    pub changed: usize,
    pub findings: usize,
    /// Files whose item pass was skipped because of a structural anomaly.
    pub anomalies: usize,
    /// Files that could not be read or parsed, or whose rewrite failed.
    pub failures: usize,
}

impl BatchReport {
    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary {
            files: self.entries.len(),
            ..BatchSummary::default()
        };
        for entry in &self.entries {
            match entry {
                Ok(report) => {
                    summary.changed += usize::from(report.changed());
                    summary.findings += report.findings.len();
                    summary.anomalies += usize::from(report.anomaly.is_some());
                    summary.failures += usize::from(report.write_error.is_some());
                }
                Err(_) => summary.failures += 1,
            }
        }
        summary
    }
}

/// Runs `normalizer` over `files` on the current rayon pool.
pub fn run_batch(normalizer: &Normalizer, files: &[PathBuf]) -> BatchReport {
    let entries = files
        .par_iter()
        .map(|path| normalizer.process_file(path))
        .collect();
    BatchReport { entries }
}
