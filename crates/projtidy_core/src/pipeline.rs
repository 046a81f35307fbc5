//! Per-file normalization pipeline.
//!
//! # Responsibility
//! - Run the property pass and the item pass over one project file.
//! - Commit each pass separately through the change detector.
//! - Contain every failure to the file it happened in.
//!
//! # Invariants
//! - The file is read once; the item pass compares against the bytes produced
//!   by the property pass, not against the file on disk.
//! - A structural anomaly discards the item pass only; an already committed
//!   property pass stays.
//! - A failed write is recorded in the report; findings are always returned.

use crate::change::{commit, PassOutcome, WriteMode};
use crate::config::NormalizeConfig;
use crate::findings::{Finding, StructuralAnomaly};
use crate::normalize::{normalize_item_groups, PropertyGroupNormalizer};
use crate::xml::{Document, XmlError};
use log::{debug, info, warn};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Output of an in-memory normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub output: Vec<u8>,
    pub findings: Vec<Finding>,
}

/// Failure of an in-memory normalization.
#[derive(Debug)]
pub enum NormalizeError {
    Xml(XmlError),
    Anomaly(StructuralAnomaly),
}

impl Display for NormalizeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Xml(err) => write!(f, "{err}"),
            Self::Anomaly(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NormalizeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Xml(err) => Some(err),
            Self::Anomaly(err) => Some(err),
        }
    }
}

impl From<XmlError> for NormalizeError {
    fn from(value: XmlError) -> Self {
        Self::Xml(value)
    }
}

impl From<StructuralAnomaly> for NormalizeError {
    fn from(value: StructuralAnomaly) -> Self {
        Self::Anomaly(value)
    }
}

/// File-scoped failure that prevented processing.
#[derive(Debug)]
pub enum ProcessError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: XmlError,
    },
}

impl ProcessError {
    pub fn path(&self) -> &Path {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } => path,
        }
    }
}

impl Display for ProcessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => write!(f, "cannot read {}: {source}", path.display()),
            Self::Parse { path, source } => {
                write!(f, "cannot parse {}: {source}", path.display())
            }
        }
    }
}

impl Error for ProcessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
        }
    }
}

/// What happened to one project file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub findings: Vec<Finding>,
    pub property_pass: PassOutcome,
    pub item_pass: PassOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly: Option<StructuralAnomaly>,
    /// Why a pass marked `Failed` could not be persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_error: Option<String>,
}

impl FileReport {
    /// Whether either pass rewrote (or would rewrite) the file.
    pub fn changed(&self) -> bool {
        self.property_pass.changed() || self.item_pass.changed()
    }

    /// One advisory line per finding, naming this file.
    pub fn report_lines(&self) -> Vec<String> {
        self.findings
            .iter()
            .map(|finding| finding.report_line(&self.path))
            .collect()
    }
}

/// Applies both normalization passes to project files.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: NormalizeConfig,
    mode: WriteMode,
}

impl Normalizer {
    pub fn new(config: NormalizeConfig, mode: WriteMode) -> Self {
        Self { config, mode }
    }

    /// Sorts property groups and reports inconsistencies.
    pub fn normalize_properties(&self, doc: &mut Document) -> Vec<Finding> {
        PropertyGroupNormalizer::new(&self.config).normalize(doc)
    }

    /// Consolidates and sorts item groups.
    pub fn normalize_items(&self, doc: &mut Document) -> Result<Vec<Finding>, StructuralAnomaly> {
        normalize_item_groups(doc)
    }

    /// Runs both passes in memory.
    pub fn normalize_bytes(&self, input: &[u8]) -> Result<Normalized, NormalizeError> {
        let mut doc = Document::from_bytes(input)?;
        let mut findings = self.normalize_properties(&mut doc);
        findings.extend(self.normalize_items(&mut doc)?);
        Ok(Normalized {
            output: doc.to_bytes(),
            findings,
        })
    }

    /// Normalizes one file on disk.
    ///
    /// # Errors
    /// `Read` / `Parse` when the file cannot be loaded; nothing is written.
    /// Write failures are reported through [`FileReport::write_error`].
    pub fn process_file(&self, path: &Path) -> Result<FileReport, ProcessError> {
        let original = std::fs::read(path).map_err(|source| ProcessError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.process_contents(path, &original)
    }

    /// Normalizes `original`, the current content of `path`, and commits
    /// each changed pass to `path`.
    pub fn process_contents(
        &self,
        path: &Path,
        original: &[u8],
    ) -> Result<FileReport, ProcessError> {
        let mut doc = Document::from_bytes(original).map_err(|source| ProcessError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let mut write_error = None;

        let mut findings = self.normalize_properties(&mut doc);
        let after_properties = doc.to_bytes();
        let property_pass =
            self.commit_pass(path, original, &after_properties, "property", &mut write_error);

        let (item_pass, anomaly) = match self.normalize_items(&mut doc) {
            Ok(item_findings) => {
                findings.extend(item_findings);
                let outcome = if write_error.is_some() {
                    PassOutcome::Skipped
                } else {
                    let after_items = doc.to_bytes();
                    self.commit_pass(path, &after_properties, &after_items, "item", &mut write_error)
                };
                (outcome, None)
            }
            Err(anomaly) => {
                warn!(
                    "event=item_pass_skipped module=pipeline status=error path={} reason={}",
                    path.display(),
                    anomaly
                );
                (PassOutcome::Skipped, Some(anomaly))
            }
        };

        if property_pass.changed() || item_pass.changed() {
            info!(
                "event=file_normalized module=pipeline status=ok path={} property_pass={:?} item_pass={:?}",
                path.display(),
                property_pass,
                item_pass
            );
        } else {
            debug!(
                "event=file_unchanged module=pipeline status=ok path={}",
                path.display()
            );
        }

        Ok(FileReport {
            path: path.to_path_buf(),
            findings,
            property_pass,
            item_pass,
            anomaly,
            write_error,
        })
    }

    fn commit_pass(
        &self,
        path: &Path,
        baseline: &[u8],
        updated: &[u8],
        pass: &str,
        write_error: &mut Option<String>,
    ) -> PassOutcome {
        match commit(path, baseline, updated, self.mode) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(
                    "event=write_failed module=pipeline status=error path={} pass={pass} error={err}",
                    path.display()
                );
                *write_error = Some(format!(
                    "cannot write {} ({pass} pass): {err}",
                    path.display()
                ));
                PassOutcome::Failed
            }
        }
    }
}
