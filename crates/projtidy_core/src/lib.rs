//! Canonical ordering for MSBuild-style project files.
//! This crate owns the group consolidation and ordering rules; the CLI only
//! wires them to the file system.

pub mod batch;
pub mod change;
pub mod config;
pub mod discovery;
pub mod findings;
pub mod logging;
pub mod normalize;
pub mod pipeline;
pub mod xml;

pub use batch::{run_batch, BatchReport, BatchSummary};
pub use change::{commit, PassOutcome, WriteMode};
pub use config::{ConfigError, NormalizeConfig, PairRule, PropertyMatcher};
pub use discovery::{discover_project_files, DiscoveryError};
pub use findings::{Finding, StructuralAnomaly};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget, LoggingError};
pub use pipeline::{FileReport, NormalizeError, Normalized, Normalizer, ProcessError};
pub use xml::{Document, XmlError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
