//! Text and JSON rendering of a batch report, plus the exit status policy.

use projtidy_core::{BatchReport, BatchSummary, FileReport, WriteMode};
use serde::Serialize;

/// Flags that turn advisory results into a failing exit status.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExitPolicy {
    pub check: bool,
    pub strict: bool,
}

/// Maps a summary to the process exit status.
///
/// Failures and anomalies always fail the run. Changes fail only in check
/// mode; findings only in strict mode.
pub fn exit_code(summary: &BatchSummary, policy: ExitPolicy) -> u8 {
    if summary.failures > 0 || summary.anomalies > 0 {
        return 1;
    }
    if policy.check && summary.changed > 0 {
        return 1;
    }
    if policy.strict && summary.findings > 0 {
        return 1;
    }
    0
}

/// Prints findings to stdout and failures to stderr, one per line.
pub fn render_text(report: &BatchReport, mode: WriteMode) {
    for entry in &report.entries {
        match entry {
            Ok(file) => {
                for line in file.report_lines() {
                    println!("{line}");
                }
                if let Some(anomaly) = &file.anomaly {
                    eprintln!("error: {}: {anomaly}", file.path.display());
                }
                if let Some(write_error) = &file.write_error {
                    eprintln!("error: {write_error}");
                }
                if mode == WriteMode::Check && file.changed() {
                    println!("would rewrite {}", file.path.display());
                }
            }
            Err(err) => eprintln!("error: {err}"),
        }
    }
}

#[derive(Serialize)]
struct JsonFailure {
    path: String,
    error: String,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: BatchSummary,
    files: Vec<&'a FileReport>,
    failures: Vec<JsonFailure>,
}

/// Renders the whole report as pretty JSON.
pub fn render_json(report: &BatchReport) -> serde_json::Result<String> {
    let mut files = Vec::new();
    let mut failures = Vec::new();
    for entry in &report.entries {
        match entry {
            Ok(file) => files.push(file),
            Err(err) => failures.push(JsonFailure {
                path: err.path().display().to_string(),
                error: err.to_string(),
            }),
        }
    }
    serde_json::to_string_pretty(&JsonReport {
        summary: report.summary(),
        files,
        failures,
    })
}

#[cfg(test)]
mod tests {
    use super::{exit_code, ExitPolicy};
    use projtidy_core::BatchSummary;

    #[test]
    fn findings_alone_keep_success_unless_strict() {
        let summary = BatchSummary {
            files: 2,
            findings: 3,
            ..BatchSummary::default()
        };
        assert_eq!(exit_code(&summary, ExitPolicy::default()), 0);
        assert_eq!(
            exit_code(
                &summary,
                ExitPolicy {
                    strict: true,
                    ..ExitPolicy::default()
                }
            ),
            1
        );
    }

    #[test]
    fn changes_fail_only_in_check_mode() {
        let summary = BatchSummary {
            files: 1,
            changed: 1,
            ..BatchSummary::default()
        };
        assert_eq!(exit_code(&summary, ExitPolicy::default()), 0);
        assert_eq!(
            exit_code(
                &summary,
                ExitPolicy {
                    check: true,
                    ..ExitPolicy::default()
                }
            ),
            1
        );
    }

    #[test]
    fn failures_and_anomalies_always_fail() {
        let failed = BatchSummary {
            files: 1,
            failures: 1,
            ..BatchSummary::default()
        };
        let anomalous = BatchSummary {
            files: 1,
            anomalies: 1,
            ..BatchSummary::default()
        };
        assert_eq!(exit_code(&failed, ExitPolicy::default()), 1);
        assert_eq!(exit_code(&anomalous, ExitPolicy::default()), 1);
    }
}
