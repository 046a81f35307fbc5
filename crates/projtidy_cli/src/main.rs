//! `projtidy` command line entry point.
//!
//! # Responsibility
//! - Parse arguments, load rules and discover project files.
//! - Hand the file list to the core batch driver and render its report.
//!
//! # Invariants
//! - Usage errors print usage text to stdout and exit with status -1 (255).
//! - Per-file failures never stop the batch; they only affect the exit status.

mod report;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use log::{info, warn};
use projtidy_core::{
    default_log_level, discover_project_files, init_logging, run_batch, NormalizeConfig,
    Normalizer, WriteMode,
};
use report::{exit_code, render_json, render_text, ExitPolicy};
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit status for invalid invocations; the shell sees -1 as 255.
const USAGE_EXIT: u8 = 255;
/// Exit status for unreadable or invalid rule files.
const CONFIG_EXIT: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "projtidy")]
#[command(
    about = "Sorts and consolidates the PropertyGroup and ItemGroup contents of MSBuild project files"
)]
#[command(version)]
struct Cli {
    #[arg(help = "Root directory searched recursively for project files")]
    root: PathBuf,
    #[arg(long, value_name = "PATH", help = "TOML file with ordering and consistency rules")]
    config: Option<PathBuf>,
    #[arg(long, help = "Do not write; exit 1 if any file would change")]
    check: bool,
    #[arg(long, help = "Exit 1 when any consistency finding is reported")]
    strict: bool,
    #[arg(long, help = "Print a JSON report instead of text lines")]
    json: bool,
    #[arg(long, value_name = "N", help = "Number of worker threads")]
    jobs: Option<usize>,
    #[arg(long, value_name = "LEVEL", help = "trace|debug|info|warn|error|off")]
    log_level: Option<String>,
    #[arg(long, value_name = "DIR", help = "Write rolling log files to this directory")]
    log_dir: Option<PathBuf>,
}

fn print_usage() {
    println!("{}", Cli::command().render_help());
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprint!("{}", err.render());
            print_usage();
            return ExitCode::from(USAGE_EXIT);
        }
    };

    if !cli.root.is_dir() {
        eprintln!("`{}` is not an existing directory", cli.root.display());
        print_usage();
        return ExitCode::from(USAGE_EXIT);
    }

    let log_dir = match cli.log_dir.as_deref().map(std::path::absolute).transpose() {
        Ok(dir) => dir,
        Err(err) => {
            eprintln!("invalid --log-dir: {err}");
            return ExitCode::from(USAGE_EXIT);
        }
    };
    let level = cli.log_level.as_deref().unwrap_or(default_log_level());
    if let Err(err) = init_logging(level, log_dir.as_deref()) {
        eprintln!("{err}");
        print_usage();
        return ExitCode::from(USAGE_EXIT);
    }

    let config = match cli.config.as_deref() {
        Some(path) => match NormalizeConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("{err}");
                return ExitCode::from(CONFIG_EXIT);
            }
        },
        None => NormalizeConfig::default(),
    };
    let pattern = match config.file_pattern() {
        Ok(pattern) => pattern,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(CONFIG_EXIT);
        }
    };

    if let Some(jobs) = cli.jobs.filter(|jobs| *jobs > 0) {
        if let Err(err) = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
        {
            warn!("event=thread_pool module=cli status=error error={err}");
        }
    }

    let files = match discover_project_files(&cli.root, &pattern) {
        Ok(files) => files,
        Err(err) => {
            eprintln!("{err}");
            print_usage();
            return ExitCode::from(USAGE_EXIT);
        }
    };
    info!(
        "event=discovery_done module=cli status=ok root={} files={}",
        cli.root.display(),
        files.len()
    );

    let mode = if cli.check {
        WriteMode::Check
    } else {
        WriteMode::Write
    };
    let normalizer = Normalizer::new(config, mode);
    let report = run_batch(&normalizer, &files);
    let summary = report.summary();

    if cli.json {
        match render_json(&report) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("cannot render JSON report: {err}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        render_text(&report, mode);
    }

    info!(
        "event=run_done module=cli status=ok files={} changed={} findings={} anomalies={} failures={}",
        summary.files, summary.changed, summary.findings, summary.anomalies, summary.failures
    );

    ExitCode::from(exit_code(
        &summary,
        ExitPolicy {
            check: cli.check,
            strict: cli.strict,
        },
    ))
}
