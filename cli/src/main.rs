//! VCopy - Command-line interface for the verified copy engine.
//!
//! Provides argument parsing, a byte-scaled progress bar, a live host
//! statistics line, and exit-code mapping on top of the engine.

use clap::Parser;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use engine::{CancelToken, ChecksumAlgorithm, CopyReport, OperationMode, RunOptions};

mod display;
mod format;
mod stats;

use display::ConsoleProgress;
use format::{format_bytes, format_duration};
use stats::SystemMonitor;

/// VCopy - copy files and directories with checksum verification
#[derive(Parser, Debug)]
#[command(name = "vcopy")]
#[command(version = "0.1.0")]
#[command(about = "Copy files and directories with checksum verification, retries, and progress tracking")]
struct Args {
    /// Source file or directory
    #[arg(value_name = "SOURCE")]
    source: PathBuf,

    /// Destination path
    #[arg(value_name = "DESTINATION")]
    destination: PathBuf,

    /// Additional attempts after a failed copy
    #[arg(long, value_name = "N", default_value_t = 0)]
    retry: u32,

    /// List files absent or mismatched at the destination;
    /// pass 'copy-all' to copy them as well
    #[arg(long, value_name = "ACTION", num_args = 0..=1, default_missing_value = "report")]
    list_missing: Option<String>,

    /// Checksum algorithm: md5, sha256, blake3
    #[arg(long, value_name = "ALGORITHM", default_value = "md5")]
    hash: String,

    /// Per-file status lines
    #[arg(long)]
    verbose: bool,

    /// Disable the live CPU/RAM/network statistics line
    #[arg(long)]
    no_stats: bool,
}

fn main() {
    let args = Args::parse();

    let exit_code = match run_cli(&args) {
        Ok(()) => 0,
        Err(msg) => {
            eprintln!("{} {}", "Error:".red().bold(), msg);
            2
        }
    };

    std::process::exit(exit_code);
}

/// Main CLI logic - separated for testability
fn run_cli(args: &Args) -> Result<(), String> {
    let mode = parse_mode(args)?;
    let algorithm = ChecksumAlgorithm::from_str(&args.hash).ok_or_else(|| {
        format!(
            "Invalid hash algorithm '{}'. Must be 'md5', 'sha256', or 'blake3'",
            args.hash
        )
    })?;

    let options = RunOptions {
        mode,
        max_retries: args.retry,
        algorithm,
        ..RunOptions::default()
    };
    let cancel = CancelToken::new();

    print_header(args, mode);

    // Report-only mode needs no bars and no telemetry
    if mode == OperationMode::ListMissing {
        let report = engine::run(&args.source, &args.destination, &options, None, &cancel)
            .map_err(|e| e.to_string())?;
        print_missing(&report);
        return Ok(());
    }

    let progress = ConsoleProgress::new(args.verbose);

    let stats_stop = Arc::new(AtomicBool::new(false));
    let stats_handle = if args.no_stats {
        None
    } else {
        let line = progress.stats_line();
        let stop = Arc::clone(&stats_stop);
        Some(thread::spawn(move || {
            let mut monitor = SystemMonitor::new();
            while !stop.load(Ordering::SeqCst) {
                let sample = monitor.sample();
                line.set_message(display::format_stats_line(&sample));
                thread::sleep(Duration::from_secs(1));
            }
        }))
    };

    let result = engine::run(
        &args.source,
        &args.destination,
        &options,
        Some(&progress),
        &cancel,
    );

    stats_stop.store(true, Ordering::SeqCst);
    if let Some(handle) = stats_handle {
        let _ = handle.join();
    }
    progress.finish();

    let report = result.map_err(|e| e.to_string())?;
    print_summary(&report);

    if report.cancelled {
        return Err("Run cancelled before completion".to_string());
    }
    if !report.overall_success() {
        return Err(format!("{} file(s) failed to copy", report.files_failed));
    }
    Ok(())
}

fn parse_mode(args: &Args) -> Result<OperationMode, String> {
    match args.list_missing.as_deref() {
        None => Ok(OperationMode::CopyAll),
        Some("report") => Ok(OperationMode::ListMissing),
        Some("copy-all") => Ok(OperationMode::CopyMissingOnly),
        Some(other) => Err(format!(
            "Invalid --list-missing action '{}'. Omit the value to report, or pass 'copy-all'",
            other
        )),
    }
}

fn print_header(args: &Args, mode: OperationMode) {
    eprintln!("{}", "--- VCopy ---".bold());
    eprintln!("{}    {}", "Mode:".bold(), mode);
    eprintln!("{}  {}", "Source:".bold(), args.source.display().cyan());
    eprintln!(
        "{} {}",
        "Destination:".bold(),
        args.destination.display().cyan()
    );
    eprintln!();
}

fn print_missing(report: &CopyReport) {
    if report.missing.is_empty() {
        eprintln!(
            "{}",
            "Destination already holds every source file.".green()
        );
        return;
    }
    eprintln!("Missing at destination:");
    for entry in &report.missing {
        if entry.relative_path.as_os_str().is_empty() {
            eprintln!("  {}", entry.display_name());
        } else {
            eprintln!("  {}", entry.relative_path.display());
        }
    }
    eprintln!();
    eprintln!("{} file(s) missing or mismatched", report.missing.len());
}

fn print_summary(report: &CopyReport) {
    eprintln!();
    if report.cancelled {
        eprintln!("{}", "✖ Operation cancelled.".yellow().bold());
    } else if report.overall_success() {
        let total = report.files_succeeded + report.files_skipped;
        if total == 0 {
            eprintln!(
                "{}",
                "Warning: Source is empty. Nothing to copy.".yellow()
            );
        } else {
            eprintln!("{}", "✔ Transfer complete!".blue().bold());
        }
    } else {
        eprintln!("{}", "✖ Transfer finished with errors.".red().bold());
    }

    eprintln!(
        "Summary: {} copied, {} skipped, {} failed",
        report.files_succeeded, report.files_skipped, report.files_failed
    );
    eprintln!("Bytes copied: {}", format_bytes(report.bytes_copied));
    eprintln!("Elapsed: {}", format_duration(report.elapsed));

    if !report.failures.is_empty() {
        eprintln!();
        eprintln!("Failed files:");
        for failure in &report.failures {
            let name = if failure.relative_path.as_os_str().is_empty() {
                failure.source_path.display().to_string()
            } else {
                failure.relative_path.display().to_string()
            };
            eprintln!("  {}: {}", name, failure.error);
        }
    }
}
