//! Terminal progress rendering.
//!
//! Implements the engine's progress sink on top of indicatif: a byte-scaled
//! bar for the overall run, with the current file name as the bar message,
//! and a second line for live host statistics. Bar updates are in-memory
//! position changes, cheap enough for per-block calls.

use engine::{CopyReport, PathEntry, ProgressSink, TaskOutcome, TransferTask};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

use crate::format::format_speed;
use crate::stats::HostStats;

/// Progress display for one copy run.
pub struct ConsoleProgress {
    multi: MultiProgress,
    bar: ProgressBar,
    stats_line: ProgressBar,
    verbose: bool,
}

impl ConsoleProgress {
    pub fn new(verbose: bool) -> Self {
        let multi = MultiProgress::new();
        let bar = multi.add(ProgressBar::new(0));
        bar.set_style(transfer_bar_style());

        let stats_line = multi.add(ProgressBar::new(0));
        stats_line.set_style(
            ProgressStyle::with_template("{msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );

        ConsoleProgress {
            multi,
            bar,
            stats_line,
            verbose,
        }
    }

    /// Handle for the statistics line, for the sampler thread.
    pub fn stats_line(&self) -> ProgressBar {
        self.stats_line.clone()
    }

    /// Clear the bars once the run is over so the summary prints cleanly.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
        self.stats_line.finish_and_clear();
    }
}

fn transfer_bar_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta}) {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("=> ")
}

impl ProgressSink for ConsoleProgress {
    fn on_run_started(&self, _total_files: usize, total_bytes: u64) {
        self.bar.set_length(total_bytes);
    }

    fn on_file_started(&self, entry: &PathEntry) {
        self.bar.set_message(entry.display_name());
    }

    fn on_progress(&self, bytes_copied: u64, _bytes_total: u64, _entry: &PathEntry) {
        self.bar.set_position(bytes_copied);
    }

    fn on_file_completed(&self, task: &TransferTask) {
        if !self.verbose {
            return;
        }
        let status = match task.outcome {
            TaskOutcome::Succeeded => "Done",
            TaskOutcome::Failed => "Failed",
            TaskOutcome::Pending => "Pending",
        };
        let _ = self.multi.println(format!(
            "{}: {} ({} attempt(s))",
            status,
            task.entry.display_name(),
            task.attempts
        ));
    }

    fn on_run_completed(&self, _report: &CopyReport) {
        if let Some(length) = self.bar.length() {
            self.bar.set_position(length);
        }
    }
}

/// Render one host-statistics sample, in the style of the original stats
/// line: CPU, RAM, and network throughput side by side.
pub fn format_stats_line(stats: &HostStats) -> String {
    format!(
        "{} | {} | {} | {}",
        format!("CPU: {:>5.1}%", stats.cpu_percent).cyan(),
        format!("RAM: {:>5.1}%", stats.mem_percent).magenta(),
        format!("Up: {}", format_speed(stats.upload_bps)).green(),
        format!("Down: {}", format_speed(stats.download_bps)).yellow(),
    )
}
