use colored::Colorize;
use humansize::{format_size, DECIMAL};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use crate::errors::RunError;
use crate::model::{DocumentSource, Stage};
use crate::output::WrittenDocument;
use crate::pipeline::{Progress, RunReport, StageReport};

pub fn banner(title: &str) {
    println!("\n{}", format!("=== {title} ===").bold());
}

/// Console progress: stage banners plus a spinner while a section is being generated.
pub struct ConsoleProgress {
    spinners: bool,
    state: Mutex<SpinnerState>,
}

#[derive(Default)]
struct SpinnerState {
    total: usize,
    bar: Option<ProgressBar>,
}

impl ConsoleProgress {
    pub fn new(spinners: bool) -> Self {
        Self { spinners, state: Mutex::new(SpinnerState::default()) }
    }

    fn spinner(message: String) -> ProgressBar {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("  {spinner:.cyan} {msg} {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message);
        bar.enable_steady_tick(Duration::from_millis(120));
        bar
    }
}

impl Progress for ConsoleProgress {
    fn stage_started(&self, stage: Stage, sections: usize) {
        banner(stage.label());
        if let Ok(mut state) = self.state.lock() {
            state.total = sections;
        }
    }

    fn section_started(&self, _stage: Stage, index: usize, name: &str) {
        let Ok(mut state) = self.state.lock() else { return };
        let message = format!("[{}/{}] {name}", index + 1, state.total);
        if self.spinners {
            state.bar = Some(Self::spinner(message));
        }
    }

    fn section_finished(&self, _stage: Stage, index: usize, name: &str, ok: bool) {
        let Ok(mut state) = self.state.lock() else { return };
        if let Some(bar) = state.bar.take() {
            bar.finish_and_clear();
        }
        let mark = if ok { "✓".green().bold() } else { "✗".red().bold() };
        println!("  {mark} [{}/{}] {name}", index + 1, state.total);
    }

    fn stage_skipped(&self, stage: Stage, existing: Option<&Path>) {
        match existing {
            Some(path) => println!("{}  {stage} (using {})", "[SKIP]".yellow().bold(), path.display()),
            None => println!("{}  {stage} (no document; later stages get less context)", "[SKIP]".yellow().bold()),
        }
    }

    fn stage_written(&self, _stage: Stage, written: &WrittenDocument) {
        println!(
            "{}  {} (v{}, {})",
            "[WRITE]".green().bold(),
            written.path.display(),
            written.version,
            format_size(written.bytes, DECIMAL)
        );
        if let Some(archived) = &written.archived {
            println!("{}  previous version copied to {}", "[ARCHIVE]".cyan().bold(), archived.display());
        }
    }
}

pub fn print_run_summary(report: &RunReport) {
    let summary = &report.summary;
    println!("\n{}", "┏━━━━━━━━━━━━━━━━━━━━━━ Generation Summary ━━━━━━━━━━━━━━━━━━━━━━┓".bold());
    for (kind, record) in &summary.generated_files {
        let origin = match (record.source, record.version) {
            (DocumentSource::Existing, _) => "existing".yellow().to_string(),
            (DocumentSource::Generated, Some(v)) => format!("v{v}").green().to_string(),
            (DocumentSource::Generated, None) => "generated".green().to_string(),
        };
        println!(
            "  {:<20} {:<10} {:>9}  {}",
            kind.to_string(),
            origin,
            format_size(record.bytes, DECIMAL),
            record.path.display()
        );
    }
    if !summary.skipped.is_empty() {
        let names: Vec<String> = summary.skipped.iter().map(Stage::to_string).collect();
        println!("  {}: {}", "Skipped".yellow().bold(), names.join(", "));
    }
    println!("  {}: {}", "Summary".bold(), report.summary_path.display());
    println!("{}", "┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛".bold());
}

pub fn print_stage_report(report: &StageReport) {
    println!(
        "\n{} {} written to {}",
        "Done:".green().bold(),
        report.stage,
        report.written.path.display()
    );
    if let Some(validation) = &report.validation {
        println!("  validation notes: {}", validation.path.display());
    }
}

/// Report a failed run on stderr, naming the stage, section and error kind.
pub fn print_failure(err: &RunError) {
    eprintln!("{} {err}", "error:".red().bold());
    if err.stage().is_some() {
        eprintln!("{}", "Documents written by earlier stages were left in place.".dimmed());
    }
}
