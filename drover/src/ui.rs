//! Terminal presentation: headers, progress bars, the in-session spinner.
//!
//! Purely a rendering layer over structured data from the controller; no
//! decisions are made here.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use colored::Colorize;

use crate::core::integrity::IntegrityViolation;
use crate::core::progress::ProgressReport;
use crate::core::types::{SessionKind, SessionStatus};
use crate::io::config::UiConfig;
use crate::looping::{LoopEvent, LoopOutcome, StopReason};
use crate::session::SessionOutcome;

const DIVIDER_WIDTH: usize = 70;
const BAR_WIDTH: usize = 20;

/// Render one controller event.
pub fn render_event(event: &LoopEvent, ui: &UiConfig) {
    match event {
        LoopEvent::SpecSeeded { path } => {
            println!("Created {}", path.display());
        }
        LoopEvent::SessionStarting { session, kind } => {
            print_session_header(*session, *kind);
        }
        LoopEvent::SessionFinished { outcome, .. } => {
            print_session_result(outcome);
        }
        LoopEvent::IntegrityViolation {
            kind,
            violations,
            restored,
        } => {
            print_violations(*kind, violations, *restored);
        }
        LoopEvent::Progress(report) => {
            print_progress(report, ui);
        }
        LoopEvent::WaitingForStop { window } => {
            println!(
                "\n{}",
                format!(
                    "Press any key within {}s to stop after this session...",
                    window.as_secs()
                )
                .dimmed()
            );
        }
    }
}

pub fn print_header(project_dir: &Path, model: &str, max_sessions: Option<u32>) {
    println!();
    println!("{}", "drover".bold().cyan());
    println!("  {} {}", "Project".dimmed(), project_dir.display());
    println!("  {} {}", "Model".dimmed(), model);
    match max_sessions {
        Some(max) => println!("  {} {}", "Sessions".dimmed(), max),
        None => println!("  {} {}", "Sessions".dimmed(), "unlimited".dimmed()),
    }
    println!();
}

fn print_session_header(session: u32, kind: SessionKind) {
    let title = match kind {
        SessionKind::Initializer => "INITIALIZER",
        SessionKind::AdoptionInitializer => "ADOPTION INITIALIZER",
        SessionKind::EnhancementInitializer => "ENHANCEMENT INITIALIZER",
        SessionKind::Coding => "CODING AGENT",
    };
    println!();
    println!("{}", "=".repeat(DIVIDER_WIDTH).cyan());
    println!("{}", format!("  SESSION {session}: {title}").bold().cyan());
    println!("{}", "=".repeat(DIVIDER_WIDTH).cyan());
    println!();
}

fn print_session_result(outcome: &SessionOutcome) {
    if !outcome.output.is_empty() {
        println!("{}", outcome.output);
    }
    match outcome.status {
        SessionStatus::Continue => {
            if !outcome.error.is_empty() {
                println!("\n{} {}", "[stderr]:".red(), outcome.error);
            }
        }
        SessionStatus::Timeout => {
            println!("\n{}", outcome.error.red());
        }
        SessionStatus::Error => {
            println!("\n{} {}", "Session error:".red(), outcome.error);
            println!("{}", "Will retry with a fresh session...".dimmed());
        }
    }
    println!("\n{}\n", "─".repeat(DIVIDER_WIDTH).dimmed());
}

fn print_violations(kind: SessionKind, violations: &[IntegrityViolation], restored: bool) {
    println!(
        "{}",
        format!("Warning: {kind} session made disallowed checklist changes:").yellow()
    );
    for violation in violations {
        println!("{}", format!("  - {violation}").yellow());
    }
    if restored {
        println!("{}", "Checklist restored from the pre-session snapshot.".yellow());
    } else {
        println!(
            "{}",
            "No known-good snapshot exists; leaving the checklist as written.".yellow()
        );
    }
}

/// Progress bar plus newly-passing and pending feature lists.
pub fn print_progress(report: &ProgressReport, ui: &UiConfig) {
    let Some(percent) = report.percent else {
        println!("{}", "Progress: no checklist yet".dimmed());
        return;
    };

    let filled = ((percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    let bar = format!(
        "{}{}",
        "█".repeat(filled.min(BAR_WIDTH)),
        "░".repeat(BAR_WIDTH.saturating_sub(filled))
    );
    let line = format!(
        "Progress: {bar} {}/{} ({percent:.1}%)",
        report.passing, report.total
    );
    if percent >= 100.0 {
        println!("{}", line.green().bold());
    } else if percent >= 50.0 {
        println!("{}", line.yellow());
    } else {
        println!("{line}");
    }

    if !report.newly_passed.is_empty() {
        println!("{}", "Newly passing:".green().bold());
        for name in &report.newly_passed {
            println!("  {} {}", "✓".green(), truncate(name, ui.feature_name_max_length));
        }
    }

    if !report.pending.is_empty() {
        println!("{}", "Pending:".dimmed());
        for name in report.pending.iter().take(ui.pending_display_limit) {
            println!("  {} {}", "○".dimmed(), truncate(name, ui.feature_name_max_length));
        }
        let hidden = report.pending.len().saturating_sub(ui.pending_display_limit);
        if hidden > 0 {
            println!("{}", format!("  ... and {hidden} more").dimmed());
        }
    }
}

pub fn print_outcome(outcome: &LoopOutcome, project_dir: &Path) {
    println!();
    match outcome.stop {
        StopReason::Complete => {
            println!("{}", "COMPLETE".green().bold());
        }
        StopReason::MaxSessionsReached => {
            println!(
                "{}",
                format!("Reached session ceiling ({})", outcome.sessions_executed).yellow()
            );
            println!("{}", "Run `drover resume` to continue.".dimmed());
        }
        StopReason::UserStopped => {
            println!("{}", "Stopped by user.".yellow());
            println!("{}", "Run `drover resume` to continue.".dimmed());
        }
    }
    println!(
        "  {} {} sessions in {}",
        "Ran".dimmed(),
        outcome.sessions_executed,
        format_elapsed(outcome.elapsed)
    );
    println!("  {} {}", "Project".dimmed(), project_dir.display());
}

fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs >= 3600 {
        format!("{}h{:02}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m{:02}s", secs / 60, secs % 60)
    } else {
        format!("{secs}s")
    }
}

fn truncate(name: &str, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        return name.to_string();
    }
    let kept: String = name.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{kept}…")
}

/// Elapsed-time spinner shown on stderr while the agent runs.
///
/// Driven by the completion-poll tick; never spawns anything of its own.
pub struct Spinner {
    frame: usize,
}

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

impl Spinner {
    pub fn new() -> Self {
        Self { frame: 0 }
    }

    pub fn tick(&mut self, elapsed: Duration) {
        let glyph = SPINNER_FRAMES[self.frame % SPINNER_FRAMES.len()];
        self.frame += 1;
        let mut stderr = std::io::stderr();
        let _ = write!(stderr, "\r{glyph} running... {}s ", elapsed.as_secs());
        let _ = stderr.flush();
    }

    pub fn finish(self) {
        let mut stderr = std::io::stderr();
        let _ = write!(stderr, "\r{}\r", " ".repeat(30));
        let _ = stderr.flush();
    }
}

impl Default for Spinner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_names_and_marks_long_ones() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a-rather-long-feature-name", 10), "a-rather-…");
    }

    #[test]
    fn elapsed_formats_scale_with_magnitude() {
        assert_eq!(format_elapsed(Duration::from_secs(42)), "42s");
        assert_eq!(format_elapsed(Duration::from_secs(62)), "1m02s");
        assert_eq!(format_elapsed(Duration::from_secs(3725)), "1h02m");
    }
}
