//! Console reporting for suite runs.
//!
//! One line per scenario plus a single-line aggregate summary; the failing
//! step's reason is shown when applicable. The process exit code is derived
//! from the report, not from the reporter.

use crate::harness::{ScenarioRecord, SuiteReport};

/// Styles and prints suite progress to stderr-friendly plain lines.
///
/// Color is optional so CI logs stay readable; quiet mode suppresses
/// per-scenario lines and keeps only the summary.
#[derive(Debug, Clone)]
pub struct ConsoleReporter {
    /// Whether to use ANSI colors
    pub use_color: bool,
    /// Suppress per-scenario lines
    pub quiet: bool,
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self {
            use_color: true,
            quiet: false,
        }
    }
}

impl ConsoleReporter {
    /// Create a reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self { use_color, quiet }
    }

    /// Format one scenario line
    #[must_use]
    pub fn scenario_line(&self, record: &ScenarioRecord) -> String {
        let mark = if record.passed() {
            self.paint("\u{2713}", "PASS", |s| s.green().bold())
        } else {
            self.paint("\u{2717}", "FAIL", |s| s.red().bold())
        };
        let mut line = format!(
            "{mark} {} ({} steps, {:.1}s)",
            record.name,
            record.outcome.steps_executed,
            record.outcome.duration.as_secs_f64()
        );
        if let Some(reason) = &record.outcome.failure_reason {
            let step = record
                .outcome
                .failure_step
                .map_or_else(|| "setup".to_string(), |i| format!("step {i}"));
            line.push_str(&format!("\n    {step}: {reason}"));
        }
        line
    }

    /// Format the single-line aggregate summary
    #[must_use]
    pub fn summary_line(&self, report: &SuiteReport) -> String {
        let verdict = if report.all_passed() {
            self.paint("ok", "ok", |s| s.green().bold())
        } else {
            self.paint("FAILED", "FAILED", |s| s.red().bold())
        };
        format!(
            "{verdict}. {} passed; {} failed; finished in {:.2}s",
            report.passed_count(),
            report.failed_count(),
            report.duration.as_secs_f64()
        )
    }

    /// Print one scenario record
    pub fn report_scenario(&self, record: &ScenarioRecord) {
        if self.quiet {
            return;
        }
        println!("{}", self.scenario_line(record));
    }

    /// Print the aggregate summary
    pub fn summary(&self, report: &SuiteReport) {
        println!("{}", self.summary_line(report));
    }

    fn paint(
        &self,
        symbol: &str,
        plain: &str,
        style: impl FnOnce(console::StyledObject<String>) -> console::StyledObject<String>,
    ) -> String {
        if self.use_color {
            style(console::style(symbol.to_string())).to_string()
        } else {
            plain.to_string()
        }
    }
}
