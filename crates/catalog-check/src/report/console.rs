//! Console reporter - display test results

use crate::case::{CaseStatus, TestCase};
use crate::runner::RunSummary;
use colored::*;
use std::io::{self, Write};

/// Console reporter with output configuration
pub struct ConsoleReporter {
    /// Show one line per node instead of dots
    verbose: bool,
    /// Disable colored output
    no_color: bool,
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new(false)
    }
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            no_color: false,
        }
    }

    /// Disable colored output
    pub fn with_no_color(mut self, no_color: bool) -> Self {
        self.no_color = no_color;
        self
    }

    /// Report to stdout
    pub fn report(&self, cases: &[TestCase]) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.write_report(&mut out, cases)
    }

    /// Report to any writer
    pub fn write_report<W: Write>(&self, out: &mut W, cases: &[TestCase]) -> io::Result<()> {
        if self.no_color {
            colored::control::set_override(false);
        }

        let result = self.write_all(out, cases);

        if self.no_color {
            colored::control::unset_override();
        }
        result
    }

    fn write_all<W: Write>(&self, out: &mut W, cases: &[TestCase]) -> io::Result<()> {
        for case in cases {
            self.write_case(out, case)?;
        }

        // Dots need a newline before the summary
        if !self.verbose && !cases.is_empty() {
            writeln!(out)?;
        }

        writeln!(out)?;
        self.write_summary(out, &RunSummary::from_cases(cases))?;
        self.write_failures(out, cases)
    }

    fn write_case<W: Write>(&self, out: &mut W, case: &TestCase) -> io::Result<()> {
        let (long, short) = match case.status() {
            CaseStatus::Passed => ("PASS".green().bold(), ".".green()),
            CaseStatus::Failed { .. } => ("FAIL".red().bold(), "F".red().bold()),
            CaseStatus::Pending => ("SKIP".yellow().bold(), "S".yellow()),
        };

        if self.verbose {
            writeln!(out, "{} {} ({:.2?})", long, case.name(), case.duration())
        } else {
            write!(out, "{}", short)?;
            out.flush()
        }
    }

    fn write_summary<W: Write>(&self, out: &mut W, summary: &RunSummary) -> io::Result<()> {
        writeln!(out, "{}", "─".repeat(50))?;

        let status = if summary.is_success() {
            "PASSED".green().bold()
        } else {
            "FAILED".red().bold()
        };

        write!(
            out,
            "Catalog result: {} | {} nodes, {} passed, {} failed",
            status,
            summary.total.to_string().bold(),
            summary.passed.to_string().green().bold(),
            if summary.failed > 0 {
                summary.failed.to_string().red().bold()
            } else {
                summary.failed.to_string().normal()
            }
        )?;
        if summary.pending > 0 {
            write!(out, ", {} not run", summary.pending.to_string().yellow())?;
        }
        writeln!(out)?;
        writeln!(out, "Time: {:.2?}", summary.duration)
    }

    fn write_failures<W: Write>(&self, out: &mut W, cases: &[TestCase]) -> io::Result<()> {
        let failures: Vec<_> = cases.iter().filter(|c| c.passed() == Some(false)).collect();
        if failures.is_empty() {
            return Ok(());
        }

        writeln!(out)?;
        writeln!(out, "{}", "Failures:".red().bold())?;
        writeln!(out)?;

        for case in failures {
            writeln!(out, "  {} {}", "●".red(), case.name().bold())?;
            for line in case.error().unwrap_or_default().lines() {
                writeln!(out, "      {}", line.dimmed())?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}
