//! JUnit XML output for CI servers

use crate::case::{CaseStatus, TestCase};
use crate::error::{CatalogCheckError, CheckResult};
use crate::runner::RunSummary;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fmt::Display;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

/// Writes one `<testsuite>` with a `<testcase>` per node
pub struct JUnitReporter {
    suite_name: String,
}

impl Default for JUnitReporter {
    fn default() -> Self {
        Self::new("catalog-check")
    }
}

impl JUnitReporter {
    pub fn new(suite_name: impl Into<String>) -> Self {
        Self {
            suite_name: suite_name.into(),
        }
    }

    /// Write the report to `path`, creating parent directories
    pub fn write_file(&self, path: &Path, cases: &[TestCase]) -> CheckResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| CatalogCheckError::io(parent, e))?;
        }
        let file = File::create(path).map_err(|e| CatalogCheckError::io(path, e))?;
        let mut out = BufWriter::new(file);
        self.write_report(&mut out, cases)?;
        out.flush().map_err(|e| CatalogCheckError::io(path, e))
    }

    /// Render the report as a string
    pub fn render(&self, cases: &[TestCase]) -> CheckResult<String> {
        let mut out = Vec::new();
        self.write_report(&mut out, cases)?;
        String::from_utf8(out).map_err(report_error)
    }

    pub fn write_report<W: Write>(&self, out: W, cases: &[TestCase]) -> CheckResult<()> {
        let summary = RunSummary::from_cases(cases);
        let mut writer = Writer::new_with_indent(out, b' ', 2);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(report_error)?;

        let tests = summary.total.to_string();
        let failures = summary.failed.to_string();
        let skipped = summary.pending.to_string();
        let time = seconds(summary.duration);

        let mut suites = BytesStart::new("testsuites");
        suites.push_attribute(("name", self.suite_name.as_str()));
        suites.push_attribute(("tests", tests.as_str()));
        suites.push_attribute(("failures", failures.as_str()));
        suites.push_attribute(("time", time.as_str()));
        writer
            .write_event(Event::Start(suites))
            .map_err(report_error)?;

        let mut suite = BytesStart::new("testsuite");
        suite.push_attribute(("name", self.suite_name.as_str()));
        suite.push_attribute(("tests", tests.as_str()));
        suite.push_attribute(("failures", failures.as_str()));
        suite.push_attribute(("errors", "0"));
        suite.push_attribute(("skipped", skipped.as_str()));
        suite.push_attribute(("time", time.as_str()));
        writer
            .write_event(Event::Start(suite))
            .map_err(report_error)?;

        for case in cases {
            self.write_case(&mut writer, case)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new("testsuite")))
            .map_err(report_error)?;
        writer
            .write_event(Event::End(BytesEnd::new("testsuites")))
            .map_err(report_error)?;
        writer
            .get_mut()
            .write_all(b"\n")
            .map_err(report_error)
    }

    fn write_case<W: Write>(&self, writer: &mut Writer<W>, case: &TestCase) -> CheckResult<()> {
        let time = seconds(case.duration());
        let mut element = BytesStart::new("testcase");
        element.push_attribute(("name", case.name()));
        element.push_attribute(("classname", self.suite_name.as_str()));
        element.push_attribute(("time", time.as_str()));

        match case.status() {
            CaseStatus::Passed => writer
                .write_event(Event::Empty(element))
                .map_err(report_error),
            CaseStatus::Failed { error } => {
                writer
                    .write_event(Event::Start(element))
                    .map_err(report_error)?;

                let headline = error.lines().next().unwrap_or_default();
                let mut failure = BytesStart::new("failure");
                failure.push_attribute(("message", headline));
                failure.push_attribute(("type", "CatalogFailure"));
                writer
                    .write_event(Event::Start(failure))
                    .map_err(report_error)?;
                writer
                    .write_event(Event::Text(BytesText::new(error)))
                    .map_err(report_error)?;
                writer
                    .write_event(Event::End(BytesEnd::new("failure")))
                    .map_err(report_error)?;

                writer
                    .write_event(Event::End(BytesEnd::new("testcase")))
                    .map_err(report_error)
            }
            CaseStatus::Pending => {
                writer
                    .write_event(Event::Start(element))
                    .map_err(report_error)?;
                writer
                    .write_event(Event::Empty(BytesStart::new("skipped")))
                    .map_err(report_error)?;
                writer
                    .write_event(Event::End(BytesEnd::new("testcase")))
                    .map_err(report_error)
            }
        }
    }
}

fn seconds(duration: Duration) -> String {
    format!("{:.3}", duration.as_secs_f64())
}

fn report_error(error: impl Display) -> CatalogCheckError {
    CatalogCheckError::Report(error.to_string())
}
