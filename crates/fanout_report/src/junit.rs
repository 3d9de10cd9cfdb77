use std::fmt::Write;
use std::time::Duration;

use crate::aggregator::{EntryId, Report, ReportEntry};
use crate::outcome::Status;

impl Report {
    /// Renders the report as an xunit-compatible XML document.
    ///
    /// Every entry becomes a `<testcase>` in a single `<testsuite>`; units
    /// use `module.Class` as their class name, and modules that failed to
    /// load use the module name with a `<module>` test name.
    pub fn to_junit_xml(&self) -> String {
        let stats = self.stats();
        let time: Duration = self
            .entries()
            .iter()
            .map(|entry| entry.outcome.elapsed)
            .sum();

        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        let _ = writeln!(
            xml,
            "<testsuite name=\"fanout\" tests=\"{}\" failures=\"{}\" errors=\"{}\" skipped=\"{}\" time=\"{:.3}\">",
            stats.total(),
            stats.failed,
            stats.errored,
            stats.skipped,
            time.as_secs_f64(),
        );

        for entry in self.entries() {
            write_testcase(&mut xml, entry);
        }

        xml.push_str("</testsuite>\n");
        xml
    }
}

fn write_testcase(xml: &mut String, entry: &ReportEntry) {
    let (classname, name) = match &entry.id {
        EntryId::Unit(id) => (id.class_path(), id.method.clone()),
        EntryId::Module(module) => (module.clone(), "<module>".to_string()),
    };

    let _ = write!(
        xml,
        "  <testcase classname=\"{}\" name=\"{}\" time=\"{:.3}\"",
        escape_xml(&classname),
        escape_xml(&name),
        entry.outcome.elapsed.as_secs_f64(),
    );

    let outcome = &entry.outcome;
    if matches!(outcome.status, Status::Passed) && outcome.output.is_empty() {
        xml.push_str("/>\n");
        return;
    }

    xml.push_str(">\n");
    match &outcome.status {
        Status::Passed => {}
        Status::Failed { detail } => {
            let _ = writeln!(
                xml,
                "    <failure message=\"{}\">{}</failure>",
                escape_xml(last_line(detail)),
                escape_xml(detail),
            );
        }
        Status::Errored { kind, detail } => {
            let _ = writeln!(
                xml,
                "    <error type=\"{kind}\" message=\"{}\">{}</error>",
                escape_xml(last_line(detail)),
                escape_xml(detail),
            );
        }
        Status::Skipped { reason } => {
            let _ = writeln!(xml, "    <skipped message=\"{}\"/>", escape_xml(reason));
        }
    }
    if !outcome.output.is_empty() {
        let _ = writeln!(xml, "    <system-out>{}</system-out>", escape_xml(&outcome.output));
    }
    xml.push_str("  </testcase>\n");
}

fn last_line(detail: &str) -> &str {
    detail
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .unwrap_or_default()
        .trim()
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
