//! The line protocol between the pool and its workers.
//!
//! The pool writes one JSON [`RunRequest`] per line to a worker's stdin. The
//! worker answers with a single line on stdout holding [`OUTCOME_MARKER`]
//! followed by the JSON [`Outcome`]. Text before the marker on the same line
//! and any other stdout line are ignored, so stray writes that escape output
//! capture (even ones without a trailing newline) cannot corrupt the stream.
//! Closing stdin asks the worker to exit.

use fanout_collector::UnitId;
use fanout_report::Outcome;
use serde::{Deserialize, Serialize};

pub const OUTCOME_MARKER: &str = "@@fanout-outcome ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    pub unit: UnitId,
}

impl RunRequest {
    pub fn to_line(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }

    pub fn from_line(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line.trim_end())
    }
}

pub fn outcome_line(outcome: &Outcome) -> serde_json::Result<String> {
    Ok(format!("{OUTCOME_MARKER}{}\n", serde_json::to_string(outcome)?))
}

/// Returns `None` for lines that are not protocol lines.
pub fn parse_outcome_line(line: &str) -> Option<serde_json::Result<Outcome>> {
    let start = line.find(OUTCOME_MARKER)? + OUTCOME_MARKER.len();
    Some(serde_json::from_str(line[start..].trim_end()))
}

#[cfg(test)]
mod tests {
    use fanout_report::ErrorKind;

    use super::*;

    #[test]
    fn request_is_one_line_of_json() {
        let line = RunRequest {
            unit: UnitId::new("pkg.test_mod", "Case", "test_a"),
        }
        .to_line()
        .unwrap();

        insta::assert_snapshot!(line, @r#"{"unit":{"module":"pkg.test_mod","class":"Case","method":"test_a"}}"#);
        assert_eq!(
            RunRequest::from_line(&line).unwrap().unit.to_string(),
            "pkg.test_mod.Case.test_a"
        );
    }

    #[test]
    fn outcome_lines_are_marked() {
        let outcome = Outcome::errored(ErrorKind::Test, "ValueError").with_output("line one\nline two\n");
        let line = outcome_line(&outcome).unwrap();

        assert_eq!(line.matches('\n').count(), 1);
        assert_eq!(parse_outcome_line(&line).unwrap().unwrap(), outcome);
    }

    #[test]
    fn unterminated_output_before_the_marker_is_dropped() {
        let line = format!("partial{}", outcome_line(&Outcome::passed()).unwrap());
        assert_eq!(parse_outcome_line(&line).unwrap().unwrap(), Outcome::passed());
    }

    #[test]
    fn other_lines_are_not_protocol_lines() {
        assert!(parse_outcome_line("print from a test\n").is_none());
        assert!(parse_outcome_line("@@fanout-outcome {broken").unwrap().is_err());
    }
}
