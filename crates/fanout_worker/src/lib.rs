use std::io::{BufRead, Write};

use anyhow::Context;
use fanout_report::Outcome;
use fanout_runner::protocol::{RunRequest, outcome_line};
use fanout_runner::{TestFramework, run_units};

mod cli;

pub use cli::{ExitStatus, fanout_worker_main};

/// Answers run requests from `input` until it is closed.
///
/// Each request names one unit; its outcome is written to `output` as a
/// single protocol line before the next request is read. Returns the number
/// of units run.
pub fn serve(
    framework: &dyn TestFramework,
    input: impl BufRead,
    mut output: impl Write,
) -> anyhow::Result<usize> {
    let mut served = 0;

    for line in input.lines() {
        let line = line.context("Failed to read a request")?;
        if line.trim().is_empty() {
            continue;
        }

        let request =
            RunRequest::from_line(&line).with_context(|| format!("Malformed request `{line}`"))?;

        tracing::debug!(unit = %request.unit, "Running");

        let outcome = run_units(framework, std::slice::from_ref(&request.unit))
            .into_iter()
            .next()
            .unwrap_or_else(Outcome::incomplete);

        output.write_all(outcome_line(&outcome)?.as_bytes())?;
        output.flush()?;

        served += 1;
    }

    Ok(served)
}

#[cfg(test)]
mod tests {
    use fanout_collector::{DiscoveredModule, UnitId};
    use fanout_runner::{DiscoveryRequest, RecordedRun};

    use super::*;

    struct Framework;

    impl TestFramework for Framework {
        fn discover(&self, _: &DiscoveryRequest) -> anyhow::Result<Vec<DiscoveredModule>> {
            Ok(Vec::new())
        }

        fn run(&self, units: &[UnitId]) -> anyhow::Result<Vec<RecordedRun>> {
            Ok(units
                .iter()
                .map(|id| {
                    let outcome = if id.method == "test_fail" {
                        Outcome::failed("AssertionError")
                    } else {
                        Outcome::passed().with_output("hi\n")
                    };
                    RecordedRun::new(id.to_string(), outcome)
                })
                .collect())
        }
    }

    #[test]
    fn answers_each_request_with_one_line() {
        let input = concat!(
            r#"{"unit":{"module":"test_mod","class":"Case","method":"test_ok"}}"#,
            "\n\n",
            r#"{"unit":{"module":"test_mod","class":"Case","method":"test_fail"}}"#,
            "\n",
        );
        let mut output = Vec::new();

        let served = serve(&Framework, input.as_bytes(), &mut output).unwrap();

        assert_eq!(served, 2);
        insta::assert_snapshot!(String::from_utf8(output).unwrap(), @r#"
        @@fanout-outcome {"status":{"result":"passed"},"output":"hi\n","elapsed":{"secs":0,"nanos":0}}
        @@fanout-outcome {"status":{"result":"failed","detail":"AssertionError"},"output":"","elapsed":{"secs":0,"nanos":0}}
        "#);
    }

    #[test]
    fn malformed_requests_stop_the_worker() {
        let err = serve(&Framework, "not json\n".as_bytes(), Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "Malformed request `not json`");
    }
}
