use insta_cmd::assert_cmd_snapshot;

use crate::common::TestContext;

const TESTS: &str = r"
import unittest

class Math(unittest.TestCase):
    def test_add(self):
        pass
";

#[test]
fn test_fanout_toml_pattern() {
    let context = TestContext::with_files([
        ("fanout.toml", "[discovery]\npattern = \"check_*.py\"\n"),
        ("check_math.py", TESTS),
        ("test_math.py", "raise SystemExit('should not be imported')\n"),
    ]);

    assert_cmd_snapshot!(context.command(), @r"
    success: true
    exit_code: 0
    ----- stdout -----
    test check_math.Math.test_add ... ok

    test result: ok. 1 passed; 0 failed; 0 errored; 0 skipped; finished in [TIME]

    ----- stderr -----
    ");
}

#[test]
fn test_pyproject_tool_table() {
    let context = TestContext::with_files([
        (
            "pyproject.toml",
            "[project]\nname = \"demo\"\n\n[tool.fanout.terminal]\noutput-format = \"concise\"\n",
        ),
        (
            "test_math.py",
            r"
            import unittest

            class Math(unittest.TestCase):
                def test_bad(self):
                    self.assertEqual(1, 2)
            ",
        ),
    ]);

    assert_cmd_snapshot!(context.command(), @r"
    success: false
    exit_code: 1
    ----- stdout -----
    test test_math.Math.test_bad ... FAILED

    diagnostics:

    test_math.Math.test_bad: AssertionError: 1 != 2

    test result: FAILED. 0 passed; 1 failed; 0 errored; 0 skipped; finished in [TIME]

    ----- stderr -----
    ");
}

#[test]
fn test_cli_overrides_file() {
    let context = TestContext::with_files([
        ("fanout.toml", "[discovery]\npattern = \"nothing_*.py\"\n"),
        ("test_math.py", TESTS),
    ]);

    assert_cmd_snapshot!(context.command().args(["--pattern", "test_*.py"]), @r"
    success: true
    exit_code: 0
    ----- stdout -----
    test test_math.Math.test_add ... ok

    test result: ok. 1 passed; 0 failed; 0 errored; 0 skipped; finished in [TIME]

    ----- stderr -----
    ");
}

#[test]
fn test_unknown_option_is_fatal() {
    let context = TestContext::with_files([
        ("fanout.toml", "[run]\nthreads = 4\n"),
        ("test_math.py", TESTS),
    ]);

    let output = context.command().output().unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("Failed to parse `"));
    assert!(stderr.contains("fanout.toml`"));
}

#[test]
fn test_pyproject_is_rejected_as_config_file() {
    let context = TestContext::with_files([("pyproject.toml", ""), ("test_math.py", TESTS)]);

    assert_cmd_snapshot!(context.command().args(["--config-file", "pyproject.toml"]), @r"
    success: false
    exit_code: 2
    ----- stdout -----

    ----- stderr -----
    fanout failed
      Cause: `[TEMP_DIR]/pyproject.toml` is a `pyproject.toml`; configuration passed with `--config-file` must be a `fanout.toml`
    ");
}
