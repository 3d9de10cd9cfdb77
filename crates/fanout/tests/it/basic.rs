use insta_cmd::assert_cmd_snapshot;

use crate::common::TestContext;

#[test]
fn test_all_units_pass_across_workers() {
    let context = TestContext::with_file(
        "test_math.py",
        r"
        import unittest

        class MathCase(unittest.TestCase):
            def test_add(self):
                self.assertEqual(1 + 1, 2)

            def test_mul(self):
                self.assertEqual(2 * 3, 6)

            def test_sub(self):
                self.assertEqual(3 - 1, 2)
        ",
    );

    assert_cmd_snapshot!(context.command().args(["--num-workers", "2"]), @r"
    success: true
    exit_code: 0
    ----- stdout -----
    test test_math.MathCase.test_add ... ok
    test test_math.MathCase.test_mul ... ok
    test test_math.MathCase.test_sub ... ok

    test result: ok. 3 passed; 0 failed; 0 errored; 0 skipped; finished in [TIME]

    ----- stderr -----
    ");
}

#[test]
fn test_empty_directory() {
    let context = TestContext::new();

    assert_cmd_snapshot!(context.command(), @r"
    success: true
    exit_code: 0
    ----- stdout -----
    test result: ok. 0 passed; 0 failed; 0 errored; 0 skipped; finished in [TIME]

    ----- stderr -----
    ");
}

#[test]
fn test_failures_fail_the_run() {
    let context = TestContext::with_file(
        "test_calc.py",
        r"
        import unittest

        class Calc(unittest.TestCase):
            def test_bad(self):
                self.assertEqual(1, 2)

            def test_good(self):
                pass

            @unittest.skip('flaky on CI')
            def test_later(self):
                pass

            def test_raises(self):
                raise KeyError('missing')
        ",
    );

    assert_cmd_snapshot!(context.command().args(["--output-format", "concise"]), @r"
    success: false
    exit_code: 1
    ----- stdout -----
    test test_calc.Calc.test_bad ... FAILED
    test test_calc.Calc.test_good ... ok
    test test_calc.Calc.test_later ... skipped
    test test_calc.Calc.test_raises ... ERROR

    diagnostics:

    test_calc.Calc.test_bad: AssertionError: 1 != 2
    test_calc.Calc.test_raises (test): KeyError: 'missing'

    test result: FAILED. 1 passed; 1 failed; 1 errored; 1 skipped; finished in [TIME]

    ----- stderr -----
    ");
}

#[test]
fn test_quiet_prints_only_the_summary() {
    let context = TestContext::with_file(
        "test_calc.py",
        r"
        import unittest

        class Calc(unittest.TestCase):
            def test_bad(self):
                self.assertEqual(1, 2)
        ",
    );

    assert_cmd_snapshot!(context.command().arg("-q"), @r"
    success: false
    exit_code: 1
    ----- stdout -----
    test result: FAILED. 0 passed; 1 failed; 0 errored; 0 skipped; finished in [TIME]

    ----- stderr -----
    ");
}

#[test]
fn test_captured_output_is_shown_for_failures() {
    let context = TestContext::with_file(
        "test_noisy.py",
        r"
        import unittest

        class Noisy(unittest.TestCase):
            def test_prints(self):
                print('connecting to the database')
                self.fail('gave up')
        ",
    );

    let output = context.command().output().unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout.contains("---- test_noisy.Noisy.test_prints ----"));
    assert!(stdout.contains("AssertionError: gave up"));
    assert!(stdout.contains("captured output:\nconnecting to the database\n"));
}

#[cfg(unix)]
#[test]
fn test_crashing_worker_loses_only_its_unit() {
    let context = TestContext::with_file(
        "test_crash.py",
        r"
        import os
        import unittest

        class Crash(unittest.TestCase):
            def test_a(self):
                pass

            def test_b(self):
                os._exit(3)

            def test_c(self):
                pass
        ",
    );

    let output = context
        .command()
        .args(["--num-workers", "2", "--output-format", "concise"])
        .output()
        .unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout.contains("test test_crash.Crash.test_a ... ok"));
    assert!(stdout.contains("test test_crash.Crash.test_b ... ERROR"));
    assert!(stdout.contains("test test_crash.Crash.test_c ... ok"));
    assert!(stdout.contains("test_crash.Crash.test_b (worker lost)"));
    assert!(stdout.contains("2 passed; 0 failed; 1 errored; 0 skipped"));
}

#[test]
fn test_junit_xml_report() {
    let context = TestContext::with_file(
        "test_calc.py",
        r"
        import unittest

        class Calc(unittest.TestCase):
            def test_bad(self):
                self.assertEqual(1, 2)

            def test_good(self):
                pass
        ",
    );

    let output = context
        .command()
        .args(["--junit-xml", "reports/junit.xml"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let xml = std::fs::read_to_string(context.root().join("reports/junit.xml")).unwrap();
    assert!(xml.contains(r#"<testsuite name="fanout" tests="2" failures="1" errors="0" skipped="0""#));
    assert!(xml.contains(r#"<testcase classname="test_calc.Calc" name="test_good""#));
}

#[test]
fn test_version() {
    let context = TestContext::new();

    let output = context.fanout().arg("version").output().unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();

    assert!(output.status.success());
    assert!(stdout.starts_with(&format!("fanout {}", env!("CARGO_PKG_VERSION"))));
}
