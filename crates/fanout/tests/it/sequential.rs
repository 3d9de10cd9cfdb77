use insta_cmd::assert_cmd_snapshot;

use crate::common::TestContext;

#[test]
fn test_sequential_module_runs_every_unit_after_a_failure() {
    let context = TestContext::with_file(
        "test_serial.py",
        r"
        import unittest

        __no_parallel__ = True

        class Serial(unittest.TestCase):
            def test_1_first(self):
                self.assertTrue(False, 'first one fails')

            def test_2_second(self):
                pass
        ",
    );

    assert_cmd_snapshot!(context.command().args(["--output-format", "concise"]), @r"
    success: false
    exit_code: 1
    ----- stdout -----
    test test_serial.Serial.test_1_first ... FAILED
    test test_serial.Serial.test_2_second ... ok

    diagnostics:

    test_serial.Serial.test_1_first: AssertionError: False is not true : first one fails

    test result: FAILED. 1 passed; 1 failed; 0 errored; 0 skipped; finished in [TIME]

    ----- stderr -----
    ");
}

#[test]
fn test_sequential_class_setup_runs_once() {
    let context = TestContext::with_file(
        "test_shared.py",
        r"
        import unittest

        class Shared(unittest.TestCase):
            __no_parallel__ = True
            setups = 0

            @classmethod
            def setUpClass(cls):
                Shared.setups += 1

            def test_a(self):
                self.assertEqual(Shared.setups, 1)

            def test_b(self):
                self.assertEqual(Shared.setups, 1)
        ",
    );

    assert_cmd_snapshot!(context.command(), @r"
    success: true
    exit_code: 0
    ----- stdout -----
    test test_shared.Shared.test_a ... ok
    test test_shared.Shared.test_b ... ok

    test result: ok. 2 passed; 0 failed; 0 errored; 0 skipped; finished in [TIME]

    ----- stderr -----
    ");
}

#[test]
fn test_sequential_units_run_in_discovery_order() {
    let context = TestContext::with_file(
        "test_order.py",
        r"
        import unittest

        __no_parallel__ = True

        seen = []

        class First(unittest.TestCase):
            def test_a(self):
                seen.append('First.test_a')

            def test_b(self):
                seen.append('First.test_b')

        class Second(unittest.TestCase):
            def test_c(self):
                self.assertEqual(seen, ['First.test_a', 'First.test_b'])
        ",
    );

    let output = context.command().output().unwrap();
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn test_class_setup_error_is_a_fixture_error() {
    let context = TestContext::with_file(
        "test_db.py",
        r"
        import unittest

        class Db(unittest.TestCase):
            @classmethod
            def setUpClass(cls):
                raise OSError('no database')

            def test_query(self):
                pass

        class Other(unittest.TestCase):
            def test_fine(self):
                pass
        ",
    );

    assert_cmd_snapshot!(context.command().args(["--output-format", "concise"]), @r"
    success: false
    exit_code: 1
    ----- stdout -----
    test test_db.Db.test_query ... ERROR
    test test_db.Other.test_fine ... ok

    diagnostics:

    test_db.Db.test_query (fixture): OSError: no database

    test result: FAILED. 1 passed; 0 failed; 1 errored; 0 skipped; finished in [TIME]

    ----- stderr -----
    ");
}
