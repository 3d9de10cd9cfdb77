use insta_cmd::assert_cmd_snapshot;

use crate::common::TestContext;

#[test]
fn test_broken_module_does_not_hide_the_rest() {
    let context = TestContext::with_files([
        ("test_broken.py", "import does_not_exist_anywhere\n"),
        (
            "test_ok.py",
            r"
            import unittest

            class Ok(unittest.TestCase):
                def test_one(self):
                    pass
            ",
        ),
    ]);

    assert_cmd_snapshot!(context.command().args(["--output-format", "concise"]), @r"
    success: false
    exit_code: 1
    ----- stdout -----
    test test_broken ... ERROR
    test test_ok.Ok.test_one ... ok

    diagnostics:

    test_broken (discovery): ModuleNotFoundError: No module named 'does_not_exist_anywhere'

    test result: FAILED. 1 passed; 0 failed; 1 errored; 0 skipped; finished in [TIME]

    ----- stderr -----
    ");
}

#[test]
fn test_missing_start_directory() {
    let context = TestContext::new();

    assert_cmd_snapshot!(context.command().args(["missing", "--output-format", "concise"]), @r"
    success: false
    exit_code: 1
    ----- stdout -----
    test [TEMP_DIR]/missing ... ERROR

    diagnostics:

    [TEMP_DIR]/missing (discovery): `[TEMP_DIR]/missing` is not a directory

    test result: FAILED. 0 passed; 0 failed; 1 errored; 0 skipped; finished in [TIME]

    ----- stderr -----
    ");
}

#[test]
fn test_dry_run_prints_the_plan() {
    let context = TestContext::with_files([
        (
            "test_api.py",
            r"
            import unittest

            class Auth(unittest.TestCase):
                def test_login(self):
                    pass

                def test_logout(self):
                    pass

            class Billing(unittest.TestCase):
                __no_parallel__ = True

                def test_invoice(self):
                    pass
            ",
        ),
        (
            "test_db.py",
            r"
            import unittest

            __no_parallel__ = True

            class Schema(unittest.TestCase):
                def test_create(self):
                    pass
            ",
        ),
    ]);

    assert_cmd_snapshot!(context.command().arg("--dry-run"), @r"
    success: true
    exit_code: 0
    ----- stdout -----
    <parallel> test_api.Auth.test_login
    <parallel> test_api.Auth.test_logout
    <sequential> test_api.Billing.test_invoice
    <sequential> test_db.Schema.test_create

    4 tests collected (2 parallel, 2 sequential)

    ----- stderr -----
    ");
}

#[test]
fn test_custom_pattern() {
    let context = TestContext::with_files([
        (
            "check_math.py",
            r"
            import unittest

            class Math(unittest.TestCase):
                def test_add(self):
                    pass
            ",
        ),
        (
            "test_ignored.py",
            r"
            import unittest

            class Ignored(unittest.TestCase):
                def test_never(self):
                    pass
            ",
        ),
    ]);

    assert_cmd_snapshot!(context.command().args(["--pattern", "check_*.py"]), @r"
    success: true
    exit_code: 0
    ----- stdout -----
    test check_math.Math.test_add ... ok

    test result: ok. 1 passed; 0 failed; 0 errored; 0 skipped; finished in [TIME]

    ----- stderr -----
    ");
}

#[test]
fn test_packages_are_discovered_recursively() {
    let context = TestContext::with_files([
        ("tests/__init__.py", ""),
        (
            "tests/test_nested.py",
            r"
            import unittest

            class Nested(unittest.TestCase):
                def test_deep(self):
                    pass
            ",
        ),
    ]);

    assert_cmd_snapshot!(context.command(), @r"
    success: true
    exit_code: 0
    ----- stdout -----
    test tests.test_nested.Nested.test_deep ... ok

    test result: ok. 1 passed; 0 failed; 0 errored; 0 skipped; finished in [TIME]

    ----- stderr -----
    ");
}
