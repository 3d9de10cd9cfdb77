use insta_cmd::assert_cmd_snapshot;

use crate::common::TestContext;

fn context() -> TestContext {
    TestContext::with_file(
        "test_api.py",
        r"
        import unittest

        class Auth(unittest.TestCase):
            def test_login(self):
                pass

            def test_logout(self):
                pass

        class Billing(unittest.TestCase):
            def test_invoice(self):
                pass
        ",
    )
}

#[test]
fn test_match_selects_by_id() {
    let context = context();

    assert_cmd_snapshot!(context.command().args(["-m", "Auth"]), @r"
    success: true
    exit_code: 0
    ----- stdout -----
    test test_api.Auth.test_login ... ok
    test test_api.Auth.test_logout ... ok

    test result: ok. 2 passed; 0 failed; 0 errored; 0 skipped; finished in [TIME]

    ----- stderr -----
    ");
}

#[test]
fn test_multiple_patterns_are_alternatives() {
    let context = context();

    assert_cmd_snapshot!(context.command().args(["-m", "login$", "-m", "invoice"]), @r"
    success: true
    exit_code: 0
    ----- stdout -----
    test test_api.Auth.test_login ... ok
    test test_api.Billing.test_invoice ... ok

    test result: ok. 2 passed; 0 failed; 0 errored; 0 skipped; finished in [TIME]

    ----- stderr -----
    ");
}

#[test]
fn test_invalid_pattern_is_fatal() {
    let context = context();

    let output = context.command().args(["-m", "("]).output().unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.starts_with("fanout failed\n"));
}
