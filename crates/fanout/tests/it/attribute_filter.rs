use insta_cmd::assert_cmd_snapshot;

use crate::common::TestContext;

const TESTS: &str = r"
import unittest

class Api(unittest.TestCase):
    network = True

    def test_get(self):
        pass

class Local(unittest.TestCase):
    def test_read(self):
        pass

    def test_rebuild(self):
        pass
    test_rebuild.slow = True

    def test_write(self):
        pass
    test_write.slow = False
";

#[test]
fn test_attr_selects_by_method_attribute() {
    let context = TestContext::with_file("test_store.py", TESTS);

    assert_cmd_snapshot!(context.command().args(["-a", "slow"]), @r"
    success: true
    exit_code: 0
    ----- stdout -----
    test test_store.Local.test_rebuild ... ok

    test result: ok. 1 passed; 0 failed; 0 errored; 0 skipped; finished in [TIME]

    ----- stderr -----
    ");
}

#[test]
fn test_multiple_attributes_are_alternatives() {
    let context = TestContext::with_file("test_store.py", TESTS);

    assert_cmd_snapshot!(context.command().args(["--attr", "slow", "--attr", "network"]), @r"
    success: true
    exit_code: 0
    ----- stdout -----
    test test_store.Api.test_get ... ok
    test test_store.Local.test_rebuild ... ok

    test result: ok. 2 passed; 0 failed; 0 errored; 0 skipped; finished in [TIME]

    ----- stderr -----
    ");
}

#[test]
fn test_attr_from_configuration() {
    let context = TestContext::with_files([
        ("fanout.toml", "[report]\nattr = [\"network\"]\n"),
        ("test_store.py", TESTS),
    ]);

    assert_cmd_snapshot!(context.command(), @r"
    success: true
    exit_code: 0
    ----- stdout -----
    test test_store.Api.test_get ... ok

    test result: ok. 1 passed; 0 failed; 0 errored; 0 skipped; finished in [TIME]

    ----- stderr -----
    ");
}
